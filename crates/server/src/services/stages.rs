use std::collections::HashSet;

use shared::{CreateStageRequest, UpdateStageRequest, DEFAULT_STAGE_COLOR, DEFAULT_STAGE_ICON};

use crate::{
    db::{Database, Stage},
    error::AppError,
    services::{quota, roles::find_role},
};

fn stage_not_found() -> AppError {
    AppError::NotFound("Stage not found".to_string())
}

/// Stage -> Role -> Company. Both hops must hold, and either failing looks the
/// same to the caller.
async fn find_owned_stage(
    db: &Database,
    stage_id: i64,
    role_id: i64,
    company_id: i64,
) -> Result<Stage, AppError> {
    if db.get_role(role_id, company_id).await?.is_none() {
        return Err(stage_not_found());
    }
    db.get_stage_for_role(stage_id, role_id)
        .await?
        .ok_or_else(stage_not_found)
}

fn validate_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("Stage name is required".to_string()));
    }
    Ok(())
}

fn validate_order(order: Option<i64>) -> Result<(), AppError> {
    match order {
        Some(o) if o < 1 => Err(AppError::Validation("Stage order must be at least 1".to_string())),
        _ => Ok(()),
    }
}

pub async fn list(db: &Database, role_id: i64, company_id: i64) -> Result<Vec<Stage>, AppError> {
    find_role(db, role_id, company_id).await?;
    Ok(db.list_stages(role_id).await?)
}

pub async fn create(
    db: &Database,
    role_id: i64,
    company_id: i64,
    req: CreateStageRequest,
) -> Result<Stage, AppError> {
    find_role(db, role_id, company_id).await?;
    validate_name(&req.name)?;
    validate_order(req.order)?;

    quota::check_stage_limit(db, company_id, role_id).await?;

    let stage = db
        .insert_stage(
            role_id,
            req.name.trim(),
            req.order,
            req.color.as_deref().unwrap_or(DEFAULT_STAGE_COLOR),
            req.icon.as_deref().unwrap_or(DEFAULT_STAGE_ICON),
        )
        .await?;

    tracing::info!("Stage {} ({}) added to role {} at order {}", stage.id, stage.name, role_id, stage.order);
    Ok(stage)
}

pub async fn update(
    db: &Database,
    stage_id: i64,
    role_id: i64,
    company_id: i64,
    mut req: UpdateStageRequest,
) -> Result<Stage, AppError> {
    find_owned_stage(db, stage_id, role_id, company_id).await?;
    if let Some(name) = &req.name {
        validate_name(name)?;
    }
    validate_order(req.order)?;
    req.name = req.name.map(|n| n.trim().to_string());

    db.update_stage(stage_id, role_id, &req)
        .await?
        .ok_or_else(stage_not_found)
}

/// Applications parked on the stage fall back to unplaced before the row goes.
pub async fn delete(db: &Database, stage_id: i64, role_id: i64, company_id: i64) -> Result<(), AppError> {
    find_owned_stage(db, stage_id, role_id, company_id).await?;

    let detached = db.delete_stage_detaching(stage_id, role_id).await?;
    tracing::info!(
        "Stage {} deleted from role {}, {} application(s) detached",
        stage_id,
        role_id,
        detached
    );
    Ok(())
}

/// Rewrite the whole pipeline order at once. `stage_ids` must name every
/// stage of the role exactly once.
pub async fn reorder(
    db: &Database,
    role_id: i64,
    company_id: i64,
    stage_ids: &[i64],
) -> Result<Vec<Stage>, AppError> {
    find_role(db, role_id, company_id).await?;

    let current: HashSet<i64> = db.list_stages(role_id).await?.iter().map(|s| s.id).collect();
    let requested: HashSet<i64> = stage_ids.iter().copied().collect();
    if requested.len() != stage_ids.len() || requested != current {
        return Err(AppError::Validation(
            "Stage order must list every stage of the role exactly once".to_string(),
        ));
    }

    db.reorder_stages(role_id, stage_ids).await?;
    tracing::debug!("Role {} stages reordered", role_id);
    Ok(db.list_stages(role_id).await?)
}
