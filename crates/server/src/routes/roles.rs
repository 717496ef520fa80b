//! Role and stage management. Reads are open to every member; writes need an admin.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use shared::{
    ApiResponse, CreateRoleRequest, CreateStageRequest, ReorderStagesRequest, ToggleActiveRequest,
    UpdateRoleRequest, UpdateStageRequest,
};

use crate::{
    db::{RoleWithStages, Stage},
    error::AppError,
    services::{roles, stages},
    state::AppState,
    tenant::TenantContext,
};

/// GET /roles
pub async fn list_roles(
    State(state): State<AppState>,
    ctx: TenantContext,
) -> Result<Json<ApiResponse<Vec<RoleWithStages>>>, AppError> {
    let roles = roles::list(&state.db, ctx.company_id).await?;
    Ok(Json(ApiResponse::ok(roles)))
}

/// POST /roles
pub async fn create_role(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(req): Json<CreateRoleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RoleWithStages>>), AppError> {
    ctx.require_admin()?;
    let role = roles::create(&state.db, ctx.company_id, ctx.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(role))))
}

/// GET /roles/:id
pub async fn get_role(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(role_id): Path<i64>,
) -> Result<Json<ApiResponse<RoleWithStages>>, AppError> {
    let role = roles::get(&state.db, role_id, ctx.company_id).await?;
    Ok(Json(ApiResponse::ok(role)))
}

/// PATCH /roles/:id
pub async fn update_role(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(role_id): Path<i64>,
    Json(req): Json<UpdateRoleRequest>,
) -> Result<Json<ApiResponse<RoleWithStages>>, AppError> {
    ctx.require_admin()?;
    let role = roles::update(&state.db, role_id, ctx.company_id, req).await?;
    Ok(Json(ApiResponse::ok(role)))
}

/// DELETE /roles/:id
pub async fn delete_role(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(role_id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    ctx.require_admin()?;
    roles::delete(&state.db, role_id, ctx.company_id).await?;
    Ok(Json(ApiResponse::ok(())))
}

/// PATCH /roles/:id/active
pub async fn toggle_active(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(role_id): Path<i64>,
    Json(req): Json<ToggleActiveRequest>,
) -> Result<Json<ApiResponse<RoleWithStages>>, AppError> {
    ctx.require_admin()?;
    let role = roles::toggle_active(&state.db, role_id, ctx.company_id, req.is_active).await?;
    Ok(Json(ApiResponse::ok(role)))
}

/// GET /roles/:role_id/stages
pub async fn list_stages(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(role_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<Stage>>>, AppError> {
    let stages = stages::list(&state.db, role_id, ctx.company_id).await?;
    Ok(Json(ApiResponse::ok(stages)))
}

/// POST /roles/:role_id/stages
pub async fn create_stage(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(role_id): Path<i64>,
    Json(req): Json<CreateStageRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Stage>>), AppError> {
    ctx.require_admin()?;
    let stage = stages::create(&state.db, role_id, ctx.company_id, req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(stage))))
}

/// PUT /roles/:role_id/stages/order
pub async fn reorder_stages(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(role_id): Path<i64>,
    Json(req): Json<ReorderStagesRequest>,
) -> Result<Json<ApiResponse<Vec<Stage>>>, AppError> {
    ctx.require_admin()?;
    let stages = stages::reorder(&state.db, role_id, ctx.company_id, &req.stage_ids).await?;
    Ok(Json(ApiResponse::ok(stages)))
}

/// PATCH /roles/:role_id/stages/:id
pub async fn update_stage(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path((role_id, stage_id)): Path<(i64, i64)>,
    Json(req): Json<UpdateStageRequest>,
) -> Result<Json<ApiResponse<Stage>>, AppError> {
    ctx.require_admin()?;
    let stage = stages::update(&state.db, stage_id, role_id, ctx.company_id, req).await?;
    Ok(Json(ApiResponse::ok(stage)))
}

/// DELETE /roles/:role_id/stages/:id
pub async fn delete_stage(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path((role_id, stage_id)): Path<(i64, i64)>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    ctx.require_admin()?;
    stages::delete(&state.db, stage_id, role_id, ctx.company_id).await?;
    Ok(Json(ApiResponse::ok(())))
}
