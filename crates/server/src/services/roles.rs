//! Role registry: job requisitions, their application forms and default pipeline.

use rand::seq::SliceRandom;
use shared::{ensure_system_fields, CreateRoleRequest, UpdateRoleRequest, ROLE_COLORS};

use crate::{
    db::{Database, NewRole, Role, RolePatch, RoleWithStages},
    error::AppError,
    services::quota,
};

fn pick_role_color() -> String {
    ROLE_COLORS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("#6366f1")
        .to_string()
}

pub(crate) async fn find_role(db: &Database, role_id: i64, company_id: i64) -> Result<Role, AppError> {
    db.get_role(role_id, company_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Role not found".to_string()))
}

async fn with_stages(db: &Database, role: Role) -> Result<RoleWithStages, AppError> {
    let stages = db.list_stages(role.id).await?;
    Ok(RoleWithStages { role, stages })
}

pub async fn list(db: &Database, company_id: i64) -> Result<Vec<RoleWithStages>, AppError> {
    let mut result = Vec::new();
    for role in db.list_roles(company_id).await? {
        result.push(with_stages(db, role).await?);
    }
    Ok(result)
}

pub async fn get(db: &Database, role_id: i64, company_id: i64) -> Result<RoleWithStages, AppError> {
    let role = find_role(db, role_id, company_id).await?;
    with_stages(db, role).await
}

/// Create a role with the default Pending / Accepted / Rejected pipeline.
pub async fn create(
    db: &Database,
    company_id: i64,
    actor_id: i64,
    req: CreateRoleRequest,
) -> Result<RoleWithStages, AppError> {
    req.validate().map_err(AppError::Validation)?;

    if req.is_active {
        quota::check_active_role_limit(db, company_id).await?;
    }

    let new_role = NewRole {
        company_id,
        created_by_user_id: actor_id,
        name: req.name.trim().to_string(),
        description: req.description,
        location: req.location,
        role_type: req.role_type,
        seniority_level: req.seniority_level,
        requirements: req.requirements,
        custom_fields: ensure_system_fields(req.custom_fields),
        is_active: req.is_active,
        color: pick_role_color(),
    };

    let role_id = db.create_role_with_default_stages(&new_role).await?;
    tracing::info!("Role {} created for company {} by user {}", role_id, company_id, actor_id);

    get(db, role_id, company_id).await
}

pub async fn update(
    db: &Database,
    role_id: i64,
    company_id: i64,
    req: UpdateRoleRequest,
) -> Result<RoleWithStages, AppError> {
    let existing = find_role(db, role_id, company_id).await?;
    req.validate().map_err(AppError::Validation)?;

    if req.is_active == Some(true) && !existing.is_active {
        quota::check_active_role_limit(db, company_id).await?;
    }

    let patch = RolePatch {
        name: req.name.map(|n| n.trim().to_string()),
        description: req.description,
        location: req.location,
        role_type: req.role_type,
        seniority_level: req.seniority_level,
        requirements: req.requirements,
        custom_fields: req.custom_fields.map(ensure_system_fields),
        is_active: req.is_active,
    };

    if !db.update_role(role_id, company_id, &patch).await? {
        return Err(AppError::NotFound("Role not found".to_string()));
    }
    get(db, role_id, company_id).await
}

/// Refused while any application references the role; deactivate instead.
pub async fn delete(db: &Database, role_id: i64, company_id: i64) -> Result<(), AppError> {
    find_role(db, role_id, company_id).await?;

    let app_count = db.count_applications_for_role(role_id, company_id).await?;
    if app_count > 0 {
        return Err(AppError::Conflict(format!(
            "Cannot delete role with {} existing application(s). Deactivate it instead.",
            app_count
        )));
    }

    db.delete_role(role_id, company_id).await?;
    tracing::info!("Role {} deleted for company {}", role_id, company_id);
    Ok(())
}

pub async fn toggle_active(
    db: &Database,
    role_id: i64,
    company_id: i64,
    is_active: bool,
) -> Result<RoleWithStages, AppError> {
    let existing = find_role(db, role_id, company_id).await?;

    if is_active && !existing.is_active {
        quota::check_active_role_limit(db, company_id).await?;
    }

    db.set_role_active(role_id, company_id, is_active).await?;
    tracing::info!("Role {} active={} for company {}", role_id, is_active, company_id);
    get(db, role_id, company_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{role_request, seed};
    use shared::{CustomField, FieldType, Plan};

    fn field(id: &str, label: &str, field_type: FieldType) -> CustomField {
        CustomField {
            id: id.into(),
            label: label.into(),
            field_type,
            required: false,
            placeholder: None,
            options: None,
            system: false,
        }
    }

    #[tokio::test]
    async fn test_create_provisions_default_pipeline() {
        let seed = seed().await;
        let role = create(&seed.db, seed.company_id, seed.admin.user_id, role_request("Designer"))
            .await
            .unwrap();

        let names: Vec<_> = role.stages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Pending", "Accepted", "Rejected"]);
        let orders: Vec<_> = role.stages.iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
        assert!(shared::ROLE_COLORS.contains(&role.role.color.as_str()));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_name() {
        let seed = seed().await;
        let result = create(&seed.db, seed.company_id, seed.admin.user_id, role_request("")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_system_fields_survive_create_and_update() {
        let seed = seed().await;
        let mut req = role_request("Engineer");
        let mut tampered = field("full_name", "Your name", FieldType::Textarea);
        tampered.required = false;
        req.custom_fields = vec![tampered, field("github", "GitHub", FieldType::Url)];

        let role = create(&seed.db, seed.company_id, seed.admin.user_id, req).await.unwrap();
        let fields = &role.role.custom_fields.0;
        assert_eq!(fields[0].id, "full_name");
        assert_eq!(fields[0].label, "Your name");
        assert_eq!(fields[0].field_type, FieldType::Text);
        assert!(fields[0].required && fields[0].system);
        assert!(fields.iter().any(|f| f.id == "email" && f.required && f.system));

        // Dropping both system fields in an update brings them back
        let updated = update(
            &seed.db,
            role.role.id,
            seed.company_id,
            UpdateRoleRequest {
                custom_fields: Some(vec![field("github", "GitHub profile", FieldType::Url)]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let ids: Vec<_> = updated.role.custom_fields.0.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["full_name", "email", "github"]);
        assert_eq!(updated.role.custom_fields.0[0].label, "Full Name");
    }

    #[tokio::test]
    async fn test_update_foreign_role_is_not_found() {
        let seed = seed().await;
        let other = seed.other_company().await;
        let result = update(
            &seed.db,
            seed.role_id,
            other,
            UpdateRoleRequest {
                name: Some("Hijacked".into()),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(get(&seed.db, seed.role_id, seed.company_id).await.unwrap().role.name, "Backend Engineer");
    }

    #[tokio::test]
    async fn test_active_role_quota() {
        let seed = seed().await;
        // The seeded role is the first of five active slots
        for i in 0..4 {
            create(&seed.db, seed.company_id, seed.admin.user_id, role_request(&format!("Role {}", i)))
                .await
                .unwrap();
        }

        let sixth = create(&seed.db, seed.company_id, seed.admin.user_id, role_request("Sixth")).await;
        match sixth {
            Err(AppError::QuotaExceeded(msg)) => assert!(msg.contains('5')),
            other => panic!("Expected QuotaExceeded, got {:?}", other.map(|r| r.role.id)),
        }

        // Inactive roles are never blocked, but cannot be switched on
        let mut inactive = role_request("Draft");
        inactive.is_active = false;
        let draft = create(&seed.db, seed.company_id, seed.admin.user_id, inactive).await.unwrap();
        assert!(!draft.role.is_active);
        assert!(matches!(
            toggle_active(&seed.db, draft.role.id, seed.company_id, true).await,
            Err(AppError::QuotaExceeded(_))
        ));
        assert!(matches!(
            update(
                &seed.db,
                draft.role.id,
                seed.company_id,
                UpdateRoleRequest { is_active: Some(true), ..Default::default() }
            )
            .await,
            Err(AppError::QuotaExceeded(_))
        ));

        // Freeing a slot lets it through
        toggle_active(&seed.db, seed.role_id, seed.company_id, false).await.unwrap();
        let activated = toggle_active(&seed.db, draft.role.id, seed.company_id, true).await.unwrap();
        assert!(activated.role.is_active);
    }

    #[tokio::test]
    async fn test_reactivating_active_role_skips_quota() {
        let seed = seed().await;
        seed.db.set_company_plan(seed.company_id, Plan::Ultimate).await.unwrap();
        for i in 0..6 {
            create(&seed.db, seed.company_id, seed.admin.user_id, role_request(&format!("Role {}", i)))
                .await
                .unwrap();
        }
        seed.db.set_company_plan(seed.company_id, Plan::Team).await.unwrap();

        // Already active, so no false -> true flip and no check
        assert!(toggle_active(&seed.db, seed.role_id, seed.company_id, true).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_blocked_by_applications() {
        let seed = seed().await;
        let app_id = seed.submit_candidate("Ada Lovelace").await;

        match delete(&seed.db, seed.role_id, seed.company_id).await {
            Err(AppError::Conflict(msg)) => assert_eq!(
                msg,
                "Cannot delete role with 1 existing application(s). Deactivate it instead."
            ),
            other => panic!("Expected Conflict, got {:?}", other),
        }

        seed.db.delete_application(app_id, seed.company_id).await.unwrap();
        delete(&seed.db, seed.role_id, seed.company_id).await.unwrap();
        assert!(matches!(
            get(&seed.db, seed.role_id, seed.company_id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(seed.db.list_stages(seed.role_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_is_tenant_scoped() {
        let seed = seed().await;
        let other = seed.other_company().await;
        create(&seed.db, other, seed.admin.user_id, role_request("Elsewhere")).await.unwrap();

        let roles = list(&seed.db, seed.company_id).await.unwrap();
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].role.id, seed.role_id);
        assert_eq!(roles[0].stages.len(), 3);
    }
}
