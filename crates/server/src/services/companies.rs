use shared::UserRole;

use crate::{
    config::{AuthConfig, BootstrapConfig},
    db::Database,
    error::AppError,
    tenant::{issue_token, TenantContext},
};

/// Make sure the configured company and its admin exist, and mint a token for
/// the admin. Running it again is harmless; only the plan is brought in line.
pub async fn bootstrap(
    db: &Database,
    config: &BootstrapConfig,
    auth: &AuthConfig,
) -> Result<String, AppError> {
    let company = match db.get_company_by_slug(&config.company_slug).await? {
        Some(company) => {
            if company.plan != config.plan.as_str() {
                db.set_company_plan(company.id, config.plan).await?;
                tracing::info!("Company {} moved to plan {}", company.slug, config.plan);
            }
            company
        }
        None => {
            let company = db
                .create_company(&config.company_name, &config.company_slug, config.plan)
                .await?;
            tracing::info!("Created company {} ({})", company.slug, company.id);
            company
        }
    };

    let admin = match db.get_user_by_email(company.id, &config.admin_email).await? {
        Some(user) => user,
        None => {
            let user = db
                .create_user(company.id, &config.admin_name, &config.admin_email, UserRole::Admin)
                .await?;
            tracing::info!("Created admin {} for company {}", user.email, company.slug);
            user
        }
    };

    issue_token(
        &TenantContext {
            company_id: company.id,
            user_id: admin.id,
            role: UserRole::Admin,
        },
        auth,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenant::verify_token;
    use shared::Plan;

    fn config(plan: Plan) -> BootstrapConfig {
        BootstrapConfig {
            company_name: "Initech".into(),
            company_slug: "initech".into(),
            plan,
            admin_name: "Peter".into(),
            admin_email: "peter@initech.test".into(),
        }
    }

    fn auth() -> AuthConfig {
        AuthConfig {
            jwt_secret: "bootstrap-secret".into(),
            token_expiry_hours: 1,
        }
    }

    #[tokio::test]
    async fn test_bootstrap_is_repeatable() {
        let db = Database::in_memory().await.unwrap();

        let first = verify_token(&bootstrap(&db, &config(Plan::Team), &auth()).await.unwrap(), "bootstrap-secret")
            .unwrap();
        assert_eq!(first.role, UserRole::Admin);

        let second = verify_token(
            &bootstrap(&db, &config(Plan::Ultimate), &auth()).await.unwrap(),
            "bootstrap-secret",
        )
        .unwrap();
        assert_eq!(second, first);

        let company = db.get_company_by_slug("initech").await.unwrap().unwrap();
        assert_eq!(company.plan, "ultimate");
    }
}
