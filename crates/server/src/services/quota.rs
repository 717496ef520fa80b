//! Plan limits checked against live counts.
//!
//! Every check recomputes its count from the authoritative rows at decision
//! time; nothing is cached between requests. Two concurrent requests racing for
//! the last free slot can both pass, overshooting a limit by at most one per
//! racing request.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use shared::{CompanyUsage, Plan, UsageCounts};

use crate::{db::Database, error::AppError};

/// First instant of the UTC calendar month containing `now`
pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or(now)
}

async fn company_plan(db: &Database, company_id: i64) -> Result<Plan, AppError> {
    let company = db
        .get_company(company_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Company not found".to_string()))?;

    company.plan.parse().map_err(AppError::Internal)
}

fn reject(company_id: i64, message: String) -> AppError {
    tracing::info!("Quota check failed for company {}: {}", company_id, message);
    AppError::QuotaExceeded(message)
}

/// Must run before the transport is called; only `sent` records count.
pub async fn check_email_limit(db: &Database, company_id: i64) -> Result<(), AppError> {
    let Some(limit) = company_plan(db, company_id).await?.limits().emails_per_month else {
        return Ok(());
    };

    let count = db
        .count_sent_emails_since(company_id, month_start(Utc::now()))
        .await?;
    if count >= limit {
        return Err(reject(
            company_id,
            format!("Monthly email limit of {} reached for your plan", limit),
        ));
    }
    Ok(())
}

pub async fn check_stage_limit(db: &Database, company_id: i64, role_id: i64) -> Result<(), AppError> {
    let Some(limit) = company_plan(db, company_id).await?.limits().stages_per_role else {
        return Ok(());
    };

    if db.get_role(role_id, company_id).await?.is_none() {
        return Err(AppError::NotFound("Role not found".to_string()));
    }

    let count = db.count_stages(role_id).await?;
    if count >= limit {
        return Err(reject(
            company_id,
            format!("Stage limit of {} per role reached for your plan", limit),
        ));
    }
    Ok(())
}

pub async fn check_active_role_limit(db: &Database, company_id: i64) -> Result<(), AppError> {
    let Some(limit) = company_plan(db, company_id).await?.limits().active_roles else {
        return Ok(());
    };

    let count = db.count_active_roles(company_id).await?;
    if count >= limit {
        return Err(reject(
            company_id,
            format!("Active role limit of {} reached for your plan", limit),
        ));
    }
    Ok(())
}

/// Display snapshot; never raises `QuotaExceeded`
pub async fn get_usage(db: &Database, company_id: i64) -> Result<CompanyUsage, AppError> {
    let plan = company_plan(db, company_id).await?;
    let since = month_start(Utc::now());

    let (emails_sent_this_month, active_roles, stages_per_role) = futures::try_join!(
        db.count_sent_emails_since(company_id, since),
        db.count_active_roles(company_id),
        db.role_stage_counts(company_id),
    )?;

    Ok(CompanyUsage {
        plan,
        limits: plan.limits(),
        usage: UsageCounts {
            emails_sent_this_month,
            active_roles,
            stages_per_role,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::NewEmailRecord;
    use crate::test_support::{seed, Seed};
    use chrono::TimeZone;
    use shared::EmailStatus;

    async fn record_email(db: &Database, seed: &Seed, app_id: i64, status: EmailStatus, at: DateTime<Utc>) {
        db.insert_email_record_at(
            &NewEmailRecord {
                application_id: app_id,
                company_id: seed.company_id,
                sender_user_id: seed.admin.user_id,
                to: "ada@example.com".into(),
                subject: "Hello".into(),
                body: "Hi".into(),
                html: "<p>Hi</p>".into(),
                template_id: None,
                status,
                error: None,
            },
            at,
        )
        .await
        .unwrap();
    }

    #[test]
    fn test_month_start() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 13, 45, 12).unwrap();
        assert_eq!(month_start(now), Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap());

        let first = Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(month_start(first), first);
    }

    #[tokio::test]
    async fn test_email_limit_counts_only_sent_this_month() {
        let seed = seed().await;
        let db = &seed.db;
        let app = seed.submit_candidate("Ada Lovelace").await;
        let now = Utc::now();

        for _ in 0..49 {
            record_email(db, &seed, app, EmailStatus::Sent, now).await;
        }
        // Failures and last month's sends do not count
        record_email(db, &seed, app, EmailStatus::Failed, now).await;
        record_email(db, &seed, app, EmailStatus::Sent, month_start(now) - chrono::Duration::seconds(1)).await;
        assert!(check_email_limit(db, seed.company_id).await.is_ok());

        record_email(db, &seed, app, EmailStatus::Sent, now).await;
        match check_email_limit(db, seed.company_id).await {
            Err(AppError::QuotaExceeded(msg)) => assert!(msg.contains("50"), "{}", msg),
            other => panic!("Expected QuotaExceeded, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ultimate_plan_is_never_limited() {
        let seed = seed().await;
        let db = &seed.db;
        db.set_company_plan(seed.company_id, Plan::Ultimate).await.unwrap();
        let app = seed.submit_candidate("Ada Lovelace").await;

        for _ in 0..60 {
            record_email(db, &seed, app, EmailStatus::Sent, Utc::now()).await;
        }
        assert!(check_email_limit(db, seed.company_id).await.is_ok());
        assert!(check_stage_limit(db, seed.company_id, seed.role_id).await.is_ok());
        assert!(check_active_role_limit(db, seed.company_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_stage_limit_hides_foreign_roles() {
        let seed = seed().await;
        let other = seed.other_company().await;

        assert!(matches!(
            check_stage_limit(&seed.db, other, seed.role_id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_usage_snapshot() {
        let seed = seed().await;
        let app = seed.submit_candidate("Ada Lovelace").await;
        record_email(&seed.db, &seed, app, EmailStatus::Sent, Utc::now()).await;
        record_email(&seed.db, &seed, app, EmailStatus::Failed, Utc::now()).await;

        let usage = get_usage(&seed.db, seed.company_id).await.unwrap();
        assert_eq!(usage.plan, Plan::Team);
        assert_eq!(usage.limits.emails_per_month, Some(50));
        assert_eq!(usage.usage.emails_sent_this_month, 1);
        assert_eq!(usage.usage.active_roles, 1);
        assert_eq!(usage.usage.stages_per_role.len(), 1);
        assert_eq!(usage.usage.stages_per_role[0].role_id, seed.role_id);
        assert_eq!(usage.usage.stages_per_role[0].stage_count, 3);
    }
}
