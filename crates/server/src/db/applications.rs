use anyhow::Result;
use chrono::Utc;
use shared::{ApplicationFilter, FormData};
use sqlx::{types::Json, QueryBuilder, Sqlite};

use super::{Application, ApplicationRow, Database, Stage, TimelineEntry};

const APPLICATION_COLUMNS: &str =
    "id, role_id, company_id, current_stage_id, form_data, resume_key, created_at, updated_at";

const APPLICATION_ROW_SELECT: &str = r#"
    SELECT a.id, a.role_id, a.company_id, a.current_stage_id, a.form_data, a.resume_key,
           a.created_at, a.updated_at,
           r.name AS role_name, r.color AS role_color,
           s.name AS stage_name, s.color AS stage_color, s.icon AS stage_icon
    FROM applications a
    JOIN roles r ON r.id = a.role_id
    LEFT JOIN stages s ON s.id = a.current_stage_id
"#;

#[derive(Debug, Clone)]
pub struct NewApplication {
    pub role_id: i64,
    pub company_id: i64,
    pub form_data: FormData,
}

impl Database {
    pub async fn insert_application(&self, app: &NewApplication) -> Result<Application> {
        let now = Utc::now();
        let application = sqlx::query_as::<_, Application>(&format!(
            "INSERT INTO applications (role_id, company_id, form_data, created_at, updated_at) VALUES (?, ?, ?, ?, ?) RETURNING {}",
            APPLICATION_COLUMNS
        ))
        .bind(app.role_id)
        .bind(app.company_id)
        .bind(Json(&app.form_data))
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(application)
    }

    pub async fn set_resume_key(&self, id: i64, company_id: i64, key: &str) -> Result<()> {
        sqlx::query(
            "UPDATE applications SET resume_key = ?, updated_at = ? WHERE id = ? AND company_id = ?",
        )
        .bind(key)
        .bind(Utc::now())
        .bind(id)
        .bind(company_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_application(&self, id: i64, company_id: i64) -> Result<Option<Application>> {
        let application = sqlx::query_as::<_, Application>(&format!(
            "SELECT {} FROM applications WHERE id = ? AND company_id = ?",
            APPLICATION_COLUMNS
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(application)
    }

    pub async fn get_application_row(&self, id: i64, company_id: i64) -> Result<Option<ApplicationRow>> {
        let row = sqlx::query_as::<_, ApplicationRow>(&format!(
            "{} WHERE a.id = ? AND a.company_id = ?",
            APPLICATION_ROW_SELECT
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Newest first. `search` is a substring match on the candidate's full name.
    pub async fn list_applications(
        &self,
        company_id: i64,
        filter: &ApplicationFilter,
    ) -> Result<Vec<ApplicationRow>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(APPLICATION_ROW_SELECT);
        qb.push(" WHERE a.company_id = ").push_bind(company_id);

        if let Some(role_id) = filter.role_id {
            qb.push(" AND a.role_id = ").push_bind(role_id);
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
            qb.push(" AND instr(COALESCE(json_extract(a.form_data, '$.full_name'), ''), ")
                .push_bind(search.to_string())
                .push(") > 0");
        }

        qb.push(" ORDER BY a.created_at DESC, a.id DESC");

        let rows = qb
            .build_query_as::<ApplicationRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Point the application at `stage_id` without recording a timeline entry.
    pub async fn set_current_stage(
        &self,
        id: i64,
        company_id: i64,
        stage_id: Option<i64>,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE applications SET current_stage_id = ?, updated_at = ? WHERE id = ? AND company_id = ?",
        )
        .bind(stage_id)
        .bind(Utc::now())
        .bind(id)
        .bind(company_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Append a timeline entry for `stage` and move the application onto it,
    /// in one transaction.
    pub async fn record_stage_transition(
        &self,
        application_id: i64,
        company_id: i64,
        stage: &Stage,
        description: Option<&str>,
    ) -> Result<TimelineEntry> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let entry = sqlx::query_as::<_, TimelineEntry>(
            r#"
            INSERT INTO application_timeline (application_id, company_id, stage_id, stage_name, description, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, application_id, company_id, stage_id, stage_name, description, created_at
            "#,
        )
        .bind(application_id)
        .bind(company_id)
        .bind(stage.id)
        .bind(&stage.name)
        .bind(description)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let moved = sqlx::query(
            "UPDATE applications SET current_stage_id = ?, updated_at = ? WHERE id = ? AND company_id = ?",
        )
        .bind(stage.id)
        .bind(now)
        .bind(application_id)
        .bind(company_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if moved == 0 {
            // Dropping the transaction rolls the timeline insert back.
            anyhow::bail!("application {} vanished during stage transition", application_id);
        }

        tx.commit().await?;
        Ok(entry)
    }

    /// Oldest entry first
    pub async fn list_timeline(&self, application_id: i64, company_id: i64) -> Result<Vec<TimelineEntry>> {
        let entries = sqlx::query_as::<_, TimelineEntry>(
            r#"
            SELECT id, application_id, company_id, stage_id, stage_name, description, created_at
            FROM application_timeline
            WHERE application_id = ? AND company_id = ?
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(application_id)
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    /// Timeline and email rows go with it through the cascade.
    pub async fn delete_application(&self, id: i64, company_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM applications WHERE id = ? AND company_id = ?")
            .bind(id)
            .bind(company_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::seed;

    #[tokio::test]
    async fn test_stage_transition_rolls_back_when_application_is_missed() {
        let seed = seed().await;
        let app = seed.submit_candidate("Ada").await;
        let stage = seed.db.list_stages(seed.role_id).await.unwrap().remove(1);
        let other = seed.other_company().await;

        // The timeline insert goes through, the pointer update matches nothing
        assert!(seed
            .db
            .record_stage_transition(app, other, &stage, Some("wrong tenant"))
            .await
            .is_err());

        assert!(seed.db.list_timeline(app, other).await.unwrap().is_empty());
        assert!(seed.db.list_timeline(app, seed.company_id).await.unwrap().is_empty());
        let stored = seed.db.get_application(app, seed.company_id).await.unwrap().unwrap();
        assert_eq!(stored.current_stage_id, None);

        let entry = seed
            .db
            .record_stage_transition(app, seed.company_id, &stage, None)
            .await
            .unwrap();
        assert_eq!(entry.stage_name, stage.name);
        assert_eq!(seed.db.list_timeline(app, seed.company_id).await.unwrap().len(), 1);
    }
}
