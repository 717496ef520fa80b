use anyhow::Result;
use chrono::Utc;
use shared::{CreateEmailTemplateRequest, UpdateEmailTemplateRequest};

use super::{Database, EmailTemplate};

const TEMPLATE_COLUMNS: &str = "id, company_id, name, subject, body, created_at, updated_at";

impl Database {
    pub async fn create_email_template(
        &self,
        company_id: i64,
        req: &CreateEmailTemplateRequest,
    ) -> Result<EmailTemplate> {
        let now = Utc::now();
        let template = sqlx::query_as::<_, EmailTemplate>(&format!(
            "INSERT INTO email_templates (company_id, name, subject, body, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?) RETURNING {}",
            TEMPLATE_COLUMNS
        ))
        .bind(company_id)
        .bind(&req.name)
        .bind(&req.subject)
        .bind(&req.body)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(template)
    }

    pub async fn get_email_template(&self, id: i64, company_id: i64) -> Result<Option<EmailTemplate>> {
        let template = sqlx::query_as::<_, EmailTemplate>(&format!(
            "SELECT {} FROM email_templates WHERE id = ? AND company_id = ?",
            TEMPLATE_COLUMNS
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(template)
    }

    pub async fn list_email_templates(&self, company_id: i64) -> Result<Vec<EmailTemplate>> {
        let templates = sqlx::query_as::<_, EmailTemplate>(&format!(
            "SELECT {} FROM email_templates WHERE company_id = ? ORDER BY created_at DESC, id DESC",
            TEMPLATE_COLUMNS
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(templates)
    }

    pub async fn update_email_template(
        &self,
        id: i64,
        company_id: i64,
        req: &UpdateEmailTemplateRequest,
    ) -> Result<Option<EmailTemplate>> {
        sqlx::query(
            r#"
            UPDATE email_templates
            SET name = COALESCE(?, name),
                subject = COALESCE(?, subject),
                body = COALESCE(?, body),
                updated_at = ?
            WHERE id = ? AND company_id = ?
            "#,
        )
        .bind(&req.name)
        .bind(&req.subject)
        .bind(&req.body)
        .bind(Utc::now())
        .bind(id)
        .bind(company_id)
        .execute(&self.pool)
        .await?;

        self.get_email_template(id, company_id).await
    }

    pub async fn delete_email_template(&self, id: i64, company_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM email_templates WHERE id = ? AND company_id = ?")
            .bind(id)
            .bind(company_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
