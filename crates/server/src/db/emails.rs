use anyhow::Result;
use chrono::{DateTime, Utc};
use shared::EmailStatus;

use super::{Database, EmailRecord};

const EMAIL_COLUMNS: &str = "id, application_id, company_id, sender_user_id, to_address, subject, body, \
     html, template_id, status, error, created_at";

#[derive(Debug, Clone)]
pub struct NewEmailRecord {
    pub application_id: i64,
    pub company_id: i64,
    pub sender_user_id: i64,
    pub to: String,
    pub subject: String,
    pub body: String,
    pub html: String,
    pub template_id: Option<i64>,
    pub status: EmailStatus,
    pub error: Option<String>,
}

impl Database {
    pub async fn insert_email_record(&self, record: &NewEmailRecord) -> Result<EmailRecord> {
        self.insert_email_record_at(record, Utc::now()).await
    }

    pub(crate) async fn insert_email_record_at(
        &self,
        record: &NewEmailRecord,
        created_at: DateTime<Utc>,
    ) -> Result<EmailRecord> {
        let row = sqlx::query_as::<_, EmailRecord>(&format!(
            r#"
            INSERT INTO application_emails (application_id, company_id, sender_user_id, to_address, subject,
                                            body, html, template_id, status, error, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {}
            "#,
            EMAIL_COLUMNS
        ))
        .bind(record.application_id)
        .bind(record.company_id)
        .bind(record.sender_user_id)
        .bind(&record.to)
        .bind(&record.subject)
        .bind(&record.body)
        .bind(&record.html)
        .bind(record.template_id)
        .bind(record.status.as_str())
        .bind(&record.error)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Newest first
    pub async fn list_emails(&self, application_id: i64, company_id: i64) -> Result<Vec<EmailRecord>> {
        let rows = sqlx::query_as::<_, EmailRecord>(&format!(
            "SELECT {} FROM application_emails WHERE application_id = ? AND company_id = ? ORDER BY created_at DESC, id DESC",
            EMAIL_COLUMNS
        ))
        .bind(application_id)
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Successful sends of the company at or after `since`
    pub async fn count_sent_emails_since(&self, company_id: i64, since: DateTime<Utc>) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM application_emails WHERE company_id = ? AND status = ? AND created_at >= ?",
        )
        .bind(company_id)
        .bind(EmailStatus::Sent.as_str())
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
