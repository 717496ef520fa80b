use shared::{CreateEmailTemplateRequest, UpdateEmailTemplateRequest};

use crate::{
    db::{Database, EmailTemplate},
    error::AppError,
};

fn template_not_found() -> AppError {
    AppError::NotFound("Email template not found".to_string())
}

pub async fn list(db: &Database, company_id: i64) -> Result<Vec<EmailTemplate>, AppError> {
    Ok(db.list_email_templates(company_id).await?)
}

pub async fn get(db: &Database, template_id: i64, company_id: i64) -> Result<EmailTemplate, AppError> {
    db.get_email_template(template_id, company_id)
        .await?
        .ok_or_else(template_not_found)
}

pub async fn create(
    db: &Database,
    company_id: i64,
    req: CreateEmailTemplateRequest,
) -> Result<EmailTemplate, AppError> {
    req.validate().map_err(AppError::Validation)?;
    let template = db.create_email_template(company_id, &req).await?;
    tracing::info!("Email template {} created for company {}", template.id, company_id);
    Ok(template)
}

pub async fn update(
    db: &Database,
    template_id: i64,
    company_id: i64,
    req: UpdateEmailTemplateRequest,
) -> Result<EmailTemplate, AppError> {
    let blank = |v: &Option<String>| v.as_deref().is_some_and(|s| s.trim().is_empty());
    if blank(&req.name) || blank(&req.subject) {
        return Err(AppError::Validation("Template name and subject must not be empty".to_string()));
    }

    db.update_email_template(template_id, company_id, &req)
        .await?
        .ok_or_else(template_not_found)
}

pub async fn delete(db: &Database, template_id: i64, company_id: i64) -> Result<(), AppError> {
    if !db.delete_email_template(template_id, company_id).await? {
        return Err(template_not_found());
    }
    tracing::info!("Email template {} deleted for company {}", template_id, company_id);
    Ok(())
}
