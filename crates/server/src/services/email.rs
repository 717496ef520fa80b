//! Candidate email dispatch and its durable record.

use regex::{Captures, Regex};
use std::sync::LazyLock;
use shared::{text_value, EmailStatus, SendEmailRequest, SendEmailResponse, FULL_NAME_FIELD};

use crate::{
    db::{Database, EmailRecord, NewEmailRecord},
    error::AppError,
    mailer::EmailTransport,
    services::quota,
    tenant::TenantContext,
};

static PLACEHOLDER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*(\w+)\s*\}\}").expect("Invalid placeholder regex")
});

/// Values substituted into `{{candidateName}}`, `{{roleName}}` and `{{companyName}}`
#[derive(Debug, Clone)]
pub struct TemplateVars {
    pub candidate_name: String,
    pub role_name: String,
    pub company_name: String,
}

/// Fill known placeholders; unknown ones are left as written.
pub fn interpolate(text: &str, vars: &TemplateVars) -> String {
    PLACEHOLDER_REGEX
        .replace_all(text, |caps: &Captures| match &caps[1] {
            "candidateName" => vars.candidate_name.clone(),
            "roleName" => vars.role_name.clone(),
            "companyName" => vars.company_name.clone(),
            _ => caps[0].to_string(),
        })
        .into_owned()
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Plain-text body as an HTML message
pub fn render_html(body: &str) -> String {
    let escaped = escape_html(body).replace("\r\n", "\n").replace('\n', "<br>");
    format!(
        "<div style=\"font-family: sans-serif; line-height: 1.5;\">{}</div>",
        escaped
    )
}

/// Append a dispatch record. Records are never changed afterwards.
pub async fn record(db: &Database, record: &NewEmailRecord) -> Result<EmailRecord, AppError> {
    let stored = db.insert_email_record(record).await?;
    tracing::info!(
        "Email {} to {} recorded for application {} ({})",
        stored.id,
        stored.to_address,
        stored.application_id,
        stored.status
    );
    Ok(stored)
}

pub async fn history(db: &Database, application_id: i64, company_id: i64) -> Result<Vec<EmailRecord>, AppError> {
    if db.get_application(application_id, company_id).await?.is_none() {
        return Err(AppError::NotFound("Application not found".to_string()));
    }
    Ok(db.list_emails(application_id, company_id).await?)
}

/// Send one email to a candidate and record the outcome.
///
/// The quota check runs before the transport is touched. A transport failure
/// is recorded as `failed` and reported in the response, not as an error.
pub async fn send_email(
    db: &Database,
    transport: &dyn EmailTransport,
    application_id: i64,
    ctx: &TenantContext,
    req: SendEmailRequest,
) -> Result<SendEmailResponse, AppError> {
    req.validate().map_err(AppError::Validation)?;

    let application = db
        .get_application(application_id, ctx.company_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Application not found".to_string()))?;

    quota::check_email_limit(db, ctx.company_id).await?;

    let (subject, body) = match req.template_id {
        Some(template_id) => {
            let template = db
                .get_email_template(template_id, ctx.company_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Email template not found".to_string()))?;
            (template.subject, template.body)
        }
        None => (req.subject, req.body),
    };

    let company = db
        .get_company(ctx.company_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Company not found".to_string()))?;
    let role_name = db
        .get_role(application.role_id, ctx.company_id)
        .await?
        .map(|r| r.name)
        .unwrap_or_default();

    let vars = TemplateVars {
        candidate_name: text_value(&application.form_data.0, FULL_NAME_FIELD)
            .unwrap_or_default()
            .to_string(),
        role_name,
        company_name: company.name.clone(),
    };
    let subject = interpolate(&subject, &vars);
    let body = interpolate(&body, &vars);
    let html = render_html(&body);

    let outcome = transport.send(&req.to, &subject, &html, &company.name).await;
    if outcome.status == EmailStatus::Failed {
        tracing::warn!(
            "Email to {} for application {} failed: {}",
            req.to,
            application_id,
            outcome.error.as_deref().unwrap_or("unknown error")
        );
    }

    record(
        db,
        &NewEmailRecord {
            application_id,
            company_id: ctx.company_id,
            sender_user_id: ctx.user_id,
            to: req.to,
            subject,
            body,
            html,
            template_id: req.template_id,
            status: outcome.status,
            error: outcome.error,
        },
    )
    .await?;

    Ok(SendEmailResponse { status: outcome.status })
}
