//! Application pipeline: candidate submissions and their movement between stages.
//!
//! An application is either unplaced (`current_stage_id` null) or parked on one
//! stage of its own role. Any stage of that role is reachable from any state.
//! `move_stage` flips the pointer alone; `add_timeline_entry` is the audited
//! path that appends history and moves the pointer in one transaction. Both go
//! through `stage_of_application_role` so their ownership checks cannot drift.

use shared::{
    text_value, validate_form_data, ApplicationFilter, FormData, EMAIL_FIELD, FULL_NAME_FIELD,
    RESUME_FIELD,
};

use crate::{
    db::{Application, ApplicationDetail, ApplicationSummary, Database, NewApplication, Stage},
    error::AppError,
    services::roles::find_role,
    storage::{application_file_key, ObjectStorage},
};

/// A file part received with a submission
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

fn application_not_found() -> AppError {
    AppError::NotFound("Application not found".to_string())
}

async fn find_application(db: &Database, application_id: i64, company_id: i64) -> Result<Application, AppError> {
    db.get_application(application_id, company_id)
        .await?
        .ok_or_else(application_not_found)
}

/// The stage, provided it belongs to the application's role
async fn stage_of_application_role(
    db: &Database,
    application: &Application,
    stage_id: i64,
) -> Result<Stage, AppError> {
    db.get_stage_for_role(stage_id, application.role_id)
        .await?
        .ok_or_else(|| AppError::Conflict("Stage does not belong to this application's role".to_string()))
}

/// Store a candidate's submission. The application row is written first so
/// the file can be keyed by its id; a failed upload, or a failure to record
/// its key, leaves the application in place without a resume.
pub async fn submit(
    db: &Database,
    storage: &dyn ObjectStorage,
    role_id: i64,
    company_id: i64,
    form_data: FormData,
    resume: Option<UploadedFile>,
) -> Result<Application, AppError> {
    let role = find_role(db, role_id, company_id).await?;
    validate_form_data(&role.custom_fields.0, &form_data)?;

    let mut application = db
        .insert_application(&NewApplication {
            role_id,
            company_id,
            form_data,
        })
        .await?;
    tracing::info!("Application {} submitted for role {}", application.id, role_id);

    if let Some(file) = resume {
        let key = application_file_key(company_id, application.id, RESUME_FIELD, &file.filename);
        match storage.upload(&key, file.bytes, &file.content_type).await {
            Ok(()) => match db.set_resume_key(application.id, company_id, &key).await {
                Ok(()) => application.resume_key = Some(key),
                Err(e) => {
                    tracing::error!("Recording resume for application {} failed: {}", application.id, e);
                    if let Err(e) = storage.delete(&key).await {
                        tracing::warn!("Orphaned resume {} left in storage: {}", key, e);
                    }
                }
            },
            Err(e) => {
                tracing::error!("Resume upload for application {} failed: {}", application.id, e);
            }
        }
    }

    Ok(application)
}

pub async fn list(
    db: &Database,
    company_id: i64,
    filter: &ApplicationFilter,
) -> Result<Vec<ApplicationSummary>, AppError> {
    let rows = db.list_applications(company_id, filter).await?;
    Ok(rows.into_iter().map(ApplicationSummary::from).collect())
}

pub async fn get(db: &Database, application_id: i64, company_id: i64) -> Result<ApplicationDetail, AppError> {
    let row = db
        .get_application_row(application_id, company_id)
        .await?
        .ok_or_else(application_not_found)?;
    let timeline = db.list_timeline(application_id, company_id).await?;

    Ok(ApplicationDetail {
        summary: row.into(),
        timeline,
    })
}

/// Drag-and-drop move. No timeline entry is written.
pub async fn move_stage(
    db: &Database,
    application_id: i64,
    company_id: i64,
    stage_id: Option<i64>,
) -> Result<ApplicationSummary, AppError> {
    let application = find_application(db, application_id, company_id).await?;
    if let Some(stage_id) = stage_id {
        stage_of_application_role(db, &application, stage_id).await?;
    }

    if !db.set_current_stage(application_id, company_id, stage_id).await? {
        return Err(application_not_found());
    }
    tracing::info!("Application {} moved to stage {:?}", application_id, stage_id);

    db.get_application_row(application_id, company_id)
        .await?
        .map(ApplicationSummary::from)
        .ok_or_else(application_not_found)
}

/// Audited stage transition. The stage name is copied into the entry so later
/// renames leave history untouched.
pub async fn add_timeline_entry(
    db: &Database,
    application_id: i64,
    company_id: i64,
    stage_id: i64,
    description: Option<&str>,
) -> Result<ApplicationDetail, AppError> {
    let application = find_application(db, application_id, company_id).await?;
    let stage = stage_of_application_role(db, &application, stage_id).await?;

    let description = description.map(str::trim).filter(|d| !d.is_empty());
    let entry = db
        .record_stage_transition(application_id, company_id, &stage, description)
        .await?;
    tracing::info!(
        "Timeline entry {} added to application {} ({})",
        entry.id,
        application_id,
        stage.name
    );

    get(db, application_id, company_id).await
}

/// Removes the row, its timeline and its email history. Stored files are
/// cleaned up best effort.
pub async fn delete(
    db: &Database,
    storage: &dyn ObjectStorage,
    application_id: i64,
    company_id: i64,
) -> Result<(), AppError> {
    let application = find_application(db, application_id, company_id).await?;

    if let Some(key) = &application.resume_key {
        if let Err(e) = storage.delete(key).await {
            tracing::warn!("Failed to delete {} for application {}: {}", key, application_id, e);
        }
    }

    if !db.delete_application(application_id, company_id).await? {
        return Err(application_not_found());
    }
    tracing::info!("Application {} deleted", application_id);
    Ok(())
}

/// `id,role,full_name,email,applied_at`, newest first
pub async fn export_csv(db: &Database, company_id: i64) -> Result<String, AppError> {
    let applications = list(db, company_id, &ApplicationFilter::default()).await?;

    let mut writer = csv::Writer::from_writer(vec![]);
    writer
        .write_record(["id", "role", "full_name", "email", "applied_at"])
        .map_err(|e| AppError::Internal(e.to_string()))?;

    for app in &applications {
        let form = &app.application.form_data.0;
        writer
            .write_record([
                app.application.id.to_string().as_str(),
                app.role.name.as_str(),
                text_value(form, FULL_NAME_FIELD).unwrap_or(""),
                text_value(form, EMAIL_FIELD).unwrap_or(""),
                app.application.created_at.to_rfc3339().as_str(),
            ])
            .map_err(|e| AppError::Internal(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(e.to_string()))
}

/// Short-lived download URL for an uploaded file. Only the resume is stored today.
pub async fn file_url(
    db: &Database,
    storage: &dyn ObjectStorage,
    application_id: i64,
    company_id: i64,
    field_id: &str,
) -> Result<String, AppError> {
    let application = find_application(db, application_id, company_id).await?;

    let key = match field_id {
        RESUME_FIELD => application.resume_key,
        _ => None,
    }
    .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    Ok(storage.presigned_get_url(&key).await?)
}
