//! Candidate-facing job board. No authentication.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use shared::{ApiResponse, FormData, FormValue, SubmittedApplication, RESUME_FIELD};

use crate::{
    db::RoleWithStages,
    error::AppError,
    services::{
        applications::UploadedFile,
        board::{self, PublicBoard},
    },
    state::AppState,
};

/// Multipart part carrying the whole form as one JSON object
const FORM_DATA_PART: &str = "formData";

/// GET /public/:slug
pub async fn get_board(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<PublicBoard>>, AppError> {
    let board = board::board(&state.db, &slug).await?;
    Ok(Json(ApiResponse::ok(board)))
}

/// GET /public/:slug/roles/:role_id
pub async fn get_role(
    State(state): State<AppState>,
    Path((slug, role_id)): Path<(String, i64)>,
) -> Result<Json<ApiResponse<RoleWithStages>>, AppError> {
    let role = board::role(&state.db, &slug, role_id).await?;
    Ok(Json(ApiResponse::ok(role)))
}

fn bad_multipart(e: impl std::fmt::Display) -> AppError {
    AppError::Validation(format!("Invalid form submission: {}", e))
}

/// Submit an application.
///
/// Text parts become form values keyed by part name; a `formData` part may
/// carry them all as JSON instead. The `resume` part is the uploaded file.
/// POST /public/:slug/roles/:role_id/apply
pub async fn apply(
    State(state): State<AppState>,
    Path((slug, role_id)): Path<(String, i64)>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<SubmittedApplication>>), AppError> {
    let mut form_data = FormData::new();
    let mut resume = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or_default().to_string();

        if name == RESUME_FIELD {
            let filename = field.file_name().unwrap_or(RESUME_FIELD).to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field.bytes().await.map_err(bad_multipart)?;
            if !bytes.is_empty() {
                resume = Some(UploadedFile {
                    filename,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
        } else if name == FORM_DATA_PART {
            let text = field.text().await.map_err(bad_multipart)?;
            let parsed: FormData = serde_json::from_str(&text)
                .map_err(|_| AppError::Validation("formData must be a JSON object".to_string()))?;
            form_data.extend(parsed);
        } else if !name.is_empty() {
            let text = field.text().await.map_err(bad_multipart)?;
            form_data.insert(name, FormValue::Text(text));
        }
    }

    let id = board::apply(&state.db, state.storage.as_ref(), &slug, role_id, form_data, resume).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(SubmittedApplication { id }))))
}
