use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub token: String,
}

fn content_type_for(key: &str) -> &'static str {
    let ext = key.rsplit('.').next().unwrap_or_default().to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain; charset=utf-8",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// Serve a stored file through a link minted by `presigned_get_url`
/// GET /files/*key?token=
pub async fn download(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, AppError> {
    let key = key.trim_start_matches('/');

    state
        .storage
        .verify_download(key, &query.token)
        .map_err(|_| AppError::AuthError("Invalid or expired download link".to_string()))?;

    let bytes = state.storage.read(key).await.map_err(|e| {
        tracing::warn!("Download of {} failed: {}", key, e);
        AppError::NotFound("File not found".to_string())
    })?;

    Ok(([(header::CONTENT_TYPE, content_type_for(key))], bytes).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("a/b/CV.PDF"), "application/pdf");
        assert_eq!(content_type_for("a/b/cv"), "application/octet-stream");
    }
}
