use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use shared::{
    AddTimelineRequest, ApiResponse, ApplicationFilter, FileUrlResponse, MoveStageRequest,
    SendEmailRequest, SendEmailResponse,
};

use crate::{
    db::{ApplicationDetail, ApplicationSummary, EmailRecord},
    error::AppError,
    services::{applications, email},
    state::AppState,
    tenant::TenantContext,
};

/// GET /applications?roleId=&search=
pub async fn list_applications(
    State(state): State<AppState>,
    ctx: TenantContext,
    Query(filter): Query<ApplicationFilter>,
) -> Result<Json<ApiResponse<Vec<ApplicationSummary>>>, AppError> {
    let apps = applications::list(&state.db, ctx.company_id, &filter).await?;
    Ok(Json(ApiResponse::ok(apps)))
}

/// GET /applications/export
pub async fn export_applications(
    State(state): State<AppState>,
    ctx: TenantContext,
) -> Result<Response, AppError> {
    let csv = applications::export_csv(&state.db, ctx.company_id).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"applications.csv\""),
        ],
        csv,
    )
        .into_response())
}

/// GET /applications/:id
pub async fn get_application(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ApplicationDetail>>, AppError> {
    let app = applications::get(&state.db, id, ctx.company_id).await?;
    Ok(Json(ApiResponse::ok(app)))
}

/// DELETE /applications/:id
pub async fn delete_application(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    applications::delete(&state.db, state.storage.as_ref(), id, ctx.company_id).await?;
    Ok(Json(ApiResponse::ok(())))
}

/// PATCH /applications/:id/stage
pub async fn move_stage(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
    Json(req): Json<MoveStageRequest>,
) -> Result<Json<ApiResponse<ApplicationSummary>>, AppError> {
    let app = applications::move_stage(&state.db, id, ctx.company_id, req.stage_id).await?;
    Ok(Json(ApiResponse::ok(app)))
}

/// POST /applications/:id/timeline
pub async fn add_timeline_entry(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
    Json(req): Json<AddTimelineRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ApplicationDetail>>), AppError> {
    let app = applications::add_timeline_entry(
        &state.db,
        id,
        ctx.company_id,
        req.stage_id,
        req.description.as_deref(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(app))))
}

/// GET /applications/:id/files/:field_id
pub async fn file_url(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path((id, field_id)): Path<(i64, String)>,
) -> Result<Json<ApiResponse<FileUrlResponse>>, AppError> {
    let url = applications::file_url(&state.db, state.storage.as_ref(), id, ctx.company_id, &field_id).await?;
    Ok(Json(ApiResponse::ok(FileUrlResponse { url })))
}

/// POST /applications/:id/emails
pub async fn send_email(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
    Json(req): Json<SendEmailRequest>,
) -> Result<Json<ApiResponse<SendEmailResponse>>, AppError> {
    let response = email::send_email(&state.db, state.mailer.as_ref(), id, &ctx, req).await?;
    Ok(Json(ApiResponse::ok(response)))
}

/// GET /applications/:id/emails
pub async fn list_emails(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<EmailRecord>>>, AppError> {
    let emails = email::history(&state.db, id, ctx.company_id).await?;
    Ok(Json(ApiResponse::ok(emails)))
}
