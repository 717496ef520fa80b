use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use shared::{ApiResponse, CompanyUsage, CreateEmailTemplateRequest, UpdateEmailTemplateRequest};

use crate::{
    db::EmailTemplate,
    error::AppError,
    services::{quota, templates},
    state::AppState,
    tenant::TenantContext,
};

/// Plan, limits and current consumption
/// GET /company/usage
pub async fn get_usage(
    State(state): State<AppState>,
    ctx: TenantContext,
) -> Result<Json<ApiResponse<CompanyUsage>>, AppError> {
    let usage = quota::get_usage(&state.db, ctx.company_id).await?;
    Ok(Json(ApiResponse::ok(usage)))
}

/// GET /email-templates
pub async fn list_templates(
    State(state): State<AppState>,
    ctx: TenantContext,
) -> Result<Json<ApiResponse<Vec<EmailTemplate>>>, AppError> {
    let list = templates::list(&state.db, ctx.company_id).await?;
    Ok(Json(ApiResponse::ok(list)))
}

/// POST /email-templates
pub async fn create_template(
    State(state): State<AppState>,
    ctx: TenantContext,
    Json(req): Json<CreateEmailTemplateRequest>,
) -> Result<(StatusCode, Json<ApiResponse<EmailTemplate>>), AppError> {
    let template = templates::create(&state.db, ctx.company_id, req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(template))))
}

/// GET /email-templates/:id
pub async fn get_template(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<EmailTemplate>>, AppError> {
    let template = templates::get(&state.db, id, ctx.company_id).await?;
    Ok(Json(ApiResponse::ok(template)))
}

/// PATCH /email-templates/:id
pub async fn update_template(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
    Json(req): Json<UpdateEmailTemplateRequest>,
) -> Result<Json<ApiResponse<EmailTemplate>>, AppError> {
    let template = templates::update(&state.db, id, ctx.company_id, req).await?;
    Ok(Json(ApiResponse::ok(template)))
}

/// DELETE /email-templates/:id
pub async fn delete_template(
    State(state): State<AppState>,
    ctx: TenantContext,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    templates::delete(&state.db, id, ctx.company_id).await?;
    Ok(Json(ApiResponse::ok(())))
}
