use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

mod applications;
mod company;
mod files;
mod health;
mod public;
mod roles;

/// Upper bound for any request body, resume uploads included
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Public job board
        .route("/public/:slug", get(public::get_board))
        .route("/public/:slug/roles/:role_id", get(public::get_role))
        .route("/public/:slug/roles/:role_id/apply", post(public::apply))
        // Roles and their pipelines
        .route("/roles", get(roles::list_roles).post(roles::create_role))
        .route(
            "/roles/:role_id",
            get(roles::get_role)
                .patch(roles::update_role)
                .delete(roles::delete_role),
        )
        .route("/roles/:role_id/active", patch(roles::toggle_active))
        .route(
            "/roles/:role_id/stages",
            get(roles::list_stages).post(roles::create_stage),
        )
        .route("/roles/:role_id/stages/order", put(roles::reorder_stages))
        .route(
            "/roles/:role_id/stages/:stage_id",
            patch(roles::update_stage).delete(roles::delete_stage),
        )
        // Applications
        .route("/applications", get(applications::list_applications))
        .route("/applications/export", get(applications::export_applications))
        .route(
            "/applications/:id",
            get(applications::get_application).delete(applications::delete_application),
        )
        .route("/applications/:id/stage", patch(applications::move_stage))
        .route("/applications/:id/timeline", post(applications::add_timeline_entry))
        .route("/applications/:id/files/:field_id", get(applications::file_url))
        .route(
            "/applications/:id/emails",
            get(applications::list_emails).post(applications::send_email),
        )
        // Company
        .route("/company/usage", get(company::get_usage))
        .route(
            "/email-templates",
            get(company::list_templates).post(company::create_template),
        )
        .route(
            "/email-templates/:id",
            get(company::get_template)
                .patch(company::update_template)
                .delete(company::delete_template),
        )
        // Presigned downloads
        .route("/files/*key", get(files::download))
        // Middleware
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
