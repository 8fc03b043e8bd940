//! Admin API: audit log review and account moderation.
//!
//! All routes sit under `/admin` and go through
//! [`require_admin_token`](crate::middleware::require_admin_token).

pub mod logs;
pub mod moderation;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::middleware::require_admin_token;
use crate::server::AppState;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/logs", get(logs::recent_logs))
        .route("/users", get(moderation::list_users))
        .route("/pending-approvals", get(moderation::pending_approvals))
        .route("/manage-verification", post(moderation::manage_verification))
        .route("/approve-owner", post(moderation::approve_owner))
        .route_layer(middleware::from_fn_with_state(state, require_admin_token))
}
