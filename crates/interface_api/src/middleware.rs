//! API middleware
//!
//! Tenant and actor identification arrives in headers set by the gateway
//! that terminates authentication upstream. The engine itself never reads
//! ambient identity: the middleware materializes a [`RequestContext`] and
//! every handler passes it down explicitly.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use core_kernel::{Actor, TenantContext, TenantId, UserId};

use crate::error::ApiError;
use crate::AppState;

/// Tenant and actor for one request
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub ctx: TenantContext,
    pub actor: Actor,
}

/// Extracts the tenant and actor headers into a [`RequestContext`]
pub async fn context_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let headers = request.headers();
    let tenant_id = required_uuid(headers, "x-tenant-id")?;
    let user_id = required_uuid(headers, "x-user-id")?;
    let user_name = headers
        .get("x-user-name")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("api")
        .to_string();

    let context = RequestContext {
        ctx: TenantContext::new(
            TenantId::from_uuid(tenant_id),
            state.master.system_currency,
        ),
        actor: Actor::new(UserId::from_uuid(user_id), user_name),
    };

    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

fn required_uuid(headers: &HeaderMap, name: &str) -> Result<Uuid, ApiError> {
    let value = headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            warn!(header = name, "missing identity header");
            ApiError::Unauthorized
        })?;
    value.parse().map_err(|_| {
        warn!(header = name, "malformed identity header");
        ApiError::Unauthorized
    })
}

/// Request logging middleware
pub async fn request_log_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let tenant = request
        .extensions()
        .get::<RequestContext>()
        .map(|c| c.ctx.tenant_id.to_string())
        .unwrap_or_else(|| "anonymous".to_string());

    let start = Utc::now();
    let response = next.run(request).await;
    let duration = Utc::now() - start;

    info!(
        method = %method,
        uri = %uri,
        tenant = %tenant,
        status = %response.status().as_u16(),
        duration_ms = duration.num_milliseconds(),
        "API request"
    );

    response
}
