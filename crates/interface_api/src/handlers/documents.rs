//! Document lifecycle handlers
//!
//! Each state transition has its own endpoint; there is no generic "patch
//! the status" route. The engine owns every guard, so the handlers only
//! translate payloads and map errors onto status codes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use core_kernel::DocumentId;
use domain_documents::Document;

use crate::dto::documents::{
    CreateDocumentRequest, DocumentResponse, TransitionReason, TransitionResponse,
};
use crate::error::ApiError;
use crate::middleware::RequestContext;
use crate::AppState;

/// Creates a draft document with a freshly issued reference
pub async fn create_document(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Json(request): Json<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<DocumentResponse>), ApiError> {
    let engine_request = request.into_engine_request()?;
    let document = state
        .issuer
        .create(
            context.ctx,
            &context.actor,
            &state.master.period,
            engine_request,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(DocumentResponse::from_document(&document)),
    ))
}

/// Gets a document by id
pub async fn get_document(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentResponse>, ApiError> {
    let document = load_document(&state, &context, id).await?;
    Ok(Json(DocumentResponse::from_document(&document)))
}

/// draft -> sent
pub async fn send_document(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransitionResponse>, ApiError> {
    let (document, outcome) = state
        .transitions
        .send(context.ctx, &context.actor, DocumentId::from_uuid(id))
        .await?;
    Ok(Json(TransitionResponse::new(&document, outcome)))
}

/// draft/sent -> approved, posting the revenue group
pub async fn approve_document(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransitionResponse>, ApiError> {
    let (document, outcome) = state
        .approvals
        .approve(
            context.ctx,
            &context.actor,
            DocumentId::from_uuid(id),
            &state.master.accounts,
            &state.master.tax_codes,
            &state.master.period,
            state.master.loyalty,
        )
        .await?;
    Ok(Json(TransitionResponse::new(&document, outcome)))
}

/// draft/sent -> rejected, with a mandatory reason
pub async fn reject_document(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Path(id): Path<Uuid>,
    Json(request): Json<TransitionReason>,
) -> Result<Json<TransitionResponse>, ApiError> {
    let (document, outcome) = state
        .transitions
        .reject(
            context.ctx,
            &context.actor,
            DocumentId::from_uuid(id),
            &request.reason,
        )
        .await?;
    Ok(Json(TransitionResponse::new(&document, outcome)))
}

/// Any non-terminal, non-paid state -> cancelled, with a mandatory reason
pub async fn cancel_document(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Path(id): Path<Uuid>,
    Json(request): Json<TransitionReason>,
) -> Result<Json<TransitionResponse>, ApiError> {
    let (document, outcome) = state
        .transitions
        .cancel(
            context.ctx,
            &context.actor,
            DocumentId::from_uuid(id),
            &request.reason,
        )
        .await?;
    Ok(Json(TransitionResponse::new(&document, outcome)))
}

/// Loads a document through a short-lived read transaction
pub(crate) async fn load_document(
    state: &AppState,
    context: &RequestContext,
    id: Uuid,
) -> Result<Document, ApiError> {
    let mut tx = state.store.begin().await?;
    let found = tx
        .find_document_for_update(context.ctx.tenant_id, DocumentId::from_uuid(id))
        .await;
    // release the row lock before mapping the result
    tx.rollback().await?;

    found?.ok_or_else(|| ApiError::NotFound(format!("document {id} not found")))
}
