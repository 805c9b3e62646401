//! Payment recording handler

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use core_kernel::{DocumentId, PaymentTypeId};

use crate::dto::payments::{PaymentResponse, RecordPaymentRequest};
use crate::error::ApiError;
use crate::middleware::RequestContext;
use crate::AppState;

/// Records a payment against an approved document
pub async fn record_payment(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Path(id): Path<Uuid>,
    Json(request): Json<RecordPaymentRequest>,
) -> Result<(StatusCode, Json<PaymentResponse>), ApiError> {
    let payment_type = request
        .payment_type_id
        .and_then(|id| state.master.payment_types.get(&PaymentTypeId::from_uuid(id)))
        .cloned();

    let engine_request =
        request.into_engine_request(DocumentId::from_uuid(id), payment_type)?;

    let recorded = state
        .payments
        .record(
            context.ctx,
            &context.actor,
            &state.master.accounts,
            &state.master.tax_codes,
            &state.master.period,
            engine_request,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(PaymentResponse::from(recorded))))
}
