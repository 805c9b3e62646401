//! Document creation under the sequence retry discipline

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use core_kernel::{
    Actor, Currency, CustomerId, ExchangeRate, FinancialPeriod, PeriodId, StoreId, TenantContext,
};
use domain_documents::{Document, NewLine};

use crate::error::PostingError;
use crate::ports::{PostingStore, PostingTx};
use crate::retry::{with_conflict_retry, RetryPolicy};
use crate::sequence::{next_reference, SequenceKind};

/// Canonical input for creating a document
///
/// Field-name aliasing for external payloads happens at the boundary; by
/// the time a request reaches the issuer it has exactly this shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDocumentRequest {
    pub customer_id: CustomerId,
    pub store_id: StoreId,
    pub currency: Currency,
    pub exchange_rate: ExchangeRate,
    pub document_date: NaiveDate,
    pub due_date: NaiveDate,
    pub lines: Vec<NewLine>,
}

/// Creates draft documents with freshly issued references
///
/// Each attempt is a full unit of work: read the tenant's maximum suffix,
/// render the candidate reference, insert. A uniqueness violation rolls the
/// attempt back and the retry combinator runs a fresh one, so a colliding
/// writer re-reads the suffix its rival just committed.
pub struct DocumentIssuer {
    store: Arc<dyn PostingStore>,
    retry: RetryPolicy,
}

impl DocumentIssuer {
    pub fn new(store: Arc<dyn PostingStore>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Creates a draft document for the tenant
    ///
    /// # Errors
    ///
    /// - [`PostingError::Validation`] when the document date falls outside
    ///   the open period or the lines are invalid
    /// - [`PostingError::Conflict`] when reference generation still
    ///   collides after the retry bound
    #[instrument(skip_all, fields(tenant = %ctx.tenant_id))]
    pub async fn create(
        &self,
        ctx: TenantContext,
        actor: &Actor,
        period: &FinancialPeriod,
        request: NewDocumentRequest,
    ) -> Result<Document, PostingError> {
        if !period.accepts(request.document_date) {
            return Err(PostingError::validation(format!(
                "document date {} is outside the open financial period",
                request.document_date
            )));
        }

        let period_id = period.id;
        with_conflict_retry(self.retry, |attempt| {
            let request = request.clone();
            async move { self.try_create(ctx, actor, period_id, request, attempt).await }
        })
        .await
    }

    async fn try_create(
        &self,
        ctx: TenantContext,
        actor: &Actor,
        period_id: PeriodId,
        request: NewDocumentRequest,
        attempt: u32,
    ) -> Result<Document, PostingError> {
        let mut tx = self.store.begin().await?;
        match Self::issue_in_tx(tx.as_mut(), ctx, actor, period_id, request).await {
            Ok(document) => {
                tx.commit().await?;
                debug!(
                    reference = %document.reference,
                    attempt,
                    "document created"
                );
                Ok(document)
            }
            Err(err) => {
                if let Err(rb) = tx.rollback().await {
                    tracing::error!(error = %rb, "rollback failed");
                }
                Err(err)
            }
        }
    }

    async fn issue_in_tx(
        tx: &mut dyn PostingTx,
        ctx: TenantContext,
        actor: &Actor,
        period_id: PeriodId,
        request: NewDocumentRequest,
    ) -> Result<Document, PostingError> {
        let max = tx
            .max_reference_suffix(ctx.tenant_id, SequenceKind::Invoice)
            .await?;
        let reference = next_reference(SequenceKind::Invoice, request.document_date, max);

        let document = Document::draft(
            ctx,
            reference,
            request.customer_id,
            request.store_id,
            request.currency,
            request.exchange_rate,
            period_id,
            request.document_date,
            request.due_date,
            request.lines,
            actor.clone(),
        )?;

        tx.insert_document(&document).await?;
        Ok(document)
    }
}
