//! Non-posting lifecycle transitions
//!
//! Send, reject, and cancel never touch the ledger, but they still run
//! under the document row lock so they cannot interleave with a concurrent
//! approval or payment. Each returns the mutated document plus an outcome
//! with zero ledger entries, matching the shape of the posting operations.

use std::sync::Arc;

use tracing::instrument;

use core_kernel::{Actor, DocumentId, TenantContext};
use domain_documents::Document;

use crate::error::PostingError;
use crate::outcome::PostingOutcome;
use crate::ports::{PostingStore, PostingTx};

/// Applies send/reject/cancel transitions in their own units of work
pub struct DocumentTransitions {
    store: Arc<dyn PostingStore>,
}

impl DocumentTransitions {
    pub fn new(store: Arc<dyn PostingStore>) -> Self {
        Self { store }
    }

    /// draft -> sent
    #[instrument(skip_all, fields(tenant = %ctx.tenant_id, document = %document_id))]
    pub async fn send(
        &self,
        ctx: TenantContext,
        actor: &Actor,
        document_id: DocumentId,
    ) -> Result<(Document, PostingOutcome), PostingError> {
        self.apply(ctx, document_id, |document| document.send(actor))
            .await
    }

    /// draft/sent -> rejected, with a mandatory reason
    #[instrument(skip_all, fields(tenant = %ctx.tenant_id, document = %document_id))]
    pub async fn reject(
        &self,
        ctx: TenantContext,
        actor: &Actor,
        document_id: DocumentId,
        reason: &str,
    ) -> Result<(Document, PostingOutcome), PostingError> {
        self.apply(ctx, document_id, |document| document.reject(actor, reason))
            .await
    }

    /// Any cancellable status -> cancelled, with a mandatory reason.
    /// Rejected for paid documents whatever the reason says.
    #[instrument(skip_all, fields(tenant = %ctx.tenant_id, document = %document_id))]
    pub async fn cancel(
        &self,
        ctx: TenantContext,
        actor: &Actor,
        document_id: DocumentId,
        reason: &str,
    ) -> Result<(Document, PostingOutcome), PostingError> {
        self.apply(ctx, document_id, |document| document.cancel(actor, reason))
            .await
    }

    async fn apply<F>(
        &self,
        ctx: TenantContext,
        document_id: DocumentId,
        transition: F,
    ) -> Result<(Document, PostingOutcome), PostingError>
    where
        F: FnOnce(&mut Document) -> Result<(), domain_documents::DocumentError>,
    {
        let mut tx = self.store.begin().await?;
        match Self::apply_in_tx(tx.as_mut(), ctx, document_id, transition).await {
            Ok(document) => {
                tx.commit().await?;
                Ok((document, PostingOutcome::default()))
            }
            Err(err) => {
                if let Err(rb) = tx.rollback().await {
                    tracing::error!(error = %rb, "rollback failed");
                }
                Err(err)
            }
        }
    }

    async fn apply_in_tx<F>(
        tx: &mut dyn PostingTx,
        ctx: TenantContext,
        document_id: DocumentId,
        transition: F,
    ) -> Result<Document, PostingError>
    where
        F: FnOnce(&mut Document) -> Result<(), domain_documents::DocumentError>,
    {
        let mut document = tx
            .find_document_for_update(ctx.tenant_id, document_id)
            .await?
            .ok_or_else(|| PostingError::validation("document not found"))?;
        transition(&mut document)?;
        tx.update_document(&document).await?;
        Ok(document)
    }
}
