//! Store abstraction for the posting services
//!
//! Every externally-triggered operation runs inside one [`PostingTx`]:
//! either `commit` persists all of its effects or `rollback` discards them.
//! `find_document_for_update` acquires the document row lock, serializing
//! concurrent approval/payment/cancel attempts against the same document;
//! the second writer blocks until the first commits and then re-validates
//! against fresh state.

use async_trait::async_trait;
use rust_decimal::Decimal;

use core_kernel::{CustomerId, DocumentId, DocumentLineId, ProductId, StoreId, TenantId};
use domain_documents::Document;
use domain_ledger::LedgerEntry;

use crate::error::PostingError;
use crate::receipt::Receipt;
use crate::sequence::SequenceKind;
use crate::stock::StockMovement;

/// Entry point: opens units of work
#[async_trait]
pub trait PostingStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn PostingTx>, PostingError>;
}

/// One atomic unit of work
///
/// Implementations map their uniqueness violations on
/// `(reference, tenant_id)` to [`PostingError::Conflict`]; everything else
/// unexpected becomes [`PostingError::Internal`].
#[async_trait]
pub trait PostingTx: Send {
    /// Loads a document and locks its row for the rest of this transaction
    async fn find_document_for_update(
        &mut self,
        tenant_id: TenantId,
        document_id: DocumentId,
    ) -> Result<Option<Document>, PostingError>;

    /// Inserts a new document; a duplicate reference is a conflict
    async fn insert_document(&mut self, document: &Document) -> Result<(), PostingError>;

    async fn update_document(&mut self, document: &Document) -> Result<(), PostingError>;

    /// Highest numeric reference suffix issued for this tenant and kind
    async fn max_reference_suffix(
        &mut self,
        tenant_id: TenantId,
        kind: SequenceKind,
    ) -> Result<Option<u64>, PostingError>;

    async fn stock_on_hand(
        &mut self,
        tenant_id: TenantId,
        store_id: StoreId,
        product_id: ProductId,
    ) -> Result<Decimal, PostingError>;

    async fn adjust_stock(
        &mut self,
        tenant_id: TenantId,
        store_id: StoreId,
        product_id: ProductId,
        delta: Decimal,
    ) -> Result<(), PostingError>;

    async fn record_stock_movement(
        &mut self,
        movement: &StockMovement,
    ) -> Result<(), PostingError>;

    /// Appends one balanced posting group. Entries are immutable once written.
    async fn append_posting_group(
        &mut self,
        entries: &[LedgerEntry],
    ) -> Result<(), PostingError>;

    /// Adjusts the customer's denormalized outstanding debt. The delta is a
    /// raw amount in system currency.
    async fn adjust_customer_debt(
        &mut self,
        tenant_id: TenantId,
        customer_id: CustomerId,
        delta: Decimal,
    ) -> Result<(), PostingError>;

    /// Customer deposit balance, a raw amount in system currency
    async fn deposit_balance(
        &mut self,
        tenant_id: TenantId,
        customer_id: CustomerId,
    ) -> Result<Decimal, PostingError>;

    async fn adjust_deposit(
        &mut self,
        tenant_id: TenantId,
        customer_id: CustomerId,
        delta: Decimal,
    ) -> Result<(), PostingError>;

    /// Customer loyalty balance expressed as a system-currency amount
    async fn loyalty_balance(
        &mut self,
        tenant_id: TenantId,
        customer_id: CustomerId,
    ) -> Result<Decimal, PostingError>;

    async fn adjust_loyalty(
        &mut self,
        tenant_id: TenantId,
        customer_id: CustomerId,
        delta: Decimal,
    ) -> Result<(), PostingError>;

    /// Records a loyalty accrual. Non-critical: callers turn failures into
    /// warnings instead of aborting.
    async fn accrue_loyalty(
        &mut self,
        tenant_id: TenantId,
        customer_id: CustomerId,
        points: Decimal,
    ) -> Result<(), PostingError>;

    /// Sum of all prior receipt allocations against one document line, in
    /// document currency. Re-derived from history rather than cached.
    async fn paid_against_line(
        &mut self,
        tenant_id: TenantId,
        line_id: DocumentLineId,
    ) -> Result<Decimal, PostingError>;

    /// Inserts a receipt with its lines; a duplicate reference is a conflict
    async fn insert_receipt(&mut self, receipt: &Receipt) -> Result<(), PostingError>;

    async fn commit(self: Box<Self>) -> Result<(), PostingError>;

    async fn rollback(self: Box<Self>) -> Result<(), PostingError>;
}
