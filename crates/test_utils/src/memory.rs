//! In-memory posting store
//!
//! Implements [`PostingStore`] over a single mutex-guarded state snapshot.
//! A transaction clones the state on `begin`, mutates the clone, and writes
//! it back on `commit`; `rollback` just drops the clone. Holding the mutex
//! for the lifetime of the transaction plays the role of the document row
//! lock: concurrent units of work serialize exactly as they would against
//! the real store.
//!
//! Because the global lock means real reference collisions can never occur
//! here, the store exposes [`MemoryPostingStore::fail_next_inserts`] to
//! inject conflicts and exercise the retry path deterministically.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use core_kernel::{CustomerId, DocumentId, DocumentLineId, ProductId, StoreId, TenantId};
use domain_documents::Document;
use domain_ledger::LedgerEntry;
use domain_posting::{
    parse_suffix, PostingError, PostingStore, PostingTx, Receipt, SequenceKind, StockMovement,
};

type StockKey = (TenantId, StoreId, ProductId);
type CustomerKey = (TenantId, CustomerId);

#[derive(Debug, Default, Clone)]
struct MemoryState {
    documents: HashMap<DocumentId, Document>,
    receipts: HashMap<core_kernel::ReceiptId, Receipt>,
    entries: Vec<LedgerEntry>,
    movements: Vec<StockMovement>,
    stock: HashMap<StockKey, Decimal>,
    debt: HashMap<CustomerKey, Decimal>,
    deposits: HashMap<CustomerKey, Decimal>,
    loyalty: HashMap<CustomerKey, Decimal>,
    accruals: Vec<(CustomerKey, Decimal)>,
}

/// Shared in-memory store for service-level tests
#[derive(Default)]
pub struct MemoryPostingStore {
    state: Arc<Mutex<MemoryState>>,
    fail_inserts: Arc<AtomicU32>,
    fail_loyalty: Arc<AtomicBool>,
}

impl MemoryPostingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `count` document/receipt inserts report a reference
    /// conflict instead of succeeding
    pub fn fail_next_inserts(&self, count: u32) {
        self.fail_inserts.store(count, Ordering::SeqCst);
    }

    /// Makes loyalty accrual fail, for exercising the warning path
    pub fn fail_loyalty_accrual(&self, fail: bool) {
        self.fail_loyalty.store(fail, Ordering::SeqCst);
    }

    pub async fn seed_stock(
        &self,
        tenant_id: TenantId,
        store_id: StoreId,
        product_id: ProductId,
        quantity: Decimal,
    ) {
        let mut state = self.state.lock().await;
        state.stock.insert((tenant_id, store_id, product_id), quantity);
    }

    pub async fn seed_deposit(&self, tenant_id: TenantId, customer_id: CustomerId, amount: Decimal) {
        let mut state = self.state.lock().await;
        state.deposits.insert((tenant_id, customer_id), amount);
    }

    pub async fn seed_loyalty(&self, tenant_id: TenantId, customer_id: CustomerId, amount: Decimal) {
        let mut state = self.state.lock().await;
        state.loyalty.insert((tenant_id, customer_id), amount);
    }

    pub async fn document(&self, document_id: DocumentId) -> Option<Document> {
        self.state.lock().await.documents.get(&document_id).cloned()
    }

    pub async fn documents_for(&self, tenant_id: TenantId) -> Vec<Document> {
        self.state
            .lock()
            .await
            .documents
            .values()
            .filter(|d| d.tenant_id == tenant_id)
            .cloned()
            .collect()
    }

    pub async fn ledger_entries(&self) -> Vec<LedgerEntry> {
        self.state.lock().await.entries.clone()
    }

    pub async fn movements(&self) -> Vec<StockMovement> {
        self.state.lock().await.movements.clone()
    }

    pub async fn receipts(&self) -> Vec<Receipt> {
        self.state.lock().await.receipts.values().cloned().collect()
    }

    pub async fn stock_level(
        &self,
        tenant_id: TenantId,
        store_id: StoreId,
        product_id: ProductId,
    ) -> Decimal {
        self.state
            .lock()
            .await
            .stock
            .get(&(tenant_id, store_id, product_id))
            .copied()
            .unwrap_or_default()
    }

    pub async fn customer_debt(&self, tenant_id: TenantId, customer_id: CustomerId) -> Decimal {
        self.state
            .lock()
            .await
            .debt
            .get(&(tenant_id, customer_id))
            .copied()
            .unwrap_or_default()
    }

    pub async fn deposit_of(&self, tenant_id: TenantId, customer_id: CustomerId) -> Decimal {
        self.state
            .lock()
            .await
            .deposits
            .get(&(tenant_id, customer_id))
            .copied()
            .unwrap_or_default()
    }

    pub async fn accrued_loyalty(&self, tenant_id: TenantId, customer_id: CustomerId) -> Decimal {
        self.state
            .lock()
            .await
            .accruals
            .iter()
            .filter(|(key, _)| *key == (tenant_id, customer_id))
            .map(|(_, points)| *points)
            .sum()
    }
}

#[async_trait]
impl PostingStore for MemoryPostingStore {
    async fn begin(&self) -> Result<Box<dyn PostingTx>, PostingError> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx {
            guard,
            working,
            fail_inserts: self.fail_inserts.clone(),
            fail_loyalty: self.fail_loyalty.clone(),
        }))
    }
}

struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    fail_inserts: Arc<AtomicU32>,
    fail_loyalty: Arc<AtomicBool>,
}

impl MemoryTx {
    fn take_injected_conflict(&self) -> bool {
        self.fail_inserts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl PostingTx for MemoryTx {
    async fn find_document_for_update(
        &mut self,
        tenant_id: TenantId,
        document_id: DocumentId,
    ) -> Result<Option<Document>, PostingError> {
        Ok(self
            .working
            .documents
            .get(&document_id)
            .filter(|d| d.tenant_id == tenant_id)
            .cloned())
    }

    async fn insert_document(&mut self, document: &Document) -> Result<(), PostingError> {
        if self.take_injected_conflict() {
            return Err(PostingError::conflict("injected reference conflict"));
        }
        let duplicate = self.working.documents.values().any(|d| {
            d.tenant_id == document.tenant_id && d.reference == document.reference
        });
        if duplicate {
            return Err(PostingError::conflict(format!(
                "duplicate reference {}",
                document.reference
            )));
        }
        self.working.documents.insert(document.id, document.clone());
        Ok(())
    }

    async fn update_document(&mut self, document: &Document) -> Result<(), PostingError> {
        if !self.working.documents.contains_key(&document.id) {
            return Err(PostingError::internal("document vanished mid-transaction"));
        }
        self.working.documents.insert(document.id, document.clone());
        Ok(())
    }

    async fn max_reference_suffix(
        &mut self,
        tenant_id: TenantId,
        kind: SequenceKind,
    ) -> Result<Option<u64>, PostingError> {
        let references: Vec<&str> = match kind {
            SequenceKind::Invoice => self
                .working
                .documents
                .values()
                .filter(|d| d.tenant_id == tenant_id)
                .map(|d| d.reference.as_str())
                .collect(),
            SequenceKind::Receipt => self
                .working
                .receipts
                .values()
                .filter(|r| r.tenant_id == tenant_id)
                .map(|r| r.reference.as_str())
                .collect(),
        };
        Ok(references.into_iter().filter_map(parse_suffix).max())
    }

    async fn stock_on_hand(
        &mut self,
        tenant_id: TenantId,
        store_id: StoreId,
        product_id: ProductId,
    ) -> Result<Decimal, PostingError> {
        Ok(self
            .working
            .stock
            .get(&(tenant_id, store_id, product_id))
            .copied()
            .unwrap_or_default())
    }

    async fn adjust_stock(
        &mut self,
        tenant_id: TenantId,
        store_id: StoreId,
        product_id: ProductId,
        delta: Decimal,
    ) -> Result<(), PostingError> {
        *self
            .working
            .stock
            .entry((tenant_id, store_id, product_id))
            .or_default() += delta;
        Ok(())
    }

    async fn record_stock_movement(
        &mut self,
        movement: &StockMovement,
    ) -> Result<(), PostingError> {
        self.working.movements.push(movement.clone());
        Ok(())
    }

    async fn append_posting_group(
        &mut self,
        entries: &[LedgerEntry],
    ) -> Result<(), PostingError> {
        self.working.entries.extend_from_slice(entries);
        Ok(())
    }

    async fn adjust_customer_debt(
        &mut self,
        tenant_id: TenantId,
        customer_id: CustomerId,
        delta: Decimal,
    ) -> Result<(), PostingError> {
        *self.working.debt.entry((tenant_id, customer_id)).or_default() += delta;
        Ok(())
    }

    async fn deposit_balance(
        &mut self,
        tenant_id: TenantId,
        customer_id: CustomerId,
    ) -> Result<Decimal, PostingError> {
        Ok(self
            .working
            .deposits
            .get(&(tenant_id, customer_id))
            .copied()
            .unwrap_or_default())
    }

    async fn adjust_deposit(
        &mut self,
        tenant_id: TenantId,
        customer_id: CustomerId,
        delta: Decimal,
    ) -> Result<(), PostingError> {
        *self
            .working
            .deposits
            .entry((tenant_id, customer_id))
            .or_default() += delta;
        Ok(())
    }

    async fn loyalty_balance(
        &mut self,
        tenant_id: TenantId,
        customer_id: CustomerId,
    ) -> Result<Decimal, PostingError> {
        Ok(self
            .working
            .loyalty
            .get(&(tenant_id, customer_id))
            .copied()
            .unwrap_or_default())
    }

    async fn adjust_loyalty(
        &mut self,
        tenant_id: TenantId,
        customer_id: CustomerId,
        delta: Decimal,
    ) -> Result<(), PostingError> {
        *self
            .working
            .loyalty
            .entry((tenant_id, customer_id))
            .or_default() += delta;
        Ok(())
    }

    async fn accrue_loyalty(
        &mut self,
        tenant_id: TenantId,
        customer_id: CustomerId,
        points: Decimal,
    ) -> Result<(), PostingError> {
        if self.fail_loyalty.load(Ordering::SeqCst) {
            return Err(PostingError::internal("loyalty ledger unavailable"));
        }
        self.working.accruals.push(((tenant_id, customer_id), points));
        Ok(())
    }

    async fn paid_against_line(
        &mut self,
        tenant_id: TenantId,
        line_id: DocumentLineId,
    ) -> Result<Decimal, PostingError> {
        Ok(self
            .working
            .receipts
            .values()
            .filter(|r| r.tenant_id == tenant_id)
            .flat_map(|r| &r.lines)
            .filter(|l| l.document_line_id == line_id)
            .map(|l| l.amount.amount())
            .sum())
    }

    async fn insert_receipt(&mut self, receipt: &Receipt) -> Result<(), PostingError> {
        if self.take_injected_conflict() {
            return Err(PostingError::conflict("injected reference conflict"));
        }
        let duplicate = self.working.receipts.values().any(|r| {
            r.tenant_id == receipt.tenant_id && r.reference == receipt.reference
        });
        if duplicate {
            return Err(PostingError::conflict(format!(
                "duplicate reference {}",
                receipt.reference
            )));
        }
        self.working.receipts.insert(receipt.id, receipt.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), PostingError> {
        let MemoryTx { mut guard, working, .. } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), PostingError> {
        Ok(())
    }
}
