//! Inventory movement records written at approval

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{DocumentId, ProductId, StockMovementId, StoreId, TenantId};

/// One change to on-hand quantity at a store
///
/// Quantity is signed: approval writes negative (outbound) movements.
/// Movements are append-only; corrections are new movements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: StockMovementId,
    pub tenant_id: TenantId,
    pub store_id: StoreId,
    pub product_id: ProductId,
    /// The document whose approval produced this movement
    pub document_id: DocumentId,
    pub quantity: Decimal,
    pub movement_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl StockMovement {
    /// An outbound movement for a document line being fulfilled
    pub fn outbound(
        tenant_id: TenantId,
        store_id: StoreId,
        product_id: ProductId,
        document_id: DocumentId,
        quantity: Decimal,
        movement_date: NaiveDate,
    ) -> Self {
        Self {
            id: StockMovementId::new_v7(),
            tenant_id,
            store_id,
            product_id,
            document_id,
            quantity: -quantity,
            movement_date,
            created_at: Utc::now(),
        }
    }
}
