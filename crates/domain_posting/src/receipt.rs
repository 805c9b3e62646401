//! Receipt records written by the payment distributor
//!
//! Receipts are immutable once committed. They record both the gross amount
//! collected and its decomposition into funding sources, plus optional
//! per-line allocations.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{
    Actor, Currency, CustomerId, DocumentId, DocumentLineId, ExchangeRate, Money, PaymentTypeId,
    ReceiptId, ReceiptLineId, TenantId,
};

/// A committed payment against one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub id: ReceiptId,
    pub tenant_id: TenantId,
    /// Gapless per-tenant reference, e.g. RCT-20260315-0007, issued under
    /// the same retry discipline as document references
    pub reference: String,
    pub document_id: DocumentId,
    pub customer_id: CustomerId,
    pub receipt_date: NaiveDate,
    pub currency: Currency,
    pub exchange_rate: ExchangeRate,
    /// Gross amount collected, in document currency
    pub amount: Money,
    pub payment_type_id: Option<PaymentTypeId>,
    pub payment_type_amount: Money,
    pub deposit_amount: Money,
    pub loyalty_amount: Money,
    pub withholding_amount: Money,
    pub lines: Vec<ReceiptLine>,
    pub created_by: Actor,
    pub created_at: DateTime<Utc>,
}

/// Allocation of part of a receipt to one document line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub id: ReceiptLineId,
    pub receipt_id: ReceiptId,
    pub document_line_id: DocumentLineId,
    pub amount: Money,
}
