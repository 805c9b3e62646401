//! Payment request/response shapes

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::{Currency, DocumentId, DocumentLineId, Money};
use domain_posting::{
    CashFunding, FundingSplit, LineAllocation, PaymentRecorded, PaymentRequest, PaymentType,
};

use crate::dto::documents::DocumentResponse;
use crate::error::ApiError;

/// Record-payment payload
///
/// `currency` names the tender currency; the engine rejects it when it does
/// not match the document. Omitting every source amount means the whole
/// amount settles through the named payment type.
#[derive(Debug, Deserialize)]
pub struct RecordPaymentRequest {
    pub amount: Decimal,
    pub currency: Currency,
    #[serde(alias = "transactionDate")]
    pub transaction_date: NaiveDate,
    #[serde(alias = "paymentTypeId")]
    pub payment_type_id: Option<Uuid>,
    #[serde(alias = "paymentAmount")]
    pub payment_amount: Option<Decimal>,
    #[serde(alias = "depositAmount")]
    pub deposit_amount: Option<Decimal>,
    #[serde(alias = "loyaltyAmount")]
    pub loyalty_amount: Option<Decimal>,
    #[serde(alias = "withholdingAmount")]
    pub withholding_amount: Option<Decimal>,
    #[serde(default)]
    pub allocations: Vec<AllocationDto>,
}

/// Allocation of part of the payment to one document line
#[derive(Debug, Deserialize)]
pub struct AllocationDto {
    #[serde(alias = "documentLineId")]
    pub document_line_id: Uuid,
    pub amount: Decimal,
}

impl RecordPaymentRequest {
    /// Converts into the canonical engine input
    ///
    /// The payment type id, when present, must already have been resolved
    /// to master data by the handler.
    pub fn into_engine_request(
        self,
        document_id: DocumentId,
        payment_type: Option<PaymentType>,
    ) -> Result<PaymentRequest, ApiError> {
        let currency = self.currency;
        let money = |amount: Decimal| Money::new(amount, currency);

        let payment = match (payment_type, self.payment_type_id) {
            (Some(payment_type), _) => Some(CashFunding {
                // absent an explicit figure the whole amount is cash
                amount: money(self.payment_amount.unwrap_or(self.amount)),
                payment_type,
            }),
            (None, Some(id)) => {
                return Err(ApiError::BadRequest(format!(
                    "unknown payment type {id}"
                )))
            }
            (None, None) => None,
        };

        let split = FundingSplit {
            payment,
            deposit: self.deposit_amount.map(money),
            loyalty: self.loyalty_amount.map(money),
            withholding: self.withholding_amount.map(money),
        };

        Ok(PaymentRequest {
            document_id,
            amount: money(self.amount),
            transaction_date: self.transaction_date,
            split,
            allocations: self
                .allocations
                .into_iter()
                .map(|a| LineAllocation {
                    document_line_id: DocumentLineId::from_uuid(a.document_line_id),
                    amount: money(a.amount),
                })
                .collect(),
        })
    }
}

/// A committed payment: fresh document, receipt, and posting outcome
#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub document: DocumentResponse,
    pub receipt: ReceiptResponse,
    pub ledger_entries: usize,
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ReceiptResponse {
    pub id: Uuid,
    pub reference: String,
    pub receipt_date: NaiveDate,
    pub currency: &'static str,
    pub amount: Decimal,
    pub payment_type_amount: Decimal,
    pub deposit_amount: Decimal,
    pub loyalty_amount: Decimal,
    pub withholding_amount: Decimal,
}

impl From<PaymentRecorded> for PaymentResponse {
    fn from(recorded: PaymentRecorded) -> Self {
        let receipt = &recorded.receipt;
        Self {
            document: DocumentResponse::from_document(&recorded.document),
            receipt: ReceiptResponse {
                id: *receipt.id.as_uuid(),
                reference: receipt.reference.clone(),
                receipt_date: receipt.receipt_date,
                currency: receipt.currency.code(),
                amount: receipt.amount.amount(),
                payment_type_amount: receipt.payment_type_amount.amount(),
                deposit_amount: receipt.deposit_amount.amount(),
                loyalty_amount: receipt.loyalty_amount.amount(),
                withholding_amount: receipt.withholding_amount.amount(),
            },
            ledger_entries: recorded.outcome.ledger_entries,
            warnings: recorded.outcome.warnings,
        }
    }
}
