//! Document request/response shapes
//!
//! Requests accept both snake_case and camelCase keys via serde aliases;
//! the handlers convert them into the canonical engine inputs so nothing
//! past the boundary deals with payload variance.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::{Currency, CustomerId, ExchangeRate, Money, ProductId, StoreId, TaxCodeId};
use domain_documents::{Document, DocumentLine, NewLine};
use domain_posting::{NewDocumentRequest, PostingOutcome};

use crate::error::ApiError;

/// Create-document payload
#[derive(Debug, Deserialize)]
pub struct CreateDocumentRequest {
    #[serde(alias = "customerId")]
    pub customer_id: Uuid,
    #[serde(alias = "storeId")]
    pub store_id: Uuid,
    pub currency: Currency,
    #[serde(alias = "exchangeRate")]
    pub exchange_rate: Decimal,
    #[serde(alias = "documentDate")]
    pub document_date: NaiveDate,
    #[serde(alias = "dueDate")]
    pub due_date: NaiveDate,
    pub lines: Vec<NewLineDto>,
}

/// One line of a create-document payload
#[derive(Debug, Deserialize)]
pub struct NewLineDto {
    #[serde(alias = "productId")]
    pub product_id: Uuid,
    pub description: String,
    pub quantity: Decimal,
    #[serde(alias = "unitPrice")]
    pub unit_price: Decimal,
    #[serde(default, alias = "discountAmount")]
    pub discount_amount: Decimal,
    #[serde(default, alias = "taxAmount")]
    pub tax_amount: Decimal,
    #[serde(default, alias = "withholdingAmount")]
    pub withholding_amount: Decimal,
    #[serde(alias = "withholdingTaxCode")]
    pub withholding_tax_code: Option<Uuid>,
}

impl CreateDocumentRequest {
    /// Converts into the canonical engine input
    pub fn into_engine_request(self) -> Result<NewDocumentRequest, ApiError> {
        let exchange_rate = ExchangeRate::new(self.exchange_rate)
            .map_err(|e| ApiError::Validation(e.to_string()))?;
        let currency = self.currency;

        let lines = self
            .lines
            .into_iter()
            .map(|line| NewLine {
                product_id: ProductId::from_uuid(line.product_id),
                description: line.description,
                quantity: line.quantity,
                unit_price: Money::new(line.unit_price, currency),
                discount_amount: Money::new(line.discount_amount, currency),
                tax_amount: Money::new(line.tax_amount, currency),
                withholding_amount: Money::new(line.withholding_amount, currency),
                withholding_tax_code: line.withholding_tax_code.map(TaxCodeId::from_uuid),
            })
            .collect();

        Ok(NewDocumentRequest {
            customer_id: CustomerId::from_uuid(self.customer_id),
            store_id: StoreId::from_uuid(self.store_id),
            currency,
            exchange_rate,
            document_date: self.document_date,
            due_date: self.due_date,
            lines,
        })
    }
}

/// Reject/cancel payload
#[derive(Debug, Deserialize)]
pub struct TransitionReason {
    pub reason: String,
}

/// Normalized document projection
///
/// `status` is the effective status: a stored non-terminal state past its
/// due date reads as overdue without being stored that way.
#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub reference: String,
    pub customer_id: Uuid,
    pub store_id: Uuid,
    pub currency: &'static str,
    pub exchange_rate: Decimal,
    pub document_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: String,
    pub payment_status: String,
    pub subtotal: Decimal,
    pub discount_total: Decimal,
    pub tax_total: Decimal,
    pub withholding_total: Decimal,
    pub total: Decimal,
    pub paid: Decimal,
    pub balance: Decimal,
    pub equivalent_amount: Decimal,
    pub lines: Vec<LineResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_reason: Option<String>,
    pub created_by: ActorResponse,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<ActorResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct LineResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub withholding_amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub withholding_tax_code: Option<Uuid>,
    pub line_total: Decimal,
}

#[derive(Debug, Serialize)]
pub struct ActorResponse {
    pub id: Uuid,
    pub name: String,
}

impl From<&core_kernel::Actor> for ActorResponse {
    fn from(actor: &core_kernel::Actor) -> Self {
        Self {
            id: *actor.id.as_uuid(),
            name: actor.display_name.clone(),
        }
    }
}

impl From<&DocumentLine> for LineResponse {
    fn from(line: &DocumentLine) -> Self {
        Self {
            id: *line.id.as_uuid(),
            product_id: *line.product_id.as_uuid(),
            description: line.description.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price.amount(),
            discount_amount: line.discount_amount.amount(),
            tax_amount: line.tax_amount.amount(),
            withholding_amount: line.withholding_amount.amount(),
            withholding_tax_code: line.withholding_tax_code.as_ref().map(|id| *id.as_uuid()),
            line_total: line.line_total.amount(),
        }
    }
}

impl DocumentResponse {
    pub fn from_document(document: &Document) -> Self {
        let today = Utc::now().date_naive();
        Self {
            id: *document.id.as_uuid(),
            reference: document.reference.clone(),
            customer_id: *document.customer_id.as_uuid(),
            store_id: *document.store_id.as_uuid(),
            currency: document.currency.code(),
            exchange_rate: document.exchange_rate.value(),
            document_date: document.document_date,
            due_date: document.due_date,
            status: document.effective_status(today).to_string(),
            payment_status: document.payment_status.to_string(),
            subtotal: document.subtotal.amount(),
            discount_total: document.discount_total.amount(),
            tax_total: document.tax_total.amount(),
            withholding_total: document.withholding_total.amount(),
            total: document.total.amount(),
            paid: document.paid.amount(),
            balance: document.balance.amount(),
            equivalent_amount: document.equivalent_amount.amount(),
            lines: document.lines.iter().map(LineResponse::from).collect(),
            status_reason: document.status_reason.clone(),
            created_by: ActorResponse::from(&document.created_by),
            created_at: document.created_at,
            updated_at: document.updated_at,
            approved_by: document.approved_by.as_ref().map(ActorResponse::from),
            approved_at: document.approved_at,
        }
    }
}

/// A state transition result: the fresh document plus what posting produced
#[derive(Debug, Serialize)]
pub struct TransitionResponse {
    pub document: DocumentResponse,
    pub ledger_entries: usize,
    pub warnings: Vec<String>,
}

impl TransitionResponse {
    pub fn new(document: &Document, outcome: PostingOutcome) -> Self {
        Self {
            document: DocumentResponse::from_document(document),
            ledger_entries: outcome.ledger_entries,
            warnings: outcome.warnings,
        }
    }
}
