//! Test data builders
//!
//! Builder patterns for constructing posting-engine inputs with sensible
//! defaults, so tests specify only the fields they care about.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{Currency, CustomerId, ExchangeRate, Money, ProductId, StoreId, TaxCodeId};
use domain_documents::NewLine;
use domain_posting::NewDocumentRequest;

use crate::fixtures::TemporalFixtures;

/// Builder for document lines
pub struct LineBuilder {
    product_id: ProductId,
    description: String,
    quantity: Decimal,
    unit_price: Money,
    discount_amount: Money,
    tax_amount: Money,
    withholding_amount: Money,
    withholding_tax_code: Option<TaxCodeId>,
}

impl Default for LineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LineBuilder {
    /// A line of 10 units at 100 USD with 100 USD tax
    pub fn new() -> Self {
        Self {
            product_id: ProductId::new(),
            description: "Widget".to_string(),
            quantity: dec!(10),
            unit_price: Money::new(dec!(100), Currency::USD),
            discount_amount: Money::zero(Currency::USD),
            tax_amount: Money::new(dec!(100), Currency::USD),
            withholding_amount: Money::zero(Currency::USD),
            withholding_tax_code: None,
        }
    }

    pub fn with_product(mut self, product_id: ProductId) -> Self {
        self.product_id = product_id;
        self
    }

    pub fn with_quantity(mut self, quantity: Decimal) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_unit_price(mut self, unit_price: Money) -> Self {
        self.unit_price = unit_price;
        self
    }

    pub fn with_discount(mut self, discount: Money) -> Self {
        self.discount_amount = discount;
        self
    }

    pub fn with_tax(mut self, tax: Money) -> Self {
        self.tax_amount = tax;
        self
    }

    pub fn with_withholding(mut self, amount: Money, code: TaxCodeId) -> Self {
        self.withholding_amount = amount;
        self.withholding_tax_code = Some(code);
        self
    }

    pub fn build(self) -> NewLine {
        NewLine {
            product_id: self.product_id,
            description: self.description,
            quantity: self.quantity,
            unit_price: self.unit_price,
            discount_amount: self.discount_amount,
            tax_amount: self.tax_amount,
            withholding_amount: self.withholding_amount,
            withholding_tax_code: self.withholding_tax_code,
        }
    }
}

/// Builder for document creation requests
pub struct DocumentRequestBuilder {
    customer_id: CustomerId,
    store_id: StoreId,
    currency: Currency,
    exchange_rate: ExchangeRate,
    document_date: NaiveDate,
    due_date: NaiveDate,
    lines: Vec<NewLine>,
}

impl Default for DocumentRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentRequestBuilder {
    /// A USD document dated at the standard fixture dates, with one
    /// default line (total 1100: subtotal 1000 + tax 100)
    pub fn new() -> Self {
        Self {
            customer_id: CustomerId::new(),
            store_id: StoreId::new(),
            currency: Currency::USD,
            exchange_rate: ExchangeRate::identity(),
            document_date: TemporalFixtures::document_date(),
            due_date: TemporalFixtures::due_date(),
            lines: vec![LineBuilder::new().build()],
        }
    }

    pub fn with_customer(mut self, customer_id: CustomerId) -> Self {
        self.customer_id = customer_id;
        self
    }

    pub fn with_store(mut self, store_id: StoreId) -> Self {
        self.store_id = store_id;
        self
    }

    pub fn with_currency(mut self, currency: Currency, rate: ExchangeRate) -> Self {
        self.currency = currency;
        self.exchange_rate = rate;
        self
    }

    pub fn with_document_date(mut self, date: NaiveDate) -> Self {
        self.document_date = date;
        self
    }

    pub fn with_due_date(mut self, date: NaiveDate) -> Self {
        self.due_date = date;
        self
    }

    pub fn with_lines(mut self, lines: Vec<NewLine>) -> Self {
        self.lines = lines;
        self
    }

    pub fn build(self) -> NewDocumentRequest {
        NewDocumentRequest {
            customer_id: self.customer_id,
            store_id: self.store_id,
            currency: self.currency,
            exchange_rate: self.exchange_rate,
            document_date: self.document_date,
            due_date: self.due_date,
            lines: self.lines,
        }
    }
}
