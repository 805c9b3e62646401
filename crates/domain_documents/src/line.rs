//! Document lines
//!
//! `line_total = quantity * unit_price - discount + tax`. Withholding is
//! tracked on the line but excluded from the total: it reduces the cash
//! eventually collected, not the revenue recognized.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{DocumentLineId, Money, ProductId, TaxCodeId};

use crate::error::DocumentError;

/// Input shape for creating or replacing a line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLine {
    pub product_id: ProductId,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Money,
    pub discount_amount: Money,
    pub tax_amount: Money,
    pub withholding_amount: Money,
    /// Which withholding code applies, when withholding_amount is non-zero
    pub withholding_tax_code: Option<TaxCodeId>,
}

/// A line owned by exactly one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentLine {
    pub id: DocumentLineId,
    pub product_id: ProductId,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Money,
    pub discount_amount: Money,
    pub tax_amount: Money,
    pub withholding_amount: Money,
    pub withholding_tax_code: Option<TaxCodeId>,
    /// Derived: quantity * unit_price - discount + tax
    pub line_total: Money,
}

impl DocumentLine {
    /// Builds a line from its input shape, deriving the total
    pub fn from_new(input: NewLine) -> Result<Self, DocumentError> {
        if input.quantity <= Decimal::ZERO {
            return Err(DocumentError::InvalidLine(format!(
                "quantity must be positive, got {}",
                input.quantity
            )));
        }
        if input.unit_price.is_negative() {
            return Err(DocumentError::InvalidLine(
                "unit price must not be negative".to_string(),
            ));
        }
        if input.discount_amount.is_negative()
            || input.tax_amount.is_negative()
            || input.withholding_amount.is_negative()
        {
            return Err(DocumentError::InvalidLine(
                "discount, tax, and withholding must not be negative".to_string(),
            ));
        }
        if input.withholding_amount.is_positive() && input.withholding_tax_code.is_none() {
            return Err(DocumentError::InvalidLine(
                "withholding amount requires a withholding tax code".to_string(),
            ));
        }

        let gross = input.unit_price.multiply(input.quantity);
        let line_total = gross
            .checked_sub(&input.discount_amount)?
            .checked_add(&input.tax_amount)?;

        if line_total.is_negative() {
            return Err(DocumentError::InvalidLine(
                "discount exceeds line amount".to_string(),
            ));
        }

        Ok(Self {
            id: DocumentLineId::new_v7(),
            product_id: input.product_id,
            description: input.description,
            quantity: input.quantity,
            unit_price: input.unit_price,
            discount_amount: input.discount_amount,
            tax_amount: input.tax_amount,
            withholding_amount: input.withholding_amount,
            withholding_tax_code: input.withholding_tax_code,
            line_total,
        })
    }

    /// The pre-discount, pre-tax goods amount
    pub fn gross_amount(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }

    pub fn has_withholding(&self) -> bool {
        self.withholding_amount.is_positive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    fn usd(amount: Decimal) -> Money {
        Money::new(amount, Currency::USD)
    }

    fn base_line() -> NewLine {
        NewLine {
            product_id: ProductId::new(),
            description: "Widget".to_string(),
            quantity: dec!(4),
            unit_price: usd(dec!(25)),
            discount_amount: usd(dec!(10)),
            tax_amount: usd(dec!(9)),
            withholding_amount: usd(dec!(0)),
            withholding_tax_code: None,
        }
    }

    #[test]
    fn line_total_formula() {
        let line = DocumentLine::from_new(base_line()).unwrap();
        // 4 * 25 - 10 + 9
        assert_eq!(line.line_total.amount(), dec!(99));
    }

    #[test]
    fn withholding_excluded_from_total() {
        let mut input = base_line();
        input.withholding_amount = usd(dec!(2));
        input.withholding_tax_code = Some(TaxCodeId::new());
        let line = DocumentLine::from_new(input).unwrap();
        assert_eq!(line.line_total.amount(), dec!(99));
        assert!(line.has_withholding());
    }

    #[test]
    fn zero_quantity_rejected() {
        let mut input = base_line();
        input.quantity = dec!(0);
        assert!(DocumentLine::from_new(input).is_err());
    }

    #[test]
    fn withholding_without_code_rejected() {
        let mut input = base_line();
        input.withholding_amount = usd(dec!(2));
        assert!(DocumentLine::from_new(input).is_err());
    }

    #[test]
    fn discount_beyond_line_amount_rejected() {
        let mut input = base_line();
        input.discount_amount = usd(dec!(500));
        assert!(DocumentLine::from_new(input).is_err());
    }
}
