//! Money types with precise decimal arithmetic
//!
//! Monetary values are represented with rust_decimal so that ledger math is
//! exact. Every amount is tagged with its currency; mixing currencies is a
//! checked error, never a silent coercion. Conversion into the tenant's
//! system (reporting) currency goes through a validated [`ExchangeRate`].

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Neg, Sub};
use thiserror::Error;

/// Currency codes following ISO 4217
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    USD,
    EUR,
    GBP,
    JPY,
    IDR,
    SGD,
    MYR,
    AUD,
}

impl Currency {
    /// Returns the number of decimal places for this currency
    pub fn decimal_places(&self) -> u32 {
        match self {
            Currency::JPY | Currency::IDR => 0,
            _ => 2,
        }
    }

    /// Returns the ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::JPY => "JPY",
            Currency::IDR => "IDR",
            Currency::SGD => "SGD",
            Currency::MYR => "MYR",
            Currency::AUD => "AUD",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors that can occur during money operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Currency mismatch: cannot operate on {0} and {1}")]
    CurrencyMismatch(String, String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Exchange rate must be strictly positive, got {0}")]
    NonPositiveRate(Decimal),
}

/// Tolerance used when reconciling derived balances and posting groups.
///
/// Rounding during currency conversion can leave sub-cent residue; anything
/// at or below this value in system currency is treated as equal.
pub fn reconciliation_tolerance() -> Decimal {
    dec!(0.01)
}

/// A monetary amount with associated currency
///
/// Amounts are stored with 4 decimal places internally so that exchange rate
/// conversions keep enough precision before the final rounding to the
/// currency's natural scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    /// Creates a new Money value
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self {
            amount: amount.round_dp(4),
            currency,
        }
    }

    /// Creates a zero amount in the specified currency
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: dec!(0),
            currency,
        }
    }

    /// Returns the amount
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns the currency
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Returns true if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is positive
    pub fn is_positive(&self) -> bool {
        self.amount.is_sign_positive() && !self.amount.is_zero()
    }

    /// Returns true if the amount is negative
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    /// Returns the absolute value
    pub fn abs(&self) -> Self {
        Self {
            amount: self.amount.abs(),
            currency: self.currency,
        }
    }

    /// Rounds to the currency's standard decimal places
    pub fn round_to_currency(&self) -> Self {
        Self {
            amount: self.amount.round_dp(self.currency.decimal_places()),
            currency: self.currency,
        }
    }

    /// Checked addition that returns an error on currency mismatch
    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(Self::new(self.amount + other.amount, self.currency))
    }

    /// Checked subtraction that returns an error on currency mismatch
    pub fn checked_sub(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(Self::new(self.amount - other.amount, self.currency))
    }

    /// Multiplies by a scalar (e.g., for quantity or rate calculations)
    pub fn multiply(&self, factor: Decimal) -> Self {
        Self::new(self.amount * factor, self.currency)
    }

    /// Returns true if this amount equals `other` within the reconciliation
    /// tolerance. Both must be in the same currency.
    pub fn reconciles_with(&self, other: &Money) -> Result<bool, MoneyError> {
        let diff = self.checked_sub(other)?;
        Ok(diff.amount.abs() <= reconciliation_tolerance())
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<(), MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch(
                self.currency.to_string(),
                other.currency.to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dp = self.currency.decimal_places() as usize;
        write!(f, "{} {:.dp$}", self.currency.code(), self.amount, dp = dp)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        self.checked_add(&other)
            .expect("Currency mismatch in Money::add")
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        self.checked_sub(&other)
            .expect("Currency mismatch in Money::sub")
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.amount, self.currency)
    }
}

/// A validated exchange rate from a document currency into the tenant's
/// system currency.
///
/// A rate of 1 is used when the document is already in system currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeRate(Decimal);

impl ExchangeRate {
    /// Creates a new exchange rate. Rates must be strictly positive.
    pub fn new(value: Decimal) -> Result<Self, MoneyError> {
        if value <= Decimal::ZERO {
            return Err(MoneyError::NonPositiveRate(value));
        }
        Ok(Self(value))
    }

    /// The identity rate
    pub fn identity() -> Self {
        Self(Decimal::ONE)
    }

    /// Returns the raw rate value
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Converts an amount into the target (system) currency at this rate.
    pub fn convert(&self, amount: &Money, into: Currency) -> Money {
        Money::new(amount.amount() * self.0, into)
    }
}

impl fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_arithmetic() {
        let a = Money::new(dec!(100.00), Currency::USD);
        let b = Money::new(dec!(50.00), Currency::USD);

        assert_eq!((a + b).amount(), dec!(150.00));
        assert_eq!((a - b).amount(), dec!(50.00));
        assert_eq!((-a).amount(), dec!(-100.00));
    }

    #[test]
    fn currency_mismatch_is_rejected() {
        let usd = Money::new(dec!(100.00), Currency::USD);
        let eur = Money::new(dec!(100.00), Currency::EUR);

        let result = usd.checked_add(&eur);
        assert!(matches!(result, Err(MoneyError::CurrencyMismatch(_, _))));
    }

    #[test]
    fn reconciles_within_tolerance() {
        let a = Money::new(dec!(100.005), Currency::USD);
        let b = Money::new(dec!(100.00), Currency::USD);
        assert!(a.reconciles_with(&b).unwrap());

        let c = Money::new(dec!(100.02), Currency::USD);
        assert!(!c.reconciles_with(&b).unwrap());
    }

    #[test]
    fn exchange_rate_must_be_positive() {
        assert!(ExchangeRate::new(dec!(0)).is_err());
        assert!(ExchangeRate::new(dec!(-1.5)).is_err());
        assert!(ExchangeRate::new(dec!(15250.0)).is_ok());
    }

    #[test]
    fn exchange_rate_converts_into_system_currency() {
        let rate = ExchangeRate::new(dec!(1.25)).unwrap();
        let eur = Money::new(dec!(200.00), Currency::EUR);
        let usd = rate.convert(&eur, Currency::USD);

        assert_eq!(usd.currency(), Currency::USD);
        assert_eq!(usd.amount(), dec!(250.00));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn addition_is_commutative(
            a in -1_000_000i64..1_000_000i64,
            b in -1_000_000i64..1_000_000i64
        ) {
            let ma = Money::new(Decimal::new(a, 2), Currency::USD);
            let mb = Money::new(Decimal::new(b, 2), Currency::USD);

            prop_assert_eq!(ma + mb, mb + ma);
        }

        #[test]
        fn conversion_scales_linearly(
            amount in 1i64..1_000_000i64,
            rate_minor in 1i64..100_000i64
        ) {
            let rate = ExchangeRate::new(Decimal::new(rate_minor, 4)).unwrap();
            let money = Money::new(Decimal::new(amount, 2), Currency::EUR);
            let doubled = Money::new(Decimal::new(amount * 2, 2), Currency::EUR);

            let once = rate.convert(&money, Currency::USD);
            let twice = rate.convert(&doubled, Currency::USD);

            prop_assert_eq!(once.checked_add(&once).unwrap(), twice);
        }
    }
}
