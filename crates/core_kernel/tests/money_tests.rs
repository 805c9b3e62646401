//! Integration tests for money and exchange rate behavior

use core_kernel::{reconciliation_tolerance, Currency, ExchangeRate, Money, MoneyError};
use rust_decimal_macros::dec;

#[test]
fn zero_decimal_currencies_round_correctly() {
    let yen = Money::new(dec!(1000.4), Currency::JPY).round_to_currency();
    assert_eq!(yen.amount(), dec!(1000));
    assert_eq!(yen.to_string(), "JPY 1000");
}

#[test]
fn display_uses_currency_scale() {
    let usd = Money::new(dec!(12.5), Currency::USD);
    assert_eq!(usd.to_string(), "USD 12.50");
}

#[test]
fn subtraction_below_zero_is_negative_not_saturated() {
    let a = Money::new(dec!(10), Currency::USD);
    let b = Money::new(dec!(25), Currency::USD);
    let diff = a.checked_sub(&b).unwrap();
    assert!(diff.is_negative());
    assert_eq!(diff.amount(), dec!(-15));
}

#[test]
fn tolerance_matches_one_cent() {
    assert_eq!(reconciliation_tolerance(), dec!(0.01));
}

#[test]
fn mixed_currency_reconciliation_is_an_error() {
    let usd = Money::new(dec!(1), Currency::USD);
    let idr = Money::new(dec!(1), Currency::IDR);
    assert!(matches!(
        usd.reconciles_with(&idr),
        Err(MoneyError::CurrencyMismatch(_, _))
    ));
}

#[test]
fn identity_rate_preserves_amount() {
    let rate = ExchangeRate::identity();
    let m = Money::new(dec!(99.99), Currency::USD);
    assert_eq!(rate.convert(&m, Currency::USD).amount(), dec!(99.99));
}
