//! Pre-built test fixtures
//!
//! Ready-to-use data for common posting-engine entities, designed to be
//! consistent and predictable across the test suite.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{
    Actor, Currency, DateRange, ExchangeRate, FinancialPeriod, Money, PeriodId, TenantContext,
    TenantId, UserId,
};
use domain_posting::{AccountLinks, PaymentType, TaxCode};
use core_kernel::{LedgerAccountId, PaymentTypeId, TaxCodeId};

/// Fixture for money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    pub fn usd(amount: Decimal) -> Money {
        Money::new(amount, Currency::USD)
    }

    pub fn usd_zero() -> Money {
        Money::zero(Currency::USD)
    }

    pub fn eur(amount: Decimal) -> Money {
        Money::new(amount, Currency::EUR)
    }
}

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// Standard business date used by most tests (Mar 10, 2026)
    pub fn document_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    /// A due date one month after the standard document date
    pub fn due_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, 10).unwrap()
    }

    /// An open financial period covering the whole of 2026
    pub fn open_period() -> FinancialPeriod {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
        )
        .unwrap();
        FinancialPeriod::open(PeriodId::new(), range)
    }

    /// A period that was already closed
    pub fn closed_period() -> FinancialPeriod {
        let mut period = Self::open_period();
        period.close().unwrap();
        period
    }
}

/// Fixture for request context data
pub struct ContextFixtures;

impl ContextFixtures {
    /// A USD-reporting tenant
    pub fn tenant() -> TenantContext {
        TenantContext::new(TenantId::new(), Currency::USD)
    }

    /// A standard acting user
    pub fn actor() -> Actor {
        Actor::new(UserId::new(), "Test Clerk")
    }
}

/// Fixture for master-data records
pub struct MasterDataFixtures;

impl MasterDataFixtures {
    /// A complete set of posting accounts
    pub fn accounts() -> AccountLinks {
        AccountLinks {
            accounts_receivable: LedgerAccountId::new(),
            revenue: LedgerAccountId::new(),
            tax_payable: LedgerAccountId::new(),
            customer_deposits: LedgerAccountId::new(),
            loyalty_points: LedgerAccountId::new(),
            withholding_clearing: LedgerAccountId::new(),
        }
    }

    /// A cash payment type with its own asset account
    pub fn cash_payment_type() -> PaymentType {
        PaymentType {
            id: PaymentTypeId::new(),
            name: "Cash".to_string(),
            account: LedgerAccountId::new(),
        }
    }

    /// A withholding tax code with a linked payable account
    pub fn withholding_code(name: &str) -> TaxCode {
        TaxCode {
            id: TaxCodeId::new(),
            name: name.to_string(),
            withholding_account: LedgerAccountId::new(),
        }
    }

    /// A generous default stock level
    pub fn plenty_of_stock() -> Decimal {
        dec!(1000)
    }
}
