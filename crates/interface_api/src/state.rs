//! Shared application state
//!
//! The posting services are constructed once at startup around one store
//! handle; handlers clone the state cheaply per request.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};

use core_kernel::{
    Currency, DateRange, FinancialPeriod, LedgerAccountId, PaymentTypeId, PeriodId, TaxCodeId,
};
use domain_posting::{
    AccountLinks, ApprovalOrchestrator, DocumentIssuer, DocumentTransitions, LoyaltyProgram,
    PaymentDistributor, PaymentType, PostingStore, RetryPolicy, TaxCode,
};

use crate::config::ApiConfig;

/// Resolved master data the posting services consume
#[derive(Debug, Clone)]
pub struct MasterData {
    pub system_currency: Currency,
    pub accounts: AccountLinks,
    pub tax_codes: HashMap<TaxCodeId, TaxCode>,
    pub payment_types: HashMap<PaymentTypeId, PaymentType>,
    pub loyalty: Option<LoyaltyProgram>,
    /// The open period postings are accepted into
    pub period: FinancialPeriod,
}

impl MasterData {
    /// Builds master data from configuration
    ///
    /// Fails when the chart of accounts is missing: a deployment without
    /// posting accounts cannot serve any mutation.
    pub fn from_config(config: &ApiConfig) -> anyhow::Result<Self> {
        let accounts = config
            .master
            .accounts
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("posting accounts are not configured"))?;

        let tax_codes = config
            .master
            .tax_codes
            .iter()
            .map(|setting| {
                let code = TaxCode {
                    id: TaxCodeId::from_uuid(setting.id),
                    name: setting.name.clone(),
                    withholding_account: LedgerAccountId::from_uuid(setting.withholding_account),
                };
                (code.id, code)
            })
            .collect();

        let payment_types = config
            .master
            .payment_types
            .iter()
            .map(|setting| {
                let payment_type = PaymentType {
                    id: PaymentTypeId::from_uuid(setting.id),
                    name: setting.name.clone(),
                    account: LedgerAccountId::from_uuid(setting.account),
                };
                (payment_type.id, payment_type)
            })
            .collect();

        Ok(Self {
            system_currency: config.system_currency,
            accounts: AccountLinks {
                accounts_receivable: LedgerAccountId::from_uuid(accounts.accounts_receivable),
                revenue: LedgerAccountId::from_uuid(accounts.revenue),
                tax_payable: LedgerAccountId::from_uuid(accounts.tax_payable),
                customer_deposits: LedgerAccountId::from_uuid(accounts.customer_deposits),
                loyalty_points: LedgerAccountId::from_uuid(accounts.loyalty_points),
                withholding_clearing: LedgerAccountId::from_uuid(accounts.withholding_clearing),
            },
            tax_codes,
            payment_types,
            loyalty: config
                .master
                .loyalty_points_per_unit
                .map(|points_per_unit| LoyaltyProgram { points_per_unit }),
            period: calendar_year_period(Utc::now().date_naive()),
        })
    }
}

/// An open period spanning the calendar year containing `today`
fn calendar_year_period(today: NaiveDate) -> FinancialPeriod {
    let year = today.year();
    // both ymd calls are valid for every year
    let start = NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(today);
    let end = NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(today);
    let range = DateRange::new(start, end).unwrap_or(DateRange { start, end });
    FinancialPeriod::open(PeriodId::new(), range)
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PostingStore>,
    pub issuer: Arc<DocumentIssuer>,
    pub approvals: Arc<ApprovalOrchestrator>,
    pub payments: Arc<PaymentDistributor>,
    pub transitions: Arc<DocumentTransitions>,
    pub master: Arc<MasterData>,
}

impl AppState {
    pub fn new(store: Arc<dyn PostingStore>, master: MasterData) -> Self {
        let retry = RetryPolicy::default();
        Self {
            issuer: Arc::new(DocumentIssuer::new(store.clone(), retry)),
            approvals: Arc::new(ApprovalOrchestrator::new(store.clone())),
            payments: Arc::new(PaymentDistributor::new(store.clone(), retry)),
            transitions: Arc::new(DocumentTransitions::new(store.clone())),
            store,
            master: Arc::new(master),
        }
    }
}
