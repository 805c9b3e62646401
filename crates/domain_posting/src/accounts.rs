//! Master-data records the posting services consume
//!
//! Resolved by collaborators at the boundary and passed in as plain data.
//! A record missing its linked ledger account never reaches the services:
//! constructors here take the account id as a required field, and lookups
//! that fail upstream surface as [`crate::PostingError::Configuration`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{LedgerAccountId, PaymentTypeId, TaxCodeId};

/// The tenant's required posting accounts
///
/// One struct rather than per-call lookups so a misconfigured tenant fails
/// before any mutation happens.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AccountLinks {
    /// Asset: amounts owed by customers
    pub accounts_receivable: LedgerAccountId,
    /// Income: revenue recognized at approval
    pub revenue: LedgerAccountId,
    /// Liability: tax collected on behalf of the authority
    pub tax_payable: LedgerAccountId,
    /// Liability: customer deposit balances consumed as a funding source
    pub customer_deposits: LedgerAccountId,
    /// Contra/asset: loyalty points consumed as a funding source
    pub loyalty_points: LedgerAccountId,
    /// Asset: withholding certificates receivable from customers
    pub withholding_clearing: LedgerAccountId,
}

/// A withholding tax code with its dedicated payable account
///
/// Withholding payable is tracked per code because one document may carry
/// lines under several codes, each settled with the authority separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxCode {
    pub id: TaxCodeId,
    pub name: String,
    pub withholding_account: LedgerAccountId,
}

/// A payment type (cash, bank transfer, card) and the asset account it
/// settles into
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentType {
    pub id: PaymentTypeId,
    pub name: String,
    pub account: LedgerAccountId,
}

/// Loyalty accrual configuration, when the tenant runs a program
///
/// Points accrued at approval are `equivalent total * points_per_unit`.
/// Accrual is a non-critical side effect: its failure produces a warning,
/// not a rollback.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LoyaltyProgram {
    pub points_per_unit: Decimal,
}
