//! Ledger entry types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::{ExchangeRate, LedgerAccountId, LedgerEntryId, Money, PostingGroupId, TenantId};

/// Whether an entry increases the debit or the credit side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryNature {
    Debit,
    Credit,
}

impl EntryNature {
    /// The opposite nature, used when building reversal groups
    pub fn inverted(&self) -> Self {
        match self {
            EntryNature::Debit => EntryNature::Credit,
            EntryNature::Credit => EntryNature::Debit,
        }
    }
}

/// One immutable line in the ledger
///
/// Amounts are always positive; direction is carried by `nature`. The
/// `equivalent` field is the amount converted into system currency at
/// `exchange_rate`, captured at posting time so later rate changes never
/// reshuffle history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    pub tenant_id: TenantId,
    /// Entries created by the same business event share this id
    pub posting_group_id: PostingGroupId,
    pub account_id: LedgerAccountId,
    pub nature: EntryNature,
    /// Amount in the entry's own currency
    pub amount: Money,
    pub exchange_rate: ExchangeRate,
    /// Amount converted into system currency
    pub equivalent: Money,
    /// Business date of the underlying event
    pub entry_date: NaiveDate,
    /// Kind of originating event, e.g. "document" or "receipt"
    pub source_type: String,
    pub source_id: Uuid,
    pub memo: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn is_debit(&self) -> bool {
        self.nature == EntryNature::Debit
    }

    pub fn is_credit(&self) -> bool {
        self.nature == EntryNature::Credit
    }
}
