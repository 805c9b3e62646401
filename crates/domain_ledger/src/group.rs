//! Posting group construction and balance enforcement
//!
//! The Ledger Writer is not a standalone entry point: the approval
//! orchestrator and the payment distributor build a [`PostingGroup`], then
//! hand the validated entries to the store inside their unit of work. The
//! balance invariant is checked *before* anything is persisted; a violation
//! aborts the enclosing transaction rather than being silently corrected.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::debug;
use uuid::Uuid;

use core_kernel::{
    reconciliation_tolerance, ExchangeRate, LedgerAccountId, LedgerEntryId, Money, PostingGroupId,
    TenantContext,
};

use crate::entry::{EntryNature, LedgerEntry};
use crate::error::LedgerError;

/// Builder for one balanced set of ledger entries
///
/// All entries in a group share the tenant, exchange rate, business date,
/// and source reference of the event that produced them.
#[derive(Debug)]
pub struct PostingGroup {
    id: PostingGroupId,
    ctx: TenantContext,
    rate: ExchangeRate,
    entry_date: NaiveDate,
    source_type: String,
    source_id: Uuid,
    entries: Vec<LedgerEntry>,
}

impl PostingGroup {
    /// Starts a new group for a business event
    pub fn new(
        ctx: TenantContext,
        rate: ExchangeRate,
        entry_date: NaiveDate,
        source_type: impl Into<String>,
        source_id: Uuid,
    ) -> Self {
        Self {
            id: PostingGroupId::new_v7(),
            ctx,
            rate,
            entry_date,
            source_type: source_type.into(),
            source_id,
            entries: Vec::new(),
        }
    }

    /// The group identifier shared by all entries
    pub fn id(&self) -> PostingGroupId {
        self.id
    }

    /// Adds a debit entry
    pub fn debit(self, account_id: LedgerAccountId, amount: Money) -> Self {
        self.push(account_id, amount, EntryNature::Debit, None)
    }

    /// Adds a credit entry
    pub fn credit(self, account_id: LedgerAccountId, amount: Money) -> Self {
        self.push(account_id, amount, EntryNature::Credit, None)
    }

    /// Adds a debit entry with a memo
    pub fn debit_memo(
        self,
        account_id: LedgerAccountId,
        amount: Money,
        memo: impl Into<String>,
    ) -> Self {
        self.push(account_id, amount, EntryNature::Debit, Some(memo.into()))
    }

    /// Adds a credit entry with a memo
    pub fn credit_memo(
        self,
        account_id: LedgerAccountId,
        amount: Money,
        memo: impl Into<String>,
    ) -> Self {
        self.push(account_id, amount, EntryNature::Credit, Some(memo.into()))
    }

    fn push(
        mut self,
        account_id: LedgerAccountId,
        amount: Money,
        nature: EntryNature,
        memo: Option<String>,
    ) -> Self {
        let equivalent = self.rate.convert(&amount, self.ctx.system_currency);
        self.entries.push(LedgerEntry {
            id: LedgerEntryId::new_v7(),
            tenant_id: self.ctx.tenant_id,
            posting_group_id: self.id,
            account_id,
            nature,
            amount,
            exchange_rate: self.rate,
            equivalent,
            entry_date: self.entry_date,
            source_type: self.source_type.clone(),
            source_id: self.source_id,
            memo,
            created_at: Utc::now(),
        });
        self
    }

    /// Number of entries accumulated so far
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validates the group and returns the entries ready for persistence
    ///
    /// # Errors
    ///
    /// - [`LedgerError::TooFewEntries`] when fewer than two entries exist
    /// - [`LedgerError::NonPositiveAmount`] when any entry amount is <= 0
    /// - [`LedgerError::Unbalanced`] when debit and credit equivalents
    ///   diverge beyond the reconciliation tolerance
    pub fn post(self) -> Result<Vec<LedgerEntry>, LedgerError> {
        if self.entries.len() < 2 {
            return Err(LedgerError::TooFewEntries(self.entries.len()));
        }

        for entry in &self.entries {
            if !entry.amount.is_positive() {
                return Err(LedgerError::NonPositiveAmount(
                    entry.amount.amount(),
                    entry.account_id.to_string(),
                ));
            }
        }

        let (debits, credits) = equivalent_totals(&self.entries);
        if (debits - credits).abs() > reconciliation_tolerance() {
            return Err(LedgerError::Unbalanced { debits, credits });
        }

        debug!(
            posting_group = %self.id,
            entries = self.entries.len(),
            debits = %debits,
            "posting group balanced"
        );
        Ok(self.entries)
    }
}

/// Sums debit and credit equivalents across a set of entries
pub fn equivalent_totals(entries: &[LedgerEntry]) -> (Decimal, Decimal) {
    let mut debits = Decimal::ZERO;
    let mut credits = Decimal::ZERO;
    for entry in entries {
        match entry.nature {
            EntryNature::Debit => debits += entry.equivalent.amount(),
            EntryNature::Credit => credits += entry.equivalent.amount(),
        }
    }
    (debits, credits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{Currency, TenantId};
    use rust_decimal_macros::dec;

    fn ctx() -> TenantContext {
        TenantContext::new(TenantId::new(), Currency::USD)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    fn group() -> PostingGroup {
        PostingGroup::new(
            ctx(),
            ExchangeRate::identity(),
            today(),
            "document",
            Uuid::new_v4(),
        )
    }

    #[test]
    fn balanced_group_posts() {
        let ar = LedgerAccountId::new();
        let revenue = LedgerAccountId::new();

        let entries = group()
            .debit(ar, Money::new(dec!(1100), Currency::USD))
            .credit(revenue, Money::new(dec!(1100), Currency::USD))
            .post()
            .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].posting_group_id, entries[1].posting_group_id);
    }

    #[test]
    fn unbalanced_group_is_rejected() {
        let result = group()
            .debit(LedgerAccountId::new(), Money::new(dec!(1000), Currency::USD))
            .credit(LedgerAccountId::new(), Money::new(dec!(999.50), Currency::USD))
            .post();

        assert!(matches!(result, Err(LedgerError::Unbalanced { .. })));
    }

    #[test]
    fn sub_cent_residue_is_within_tolerance() {
        let result = group()
            .debit(LedgerAccountId::new(), Money::new(dec!(100.004), Currency::USD))
            .credit(LedgerAccountId::new(), Money::new(dec!(100.00), Currency::USD))
            .post();

        assert!(result.is_ok());
    }

    #[test]
    fn single_entry_group_is_rejected() {
        let result = group()
            .debit(LedgerAccountId::new(), Money::new(dec!(50), Currency::USD))
            .post();

        assert!(matches!(result, Err(LedgerError::TooFewEntries(1))));
    }

    #[test]
    fn zero_amount_entry_is_rejected() {
        let result = group()
            .debit(LedgerAccountId::new(), Money::zero(Currency::USD))
            .credit(LedgerAccountId::new(), Money::zero(Currency::USD))
            .post();

        assert!(matches!(result, Err(LedgerError::NonPositiveAmount(_, _))));
    }

    #[test]
    fn equivalents_use_the_exchange_rate() {
        let ctx = TenantContext::new(TenantId::new(), Currency::USD);
        let rate = ExchangeRate::new(dec!(1.25)).unwrap();
        let entries = PostingGroup::new(ctx, rate, today(), "document", Uuid::new_v4())
            .debit(LedgerAccountId::new(), Money::new(dec!(200), Currency::EUR))
            .credit(LedgerAccountId::new(), Money::new(dec!(200), Currency::EUR))
            .post()
            .unwrap();

        assert_eq!(entries[0].equivalent.amount(), dec!(250));
        assert_eq!(entries[0].equivalent.currency(), Currency::USD);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use core_kernel::{Currency, TenantId};
    use proptest::prelude::*;

    proptest! {
        /// Any group built as mirrored debit/credit pairs balances,
        /// whatever the amounts and rate.
        #[test]
        fn mirrored_pairs_always_balance(
            amounts in proptest::collection::vec(1i64..10_000_000i64, 1..8),
            rate_minor in 1i64..500_000i64
        ) {
            let ctx = TenantContext::new(TenantId::new(), Currency::USD);
            let rate = ExchangeRate::new(Decimal::new(rate_minor, 4)).unwrap();
            let mut group = PostingGroup::new(
                ctx,
                rate,
                NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                "document",
                Uuid::new_v4(),
            );

            for minor in &amounts {
                let money = Money::new(Decimal::new(*minor, 2), Currency::EUR);
                group = group
                    .debit(LedgerAccountId::new(), money)
                    .credit(LedgerAccountId::new(), money);
            }

            let entries = group.post().unwrap();
            let (debits, credits) = equivalent_totals(&entries);
            prop_assert_eq!(debits, credits);
        }
    }
}
