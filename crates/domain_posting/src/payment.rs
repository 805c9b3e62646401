//! Payment distribution across funding sources
//!
//! A single payment may draw on up to four sources: a payment type
//! (cash/bank), the customer's deposit balance, loyalty points, and the
//! withheld tax the customer remits to the authority on the tenant's
//! behalf. The posting group debits each consumed source and credits the
//! receivable once, for the gross amount, so the document's receivable
//! clears in full even when less cash changes hands.
//!
//! Cross-currency payments are rejected outright: accepting them would
//! create untracked FX gain/loss between payment and document rates.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use core_kernel::{
    reconciliation_tolerance, Actor, DocumentId, DocumentLineId, FinancialPeriod, Money, ReceiptId,
    ReceiptLineId, TaxCodeId, TenantContext,
};
use domain_documents::Document;
use domain_ledger::{LedgerEntry, PostingGroup};

use crate::accounts::{AccountLinks, PaymentType, TaxCode};
use crate::approval::withholding_by_code;
use crate::error::PostingError;
use crate::outcome::PostingOutcome;
use crate::ports::{PostingStore, PostingTx};
use crate::receipt::{Receipt, ReceiptLine};
use crate::retry::{with_conflict_retry, RetryPolicy};
use crate::sequence::{next_reference, SequenceKind};

/// The cash/bank portion of a payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFunding {
    pub payment_type: PaymentType,
    pub amount: Money,
}

/// How a payment decomposes into funding sources
///
/// All amounts are in document currency. Sources left as `None` contribute
/// nothing; the non-zero sources must sum to the gross payment amount.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FundingSplit {
    pub payment: Option<CashFunding>,
    pub deposit: Option<Money>,
    pub loyalty: Option<Money>,
    pub withholding: Option<Money>,
}

impl FundingSplit {
    /// The common case: the whole amount through one payment type
    pub fn all_cash(payment_type: PaymentType, amount: Money) -> Self {
        Self {
            payment: Some(CashFunding {
                payment_type,
                amount,
            }),
            ..Self::default()
        }
    }

    fn parts(&self) -> [(&'static str, Option<&Money>); 4] {
        [
            ("payment type", self.payment.as_ref().map(|p| &p.amount)),
            ("deposit", self.deposit.as_ref()),
            ("loyalty", self.loyalty.as_ref()),
            ("withholding", self.withholding.as_ref()),
        ]
    }
}

/// Allocation of part of the payment to one document line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineAllocation {
    pub document_line_id: DocumentLineId,
    pub amount: Money,
}

/// Canonical input for recording a payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub document_id: DocumentId,
    /// Gross amount, in document currency
    pub amount: Money,
    pub transaction_date: NaiveDate,
    pub split: FundingSplit,
    /// Optional per-line allocation; validated against each line's
    /// historically derived paid amount
    pub allocations: Vec<LineAllocation>,
}

/// Everything a committed payment produced
#[derive(Debug)]
pub struct PaymentRecorded {
    pub document: Document,
    pub receipt: Receipt,
    pub outcome: PostingOutcome,
}

/// Validates, posts, and records payments against approved documents
pub struct PaymentDistributor {
    store: Arc<dyn PostingStore>,
    retry: RetryPolicy,
}

impl PaymentDistributor {
    pub fn new(store: Arc<dyn PostingStore>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Records a payment inside one unit of work
    ///
    /// The receipt's own reference comes from the receipt sequence, so the
    /// whole unit of work sits under the conflict retry: a reference
    /// collision rolls the attempt back and a fresh one re-reads the
    /// sequence and the document.
    ///
    /// # Errors
    ///
    /// - [`PostingError::Validation`] for amount, capacity, currency,
    ///   date, or allocation violations; nothing is written
    /// - [`PostingError::Configuration`] when a withholding tax code has
    ///   no resolved account
    /// - [`PostingError::Conflict`] when receipt sequencing still collides
    ///   after the retry bound
    #[instrument(skip_all, fields(tenant = %ctx.tenant_id, document = %request.document_id))]
    pub async fn record(
        &self,
        ctx: TenantContext,
        actor: &Actor,
        accounts: &AccountLinks,
        tax_codes: &HashMap<TaxCodeId, TaxCode>,
        period: &FinancialPeriod,
        request: PaymentRequest,
    ) -> Result<PaymentRecorded, PostingError> {
        with_conflict_retry(self.retry, |_attempt| {
            let request = request.clone();
            async move {
                let mut tx = self.store.begin().await?;
                match Self::record_in_tx(tx.as_mut(), ctx, actor, accounts, tax_codes, period, request)
                    .await
                {
                    Ok(result) => {
                        tx.commit().await?;
                        Ok(result)
                    }
                    Err(err) => {
                        if let Err(rb) = tx.rollback().await {
                            tracing::error!(error = %rb, "rollback failed");
                        }
                        Err(err)
                    }
                }
            }
        })
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn record_in_tx(
        tx: &mut dyn PostingTx,
        ctx: TenantContext,
        actor: &Actor,
        accounts: &AccountLinks,
        tax_codes: &HashMap<TaxCodeId, TaxCode>,
        period: &FinancialPeriod,
        request: PaymentRequest,
    ) -> Result<PaymentRecorded, PostingError> {
        let mut document = tx
            .find_document_for_update(ctx.tenant_id, request.document_id)
            .await?
            .ok_or_else(|| PostingError::validation("document not found"))?;

        Self::validate(&document, period, &request)?;
        Self::check_capacities(tx, ctx, &document, &request.split).await?;
        Self::check_allocations(tx, ctx, &document, &request).await?;

        let receipt_id = ReceiptId::new_v7();
        let entries =
            Self::build_settlement_group(&document, ctx, accounts, tax_codes, &request, receipt_id)?;
        tx.append_posting_group(&entries).await?;

        document.apply_payment(&request.amount, actor)?;
        tx.update_document(&document).await?;

        Self::settle_balances(tx, ctx, &document, &request).await?;

        let receipt = Self::build_receipt(tx, ctx, actor, &document, &request, receipt_id).await?;
        tx.insert_receipt(&receipt).await?;

        debug!(
            reference = %receipt.reference,
            amount = %request.amount,
            balance = %document.balance,
            "payment recorded"
        );
        Ok(PaymentRecorded {
            document,
            receipt,
            outcome: PostingOutcome::new(entries.len()),
        })
    }

    /// Stateless validation: status, currency, amount, dates, split shape
    fn validate(
        document: &Document,
        period: &FinancialPeriod,
        request: &PaymentRequest,
    ) -> Result<(), PostingError> {
        if !document.status.can_accept_payment() {
            return Err(PostingError::validation(format!(
                "cannot record a payment against a document in status {:?}",
                document.status
            )));
        }
        if request.amount.currency() != document.currency {
            return Err(PostingError::validation(format!(
                "payment currency {} does not match document currency {}; \
                 cross-currency payment is not supported",
                request.amount.currency(),
                document.currency
            )));
        }
        if !request.amount.is_positive() {
            return Err(PostingError::validation(
                "payment amount must be positive",
            ));
        }
        if request.amount.amount() > document.balance.amount() + reconciliation_tolerance() {
            return Err(PostingError::validation(format!(
                "payment {} exceeds outstanding balance {}",
                request.amount, document.balance
            )));
        }
        if request.transaction_date < document.document_date {
            return Err(PostingError::validation(format!(
                "transaction date {} precedes document date {}",
                request.transaction_date, document.document_date
            )));
        }
        if !period.accepts(request.transaction_date) {
            return Err(PostingError::validation(format!(
                "transaction date {} is outside the open financial period",
                request.transaction_date
            )));
        }

        let mut split_total = Money::zero(document.currency);
        let mut any_positive = false;
        for (name, part) in request.split.parts() {
            let Some(amount) = part else { continue };
            if amount.currency() != document.currency {
                return Err(PostingError::validation(format!(
                    "{name} sub-amount currency {} does not match document currency {}",
                    amount.currency(),
                    document.currency
                )));
            }
            if amount.is_negative() {
                return Err(PostingError::validation(format!(
                    "{name} sub-amount must not be negative"
                )));
            }
            any_positive |= amount.is_positive();
            split_total = split_total.checked_add(amount)?;
        }
        if !any_positive {
            return Err(PostingError::validation(
                "payment requires at least one non-zero funding source",
            ));
        }
        if !split_total.reconciles_with(&request.amount)? {
            return Err(PostingError::validation(format!(
                "funding sources sum to {split_total} but the payment amount is {}",
                request.amount
            )));
        }
        Ok(())
    }

    /// Capacity checks that need store state: deposit and loyalty balances
    /// are held in system currency and converted into document currency at
    /// the document's stored rate before comparison.
    async fn check_capacities(
        tx: &mut dyn PostingTx,
        ctx: TenantContext,
        document: &Document,
        split: &FundingSplit,
    ) -> Result<(), PostingError> {
        let tolerance = reconciliation_tolerance();
        let rate = document.exchange_rate.value();

        if let Some(deposit) = &split.deposit {
            if deposit.is_positive() {
                let balance = tx
                    .deposit_balance(ctx.tenant_id, document.customer_id)
                    .await?;
                let capacity = balance / rate;
                if deposit.amount() > capacity + tolerance {
                    return Err(PostingError::validation(format!(
                        "deposit sub-amount {deposit} exceeds available deposit capacity {capacity}"
                    )));
                }
            }
        }
        if let Some(loyalty) = &split.loyalty {
            if loyalty.is_positive() {
                let balance = tx
                    .loyalty_balance(ctx.tenant_id, document.customer_id)
                    .await?;
                let capacity = balance / rate;
                if loyalty.amount() > capacity + tolerance {
                    return Err(PostingError::validation(format!(
                        "loyalty sub-amount {loyalty} exceeds available loyalty capacity {capacity}"
                    )));
                }
            }
        }
        if let Some(withholding) = &split.withholding {
            if withholding.amount() > document.withholding_total.amount() + tolerance {
                return Err(PostingError::validation(format!(
                    "withholding sub-amount {withholding} exceeds document withholding {}",
                    document.withholding_total
                )));
            }
        }
        Ok(())
    }

    /// Per-line allocation checks against historically derived paid amounts
    async fn check_allocations(
        tx: &mut dyn PostingTx,
        ctx: TenantContext,
        document: &Document,
        request: &PaymentRequest,
    ) -> Result<(), PostingError> {
        let tolerance = reconciliation_tolerance();
        let mut allocated = Money::zero(document.currency);

        for allocation in &request.allocations {
            let line = document
                .lines
                .iter()
                .find(|l| l.id == allocation.document_line_id)
                .ok_or_else(|| {
                    PostingError::validation(format!(
                        "allocation targets line {} which is not on this document",
                        allocation.document_line_id
                    ))
                })?;
            if !allocation.amount.is_positive() {
                return Err(PostingError::validation(
                    "line allocations must be positive",
                ));
            }
            if allocation.amount.currency() != document.currency {
                return Err(PostingError::validation(
                    "line allocation currency must match the document currency",
                ));
            }

            let prior = tx
                .paid_against_line(ctx.tenant_id, line.id)
                .await?;
            if prior + allocation.amount.amount() > line.line_total.amount() + tolerance {
                return Err(PostingError::validation(format!(
                    "allocation of {} to line {} exceeds its total {} ({} already paid)",
                    allocation.amount, line.id, line.line_total, prior
                )));
            }
            allocated = allocated.checked_add(&allocation.amount)?;
        }

        if allocated.amount() > request.amount.amount() + tolerance {
            return Err(PostingError::validation(format!(
                "line allocations sum to {allocated}, more than the payment amount {}",
                request.amount
            )));
        }
        Ok(())
    }

    /// One debit per consumed source, one gross credit to the receivable
    fn build_settlement_group(
        document: &Document,
        ctx: TenantContext,
        accounts: &AccountLinks,
        tax_codes: &HashMap<TaxCodeId, TaxCode>,
        request: &PaymentRequest,
        receipt_id: ReceiptId,
    ) -> Result<Vec<LedgerEntry>, PostingError> {
        let mut group = PostingGroup::new(
            ctx,
            document.exchange_rate,
            request.transaction_date,
            "receipt",
            *receipt_id.as_uuid(),
        );

        if let Some(cash) = &request.split.payment {
            if cash.amount.is_positive() {
                group = group.debit_memo(
                    cash.payment_type.account,
                    cash.amount,
                    format!("settlement via {}", cash.payment_type.name),
                );
            }
        }
        if let Some(deposit) = &request.split.deposit {
            if deposit.is_positive() {
                group = group.debit_memo(
                    accounts.customer_deposits,
                    *deposit,
                    "settlement from customer deposit",
                );
            }
        }
        if let Some(loyalty) = &request.split.loyalty {
            if loyalty.is_positive() {
                group = group.debit_memo(
                    accounts.loyalty_points,
                    *loyalty,
                    "settlement from loyalty points",
                );
            }
        }
        if let Some(withholding) = &request.split.withholding {
            if withholding.is_positive() {
                for (code_id, portion) in split_withholding(document, withholding)? {
                    let code = tax_codes.get(&code_id).ok_or_else(|| {
                        PostingError::configuration(format!(
                            "withholding tax code {code_id} has no linked account"
                        ))
                    })?;
                    group = group.debit_memo(
                        code.withholding_account,
                        portion,
                        format!("withholding settled ({})", code.name),
                    );
                }
            }
        }

        group = group.credit_memo(
            accounts.accounts_receivable,
            request.amount,
            format!("settlement of {}", document.reference),
        );

        Ok(group.post()?)
    }

    /// Receivable and source balances, all in system currency
    async fn settle_balances(
        tx: &mut dyn PostingTx,
        ctx: TenantContext,
        document: &Document,
        request: &PaymentRequest,
    ) -> Result<(), PostingError> {
        let rate = document.exchange_rate.value();

        tx.adjust_customer_debt(
            ctx.tenant_id,
            document.customer_id,
            -(request.amount.amount() * rate),
        )
        .await?;

        if let Some(deposit) = &request.split.deposit {
            if deposit.is_positive() {
                tx.adjust_deposit(
                    ctx.tenant_id,
                    document.customer_id,
                    -(deposit.amount() * rate),
                )
                .await?;
            }
        }
        if let Some(loyalty) = &request.split.loyalty {
            if loyalty.is_positive() {
                tx.adjust_loyalty(
                    ctx.tenant_id,
                    document.customer_id,
                    -(loyalty.amount() * rate),
                )
                .await?;
            }
        }
        Ok(())
    }

    async fn build_receipt(
        tx: &mut dyn PostingTx,
        ctx: TenantContext,
        actor: &Actor,
        document: &Document,
        request: &PaymentRequest,
        receipt_id: ReceiptId,
    ) -> Result<Receipt, PostingError> {
        let max = tx
            .max_reference_suffix(ctx.tenant_id, SequenceKind::Receipt)
            .await?;
        let reference = next_reference(SequenceKind::Receipt, request.transaction_date, max);

        let zero = Money::zero(document.currency);
        let lines = request
            .allocations
            .iter()
            .map(|allocation| ReceiptLine {
                id: ReceiptLineId::new_v7(),
                receipt_id,
                document_line_id: allocation.document_line_id,
                amount: allocation.amount,
            })
            .collect();

        Ok(Receipt {
            id: receipt_id,
            tenant_id: ctx.tenant_id,
            reference,
            document_id: document.id,
            customer_id: document.customer_id,
            receipt_date: request.transaction_date,
            currency: document.currency,
            exchange_rate: document.exchange_rate,
            amount: request.amount,
            payment_type_id: request.split.payment.as_ref().map(|p| p.payment_type.id),
            payment_type_amount: request
                .split
                .payment
                .as_ref()
                .map_or(zero, |p| p.amount),
            deposit_amount: request.split.deposit.unwrap_or(zero),
            loyalty_amount: request.split.loyalty.unwrap_or(zero),
            withholding_amount: request.split.withholding.unwrap_or(zero),
            lines,
            created_by: actor.clone(),
            created_at: chrono::Utc::now(),
        })
    }
}

/// Splits a requested withholding amount across the document's tax codes,
/// greedily in line order, each code capped at its own withheld total
fn split_withholding(
    document: &Document,
    requested: &Money,
) -> Result<Vec<(TaxCodeId, Money)>, PostingError> {
    let mut remaining = requested.amount();
    let mut portions = Vec::new();

    for (code_id, code_total) in withholding_by_code(document) {
        if remaining <= Decimal::ZERO {
            break;
        }
        let take = remaining.min(code_total.amount());
        portions.push((code_id, Money::new(take, requested.currency())));
        remaining -= take;
    }

    if remaining > reconciliation_tolerance() {
        return Err(PostingError::validation(format!(
            "withholding sub-amount {requested} exceeds the document's withheld total"
        )));
    }
    Ok(portions)
}
