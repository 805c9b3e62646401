//! Approval orchestration
//!
//! Approving a document is the moment revenue is recognized. Everything
//! happens inside one unit of work: stock validation and decrement, the
//! revenue posting group, denormalized customer statistics, and the status
//! flip. Any critical failure rolls the whole thing back and no ledger
//! entries survive. Loyalty accrual is the one non-critical step; its
//! failure is returned as a warning on the outcome.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, instrument};

use core_kernel::{Actor, DocumentId, FinancialPeriod, Money, TaxCodeId, TenantContext};
use domain_documents::Document;
use domain_ledger::{LedgerEntry, PostingGroup};

use crate::accounts::{AccountLinks, LoyaltyProgram, TaxCode};
use crate::error::PostingError;
use crate::outcome::PostingOutcome;
use crate::ports::{PostingStore, PostingTx};
use crate::stock::StockMovement;

/// Drives the draft/sent -> approved transition
pub struct ApprovalOrchestrator {
    store: Arc<dyn PostingStore>,
}

impl ApprovalOrchestrator {
    pub fn new(store: Arc<dyn PostingStore>) -> Self {
        Self { store }
    }

    /// Approves a document, posting its revenue group
    ///
    /// # Errors
    ///
    /// - [`PostingError::Validation`] for a bad status, a date outside the
    ///   open period, or insufficient stock on any line
    /// - [`PostingError::Configuration`] when a line's withholding tax code
    ///   has no resolved account
    /// - [`PostingError::Internal`] for store failures; the unit of work is
    ///   rolled back in full
    #[instrument(skip_all, fields(tenant = %ctx.tenant_id, document = %document_id))]
    pub async fn approve(
        &self,
        ctx: TenantContext,
        actor: &Actor,
        document_id: DocumentId,
        accounts: &AccountLinks,
        tax_codes: &HashMap<TaxCodeId, TaxCode>,
        period: &FinancialPeriod,
        loyalty: Option<LoyaltyProgram>,
    ) -> Result<(Document, PostingOutcome), PostingError> {
        let mut tx = self.store.begin().await?;
        match Self::approve_in_tx(
            tx.as_mut(),
            ctx,
            actor,
            document_id,
            accounts,
            tax_codes,
            period,
            loyalty,
        )
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

    #[allow(clippy::too_many_arguments)]
    async fn approve_in_tx(
        tx: &mut dyn PostingTx,
        ctx: TenantContext,
        actor: &Actor,
        document_id: DocumentId,
        accounts: &AccountLinks,
        tax_codes: &HashMap<TaxCodeId, TaxCode>,
        period: &FinancialPeriod,
        loyalty: Option<LoyaltyProgram>,
    ) -> Result<(Document, PostingOutcome), PostingError> {
        let mut document = tx
            .find_document_for_update(ctx.tenant_id, document_id)
            .await?
            .ok_or_else(|| PostingError::validation("document not found"))?;

        if !document.status.can_approve() {
            return Err(PostingError::validation(format!(
                "cannot approve a document in status {:?}",
                document.status
            )));
        }
        if !period.accepts(document.document_date) {
            return Err(PostingError::validation(format!(
                "document date {} is outside the open financial period",
                document.document_date
            )));
        }

        // Header totals are re-derived from the lines, never trusted
        document.recompute_totals(ctx.system_currency)?;

        // All stock checks before any decrement, so a failure on line N
        // never leaves lines 1..N-1 decremented even transiently
        for line in &document.lines {
            let on_hand = tx
                .stock_on_hand(ctx.tenant_id, document.store_id, line.product_id)
                .await?;
            if on_hand < line.quantity {
                return Err(PostingError::validation(format!(
                    "insufficient stock for product {}: {} on hand, {} required",
                    line.product_id, on_hand, line.quantity
                )));
            }
        }

        for line in &document.lines {
            tx.adjust_stock(
                ctx.tenant_id,
                document.store_id,
                line.product_id,
                -line.quantity,
            )
            .await?;
            let movement = StockMovement::outbound(
                ctx.tenant_id,
                document.store_id,
                line.product_id,
                document.id,
                line.quantity,
                document.document_date,
            );
            tx.record_stock_movement(&movement).await?;
        }

        let entries = Self::build_revenue_group(&document, ctx, accounts, tax_codes)?;
        tx.append_posting_group(&entries).await?;

        tx.adjust_customer_debt(
            ctx.tenant_id,
            document.customer_id,
            document.equivalent_amount.amount(),
        )
        .await?;

        let mut outcome = PostingOutcome::new(entries.len());
        if let Some(program) = loyalty {
            let points = document.equivalent_amount.amount() * program.points_per_unit;
            if points > Decimal::ZERO {
                if let Err(err) = tx
                    .accrue_loyalty(ctx.tenant_id, document.customer_id, points)
                    .await
                {
                    outcome.warn(format!("loyalty accrual failed: {err}"));
                }
            }
        }

        document.mark_approved(actor)?;
        tx.update_document(&document).await?;

        debug!(
            reference = %document.reference,
            entries = outcome.ledger_entries,
            "document approved and posted"
        );
        Ok((document, outcome))
    }

    /// Builds the revenue posting group for an approval:
    /// debit receivable for the total, credit revenue for subtotal minus
    /// discount, credit tax payable for the tax. Withholding adds a
    /// balanced clearing/payable pair per tax code without touching the
    /// receivable debit, since withholding affects future cash collection
    /// rather than revenue recognition.
    fn build_revenue_group(
        document: &Document,
        ctx: TenantContext,
        accounts: &AccountLinks,
        tax_codes: &HashMap<TaxCodeId, TaxCode>,
    ) -> Result<Vec<LedgerEntry>, PostingError> {
        let mut group = PostingGroup::new(
            ctx,
            document.exchange_rate,
            document.document_date,
            "document",
            *document.id.as_uuid(),
        );

        group = group.debit_memo(
            accounts.accounts_receivable,
            document.total,
            format!("receivable for {}", document.reference),
        );

        let net_revenue = document.subtotal.checked_sub(&document.discount_total)?;
        if net_revenue.is_positive() {
            group = group.credit(accounts.revenue, net_revenue);
        }
        if document.tax_total.is_positive() {
            group = group.credit(accounts.tax_payable, document.tax_total);
        }

        for (code_id, amount) in withholding_by_code(document) {
            let code = tax_codes.get(&code_id).ok_or_else(|| {
                PostingError::configuration(format!(
                    "withholding tax code {code_id} has no linked account"
                ))
            })?;
            group = group
                .debit_memo(
                    accounts.withholding_clearing,
                    amount,
                    format!("withholding receivable ({})", code.name),
                )
                .credit_memo(
                    code.withholding_account,
                    amount,
                    format!("withholding payable ({})", code.name),
                );
        }

        Ok(group.post()?)
    }
}

/// Totals withholding per tax code across the document's lines, preserving
/// first-seen order
pub(crate) fn withholding_by_code(document: &Document) -> Vec<(TaxCodeId, Money)> {
    let mut order: Vec<TaxCodeId> = Vec::new();
    let mut totals: HashMap<TaxCodeId, Money> = HashMap::new();
    for line in &document.lines {
        if !line.has_withholding() {
            continue;
        }
        let Some(code_id) = line.withholding_tax_code else {
            continue;
        };
        match totals.get(&code_id) {
            Some(current) => {
                if let Ok(sum) = current.checked_add(&line.withholding_amount) {
                    totals.insert(code_id, sum);
                }
            }
            None => {
                order.push(code_id);
                totals.insert(code_id, line.withholding_amount);
            }
        }
    }
    order
        .into_iter()
        .filter_map(|id| totals.get(&id).map(|amount| (id, *amount)))
        .collect()
}
