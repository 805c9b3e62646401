//! The sales document aggregate

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use core_kernel::{
    Actor, Currency, CustomerId, DocumentId, ExchangeRate, Money, PeriodId, StoreId, TenantContext,
    TenantId,
};

use crate::error::DocumentError;
use crate::line::{DocumentLine, NewLine};
use crate::status::{DocumentStatus, PaymentStatus};

/// A tenant-scoped sales document
///
/// `(reference, tenant_id)` is unique per tenant, not globally: two tenants
/// may legally hold the same reference number. All money fields are in the
/// document currency except `equivalent_amount`, which is the total
/// converted into system currency at `exchange_rate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub tenant_id: TenantId,
    /// Gapless per-tenant reference, e.g. INV-20260310-0042
    pub reference: String,
    pub customer_id: CustomerId,
    pub store_id: StoreId,
    pub currency: Currency,
    pub exchange_rate: ExchangeRate,
    pub period_id: PeriodId,
    pub document_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: DocumentStatus,
    pub payment_status: PaymentStatus,
    pub subtotal: Money,
    pub discount_total: Money,
    pub tax_total: Money,
    /// Tracked separately: reduces cash collected, not revenue recognized
    pub withholding_total: Money,
    pub total: Money,
    pub paid: Money,
    pub balance: Money,
    /// `total * exchange_rate` in system currency
    pub equivalent_amount: Money,
    pub lines: Vec<DocumentLine>,
    pub status_reason: Option<String>,
    pub created_by: Actor,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub approved_by: Option<Actor>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_by: Option<Actor>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub cancelled_by: Option<Actor>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Document {
    /// Creates a draft document with its lines
    ///
    /// Totals are derived from the lines immediately; the reference must
    /// already have been issued by the sequence generator.
    #[allow(clippy::too_many_arguments)]
    pub fn draft(
        ctx: TenantContext,
        reference: impl Into<String>,
        customer_id: CustomerId,
        store_id: StoreId,
        currency: Currency,
        exchange_rate: ExchangeRate,
        period_id: PeriodId,
        document_date: NaiveDate,
        due_date: NaiveDate,
        lines: Vec<NewLine>,
        created_by: Actor,
    ) -> Result<Self, DocumentError> {
        if due_date < document_date {
            return Err(DocumentError::DueBeforeDocumentDate {
                due: due_date.to_string(),
                doc: document_date.to_string(),
            });
        }

        let now = Utc::now();
        let mut document = Self {
            id: DocumentId::new_v7(),
            tenant_id: ctx.tenant_id,
            reference: reference.into(),
            customer_id,
            store_id,
            currency,
            exchange_rate,
            period_id,
            document_date,
            due_date,
            status: DocumentStatus::Draft,
            payment_status: PaymentStatus::Unpaid,
            subtotal: Money::zero(currency),
            discount_total: Money::zero(currency),
            tax_total: Money::zero(currency),
            withholding_total: Money::zero(currency),
            total: Money::zero(currency),
            paid: Money::zero(currency),
            balance: Money::zero(currency),
            equivalent_amount: Money::zero(ctx.system_currency),
            lines: Vec::new(),
            status_reason: None,
            created_by,
            created_at: now,
            updated_at: now,
            sent_at: None,
            approved_by: None,
            approved_at: None,
            rejected_by: None,
            rejected_at: None,
            cancelled_by: None,
            cancelled_at: None,
        };
        document.set_lines(ctx.system_currency, lines)?;
        Ok(document)
    }

    /// Replaces all lines. Only draft documents may be edited.
    pub fn replace_lines(
        &mut self,
        system_currency: Currency,
        lines: Vec<NewLine>,
    ) -> Result<(), DocumentError> {
        if self.status != DocumentStatus::Draft {
            return Err(DocumentError::EditForbidden(self.status));
        }
        self.set_lines(system_currency, lines)
    }

    fn set_lines(
        &mut self,
        system_currency: Currency,
        lines: Vec<NewLine>,
    ) -> Result<(), DocumentError> {
        if lines.is_empty() {
            return Err(DocumentError::EmptyLines);
        }
        let built = lines
            .into_iter()
            .map(DocumentLine::from_new)
            .collect::<Result<Vec<_>, _>>()?;

        for line in &built {
            if line.unit_price.currency() != self.currency {
                return Err(DocumentError::InvalidLine(format!(
                    "line currency {} differs from document currency {}",
                    line.unit_price.currency(),
                    self.currency
                )));
            }
        }

        self.lines = built;
        self.recompute_totals(system_currency)?;
        Ok(())
    }

    /// Re-derives the monetary set from the lines.
    ///
    /// Callers that mutate lines or payments must leave the document with
    /// `balance = total - paid` holding; this is the single place totals
    /// come from.
    pub fn recompute_totals(&mut self, system_currency: Currency) -> Result<(), DocumentError> {
        let zero = Money::zero(self.currency);
        let mut subtotal = zero;
        let mut discount = zero;
        let mut tax = zero;
        let mut withholding = zero;

        for line in &self.lines {
            subtotal = subtotal.checked_add(&line.gross_amount())?;
            discount = discount.checked_add(&line.discount_amount)?;
            tax = tax.checked_add(&line.tax_amount)?;
            withholding = withholding.checked_add(&line.withholding_amount)?;
        }

        self.subtotal = subtotal;
        self.discount_total = discount;
        self.tax_total = tax;
        self.withholding_total = withholding;
        self.total = subtotal.checked_sub(&discount)?.checked_add(&tax)?;
        self.balance = self.total.checked_sub(&self.paid)?;
        self.equivalent_amount = self.exchange_rate.convert(&self.total, system_currency);
        self.payment_status = PaymentStatus::derive(&self.total, &self.paid);
        Ok(())
    }

    /// The status as presented to readers: past-due collectible documents
    /// surface as `Overdue` without any background sweep.
    pub fn effective_status(&self, today: NaiveDate) -> DocumentStatus {
        if self.status.ages_into_overdue() && self.due_date < today {
            DocumentStatus::Overdue
        } else {
            self.status
        }
    }

    /// draft -> sent; timestamp and actor stamping only, no side effects
    pub fn send(&mut self, actor: &Actor) -> Result<(), DocumentError> {
        if self.status != DocumentStatus::Draft {
            return Err(DocumentError::InvalidTransition {
                from: self.status,
                to: DocumentStatus::Sent,
            });
        }
        self.status = DocumentStatus::Sent;
        self.sent_at = Some(Utc::now());
        self.touch(actor);
        Ok(())
    }

    /// Marks the document approved. Called by the approval orchestrator
    /// after stock and ledger effects succeed inside its unit of work.
    pub fn mark_approved(&mut self, actor: &Actor) -> Result<(), DocumentError> {
        if !self.status.can_approve() {
            return Err(DocumentError::InvalidTransition {
                from: self.status,
                to: DocumentStatus::Approved,
            });
        }
        self.status = DocumentStatus::Approved;
        self.approved_by = Some(actor.clone());
        self.approved_at = Some(Utc::now());
        self.touch(actor);
        debug!(document = %self.id, reference = %self.reference, "document approved");
        Ok(())
    }

    /// Rejects the document with a mandatory reason
    pub fn reject(&mut self, actor: &Actor, reason: &str) -> Result<(), DocumentError> {
        if reason.trim().is_empty() {
            return Err(DocumentError::ReasonRequired("reject"));
        }
        if !self.status.can_reject() {
            return Err(DocumentError::InvalidTransition {
                from: self.status,
                to: DocumentStatus::Rejected,
            });
        }
        self.status = DocumentStatus::Rejected;
        self.status_reason = Some(reason.trim().to_string());
        self.rejected_by = Some(actor.clone());
        self.rejected_at = Some(Utc::now());
        self.touch(actor);
        Ok(())
    }

    /// Cancels the document with a mandatory reason.
    ///
    /// Forbidden once any payment has fully settled the document: payments
    /// must be reversed before cancellation, whatever reason is supplied.
    pub fn cancel(&mut self, actor: &Actor, reason: &str) -> Result<(), DocumentError> {
        if reason.trim().is_empty() {
            return Err(DocumentError::ReasonRequired("cancel"));
        }
        if self.status == DocumentStatus::Paid || self.payment_status == PaymentStatus::Paid {
            return Err(DocumentError::CancelPaid);
        }
        if !self.status.can_cancel() {
            return Err(DocumentError::InvalidTransition {
                from: self.status,
                to: DocumentStatus::Cancelled,
            });
        }
        self.status = DocumentStatus::Cancelled;
        self.status_reason = Some(reason.trim().to_string());
        self.cancelled_by = Some(actor.clone());
        self.cancelled_at = Some(Utc::now());
        self.touch(actor);
        Ok(())
    }

    /// Applies a committed payment amount to the monetary set.
    ///
    /// `paid` and `balance` are updated together and the status is
    /// re-derived: zero balance flips the document to `Paid`, anything
    /// outstanding leaves it `Partial`.
    pub fn apply_payment(&mut self, amount: &Money, actor: &Actor) -> Result<(), DocumentError> {
        if !self.status.can_accept_payment() {
            return Err(DocumentError::InvalidTransition {
                from: self.status,
                to: DocumentStatus::Partial,
            });
        }
        self.paid = self.paid.checked_add(amount)?;
        self.balance = self.total.checked_sub(&self.paid)?;
        self.payment_status = PaymentStatus::derive(&self.total, &self.paid);
        self.status = match self.payment_status {
            PaymentStatus::Paid | PaymentStatus::Overpaid => DocumentStatus::Paid,
            _ => DocumentStatus::Partial,
        };
        self.touch(actor);
        Ok(())
    }

    fn touch(&mut self, _actor: &Actor) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{ProductId, UserId};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn ctx() -> TenantContext {
        TenantContext::new(TenantId::new(), Currency::USD)
    }

    fn actor() -> Actor {
        Actor::new(UserId::new(), "Test Clerk")
    }

    fn usd(amount: Decimal) -> Money {
        Money::new(amount, Currency::USD)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn line(quantity: Decimal, unit_price: Decimal, tax: Decimal) -> NewLine {
        NewLine {
            product_id: ProductId::new(),
            description: "Item".to_string(),
            quantity,
            unit_price: usd(unit_price),
            discount_amount: usd(dec!(0)),
            tax_amount: usd(tax),
            withholding_amount: usd(dec!(0)),
            withholding_tax_code: None,
        }
    }

    fn draft_with(lines: Vec<NewLine>) -> Document {
        Document::draft(
            ctx(),
            "INV-20260310-0001",
            CustomerId::new(),
            StoreId::new(),
            Currency::USD,
            ExchangeRate::identity(),
            PeriodId::new(),
            date(2026, 3, 10),
            date(2026, 4, 10),
            lines,
            actor(),
        )
        .unwrap()
    }

    #[test]
    fn totals_derive_from_lines() {
        let doc = draft_with(vec![line(dec!(10), dec!(100), dec!(100))]);
        assert_eq!(doc.subtotal.amount(), dec!(1000));
        assert_eq!(doc.tax_total.amount(), dec!(100));
        assert_eq!(doc.total.amount(), dec!(1100));
        assert_eq!(doc.balance.amount(), dec!(1100));
        assert_eq!(doc.equivalent_amount.amount(), dec!(1100));
    }

    #[test]
    fn empty_lines_rejected() {
        let result = Document::draft(
            ctx(),
            "INV-20260310-0002",
            CustomerId::new(),
            StoreId::new(),
            Currency::USD,
            ExchangeRate::identity(),
            PeriodId::new(),
            date(2026, 3, 10),
            date(2026, 4, 10),
            vec![],
            actor(),
        );
        assert!(matches!(result, Err(DocumentError::EmptyLines)));
    }

    #[test]
    fn line_replacement_only_in_draft() {
        let mut doc = draft_with(vec![line(dec!(1), dec!(50), dec!(0))]);
        doc.send(&actor()).unwrap();
        doc.mark_approved(&actor()).unwrap();

        let result = doc.replace_lines(Currency::USD, vec![line(dec!(2), dec!(50), dec!(0))]);
        assert!(matches!(result, Err(DocumentError::EditForbidden(_))));
    }

    #[test]
    fn double_approval_rejected() {
        let mut doc = draft_with(vec![line(dec!(1), dec!(50), dec!(0))]);
        doc.mark_approved(&actor()).unwrap();
        assert!(matches!(
            doc.mark_approved(&actor()),
            Err(DocumentError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn reject_requires_reason() {
        let mut doc = draft_with(vec![line(dec!(1), dec!(50), dec!(0))]);
        assert!(matches!(
            doc.reject(&actor(), "   "),
            Err(DocumentError::ReasonRequired("reject"))
        ));
        doc.reject(&actor(), "pricing dispute").unwrap();
        assert_eq!(doc.status, DocumentStatus::Rejected);
        assert_eq!(doc.status_reason.as_deref(), Some("pricing dispute"));
    }

    #[test]
    fn cancel_paid_document_rejected_regardless_of_reason() {
        let mut doc = draft_with(vec![line(dec!(1), dec!(100), dec!(0))]);
        doc.mark_approved(&actor()).unwrap();
        doc.apply_payment(&usd(dec!(100)), &actor()).unwrap();
        assert_eq!(doc.status, DocumentStatus::Paid);

        assert!(matches!(
            doc.cancel(&actor(), "customer changed their mind"),
            Err(DocumentError::CancelPaid)
        ));
    }

    #[test]
    fn partial_payment_sets_partial_status() {
        let mut doc = draft_with(vec![line(dec!(10), dec!(100), dec!(100))]);
        doc.mark_approved(&actor()).unwrap();
        doc.apply_payment(&usd(dec!(500)), &actor()).unwrap();

        assert_eq!(doc.status, DocumentStatus::Partial);
        assert_eq!(doc.payment_status, PaymentStatus::Partial);
        assert_eq!(doc.balance.amount(), dec!(600));
    }

    #[test]
    fn balance_reaching_zero_flips_to_paid() {
        let mut doc = draft_with(vec![line(dec!(10), dec!(100), dec!(100))]);
        doc.mark_approved(&actor()).unwrap();
        doc.apply_payment(&usd(dec!(500)), &actor()).unwrap();
        doc.apply_payment(&usd(dec!(600)), &actor()).unwrap();

        assert_eq!(doc.status, DocumentStatus::Paid);
        assert_eq!(doc.payment_status, PaymentStatus::Paid);
        assert!(doc.balance.is_zero());
    }

    #[test]
    fn overdue_is_derived_not_stored() {
        let mut doc = draft_with(vec![line(dec!(1), dec!(100), dec!(0))]);
        doc.mark_approved(&actor()).unwrap();

        assert_eq!(doc.effective_status(date(2026, 4, 10)), DocumentStatus::Approved);
        assert_eq!(doc.effective_status(date(2026, 4, 11)), DocumentStatus::Overdue);
        // stored status untouched
        assert_eq!(doc.status, DocumentStatus::Approved);
    }

    #[test]
    fn paid_document_never_presents_overdue() {
        let mut doc = draft_with(vec![line(dec!(1), dec!(100), dec!(0))]);
        doc.mark_approved(&actor()).unwrap();
        doc.apply_payment(&usd(dec!(100)), &actor()).unwrap();

        assert_eq!(doc.effective_status(date(2027, 1, 1)), DocumentStatus::Paid);
    }
}
