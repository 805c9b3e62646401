//! Document and payment status enums

use std::fmt;

use serde::{Deserialize, Serialize};

use core_kernel::{reconciliation_tolerance, Money};

/// Lifecycle status of a sales document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Being drafted; the only status in which lines may be replaced
    Draft,
    /// Sent to the customer, awaiting approval
    Sent,
    /// Approved; ledger entries exist for it
    Approved,
    /// Rejected with a reason
    Rejected,
    /// Cancelled with a reason; payments must be reversed first
    Cancelled,
    /// Fully paid, derived when balance reaches zero
    Paid,
    /// Partially paid
    Partial,
    /// Past due date and still collectible. Never stored - derived on read.
    Overdue,
}

impl DocumentStatus {
    /// Statuses from which approval may proceed
    pub fn can_approve(&self) -> bool {
        matches!(self, DocumentStatus::Draft | DocumentStatus::Sent)
    }

    /// Statuses from which rejection may proceed
    pub fn can_reject(&self) -> bool {
        matches!(self, DocumentStatus::Draft | DocumentStatus::Sent)
    }

    /// Statuses from which cancellation may proceed. Paid documents must
    /// have their payments reversed first; rejected and cancelled are final.
    pub fn can_cancel(&self) -> bool {
        matches!(
            self,
            DocumentStatus::Draft
                | DocumentStatus::Sent
                | DocumentStatus::Approved
                | DocumentStatus::Partial
        )
    }

    /// Statuses that accept payments
    pub fn can_accept_payment(&self) -> bool {
        matches!(self, DocumentStatus::Approved | DocumentStatus::Partial)
    }

    /// Whether the overdue re-derivation applies to this stored status
    pub fn ages_into_overdue(&self) -> bool {
        matches!(
            self,
            DocumentStatus::Draft
                | DocumentStatus::Sent
                | DocumentStatus::Approved
                | DocumentStatus::Partial
        )
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::Sent => "sent",
            DocumentStatus::Approved => "approved",
            DocumentStatus::Rejected => "rejected",
            DocumentStatus::Cancelled => "cancelled",
            DocumentStatus::Paid => "paid",
            DocumentStatus::Partial => "partial",
            DocumentStatus::Overdue => "overdue",
        };
        f.write_str(name)
    }
}

/// How much of the document has been collected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Unpaid,
    Partial,
    Paid,
    Overpaid,
}

impl PaymentStatus {
    /// Derives the payment status from total and paid amounts.
    ///
    /// Comparisons use the reconciliation tolerance so conversion residue
    /// never strands a document one sub-cent away from `Paid`.
    pub fn derive(total: &Money, paid: &Money) -> Self {
        let tolerance = reconciliation_tolerance();
        let paid_amt = paid.amount();
        let total_amt = total.amount();

        if paid_amt <= tolerance {
            PaymentStatus::Unpaid
        } else if paid_amt > total_amt + tolerance {
            PaymentStatus::Overpaid
        } else if (total_amt - paid_amt).abs() <= tolerance {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Partial
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Overpaid => "overpaid",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    fn usd(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount, Currency::USD)
    }

    #[test]
    fn payment_status_derivation() {
        let total = usd(dec!(1100));
        assert_eq!(
            PaymentStatus::derive(&total, &usd(dec!(0))),
            PaymentStatus::Unpaid
        );
        assert_eq!(
            PaymentStatus::derive(&total, &usd(dec!(500))),
            PaymentStatus::Partial
        );
        assert_eq!(
            PaymentStatus::derive(&total, &usd(dec!(1100))),
            PaymentStatus::Paid
        );
        assert_eq!(
            PaymentStatus::derive(&total, &usd(dec!(1099.995))),
            PaymentStatus::Paid
        );
        assert_eq!(
            PaymentStatus::derive(&total, &usd(dec!(1100.50))),
            PaymentStatus::Overpaid
        );
    }

    #[test]
    fn approval_guards() {
        assert!(DocumentStatus::Draft.can_approve());
        assert!(DocumentStatus::Sent.can_approve());
        assert!(!DocumentStatus::Approved.can_approve());
        assert!(!DocumentStatus::Paid.can_approve());
        assert!(!DocumentStatus::Cancelled.can_approve());
        assert!(!DocumentStatus::Rejected.can_approve());
    }

    #[test]
    fn cancellation_guards() {
        assert!(DocumentStatus::Partial.can_cancel());
        assert!(!DocumentStatus::Paid.can_cancel());
        assert!(!DocumentStatus::Cancelled.can_cancel());
        assert!(!DocumentStatus::Rejected.can_cancel());
    }
}
