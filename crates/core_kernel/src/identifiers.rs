//! Strongly-typed identifiers for domain entities
//!
//! Newtype wrappers around UUIDs prevent accidental mixing of identifier
//! types (a `CustomerId` can never be passed where a `DocumentId` belongs).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates a new time-ordered identifier (v7)
            pub fn new_v7() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates from an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Returns the identifier prefix for display
            pub fn prefix() -> &'static str {
                $prefix
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                // Strip prefix if present
                let uuid_str = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(uuid_str)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

// Tenancy
define_id!(TenantId, "TEN");
define_id!(UserId, "USR");

// Documents
define_id!(DocumentId, "DOC");
define_id!(DocumentLineId, "DOCL");

// Ledger
define_id!(LedgerAccountId, "ACC");
define_id!(LedgerEntryId, "ENT");
define_id!(PostingGroupId, "GRP");

// Payments
define_id!(ReceiptId, "RCP");
define_id!(ReceiptLineId, "RCPL");
define_id!(PaymentTypeId, "PAYT");

// Master data references
define_id!(CustomerId, "CUS");
define_id!(StoreId, "STR");
define_id!(ProductId, "PRD");
define_id!(TaxCodeId, "TAX");
define_id!(PeriodId, "PER");
define_id!(StockMovementId, "MOV");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_id_display_carries_prefix() {
        let id = DocumentId::new();
        assert!(id.to_string().starts_with("DOC-"));
    }

    #[test]
    fn id_round_trips_through_string() {
        let original = TenantId::new();
        let parsed: TenantId = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn uuid_conversion() {
        let uuid = Uuid::new_v4();
        let id = ReceiptId::from(uuid);
        let back: Uuid = id.into();
        assert_eq!(uuid, back);
    }
}
