//! Explicit request context
//!
//! Everything the posting engine needs to know about "who" and "for which
//! tenant" travels in these structs. They are built at the boundary (from
//! request middleware) and passed down as plain parameters, keeping the core
//! free of ambient lookups.

use serde::{Deserialize, Serialize};

use crate::identifiers::{TenantId, UserId};
use crate::money::Currency;

/// The tenant a request operates on, plus that tenant's reporting currency.
///
/// Reference sequences, documents, and ledger entries never cross tenant
/// boundaries; every store query is scoped by `tenant_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantContext {
    pub tenant_id: TenantId,
    /// System (reporting) currency all equivalent amounts are expressed in
    pub system_currency: Currency,
}

impl TenantContext {
    pub fn new(tenant_id: TenantId, system_currency: Currency) -> Self {
        Self {
            tenant_id,
            system_currency,
        }
    }
}

/// The authenticated actor performing an operation
///
/// Used to stamp created/approved/rejected/cancelled fields. Authentication
/// itself happens upstream; the engine only records identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub display_name: String,
}

impl Actor {
    pub fn new(id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
        }
    }
}
