//! Purchase records for scout-billing.
//!
//! Every purchase attempt produces exactly one record, written once and
//! never mutated. The processor's charge ID doubles as the idempotency key
//! for the credit step: a succeeded record for a charge means the credits
//! for that charge have been granted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CreditPack, Email, PurchaseId};

/// An append-only record of one purchase attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseRecord {
    /// Unique purchase ID (ULID for time-ordering).
    pub id: PurchaseId,

    /// The account the purchase was made for.
    pub email: Email,

    /// Catalog ID of the purchased pack.
    pub pack_id: String,

    /// Amount charged in the currency's smallest unit.
    pub amount_charged_minor: i64,

    /// Credits granted on success (the pack's grant; 0 for failed attempts).
    pub credits_granted: i64,

    /// Processor transaction ID for the charge. `None` when the attempt
    /// failed before a charge object existed.
    pub charge_id: Option<String>,

    /// Final outcome of the attempt.
    pub outcome: PurchaseOutcome,

    /// Processor reason string for failed attempts.
    pub failure_reason: Option<String>,

    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl PurchaseRecord {
    /// Record for a confirmed charge. Written before the ledger credit so a
    /// retried request can detect the already-processed charge.
    #[must_use]
    pub fn succeeded(email: Email, pack: &CreditPack, charge_id: String) -> Self {
        Self {
            id: PurchaseId::generate(),
            email,
            pack_id: pack.id.clone(),
            amount_charged_minor: pack.price_minor_units,
            credits_granted: pack.credits_granted,
            charge_id: Some(charge_id),
            outcome: PurchaseOutcome::Succeeded,
            failure_reason: None,
            created_at: Utc::now(),
        }
    }

    /// Record for a failed attempt (declined, expired, unreachable).
    #[must_use]
    pub fn failed(
        email: Email,
        pack: &CreditPack,
        charge_id: Option<String>,
        reason: String,
    ) -> Self {
        Self {
            id: PurchaseId::generate(),
            email,
            pack_id: pack.id.clone(),
            amount_charged_minor: pack.price_minor_units,
            credits_granted: 0,
            charge_id,
            outcome: PurchaseOutcome::Failed,
            failure_reason: Some(reason),
            created_at: Utc::now(),
        }
    }
}

/// Outcome of a purchase attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOutcome {
    /// Charge confirmed and credits granted.
    Succeeded,

    /// Charge declined or the processor was unreachable; no credits.
    Failed,
}

impl PurchaseOutcome {
    /// Whether this outcome granted credits.
    #[must_use]
    pub const fn is_succeeded(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}
