//! The purchase orchestrator.
//!
//! Turns a purchase intent into a validated charge and exactly one ledger
//! credit:
//!
//! 1. Resolve or create the processor customer for the account.
//! 2. Resolve the payment method (explicit, else the customer default).
//! 3. Resolve the pack against the static catalog.
//! 4. Submit the charge with synchronous confirmation.
//! 5. Record the purchase (keyed by the charge's transaction ID), then
//!    credit the ledger — unless a succeeded record for that charge already
//!    exists, in which case the recorded result is returned untouched.
//!
//! Steps 1-4 are not retried here; a client re-submitting the same request
//! carries the same idempotency key and therefore lands on the same
//! processor transaction. Once a charge is confirmed, the credit step runs
//! on a detached task so client disconnects cannot cancel it, and storage
//! failures are retried before surfacing.

use std::sync::Arc;
use std::time::Duration;

use scout_billing_core::{Email, PackCatalog, PurchaseRecord};
use scout_billing_store::{Store, StoreError};

use crate::gateway::{GatewayError, PaymentGateway};

/// Attempts for the ledger credit after a confirmed charge.
const CREDIT_ATTEMPTS: u32 = 3;

/// Backoff step between credit attempts.
const CREDIT_BACKOFF: Duration = Duration::from_millis(50);

/// A validated purchase intent.
#[derive(Debug, Clone)]
pub struct PurchaseArgs {
    /// The purchasing account.
    pub email: Email,
    /// Catalog pack ID or processor price ID.
    pub pack_id: String,
    /// Explicit payment method; the customer default is used when absent.
    pub payment_method_id: Option<String>,
    /// Client-supplied idempotency token. Re-submitting with the same token
    /// reaches the same processor transaction.
    pub request_id: Option<String>,
}

/// The outcome of a successful purchase flow.
#[derive(Debug, Clone)]
pub struct PurchaseResult {
    /// Balance after the credit.
    pub balance: i64,
    /// The purchase record (freshly written, or the prior record when the
    /// charge had already been processed).
    pub record: PurchaseRecord,
    /// Whether this request observed an already-processed charge.
    pub already_processed: bool,
}

/// Errors from the purchase flow.
#[derive(Debug, thiserror::Error)]
pub enum PurchaseError {
    /// The requested pack is not in the catalog.
    #[error("unknown pack: {0}")]
    UnknownPack(String),

    /// The customer has no chargeable payment method.
    #[error("no payment method on file")]
    NoPaymentMethod,

    /// The charge was declined or its outcome is undetermined. No ledger
    /// mutation happened.
    #[error("payment failed: {0}")]
    PaymentFailed(String),

    /// A processor call outside the charge itself failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Ledger or history persistence failed.
    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Drives the multi-step purchase protocol.
pub struct PurchaseOrchestrator {
    store: Arc<dyn Store>,
    gateway: Arc<dyn PaymentGateway>,
    catalog: PackCatalog,
}

impl PurchaseOrchestrator {
    /// Create a new orchestrator.
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        gateway: Arc<dyn PaymentGateway>,
        catalog: PackCatalog,
    ) -> Self {
        Self {
            store,
            gateway,
            catalog,
        }
    }

    /// Execute one purchase intent.
    ///
    /// # Errors
    ///
    /// See `PurchaseError`. Exactly one purchase record is written per
    /// charge attempt that reached the processor.
    pub async fn execute(&self, args: PurchaseArgs) -> Result<PurchaseResult, PurchaseError> {
        // 1. Resolve the processor customer.
        let customer = self.gateway.ensure_customer(&args.email).await?;
        self.store
            .link_processor_customer(&args.email, &customer.id)?;

        // 2. Resolve the payment method to charge.
        let payment_method = match &args.payment_method_id {
            Some(id) => id.clone(),
            None => customer
                .default_payment_method
                .clone()
                .ok_or(PurchaseError::NoPaymentMethod)?,
        };

        // 3. Resolve the pack.
        let pack = self
            .catalog
            .resolve(&args.pack_id)
            .ok_or_else(|| PurchaseError::UnknownPack(args.pack_id.clone()))?
            .clone();

        // 4. Submit the charge.
        let idempotency_key = args
            .request_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let description = format!("{} pack ({} credits)", pack.id, pack.credits_granted);

        let confirmation = match self
            .gateway
            .charge(
                &customer.id,
                &payment_method,
                pack.price_minor_units,
                &description,
                &idempotency_key,
            )
            .await
        {
            Ok(confirmation) => confirmation,
            Err(err) => {
                let reason = match err {
                    GatewayError::Declined { reason } => reason,
                    other => other.to_string(),
                };

                tracing::warn!(
                    email = %args.email,
                    pack = %pack.id,
                    reason = %reason,
                    "Charge failed"
                );

                let record =
                    PurchaseRecord::failed(args.email.clone(), &pack, None, reason.clone());
                if let Err(store_err) = self.store.put_purchase(&record) {
                    tracing::error!(
                        email = %args.email,
                        error = %store_err,
                        "Failed to persist failed-purchase record"
                    );
                }

                return Err(PurchaseError::PaymentFailed(reason));
            }
        };

        tracing::info!(
            email = %args.email,
            pack = %pack.id,
            charge_id = %confirmation.charge_id,
            amount_minor = %confirmation.amount_minor,
            "Charge confirmed"
        );

        // 5. Idempotency check: a retried request that landed on an
        // already-processed charge returns the recorded result.
        if let Some(existing) = self.store.find_purchase_by_charge(&confirmation.charge_id)? {
            if existing.outcome.is_succeeded() {
                tracing::info!(
                    email = %args.email,
                    charge_id = %confirmation.charge_id,
                    "Charge already processed, skipping credit"
                );
                let balance = self.store.balance(&args.email)?;
                return Ok(PurchaseResult {
                    balance,
                    record: existing,
                    already_processed: true,
                });
            }
        }

        // 6. Record, then credit. Runs detached: a client disconnect after
        // the confirmed charge must not cancel the credit.
        let store = Arc::clone(&self.store);
        let email = args.email.clone();
        let charge_id = confirmation.charge_id.clone();
        let finalize = tokio::spawn(async move {
            let record = PurchaseRecord::succeeded(email.clone(), &pack, charge_id);
            store.put_purchase(&record)?;

            let balance = credit_with_retry(&*store, &email, pack.credits_granted).await?;
            Ok::<_, PurchaseError>(PurchaseResult {
                balance,
                record,
                already_processed: false,
            })
        });

        let result = finalize.await.map_err(|join_err| {
            PurchaseError::Storage(StoreError::Database(format!(
                "credit task failed: {join_err}"
            )))
        })??;

        tracing::info!(
            email = %args.email,
            charge_id = %confirmation.charge_id,
            new_balance = %result.balance,
            "Purchase completed"
        );

        Ok(result)
    }
}

/// Credit the ledger, retrying transient storage failures. Losing a credit
/// after a real charge is the worst failure mode in the system, so this
/// never gives up silently.
async fn credit_with_retry(
    store: &dyn Store,
    email: &Email,
    amount: i64,
) -> Result<i64, PurchaseError> {
    let mut last_err = None;

    for attempt in 1..=CREDIT_ATTEMPTS {
        match store.credit(email, amount) {
            Ok(balance) => return Ok(balance),
            Err(err @ (StoreError::Database(_) | StoreError::Serialization(_))) => {
                tracing::warn!(
                    email = %email,
                    attempt,
                    error = %err,
                    "Credit after confirmed charge failed, retrying"
                );
                last_err = Some(err);
                tokio::time::sleep(CREDIT_BACKOFF * attempt).await;
            }
            Err(err) => return Err(err.into()),
        }
    }

    let err = last_err.unwrap_or_else(|| StoreError::Database("credit failed".into()));
    tracing::error!(
        email = %email,
        amount,
        error = %err,
        "Credit exhausted retries; purchase record retained for reconciliation"
    );
    Err(err.into())
}
