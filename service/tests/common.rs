//! Common test utilities for scout-billing integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum_test::TestServer;
use tempfile::TempDir;

use scout_billing_core::{Email, SearchQuery};
use scout_billing_service::enrichment::{EnrichError, SearchBackend};
use scout_billing_service::{
    create_router, AppState, ChargeConfirmation, CustomerRef, GatewayError, PaymentGateway,
    PaymentMethodRef, ServiceConfig,
};
use scout_billing_store::RocksStore;

/// The admin API key used by the test configuration.
pub const ADMIN_KEY: &str = "test-admin-key";

/// In-process payment gateway with scriptable behavior.
///
/// Charge IDs are derived from the idempotency key, mirroring how the real
/// processor collapses re-submitted requests onto one transaction.
pub struct MockGateway {
    /// Default payment method returned on the customer, if any.
    pub default_payment_method: Option<String>,
    /// Methods returned by `list_payment_methods`.
    pub payment_methods: Vec<PaymentMethodRef>,
    /// When set, every charge is declined with this reason.
    pub decline_reason: Option<String>,
    /// When true, every non-charge API call fails.
    pub fail_api: bool,
    /// Number of charge submissions seen.
    pub charges: AtomicUsize,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self {
            default_payment_method: Some("pm_default".into()),
            payment_methods: vec![
                PaymentMethodRef {
                    id: "pm_default".into(),
                    brand: "visa".into(),
                    last4: "4242".into(),
                    exp_month: 4,
                    exp_year: 2030,
                    is_default: true,
                },
                PaymentMethodRef {
                    id: "pm_backup".into(),
                    brand: "mastercard".into(),
                    last4: "4444".into(),
                    exp_month: 9,
                    exp_year: 2028,
                    is_default: false,
                },
            ],
            decline_reason: None,
            fail_api: false,
            charges: AtomicUsize::new(0),
        }
    }
}

impl MockGateway {
    fn api_guard(&self) -> Result<(), GatewayError> {
        if self.fail_api {
            return Err(GatewayError::Api {
                message: "mock API failure".into(),
                code: None,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn ensure_customer(&self, _email: &Email) -> Result<CustomerRef, GatewayError> {
        self.api_guard()?;
        Ok(CustomerRef {
            id: "cus_test".into(),
            default_payment_method: self.default_payment_method.clone(),
        })
    }

    async fn list_payment_methods(
        &self,
        _customer: &CustomerRef,
    ) -> Result<Vec<PaymentMethodRef>, GatewayError> {
        self.api_guard()?;
        Ok(self.payment_methods.clone())
    }

    async fn set_default_payment_method(
        &self,
        _customer_id: &str,
        _payment_method_id: &str,
    ) -> Result<(), GatewayError> {
        self.api_guard()
    }

    async fn detach_payment_method(&self, _payment_method_id: &str) -> Result<(), GatewayError> {
        self.api_guard()
    }

    async fn charge(
        &self,
        _customer_id: &str,
        _payment_method_id: &str,
        amount_minor: i64,
        _description: &str,
        idempotency_key: &str,
    ) -> Result<ChargeConfirmation, GatewayError> {
        self.charges.fetch_add(1, Ordering::SeqCst);

        if let Some(reason) = &self.decline_reason {
            return Err(GatewayError::Declined {
                reason: reason.clone(),
            });
        }

        Ok(ChargeConfirmation {
            charge_id: format!("pi_{idempotency_key}"),
            amount_minor,
        })
    }
}

/// Search backend stub with a fixed response.
pub struct StubSearch {
    /// When set, every search fails with this message.
    pub fail_with: Option<String>,
}

impl StubSearch {
    /// A backend where every search succeeds.
    pub fn succeeding() -> Self {
        Self { fail_with: None }
    }

    /// A backend where every search fails.
    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.into()),
        }
    }
}

#[async_trait]
impl SearchBackend for StubSearch {
    async fn execute(&self, _query: &SearchQuery) -> Result<serde_json::Value, EnrichError> {
        if let Some(message) = &self.fail_with {
            return Err(EnrichError::Api {
                status: 500,
                message: message.clone(),
            });
        }

        Ok(serde_json::json!({"deliverable": true, "score": 97}))
    }
}

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Direct store handle for seeding and asserting ledger state.
    pub store: Arc<RocksStore>,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
    /// The test account for authenticated requests.
    pub email: Email,
}

impl TestHarness {
    /// Harness with a succeeding gateway and a succeeding search backend.
    pub fn new() -> Self {
        Self::with_parts(
            Some(Arc::new(MockGateway::default())),
            Some(Arc::new(StubSearch::succeeding())),
        )
    }

    /// Harness with a custom gateway and the default search backend.
    pub fn with_gateway(gateway: Arc<dyn PaymentGateway>) -> Self {
        Self::with_parts(Some(gateway), Some(Arc::new(StubSearch::succeeding())))
    }

    /// Harness with a custom search backend and the default gateway.
    pub fn with_search(search: Arc<dyn SearchBackend>) -> Self {
        Self::with_parts(Some(Arc::new(MockGateway::default())), Some(search))
    }

    /// Harness with full control over the external collaborators.
    pub fn with_parts(
        gateway: Option<Arc<dyn PaymentGateway>>,
        search: Option<Arc<dyn SearchBackend>>,
    ) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = Arc::new(RocksStore::open(temp_dir.path()).expect("Failed to open store"));

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            admin_api_key: Some(ADMIN_KEY.to_string()),
            ..ServiceConfig::default()
        };

        let state = AppState {
            store: Arc::<RocksStore>::clone(&store),
            config,
            gateway,
            search,
        };
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");
        let email: Email = "tester@example.com".parse().unwrap();

        Self {
            server,
            store,
            _temp_dir: temp_dir,
            email,
        }
    }

    /// Get the authorization header for user authentication.
    pub fn user_auth_header(&self) -> String {
        format!("Bearer test-token:{}", self.email)
    }

    /// Seed the test account with credits directly through the ledger.
    pub fn seed_credits(&self, amount: i64) {
        use scout_billing_store::Store;
        self.store.credit(&self.email, amount).unwrap();
    }

    /// Read the test account's balance directly from the ledger.
    pub fn ledger_balance(&self) -> i64 {
        use scout_billing_store::Store;
        self.store.balance(&self.email).unwrap()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
