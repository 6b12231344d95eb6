//! Integration tests for Copper Kettle admin.
//!
//! # Running Tests
//!
//! ```bash
//! # Migrate and start the admin server against a scratch database
//! cargo run -p copper-kettle-cli -- migrate
//! cargo run -p copper-kettle-admin
//!
//! # Run the ignored HTTP tests
//! cargo test -p copper-kettle-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `ADMIN_BASE_URL` - Admin server URL (default: `http://localhost:3001`)
//! - `ADMIN_DATABASE_URL` - Same database the server uses (falls back to `DATABASE_URL`)

use reqwest::Client;
use rust_decimal::Decimal;
use secrecy::SecretString;
use sqlx::PgPool;
use uuid::Uuid;

use copper_kettle_admin::db::{self, DiscountFields, DiscountRepository};
use copper_kettle_core::{
    Discount, DiscountScope, DiscountStatus, DiscountType, OrderId, ProductCondition,
};

/// Shared handles for a test.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
    pub pool: PgPool,
}

impl TestContext {
    /// Connect to the admin server and its database.
    ///
    /// # Panics
    ///
    /// Panics if the database URL is missing or unreachable.
    pub async fn new() -> Self {
        let base_url = std::env::var("ADMIN_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3001".to_string());
        let database_url = std::env::var("ADMIN_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .map(SecretString::from)
            .expect("ADMIN_DATABASE_URL or DATABASE_URL must be set");

        let client = Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client");
        let pool = db::create_pool(&database_url)
            .await
            .expect("Failed to connect to admin database");

        Self {
            client,
            base_url,
            pool,
        }
    }

    /// Absolute URL for an admin path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Insert a discount with a unique code.
    ///
    /// # Panics
    ///
    /// Panics if the insert fails.
    pub async fn create_discount(&self, discount_type: DiscountType, amount: Decimal) -> Discount {
        let fields = DiscountFields {
            name: "Integration Test".to_string(),
            code: unique_code(),
            discount_type,
            amount,
            product_reqs: Vec::new(),
            excluded_products: Vec::new(),
            product_condition: ProductCondition::All,
            scope: DiscountScope::Global,
            start_date: None,
            end_date: None,
            max_uses: None,
            min_cart_price: None,
            status: DiscountStatus::Active,
            once_per_customer: false,
        };

        DiscountRepository::new(&self.pool)
            .create(&fields)
            .await
            .expect("Failed to create test discount")
    }
}

/// A discount code no other test run will use.
#[must_use]
pub fn unique_code() -> String {
    format!("IT-{}", Uuid::new_v4().simple()).to_uppercase()
}

/// An order ID unlikely to collide with other test runs.
#[must_use]
pub fn unique_order_id() -> OrderId {
    let n = Uuid::new_v4().as_u128() % 1_000_000_000;
    OrderId::new(i32::try_from(n).unwrap_or(1) + 1)
}
