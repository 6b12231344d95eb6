//! Seed the admin database with products and discounts from a YAML file.
//!
//! Discounts whose code already exists are skipped, so the command can be
//! re-run safely.

use std::collections::HashMap;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use copper_kettle_admin::db::{
    self, DiscountFields, DiscountRepository, ProductRepository, RepositoryError,
};
use copper_kettle_core::{
    DiscountCodeError, DiscountScope, DiscountStatus, DiscountType, ProductCondition, ProductId,
    validate_discount_code,
};

use super::{MissingDatabaseUrl, database_url};

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Config(#[from] MissingDatabaseUrl),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Discount {code}: {source}")]
    InvalidCode {
        code: String,
        source: DiscountCodeError,
    },

    #[error("Discount {code} references unknown product {product}")]
    UnknownProduct { code: String, product: String },

    #[error("Database connection error: {0}")]
    Connect(#[from] sqlx::Error),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Seed file layout.
#[derive(Debug, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub products: Vec<String>,
    #[serde(default)]
    pub discounts: Vec<SeedDiscount>,
}

/// One discount in the seed file. Products are referenced by name.
#[derive(Debug, Deserialize)]
pub struct SeedDiscount {
    pub name: String,
    pub code: String,
    #[serde(rename = "type")]
    pub discount_type: DiscountType,
    pub amount: Decimal,
    #[serde(default)]
    pub product_reqs: Vec<String>,
    #[serde(default)]
    pub excluded_products: Vec<String>,
    #[serde(default)]
    pub product_condition: ProductCondition,
    #[serde(default)]
    pub scope: DiscountScope,
    pub max_uses: Option<i32>,
    pub min_cart_price: Option<Decimal>,
    #[serde(default)]
    pub status: DiscountStatus,
    #[serde(default)]
    pub once_per_customer: bool,
}

impl SeedDiscount {
    fn to_fields(&self, products: &HashMap<String, ProductId>) -> Result<DiscountFields, SeedError> {
        validate_discount_code(&self.code).map_err(|source| SeedError::InvalidCode {
            code: self.code.clone(),
            source,
        })?;

        let resolve = |names: &[String]| -> Result<Vec<ProductId>, SeedError> {
            names
                .iter()
                .map(|name| {
                    products
                        .get(name)
                        .copied()
                        .ok_or_else(|| SeedError::UnknownProduct {
                            code: self.code.clone(),
                            product: name.clone(),
                        })
                })
                .collect()
        };

        Ok(DiscountFields {
            name: self.name.clone(),
            code: self.code.clone(),
            discount_type: self.discount_type,
            amount: self.amount,
            product_reqs: resolve(&self.product_reqs)?,
            excluded_products: resolve(&self.excluded_products)?,
            product_condition: self.product_condition,
            scope: self.scope,
            start_date: None,
            end_date: None,
            max_uses: self.max_uses,
            min_cart_price: self.min_cart_price,
            status: self.status,
            once_per_customer: self.once_per_customer,
        })
    }
}

/// Parse a seed file's contents.
///
/// # Errors
///
/// Returns `SeedError::Yaml` if the document does not match the layout.
pub fn parse(content: &str) -> Result<SeedFile, SeedError> {
    Ok(serde_yaml::from_str(content)?)
}

/// Seed products and discounts from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, a discount is
/// invalid, or a database operation fails.
pub async fn from_file(file_path: &str) -> Result<(), SeedError> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(SeedError::FileNotFound(file_path.to_string()));
    }

    info!(path = %file_path, "Loading seed data");
    let seed = parse(&tokio::fs::read_to_string(path).await?)?;
    info!(
        products = seed.products.len(),
        discounts = seed.discounts.len(),
        "Parsed seed file"
    );

    let pool = db::create_pool(&database_url()?).await?;
    info!("Connected to database");

    let product_repo = ProductRepository::new(&pool);
    let mut products: HashMap<String, ProductId> = product_repo
        .list_all()
        .await?
        .into_iter()
        .map(|p| (p.name, p.id))
        .collect();

    for name in &seed.products {
        if products.contains_key(name) {
            continue;
        }
        let product = product_repo.create(name).await?;
        info!(product_id = %product.id, name = %product.name, "Product created");
        products.insert(product.name, product.id);
    }

    let discount_repo = DiscountRepository::new(&pool);
    let (mut inserted, mut skipped) = (0_usize, 0_usize);
    for discount in &seed.discounts {
        let fields = discount.to_fields(&products)?;
        match discount_repo.create(&fields).await {
            Ok(created) => {
                info!(discount_id = %created.id, code = %created.code, "Discount created");
                inserted += 1;
            }
            Err(RepositoryError::Conflict(_)) => {
                warn!(code = %fields.code, "Discount code already exists, skipping");
                skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    info!("Seeding complete!");
    info!("  Discounts inserted: {inserted}");
    info!("  Discounts skipped (already exist): {skipped}");
    Ok(())
}
