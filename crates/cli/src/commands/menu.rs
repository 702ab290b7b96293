//! Menu seeding.
//!
//! Reads a YAML list of menu items and inserts or updates each by slug.
//! The whole file is validated before the database is touched.
//!
//! ```yaml
//! - slug: pho-bo
//!   nameVi: Phở bò
//!   nameEn: Beef pho
//!   priceVnd: 65000
//!   category: noodles
//! ```

use std::path::Path;

use secrecy::SecretString;
use thiserror::Error;

use bep_server::db::{MenuRepository, RepositoryError};
use bep_server::models::MenuItemInput;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{count} invalid items:\n{details}")]
    Invalid { count: usize, details: String },

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Repository(#[from] RepositoryError),
}

/// Parse and validate a seed file's contents.
fn parse_items(content: &str) -> Result<Vec<MenuItemInput>, SeedError> {
    let items: Vec<MenuItemInput> = serde_yaml::from_str(content)?;

    let mut problems = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for item in &items {
        if let Err(e) = item.validate() {
            problems.push(format!("  - {}: {e}", item.slug));
        }
        if !seen.insert(item.slug.as_str()) {
            problems.push(format!("  - {}: duplicate slug", item.slug));
        }
    }

    if problems.is_empty() {
        Ok(items)
    } else {
        Err(SeedError::Invalid {
            count: problems.len(),
            details: problems.join("\n"),
        })
    }
}

/// Seed menu items from `file_path`.
///
/// # Errors
///
/// Returns an error if the file is unreadable or invalid, or a write fails.
pub async fn seed(database_url: &SecretString, file_path: &Path) -> Result<(), SeedError> {
    let content = tokio::fs::read_to_string(file_path)
        .await
        .map_err(|source| SeedError::Read {
            path: file_path.display().to_string(),
            source,
        })?;
    let items = parse_items(&content)?;
    tracing::info!(path = %file_path.display(), items = items.len(), "Seed file validated");

    let pool = super::connect(database_url).await?;
    let menu = MenuRepository::new(&pool);
    for input in &items {
        let item = menu.upsert_by_slug(input).await?;
        tracing::info!(id = %item.id, slug = %item.slug, price = %item.price(), "Seeded");
    }

    tracing::info!(count = items.len(), "Menu seeding complete");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_file() {
        let items = parse_items(
            r"
- slug: pho-bo
  nameVi: Phở bò
  nameEn: Beef pho
  priceVnd: 65000
  category: noodles
- slug: ca-phe-sua-da
  nameVi: Cà phê sữa đá
  nameEn: Iced milk coffee
  priceVnd: '35000'
  category: drinks
  available: false
",
        )
        .unwrap();

        assert_eq!(items.len(), 2);
        assert!(items[0].available);
        assert!(!items[1].available);
        assert_eq!(items[1].price_vnd.to_string(), "35000");
    }

    #[test]
    fn test_duplicate_slugs_rejected() {
        let err = parse_items(
            r"
- {slug: banh-mi, nameVi: Bánh mì, nameEn: Banh mi, priceVnd: 30000, category: snacks}
- {slug: banh-mi, nameVi: Bánh mì chả, nameEn: Pork roll banh mi, priceVnd: 35000, category: snacks}
",
        )
        .unwrap_err();

        assert!(matches!(err, SeedError::Invalid { count: 1, .. }));
        assert!(err.to_string().contains("duplicate slug"));
    }
}
