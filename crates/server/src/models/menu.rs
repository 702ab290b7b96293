//! Menu items.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bep_core::{Locale, MenuItemId, Price};

/// A dish or drink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: MenuItemId,
    pub slug: String,
    pub name_vi: String,
    pub name_en: String,
    pub description_vi: Option<String>,
    pub description_en: Option<String>,
    /// Price in đồng.
    pub price_vnd: Decimal,
    pub category: String,
    pub image_url: Option<String>,
    pub available: bool,
    pub sort_order: i32,
    /// Customization schema the cart keys selections against.
    pub customization_schema_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MenuItem {
    #[must_use]
    pub fn name(&self, locale: Locale) -> &str {
        match locale {
            Locale::Vi => &self.name_vi,
            Locale::En => &self.name_en,
        }
    }

    #[must_use]
    pub const fn price(&self) -> Price {
        Price::new(self.price_vnd, bep_core::CurrencyCode::VND)
    }
}

const fn default_true() -> bool {
    true
}

/// Body of the create and update endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemInput {
    pub slug: String,
    pub name_vi: String,
    pub name_en: String,
    #[serde(default)]
    pub description_vi: Option<String>,
    #[serde(default)]
    pub description_en: Option<String>,
    pub price_vnd: Decimal,
    pub category: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_true")]
    pub available: bool,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub customization_schema_id: Option<String>,
}

impl MenuItemInput {
    /// Check the fields a handler cannot trust.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        let slug_ok = !self.slug.is_empty()
            && self
                .slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !slug_ok {
            return Err("Slug must be lowercase letters, digits and dashes".to_string());
        }
        if self.name_vi.trim().is_empty() || self.name_en.trim().is_empty() {
            return Err("Both Vietnamese and English names are required".to_string());
        }
        if self.price_vnd.is_sign_negative() {
            return Err("Price cannot be negative".to_string());
        }
        if self.category.trim().is_empty() {
            return Err("Category is required".to_string());
        }
        Ok(())
    }
}
