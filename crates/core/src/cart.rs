//! In-memory ordering cart.
//!
//! The cart lives for one browsing session and is never persisted. Lines are
//! keyed by product ID plus the serialized customization, so "phở tái, no
//! onions" and "phở tái, extra beef" are separate lines while adding the
//! same choice twice bumps the quantity.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CurrencyCode, MenuItemId, Price};

/// Options picked for a customizable dish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customization {
    /// Customization schema the selections belong to (e.g. `pho-options`).
    pub schema_id: String,
    /// Option key to chosen value. Ordered so serialization is stable.
    pub selections: BTreeMap<String, String>,
}

impl Customization {
    #[must_use]
    pub fn new(schema_id: impl Into<String>) -> Self {
        Self {
            schema_id: schema_id.into(),
            selections: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn select(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.selections.insert(key.into(), value.into());
        self
    }

    fn serialized(&self) -> String {
        // BTreeMap keeps keys sorted, so equal selections serialize equally.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// One cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: MenuItemId,
    pub name: String,
    pub price: Price,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization: Option<Customization>,
}

impl CartItem {
    /// A single portion of a dish.
    #[must_use]
    pub fn new(id: MenuItemId, name: impl Into<String>, price: Price) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            quantity: 1,
            customization: None,
        }
    }

    #[must_use]
    pub const fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    #[must_use]
    pub fn with_customization(mut self, customization: Customization) -> Self {
        self.customization = Some(customization);
        self
    }

    /// Merge key: product ID plus serialized customization.
    #[must_use]
    pub fn identity_key(&self) -> String {
        match &self.customization {
            Some(c) => format!("{}|{}", self.id, c.serialized()),
            None => self.id.to_string(),
        }
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// The cart store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Add a line, merging into an existing line with the same identity key.
    ///
    /// A zero quantity is treated as one portion.
    pub fn add(&mut self, mut item: CartItem) {
        item.quantity = item.quantity.max(1);
        let key = item.identity_key();

        match self.items.iter_mut().find(|line| line.identity_key() == key) {
            Some(line) => line.quantity = line.quantity.saturating_add(item.quantity),
            None => self.items.push(item),
        }
    }

    /// Remove every line for a product, whatever its customization.
    pub fn remove(&mut self, id: MenuItemId) {
        self.items.retain(|line| line.id != id);
    }

    /// Set the quantity of every line for a product, removing them when
    /// `quantity` is zero or negative.
    pub fn set_quantity(&mut self, id: MenuItemId, quantity: i64) {
        if quantity <= 0 {
            self.remove(id);
            return;
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        for line in self.items.iter_mut().filter(|line| line.id == id) {
            line.quantity = quantity;
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of portions across all lines.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Sum of price times quantity across all lines.
    ///
    /// The menu is single-currency; the first line's currency is used.
    #[must_use]
    pub fn total_price(&self) -> Price {
        let currency = self
            .items
            .first()
            .map_or(CurrencyCode::default(), |line| line.price.currency_code);
        let amount: Decimal = self.items.iter().map(|line| line.line_total().amount).sum();
        Price::new(amount, currency)
    }
}
