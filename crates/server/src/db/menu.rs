//! Menu repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use bep_core::MenuItemId;

use super::RepositoryError;
use crate::models::{MenuItem, MenuItemInput};

const MENU_COLUMNS: &str = "id, slug, name_vi, name_en, description_vi, description_en, \
                            price_vnd, category, image_url, available, sort_order, \
                            customization_schema_id, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct MenuItemRow {
    id: i64,
    slug: String,
    name_vi: String,
    name_en: String,
    description_vi: Option<String>,
    description_en: Option<String>,
    price_vnd: Decimal,
    category: String,
    image_url: Option<String>,
    available: bool,
    sort_order: i32,
    customization_schema_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<MenuItemRow> for MenuItem {
    fn from(row: MenuItemRow) -> Self {
        Self {
            id: MenuItemId::new(row.id),
            slug: row.slug,
            name_vi: row.name_vi,
            name_en: row.name_en,
            description_vi: row.description_vi,
            description_en: row.description_en,
            price_vnd: row.price_vnd,
            category: row.category,
            image_url: row.image_url,
            available: row.available,
            sort_order: row.sort_order,
            customization_schema_id: row.customization_schema_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for menu items.
pub struct MenuRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MenuRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Items shown on the public menu, by category then position.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_available(&self) -> Result<Vec<MenuItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, MenuItemRow>(&format!(
            "SELECT {MENU_COLUMNS} FROM site.menu_items WHERE available \
             ORDER BY category, sort_order, id"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Every item, including unavailable ones.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<MenuItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, MenuItemRow>(&format!(
            "SELECT {MENU_COLUMNS} FROM site.menu_items ORDER BY category, sort_order, id"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: MenuItemId) -> Result<Option<MenuItem>, RepositoryError> {
        let row = sqlx::query_as::<_, MenuItemRow>(&format!(
            "SELECT {MENU_COLUMNS} FROM site.menu_items WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    #[instrument(skip(self, input), fields(slug = %input.slug))]
    pub async fn create(&self, input: &MenuItemInput) -> Result<MenuItem, RepositoryError> {
        let row = sqlx::query_as::<_, MenuItemRow>(&format!(
            "INSERT INTO site.menu_items (slug, name_vi, name_en, description_vi, description_en, \
             price_vnd, category, image_url, available, sort_order, customization_schema_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {MENU_COLUMNS}"
        ))
        .bind(&input.slug)
        .bind(&input.name_vi)
        .bind(&input.name_en)
        .bind(&input.description_vi)
        .bind(&input.description_en)
        .bind(input.price_vnd)
        .bind(&input.category)
        .bind(&input.image_url)
        .bind(input.available)
        .bind(input.sort_order)
        .bind(&input.customization_schema_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "slug"))?;

        Ok(row.into())
    }

    /// Insert or replace by slug. Used by the seed command.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_by_slug(&self, input: &MenuItemInput) -> Result<MenuItem, RepositoryError> {
        let row = sqlx::query_as::<_, MenuItemRow>(&format!(
            "INSERT INTO site.menu_items (slug, name_vi, name_en, description_vi, description_en, \
             price_vnd, category, image_url, available, sort_order, customization_schema_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             ON CONFLICT (slug) DO UPDATE SET \
                name_vi = EXCLUDED.name_vi, name_en = EXCLUDED.name_en, \
                description_vi = EXCLUDED.description_vi, description_en = EXCLUDED.description_en, \
                price_vnd = EXCLUDED.price_vnd, category = EXCLUDED.category, \
                image_url = EXCLUDED.image_url, available = EXCLUDED.available, \
                sort_order = EXCLUDED.sort_order, \
                customization_schema_id = EXCLUDED.customization_schema_id, \
                updated_at = now() \
             RETURNING {MENU_COLUMNS}"
        ))
        .bind(&input.slug)
        .bind(&input.name_vi)
        .bind(&input.name_en)
        .bind(&input.description_vi)
        .bind(&input.description_en)
        .bind(input.price_vnd)
        .bind(&input.category)
        .bind(&input.image_url)
        .bind(input.available)
        .bind(input.sort_order)
        .bind(&input.customization_schema_id)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no item has this ID.
    /// Returns `RepositoryError::Conflict` if the new slug is taken.
    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: MenuItemId,
        input: &MenuItemInput,
    ) -> Result<MenuItem, RepositoryError> {
        let row = sqlx::query_as::<_, MenuItemRow>(&format!(
            "UPDATE site.menu_items SET slug = $2, name_vi = $3, name_en = $4, \
             description_vi = $5, description_en = $6, price_vnd = $7, category = $8, \
             image_url = $9, available = $10, sort_order = $11, customization_schema_id = $12, \
             updated_at = now() \
             WHERE id = $1 \
             RETURNING {MENU_COLUMNS}"
        ))
        .bind(id)
        .bind(&input.slug)
        .bind(&input.name_vi)
        .bind(&input.name_en)
        .bind(&input.description_vi)
        .bind(&input.description_en)
        .bind(input.price_vnd)
        .bind(&input.category)
        .bind(&input.image_url)
        .bind(input.available)
        .bind(input.sort_order)
        .bind(&input.customization_schema_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "slug"))?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no item has this ID.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: MenuItemId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM site.menu_items WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
