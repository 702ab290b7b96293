//! Page SEO repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::RepositoryError;
use crate::models::{PageSeo, PageSeoInput};

#[derive(Debug, sqlx::FromRow)]
struct PageSeoRow {
    path: String,
    title_vi: String,
    title_en: String,
    description_vi: String,
    description_en: String,
    og_image_url: Option<String>,
    updated_at: DateTime<Utc>,
}

impl From<PageSeoRow> for PageSeo {
    fn from(row: PageSeoRow) -> Self {
        Self {
            path: row.path,
            title_vi: row.title_vi,
            title_en: row.title_en,
            description_vi: row.description_vi,
            description_en: row.description_en,
            og_image_url: row.og_image_url,
            updated_at: row.updated_at,
        }
    }
}

pub struct SeoRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SeoRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_path(&self, path: &str) -> Result<Option<PageSeo>, RepositoryError> {
        let row = sqlx::query_as::<_, PageSeoRow>(
            "SELECT path, title_vi, title_en, description_vi, description_en, og_image_url, \
             updated_at FROM site.page_seo WHERE path = $1",
        )
        .bind(path)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<PageSeo>, RepositoryError> {
        let rows = sqlx::query_as::<_, PageSeoRow>(
            "SELECT path, title_vi, title_en, description_vi, description_en, og_image_url, \
             updated_at FROM site.page_seo ORDER BY path",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(&self, input: &PageSeoInput) -> Result<PageSeo, RepositoryError> {
        let row = sqlx::query_as::<_, PageSeoRow>(
            "INSERT INTO site.page_seo \
                (path, title_vi, title_en, description_vi, description_en, og_image_url) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (path) DO UPDATE SET \
                title_vi = EXCLUDED.title_vi, title_en = EXCLUDED.title_en, \
                description_vi = EXCLUDED.description_vi, \
                description_en = EXCLUDED.description_en, \
                og_image_url = EXCLUDED.og_image_url, updated_at = now() \
             RETURNING path, title_vi, title_en, description_vi, description_en, og_image_url, \
                updated_at",
        )
        .bind(&input.path)
        .bind(&input.title_vi)
        .bind(&input.title_en)
        .bind(&input.description_vi)
        .bind(&input.description_en)
        .bind(&input.og_image_url)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }
}
