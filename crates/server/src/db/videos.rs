//! Background video repository.
//!
//! Each slot holds a live URL visitors see and a pending URL staged by the
//! back office. Activation promotes pending to live.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use bep_core::VideoSlot;

use super::RepositoryError;
use crate::models::SiteVideo;

const VIDEO_COLUMNS: &str = "slot, live_url, pending_url, pending_file_name, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct SiteVideoRow {
    slot: VideoSlot,
    live_url: Option<String>,
    pending_url: Option<String>,
    pending_file_name: Option<String>,
    updated_at: DateTime<Utc>,
}

impl From<SiteVideoRow> for SiteVideo {
    fn from(row: SiteVideoRow) -> Self {
        Self {
            slot: row.slot,
            live_url: row.live_url,
            pending_url: row.pending_url,
            pending_file_name: row.pending_file_name,
            updated_at: row.updated_at,
        }
    }
}

pub struct VideoRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> VideoRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<SiteVideo>, RepositoryError> {
        let rows = sqlx::query_as::<_, SiteVideoRow>(&format!(
            "SELECT {VIDEO_COLUMNS} FROM site.site_videos ORDER BY slot"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Stage `url` as the slot's pending video, replacing any earlier one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn stage_pending(
        &self,
        slot: VideoSlot,
        url: &str,
        file_name: &str,
    ) -> Result<SiteVideo, RepositoryError> {
        let row = sqlx::query_as::<_, SiteVideoRow>(&format!(
            "INSERT INTO site.site_videos (slot, pending_url, pending_file_name) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (slot) DO UPDATE SET \
                pending_url = EXCLUDED.pending_url, \
                pending_file_name = EXCLUDED.pending_file_name, \
                updated_at = now() \
             RETURNING {VIDEO_COLUMNS}"
        ))
        .bind(slot)
        .bind(url)
        .bind(file_name)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Promote the pending video to live and clear the pending fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if nothing is pending for the slot.
    #[instrument(skip(self))]
    pub async fn activate(&self, slot: VideoSlot) -> Result<SiteVideo, RepositoryError> {
        let row = sqlx::query_as::<_, SiteVideoRow>(&format!(
            "UPDATE site.site_videos SET \
                live_url = pending_url, pending_url = NULL, pending_file_name = NULL, \
                updated_at = now() \
             WHERE slot = $1 AND pending_url IS NOT NULL \
             RETURNING {VIDEO_COLUMNS}"
        ))
        .bind(slot)
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }
}
