//! Per-page SEO metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const MAX_TITLE_CHARS: usize = 70;
const MAX_DESCRIPTION_CHARS: usize = 160;

/// Title and description of one page, in both languages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSeo {
    pub path: String,
    pub title_vi: String,
    pub title_en: String,
    pub description_vi: String,
    pub description_en: String,
    pub og_image_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Body of the upsert endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSeoInput {
    pub path: String,
    pub title_vi: String,
    pub title_en: String,
    pub description_vi: String,
    pub description_en: String,
    #[serde(default)]
    pub og_image_url: Option<String>,
}

impl PageSeoInput {
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if !self.path.starts_with('/') {
            return Err("Path must start with '/'".to_string());
        }
        for title in [&self.title_vi, &self.title_en] {
            if title.trim().is_empty() || title.chars().count() > MAX_TITLE_CHARS {
                return Err(format!("Titles must be 1-{MAX_TITLE_CHARS} characters"));
            }
        }
        for description in [&self.description_vi, &self.description_en] {
            if description.chars().count() > MAX_DESCRIPTION_CHARS {
                return Err(format!(
                    "Descriptions must be at most {MAX_DESCRIPTION_CHARS} characters"
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> PageSeoInput {
        PageSeoInput {
            path: "/menu".to_string(),
            title_vi: "Thực đơn | Bếp Sài Gòn".to_string(),
            title_en: "Menu | Bếp Sài Gòn".to_string(),
            description_vi: "Món ăn Sài Gòn".to_string(),
            description_en: "Saigon home cooking".to_string(),
            og_image_url: None,
        }
    }

    #[test]
    fn test_valid_input() {
        assert!(input().validate().is_ok());
    }

    #[test]
    fn test_relative_path_rejected() {
        let seo = PageSeoInput {
            path: "menu".to_string(),
            ..input()
        };
        assert!(seo.validate().is_err());
    }

    #[test]
    fn test_long_title_rejected() {
        let seo = PageSeoInput {
            title_en: "x".repeat(71),
            ..input()
        };
        assert!(seo.validate().is_err());
    }
}
