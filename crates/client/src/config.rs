//! Client configuration.

use std::time::Duration;

use bep_core::{Locale, VideoRules};
use url::Url;

/// Delay between the session-expired toast and the redirect to login.
pub const DEFAULT_LOGOUT_REDIRECT_DELAY: Duration = Duration::from_secs(1);

/// Back-office client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Site origin, always ending in `/` so relative API paths join under it.
    pub base_url: Url,
    /// Language of toasts raised by the client.
    pub locale: Locale,
    /// Pause before navigating to login after a session expires.
    pub logout_redirect_delay: Duration,
    /// Local checks applied before a video leaves the machine.
    pub video_rules: VideoRules,
}

impl ClientConfig {
    /// Configuration with defaults for everything but the site origin.
    ///
    /// # Errors
    ///
    /// Returns a parse error if `base_url` is not an absolute URL.
    pub fn new(base_url: &str) -> Result<Self, url::ParseError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            base_url,
            locale: Locale::default(),
            logout_redirect_delay: DEFAULT_LOGOUT_REDIRECT_DELAY,
            video_rules: VideoRules::default(),
        })
    }

    #[must_use]
    pub const fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    #[must_use]
    pub const fn with_video_rules(mut self, rules: VideoRules) -> Self {
        self.video_rules = rules;
        self
    }

    #[must_use]
    pub const fn with_logout_redirect_delay(mut self, delay: Duration) -> Self {
        self.logout_redirect_delay = delay;
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let config = ClientConfig::new("https://bepsaigon.vn/site").unwrap();
        assert_eq!(config.base_url.as_str(), "https://bepsaigon.vn/site/");
        assert_eq!(
            config.base_url.join("api/admin/me").unwrap().as_str(),
            "https://bepsaigon.vn/site/api/admin/me"
        );
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new("http://127.0.0.1:3000").unwrap();
        assert_eq!(config.locale, Locale::Vi);
        assert_eq!(config.logout_redirect_delay, Duration::from_secs(1));
        assert_eq!(config.video_rules, VideoRules::default());
    }
}
