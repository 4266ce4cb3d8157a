//! Startup detection: reads the entry URL and the visitor's timezone once to
//! pre-fill country and campaign attribution.

use crate::countries::{self, Country};
use crate::errors::AppError;
use crate::models::Attribution;
use url::Url;

/// Query parameter carrying a returning visitor's identifier.
pub const UID_PARAM: &str = "uid";

/// Everything the page learns from how it was opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryContext {
    /// `uid` override from the entry URL.
    pub uid: Option<String>,
    pub attribution: Attribution,
    pub country: &'static Country,
}

impl EntryContext {
    pub fn detect(entry_url: &str, timezone: Option<&str>) -> Result<Self, AppError> {
        let url = Url::parse(entry_url)
            .map_err(|e| AppError::BadRequest(format!("Invalid entry URL: {}", e)))?;

        let param = |name: &str| {
            url.query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
                .filter(|value| !value.is_empty())
        };

        let country = countries::detect_from_timezone(timezone.unwrap_or_default());
        let context = Self {
            uid: param(UID_PARAM),
            attribution: Attribution {
                utm_source: param("utm_source"),
                utm_medium: param("utm_medium"),
                utm_campaign: param("utm_campaign"),
            },
            country,
        };

        tracing::debug!(
            "Entry detected: country={}, uid_present={}, utm_source={:?}",
            context.country.name,
            context.uid.is_some(),
            context.attribution.utm_source
        );

        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_uid_and_utm_tags() {
        let ctx = EntryContext::detect(
            "https://escuela.example.com/registro?uid=abc&utm_source=ig&utm_medium=story&utm_campaign=kit",
            Some("America/Lima"),
        )
        .unwrap();

        assert_eq!(ctx.uid.as_deref(), Some("abc"));
        assert_eq!(ctx.attribution.utm_source.as_deref(), Some("ig"));
        assert_eq!(ctx.attribution.utm_medium.as_deref(), Some("story"));
        assert_eq!(ctx.attribution.utm_campaign.as_deref(), Some("kit"));
        assert_eq!(ctx.country.name, "Perú");
    }

    #[test]
    fn test_empty_params_are_absent() {
        let ctx =
            EntryContext::detect("https://escuela.example.com/?uid=&utm_source=", None).unwrap();

        assert_eq!(ctx.uid, None);
        assert_eq!(ctx.attribution, Attribution::default());
        assert_eq!(ctx.country.name, countries::DEFAULT_COUNTRY);
    }

    #[test]
    fn test_percent_encoded_values_are_decoded() {
        let ctx = EntryContext::detect(
            "https://escuela.example.com/?utm_campaign=kit%20supervivencia",
            None,
        )
        .unwrap();
        assert_eq!(
            ctx.attribution.utm_campaign.as_deref(),
            Some("kit supervivencia")
        );
    }

    #[test]
    fn test_rejects_relative_url() {
        assert!(EntryContext::detect("/registro?uid=abc", None).is_err());
    }
}
