use once_cell::sync::Lazy;
use serde::Deserialize;
use std::env;
use strum_macros::{Display, EnumString};
use tracing::debug;

static EN: Lazy<LanguageBundle> = Lazy::new(|| parse_bundle(include_str!("../langs/en.json")));
static PT: Lazy<LanguageBundle> = Lazy::new(|| parse_bundle(include_str!("../langs/pt.json")));

// The bundles are embedded at build time and covered by tests.
fn parse_bundle(json: &str) -> LanguageBundle {
    serde_json::from_str(json).expect("embedded language bundle is valid")
}

#[derive(Clone, Copy, Debug, Default, Display, EnumString, PartialEq, Eq)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Language {
    #[default]
    En,
    Pt,
}

impl Language {
    /// Pick a language from a locale such as `pt-BR` or `pt_BR.UTF-8`.
    /// Only the primary subtag is compared; anything unsupported falls back to English.
    pub fn from_locale(locale: &str) -> Self {
        let primary = locale
            .split(['-', '_', '.', '@'])
            .next()
            .unwrap_or_default();
        primary.parse().unwrap_or_default()
    }

    /// Use the configured locale if there is one, otherwise the one reported by the environment.
    pub fn detect(configured: Option<&str>) -> Self {
        let locale = configured.map(str::to_owned).or_else(reported_locale);
        let language = locale
            .as_deref()
            .map(Self::from_locale)
            .unwrap_or_default();
        debug!("Locale {:?} selects language {language}", locale);
        language
    }

    pub fn bundle(self) -> &'static LanguageBundle {
        match self {
            Self::En => &*EN,
            Self::Pt => &*PT,
        }
    }
}

/// The locale the environment reports, checked in the same order as gettext.
pub fn reported_locale() -> Option<String> {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|var| env::var(var).ok())
        .find(|value| !value.is_empty())
}

#[derive(Debug, Deserialize)]
pub struct LanguageBundle {
    pub title: String,
    pub header: String,
    pub description: String,
    pub placeholder: String,
    pub search_button: String,
    pub keywords_prompt: String,
    pub keywords: Vec<String>,
    pub footer: String,
    pub columns: Columns,
    pub open: String,
    pub closed: String,
    pub view_on_map: String,
    pub messages: Messages,
}

#[derive(Debug, Deserialize)]
pub struct Columns {
    pub name: String,
    pub address: String,
    pub rating: String,
    pub open: String,
    pub distance: String,
    pub photo: String,
}

#[derive(Debug, Deserialize)]
pub struct Messages {
    pub unsupported: String,
    pub permission_denied: String,
    pub position_unavailable: String,
    pub location_failed: String,
    pub query_limit: String,
    pub search_failed: String,
    found: String,
}

impl Messages {
    pub fn found(&self, count: usize) -> String {
        self.found.replace("{count}", &count.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_locales() {
        assert_eq!(Language::from_locale("pt"), Language::Pt);
        assert_eq!(Language::from_locale("en"), Language::En);
        assert_eq!(Language::from_locale("pt-BR"), Language::Pt);
        assert_eq!(Language::from_locale("pt_BR.UTF-8"), Language::Pt);
        assert_eq!(Language::from_locale("PT"), Language::Pt);
    }

    #[test]
    fn test_unsupported_locale_falls_back() {
        assert_eq!(Language::from_locale("de-DE"), Language::En);
        assert_eq!(Language::from_locale("C"), Language::En);
        assert_eq!(Language::from_locale(""), Language::En);
    }

    #[test]
    fn test_configured_locale_wins() {
        assert_eq!(Language::detect(Some("pt-PT")), Language::Pt);
        assert_eq!(Language::detect(Some("fr")), Language::En);
    }

    #[test]
    fn test_bundles_parse() {
        for language in [Language::En, Language::Pt] {
            let bundle = language.bundle();
            assert_eq!(bundle.title, "SOSMe");
            assert!(!bundle.keywords.is_empty());
        }
    }

    #[test]
    fn test_bundle_used_verbatim() {
        let bundle = Language::from_locale("pt-BR").bundle();
        assert_eq!(bundle.header, "Te ajudando a encontrar o serviço mais próximo");
        assert_eq!(bundle.placeholder, "Buscar (Ex. pia, mecânico, ...)");
        assert_eq!(bundle.columns.open, "Aberto");
    }

    #[test]
    fn test_found_message() {
        assert_eq!(Language::En.bundle().messages.found(3), "Found 3 places");
        assert_eq!(Language::Pt.bundle().messages.found(0), "0 locais encontrados");
    }
}
