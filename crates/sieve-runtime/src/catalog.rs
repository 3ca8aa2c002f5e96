//! Message templates by locale
//!
//! Lookup walks the requested locale's fallback chain (`de-CH`, then
//! `de`), then the default locale's chain, then the bundled English
//! templates. Loading catalogs from disk is not handled here; overrides
//! arrive as plain maps, usually from [`crate::config::ValidatorConfig`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A BCP-47-ish language tag. `_` separators are accepted and normalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Locale(String);

impl Locale {
    pub fn new(tag: impl AsRef<str>) -> Self {
        Self(tag.as_ref().trim().replace('_', "-"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Tags to try, most specific first: `de-CH-1996`, `de-CH`, `de`.
    pub fn fallbacks(&self) -> Vec<&str> {
        let mut chain = Vec::new();
        let mut tag = self.0.as_str();
        while !tag.is_empty() {
            chain.push(tag);
            match tag.rfind('-') {
                Some(cut) => tag = &tag[..cut],
                None => break,
            }
        }
        chain
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::new("en")
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Locale {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl From<String> for Locale {
    fn from(tag: String) -> Self {
        Self::new(tag)
    }
}

impl From<Locale> for String {
    fn from(locale: Locale) -> Self {
        locale.0
    }
}

/// Key to template lookup for one locale, without any fallback.
pub trait MessageCatalog: Send + Sync + fmt::Debug {
    fn lookup(&self, locale: &Locale, key: &str) -> Option<&str>;
}

/// Templates for the built-in constraints.
pub fn bundled_template(key: &str) -> Option<&'static str> {
    let constraint = key
        .strip_prefix("sieve.validation.")?
        .strip_suffix(".message")?;
    let template = match constraint {
        "Size" | "ContainerSize" => "{path} size must be between {min} and {max}",
        "NotEmpty" | "ContainerNotEmpty" => "{path} must not be empty",
        "NotBlank" => "{path} must not be blank",
        "Min" => "{path} must be greater than or equal to {value}",
        "Max" => "{path} must be less than or equal to {value}",
        "DecimalMin" => "{path} must be greater than ${inclusive ? 'or equal to ' : ''}{value}",
        "DecimalMax" => "{path} must be less than ${inclusive ? 'or equal to ' : ''}{value}",
        "Range" => "{path} range must be between {min} and {max}",
        "Positive" => "{path} must be greater than 0",
        "PositiveOrZero" => "{path} must be greater than or equal to 0",
        "Negative" => "{path} must be less than 0",
        "NegativeOrZero" => "{path} must be less than or equal to 0",
        "AssertTrue" => "{path} must be true",
        "AssertFalse" => "{path} must be false",
        "Digits" => {
            "{path} numeric value out of bounds (<{integer} digits>.<{fraction} digits> expected)"
        }
        "Pattern" => "{path} must match \"{regexp}\"",
        "Expression" => "{path} failed the expression check",
        _ => return None,
    };
    Some(template)
}

/// Locale-keyed overrides layered over the bundled templates.
#[derive(Debug, Clone, Default)]
pub struct CatalogSet {
    default_locale: Locale,
    tables: BTreeMap<Locale, BTreeMap<String, String>>,
}

impl CatalogSet {
    pub fn new(default_locale: Locale) -> Self {
        Self {
            default_locale,
            tables: BTreeMap::new(),
        }
    }

    /// Adds (or replaces) templates for one locale.
    pub fn with_messages(
        mut self,
        locale: impl Into<Locale>,
        messages: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        self.tables
            .entry(locale.into())
            .or_default()
            .extend(messages);
        self
    }

    pub fn default_locale(&self) -> &Locale {
        &self.default_locale
    }

    /// Full resolution including fallbacks and the bundled templates.
    pub fn resolve(&self, locale: &Locale, key: &str) -> Option<&str> {
        locale
            .fallbacks()
            .into_iter()
            .chain(self.default_locale.fallbacks())
            .find_map(|tag| self.lookup(&Locale::new(tag), key))
            .or_else(|| bundled_template(key))
    }
}

impl MessageCatalog for CatalogSet {
    fn lookup(&self, locale: &Locale, key: &str) -> Option<&str> {
        self.tables
            .get(locale)
            .and_then(|table| table.get(key))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(entries: &[(&str, &str)]) -> Vec<(String, String)> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_fallback_chain() {
        assert_eq!(Locale::new("de_CH").fallbacks(), vec!["de-CH", "de"]);
        assert_eq!(Locale::new("en").fallbacks(), vec!["en"]);
        assert!(Locale::new("").fallbacks().is_empty());
    }

    #[test]
    fn test_resolution_order() {
        let key = "sieve.validation.NotBlank.message";
        let catalog = CatalogSet::new(Locale::new("fr"))
            .with_messages("de", messages(&[(key, "{path} darf nicht leer sein")]))
            .with_messages("fr", messages(&[("greeting", "bonjour")]));

        let swiss = Locale::new("de-CH");
        assert_eq!(catalog.resolve(&swiss, key), Some("{path} darf nicht leer sein"));
        assert_eq!(catalog.resolve(&swiss, "greeting"), Some("bonjour"));
        assert_eq!(
            catalog.resolve(&Locale::new("it"), key),
            Some("{path} must not be blank")
        );
        assert_eq!(catalog.resolve(&swiss, "nothing.here"), None);
    }

    #[test]
    fn test_bundled_templates_cover_builtins() {
        for name in crate::rules::builtin_rules().iter().map(|r| r.name().to_string()) {
            let key = format!("sieve.validation.{}.message", name);
            assert!(bundled_template(&key).is_some(), "no template for {}", name);
        }
    }
}
