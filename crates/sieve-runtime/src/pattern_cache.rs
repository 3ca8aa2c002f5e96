use dashmap::DashMap;
use regex::Regex;
use sieve_core::ConfigError;
use std::sync::Arc;
use tracing::trace;

/// Compiled `Pattern` regexes keyed by their exact source text.
///
/// Insert-only and unbounded: it holds one entry per distinct pattern that
/// appears in the schema. Concurrent first compilations of the same text
/// may both compile, but only one entry is ever stored and every caller
/// sees it.
#[derive(Debug, Default)]
pub struct PatternCache {
    compiled: DashMap<String, Arc<Regex>>,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the whole-string matcher for `pattern`, compiling it on first use.
    pub fn get_or_compile(&self, pattern: &str) -> Result<Arc<Regex>, ConfigError> {
        if let Some(regex) = self.compiled.get(pattern) {
            return Ok(Arc::clone(&regex));
        }

        trace!(pattern, "compiling pattern");
        let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| {
            ConfigError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            }
        })?;
        let entry = self
            .compiled
            .entry(pattern.to_string())
            .or_insert_with(|| Arc::new(regex));
        Ok(Arc::clone(&entry))
    }

    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_whole_string_match() {
        let cache = PatternCache::new();
        let regex = cache.get_or_compile("[a-z]+").unwrap();
        assert!(regex.is_match("abc"));
        assert!(!regex.is_match("abc1"));
        assert!(!cache.get_or_compile("a|b").unwrap().is_match("ab"));
    }

    #[test]
    fn test_invalid_pattern() {
        let cache = PatternCache::new();
        assert!(matches!(
            cache.get_or_compile("(unclosed"),
            Err(ConfigError::InvalidPattern { .. })
        ));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_first_compilation() {
        let cache = Arc::new(PatternCache::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.get_or_compile(r"\d{3}-\d{4}").unwrap())
            })
            .collect();
        let compiled: Vec<Arc<Regex>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(cache.len(), 1);
        let stored = cache.get_or_compile(r"\d{3}-\d{4}").unwrap();
        for regex in &compiled {
            assert!(regex.is_match("555-1234"));
            assert_eq!(regex.as_str(), stored.as_str());
        }
    }
}
