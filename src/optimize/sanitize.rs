//! Backend-safe parameter names

use rustc_hash::FxHashMap;

use crate::{Error, Result};

/// Map a display name to an identifier of `[A-Za-z0-9_]`.
///
/// Whitespace and `-` become `_`, other characters are dropped, runs of
/// `_` collapse and edge underscores are trimmed. Applying it twice gives
/// the same result.
///
/// ```
/// use scout_doe::optimize::sanitize;
///
/// assert_eq!(sanitize("NaCl (mM)"), "NaCl_mM");
/// assert_eq!(sanitize("Temp(C)"), "TempC");
/// assert_eq!(sanitize("Buffer pH (7-9)"), "Buffer_pH_7_9");
/// ```
#[must_use]
pub fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        let mapped = if ch.is_whitespace() || ch == '-' {
            '_'
        } else if ch.is_ascii_alphanumeric() || ch == '_' {
            ch
        } else {
            continue;
        };
        if mapped == '_' && (out.is_empty() || out.ends_with('_')) {
            continue;
        }
        out.push(mapped);
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// Bijection between original factor names and sanitized identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameMapping {
    to_sanitized: FxHashMap<String, String>,
    to_original: FxHashMap<String, String>,
    order: Vec<String>,
}

impl NameMapping {
    /// Sanitize every name.
    ///
    /// # Errors
    /// Returns [`Error::NameCollision`] if two names sanitize to the same
    /// identifier, or [`Error::InvalidInput`] if a name sanitizes to nothing.
    pub fn build<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let mut mapping = Self::default();
        for name in names {
            let sanitized = sanitize(name);
            if sanitized.is_empty() {
                return Err(Error::InvalidInput(format!(
                    "factor name {name:?} has no characters usable as a parameter name"
                )));
            }
            if let Some(first) = mapping.to_original.get(&sanitized) {
                return Err(Error::NameCollision {
                    first: first.clone(),
                    second: name.to_string(),
                    sanitized,
                });
            }
            mapping.to_sanitized.insert(name.to_string(), sanitized.clone());
            mapping.to_original.insert(sanitized, name.to_string());
            mapping.order.push(name.to_string());
        }
        Ok(mapping)
    }

    /// Sanitized identifier of an original name.
    #[must_use]
    pub fn sanitized(&self, original: &str) -> Option<&str> {
        self.to_sanitized.get(original).map(String::as_str)
    }

    /// Original name of a sanitized identifier.
    #[must_use]
    pub fn original(&self, sanitized: &str) -> Option<&str> {
        self.to_original.get(sanitized).map(String::as_str)
    }

    /// `(original, sanitized)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.order
            .iter()
            .filter_map(|o| self.sanitized(o).map(|s| (o.as_str(), s)))
    }

    /// Number of names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the mapping is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_cases() {
        assert_eq!(sanitize("NaCl (mM)"), "NaCl_mM");
        assert_eq!(sanitize("Temp(C)"), "TempC");
        assert_eq!(sanitize("Factor-1"), "Factor_1");
        assert_eq!(sanitize("Buffer pH (7-9)"), "Buffer_pH_7_9");
        assert_eq!(sanitize("  __a -- b__ "), "a_b");
        assert_eq!(sanitize("µM"), "M");
        assert_eq!(sanitize("()"), "");
    }

    #[test]
    fn test_mapping_round_trip() {
        let mapping = NameMapping::build(["NaCl (mM)", "Buffer pH"]).unwrap();
        assert_eq!(mapping.sanitized("NaCl (mM)"), Some("NaCl_mM"));
        assert_eq!(mapping.original("Buffer_pH"), Some("Buffer pH"));
        assert_eq!(
            mapping.iter().collect::<Vec<_>>(),
            vec![("NaCl (mM)", "NaCl_mM"), ("Buffer pH", "Buffer_pH")]
        );
    }

    #[test]
    fn test_collision_detected() {
        let err = NameMapping::build(["NaCl (mM)", "NaCl mM"]).unwrap_err();
        match err {
            Error::NameCollision {
                first,
                second,
                sanitized,
            } => {
                assert_eq!(first, "NaCl (mM)");
                assert_eq!(second, "NaCl mM");
                assert_eq!(sanitized, "NaCl_mM");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_sanitized_name_rejected() {
        assert!(matches!(NameMapping::build(["(%)"]), Err(Error::InvalidInput(_))));
    }
}
