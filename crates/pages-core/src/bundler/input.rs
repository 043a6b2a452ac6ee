//! Bundle entry inputs.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Entry inputs as a user may write them.
///
/// Deserializes untagged, so any JSON value is accepted; shapes other than
/// a string, a list of strings or a map of strings land in `Unsupported`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputOption {
    /// A single entry path.
    Single(String),
    /// Entry paths in order.
    Multiple(Vec<String>),
    /// Entry name to entry path.
    Named(BTreeMap<String, String>),
    /// Anything else.
    Unsupported(serde_json::Value),
}

impl InputOption {
    /// Normalize an optional input into an ordered list of entry paths.
    ///
    /// A map contributes its paths in name order; nothing given yields an
    /// empty list.
    pub fn normalize(input: Option<Self>) -> Result<Vec<String>, Error> {
        match input {
            None => Ok(Vec::new()),
            Some(Self::Single(path)) => Ok(vec![path]),
            Some(Self::Multiple(paths)) => Ok(paths),
            Some(Self::Named(named)) => Ok(named.into_values().collect()),
            Some(Self::Unsupported(value)) => Err(Error::UnsupportedInput {
                found: value.to_string(),
            }),
        }
    }
}

impl From<&str> for InputOption {
    fn from(path: &str) -> Self {
        Self::Single(path.to_string())
    }
}

impl From<Vec<String>> for InputOption {
    fn from(paths: Vec<String>) -> Self {
        Self::Multiple(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_shapes() {
        assert!(InputOption::normalize(None).unwrap().is_empty());
        assert_eq!(
            InputOption::normalize(Some("main.html".into())).unwrap(),
            vec!["main.html"]
        );
        assert_eq!(
            InputOption::normalize(Some(vec!["b.html".to_string(), "a.html".to_string()].into()))
                .unwrap(),
            vec!["b.html", "a.html"]
        );

        let named = BTreeMap::from([
            ("nested".to_string(), "nested/index.html".to_string()),
            ("main".to_string(), "index.html".to_string()),
        ]);
        assert_eq!(
            InputOption::normalize(Some(InputOption::Named(named))).unwrap(),
            vec!["index.html", "nested/index.html"]
        );
    }

    #[test]
    fn test_deserialize_untagged() {
        let input: InputOption = serde_json::from_str(r#""index.html""#).unwrap();
        assert_eq!(input, InputOption::Single("index.html".into()));

        let input: InputOption = serde_json::from_str(r#"{"main": "index.html"}"#).unwrap();
        assert!(matches!(input, InputOption::Named(_)));

        let input: InputOption = serde_json::from_str("42").unwrap();
        assert!(matches!(input, InputOption::Unsupported(_)));
    }

    #[test]
    fn test_unsupported_is_an_error() {
        let input: InputOption = serde_json::from_str(r#"["a.html", 1]"#).unwrap();
        let err = InputOption::normalize(Some(input)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedInput { .. }));
        assert!(err.to_string().contains(r#"["a.html",1]"#));
    }
}
