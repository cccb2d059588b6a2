//! Flat key/value configuration passed to sources and handlers.
//!
//! A [`Context`] is a sorted map of string keys to string values. Sources read
//! their own keys from it and hand a prefix-stripped view to their handler via
//! [`Context::sub_properties`].

use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use crate::error::{ConfigError, ConfigResult};

/// String-keyed configuration map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    parameters: BTreeMap<String, String>,
}

impl Context {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter, returning the updated context.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.put(key, value);
        self
    }

    /// Inserts or replaces a parameter.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.parameters.insert(key.into(), value.into());
    }

    /// Returns `true` if the key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.parameters.contains_key(key)
    }

    /// Returns the raw value for `key`.
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    /// Returns the value for `key`, or `default` when absent.
    pub fn get_string_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get_string(key).unwrap_or(default)
    }

    /// Parses the value for `key` as an integer.
    ///
    /// Returns `Ok(None)` when the key is absent and an
    /// [`ConfigError::InvalidValue`] when it is present but not numeric or out
    /// of range for `T`.
    pub fn get_integer<T>(&self, key: &str) -> ConfigResult<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.get_string(key) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|e| ConfigError::invalid_value(key, raw, e.to_string())),
        }
    }

    /// Parses the value for `key` as a boolean (`true`/`false`, case-insensitive).
    pub fn get_bool(&self, key: &str) -> ConfigResult<Option<bool>> {
        match self.get_string(key) {
            None => Ok(None),
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(Some(true)),
                "false" => Ok(Some(false)),
                _ => Err(ConfigError::invalid_value(
                    key,
                    raw,
                    "expected 'true' or 'false'",
                )),
            },
        }
    }

    /// Returns every parameter whose key starts with `prefix`, with the prefix
    /// stripped. Keys equal to the prefix itself are skipped.
    pub fn sub_properties(&self, prefix: &str) -> Context {
        let parameters = self
            .parameters
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(prefix)
                    .filter(|rest| !rest.is_empty())
                    .map(|rest| (rest.to_string(), value.clone()))
            })
            .collect();
        Context { parameters }
    }

    /// Iterates over all parameters in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.parameters
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the number of parameters.
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// Returns `true` if there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Context
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            parameters: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_integer() {
        let ctx = Context::new().with("port", " 8080 ").with("bad", "eighty");

        assert_eq!(ctx.get_integer::<u16>("port").unwrap(), Some(8080));
        assert_eq!(ctx.get_integer::<u16>("missing").unwrap(), None);
        assert!(matches!(
            ctx.get_integer::<u16>("bad"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_get_integer_out_of_range() {
        let ctx = Context::new().with("port", "70000");
        assert!(ctx.get_integer::<u16>("port").is_err());
    }

    #[test]
    fn test_get_bool() {
        let ctx = Context::new().with("a", "TRUE").with("b", "nope");
        assert_eq!(ctx.get_bool("a").unwrap(), Some(true));
        assert!(ctx.get_bool("b").is_err());
        assert_eq!(ctx.get_bool("c").unwrap(), None);
    }

    #[test]
    fn test_sub_properties_strips_prefix() {
        let ctx: Context = [
            ("port", "1"),
            ("handler", "json"),
            ("handler.charset", "utf-8"),
            ("handler.nested.key", "v"),
            ("handlerx", "ignored"),
        ]
        .into_iter()
        .collect();

        let sub = ctx.sub_properties("handler.");
        assert_eq!(sub.len(), 2);
        assert_eq!(sub.get_string("charset"), Some("utf-8"));
        assert_eq!(sub.get_string("nested.key"), Some("v"));
        assert!(!sub.contains_key("handler"));
    }
}
