//! Resolver options.
//!
//! Everything that changes resolution behavior between compilation modes is
//! passed in explicitly through [`ResolverOptions`]; there is no global state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("invalid resolver options: {0}")]
    Json(#[from] serde_json::Error),
}

/// Options for type resolution and call prioritization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolverOptions {
    /// Whether `dynamic` may be written as a type.
    pub dynamic_types_allowed: bool,
    /// Whether type references in declarations may be resolved on first use.
    pub lazy_type_resolution: bool,
    /// Also look up `plus`/`minus` for `unaryPlus`/`unaryMinus` calls.
    pub unary_operator_migration: bool,
    /// Warn when a platform class with a built-in counterpart is referenced.
    pub platform_class_mapping_check: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            dynamic_types_allowed: false,
            lazy_type_resolution: true,
            unary_operator_migration: true,
            platform_class_mapping_check: true,
        }
    }
}

impl ResolverOptions {
    /// Parse options from JSON. Missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, OptionsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Options with every type reference resolved immediately.
    pub fn eager() -> Self {
        Self {
            lazy_type_resolution: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_keep_defaults() {
        let options = ResolverOptions::from_json(r#"{ "dynamicTypesAllowed": true }"#).unwrap();
        assert!(options.dynamic_types_allowed);
        assert!(options.lazy_type_resolution);
        assert!(options.unary_operator_migration);
        assert!(options.platform_class_mapping_check);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = ResolverOptions::from_json("{ lazy").unwrap_err();
        assert!(err.to_string().starts_with("invalid resolver options"));
    }

    #[test]
    fn options_round_trip_through_json() {
        let options = ResolverOptions {
            platform_class_mapping_check: false,
            ..ResolverOptions::eager()
        };
        let json = serde_json::to_string(&options).unwrap();
        assert!(json.contains("\"lazyTypeResolution\":false"));
        assert_eq!(ResolverOptions::from_json(&json).unwrap(), options);
    }
}
