//! Transformer configuration
//!
//! YAML documents selecting a transformer by `kind`:
//!
//! ```yaml
//! kind: PrefixSuffixTransformer
//! prefix: baked-
//! suffix: -pie
//! fieldSpecs:
//!   - path: metadata/name
//! ```
//!
//! `apiVersion` and `metadata` are accepted and ignored. Without
//! `fieldSpecs`, each transformer falls back to its default field specs.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tailor_fieldspec::FieldSpec;

use crate::error::TransformError;
use crate::labels::{default_label_field_specs, LabelTransformer};
use crate::prefix_suffix::{default_name_field_specs, PrefixSuffixTransformer};
use crate::transformer::Transformer;

/// Configuration of one transformer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum TransformerConfig {
    /// Prefix/suffix transformer
    PrefixSuffixTransformer(PrefixSuffixConfig),
    /// Label transformer
    LabelTransformer(LabelConfig),
}

/// Prefix/suffix transformer settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PrefixSuffixConfig {
    /// Ignored
    #[serde(default, skip_serializing)]
    pub api_version: Option<String>,
    /// Ignored
    #[serde(default, skip_serializing)]
    pub metadata: Option<serde_yaml::Value>,
    /// Text put in front
    #[serde(default)]
    pub prefix: String,
    /// Text appended
    #[serde(default)]
    pub suffix: String,
    /// Where to apply
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub field_specs: Vec<FieldSpec>,
}

/// Label transformer settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LabelConfig {
    /// Ignored
    #[serde(default, skip_serializing)]
    pub api_version: Option<String>,
    /// Ignored
    #[serde(default, skip_serializing)]
    pub metadata: Option<serde_yaml::Value>,
    /// Labels to set
    #[serde(default)]
    pub labels: IndexMap<String, String>,
    /// Where to apply
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub field_specs: Vec<FieldSpec>,
}

impl TransformerConfig {
    /// Parse one configuration document
    ///
    /// # Errors
    /// Returns [`TransformError::Parse`] for malformed YAML, an unknown kind
    /// or unknown keys.
    pub fn from_yaml(text: &str) -> Result<Self, TransformError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Kind name
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PrefixSuffixTransformer(_) => "PrefixSuffixTransformer",
            Self::LabelTransformer(_) => "LabelTransformer",
        }
    }

    /// Build the transformer
    ///
    /// # Errors
    /// Returns [`TransformError::InvalidConfig`] for an empty label key
    pub fn build(self) -> Result<Box<dyn Transformer>, TransformError> {
        match self {
            Self::PrefixSuffixTransformer(cfg) => {
                let specs = or_default(cfg.field_specs, default_name_field_specs);
                Ok(Box::new(PrefixSuffixTransformer::new(cfg.prefix, cfg.suffix, specs)))
            }
            Self::LabelTransformer(cfg) => {
                if cfg.labels.keys().any(String::is_empty) {
                    return Err(TransformError::InvalidConfig(
                        "LabelTransformer: label keys must not be empty".to_string(),
                    ));
                }
                let specs = or_default(cfg.field_specs, default_label_field_specs);
                Ok(Box::new(LabelTransformer::new(cfg.labels, specs)))
            }
        }
    }
}

fn or_default(specs: Vec<FieldSpec>, default: fn() -> Vec<FieldSpec>) -> Vec<FieldSpec> {
    if specs.is_empty() {
        default()
    } else {
        specs
    }
}
