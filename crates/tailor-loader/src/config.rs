//! Build file
//!
//! Every build directory holds a `tailor.yaml`:
//!
//! ```yaml
//! resources:
//!   - deployment.yaml
//!   - ../base
//!   - github.com/org/repo//deploy?ref=v1
//! namePrefix: dev-
//! commonLabels:
//!   env: dev
//! transformers:
//!   - kind: PrefixSuffixTransformer
//!     suffix: -v2
//!     fieldSpecs:
//!       - kind: Deployment
//!         path: metadata/name
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tailor_transform::{LabelTransformer, Pipeline, PrefixSuffixTransformer, TransformError, TransformerConfig};

/// Name of the build file inside a build directory
pub const BUILD_FILE: &str = "tailor.yaml";

/// Contents of a build file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BuildConfig {
    /// Manifest files, base directories and remote bases, in order
    #[serde(default)]
    pub resources: Vec<String>,

    /// Prefix for every resource name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name_prefix: String,

    /// Suffix for every resource name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name_suffix: String,

    /// Labels for every resource, selector and pod template
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub common_labels: IndexMap<String, String>,

    /// Further transformers, applied last in listed order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transformers: Vec<TransformerConfig>,
}

impl BuildConfig {
    /// Parse a build file
    ///
    /// # Errors
    /// Returns the parse error for malformed YAML or unknown keys
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        // An empty file is an empty build
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// Pipeline this build runs: prefix/suffix, labels, then `transformers`
    ///
    /// # Errors
    /// Returns [`TransformError::InvalidConfig`] for an invalid transformer
    pub fn pipeline(&self) -> Result<Pipeline, TransformError> {
        let mut pipeline = Pipeline::new();
        if !self.name_prefix.is_empty() || !self.name_suffix.is_empty() {
            pipeline.push(PrefixSuffixTransformer::for_names(
                self.name_prefix.clone(),
                self.name_suffix.clone(),
            ));
        }
        if !self.common_labels.is_empty() {
            pipeline.push(LabelTransformer::common(self.common_labels.clone()));
        }
        for config in &self.transformers {
            pipeline.push_boxed(config.clone().build()?);
        }
        Ok(pipeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_build_file() {
        let config = BuildConfig::from_yaml(
            "resources:\n- a.yaml\n- ../base\nnamePrefix: dev-\nnameSuffix: -v2\ncommonLabels:\n  env: dev\ntransformers:\n- kind: LabelTransformer\n  labels:\n    team: core\n",
        )
        .unwrap();
        assert_eq!(config.resources, vec!["a.yaml", "../base"]);
        assert_eq!(config.name_prefix, "dev-");
        assert_eq!(config.common_labels.get("env").map(String::as_str), Some("dev"));
        assert_eq!(config.pipeline().unwrap().len(), 3);
    }

    #[test]
    fn empty_file_is_empty_build() {
        let config = BuildConfig::from_yaml("\n").unwrap();
        assert!(config.resources.is_empty());
        assert!(config.pipeline().unwrap().is_empty());
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(BuildConfig::from_yaml("resource:\n- a.yaml\n").is_err());
    }
}
