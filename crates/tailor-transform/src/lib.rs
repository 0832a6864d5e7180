//! tailor Transformers
//!
//! Field-spec driven rewriting of resource collections, with references
//! kept consistent across renames.
//!
//! # Core Concepts
//!
//! - [`Transformer`]: One all-or-nothing pipeline step
//! - [`FieldMutator`]: Two-phase rewrite of every location a field spec matches
//! - [`PrefixSuffixTransformer`] / [`LabelTransformer`]: The built-in transformers
//! - [`ReferenceCatalog`]: Data table of cross-resource name references
//! - [`NameReferenceEngine`]: Rewrites references to follow renamed resources
//! - [`Pipeline`]: Runs transformers in order, repairing references after renames
//!
//! # Example
//!
//! ```rust
//! use tailor_resource::{codec, ResourceCollection};
//! use tailor_transform::{Pipeline, PrefixSuffixTransformer};
//!
//! let text = "apiVersion: v1\nkind: Secret\nmetadata:\n  name: sec\n";
//! let mut collection = ResourceCollection::from_resources(codec::decode_resources(text, "in.yaml").unwrap()).unwrap();
//!
//! let pipeline = Pipeline::new().with(PrefixSuffixTransformer::for_names("test-", ""));
//! let report = pipeline.run(&mut collection).unwrap();
//! assert_eq!(collection.all()[0].name(), "test-sec");
//! assert!(report.warnings.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod catalog;
mod config;
mod error;
mod labels;
mod mutator;
mod nameref;
mod pipeline;
mod prefix_suffix;
mod transformer;

// Re-exports
pub use catalog::{ReferenceCatalog, ReferenceSpec};
pub use config::{LabelConfig, PrefixSuffixConfig, TransformerConfig};
pub use error::{PipelineError, TransformError, Warning};
pub use labels::{default_label_field_specs, LabelMerge, LabelTransformer};
pub use mutator::{FieldMutator, ValueRewrite};
pub use nameref::{NameRefPlan, NameRefReport, NameReferenceEngine};
pub use pipeline::{Pipeline, RunReport, StepReport};
pub use prefix_suffix::{default_name_field_specs, PrefixSuffix, PrefixSuffixTransformer};
pub use transformer::{TransformOutcome, Transformer};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
