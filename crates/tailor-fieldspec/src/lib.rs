//! tailor Field Specs
//!
//! Declarative descriptions of where in a resource a transformer may act,
//! and the matcher resolving them against a collection.
//!
//! # Overview
//!
//! - **FieldPath**: Slash-separated path, sequences traversed implicitly or with `[]`
//! - **FieldSpec**: Category selector plus path plus the `create` flag
//! - **PathMatcher**: Resolves specs into concrete locations, in collection order
//!
//! # Example
//!
//! ```rust
//! use tailor_fieldspec::{FieldSpec, PathMatcher};
//! use tailor_resource::{codec, ResourceCollection};
//!
//! let text = "apiVersion: v1\nkind: Pod\nmetadata:\n  name: p\nspec:\n  containers:\n  - name: a\n  - name: b\n";
//! let collection = ResourceCollection::from_resources(codec::decode_resources(text, "pod.yaml").unwrap()).unwrap();
//!
//! let spec = FieldSpec::for_kind("Pod", "spec/containers/name".parse().unwrap());
//! let matches = PathMatcher::new(&collection).find(&spec).unwrap();
//! assert_eq!(matches.len(), 2);
//! ```

#![warn(missing_docs)]

pub mod matcher;
pub mod path;
pub mod spec;

// Re-exports
pub use matcher::{MatchError, PathMatch, PathMatcher};
pub use path::{FieldPath, PathError, PathSegment};
pub use spec::{is_bypass_kind, FieldSpec, BYPASS_KINDS};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for field spec operations
    pub use crate::{FieldPath, FieldSpec, MatchError, PathMatch, PathMatcher};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
