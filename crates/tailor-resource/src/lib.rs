//! tailor Resource Model
//!
//! Identity-indexed collections of manifest documents.
//!
//! # Core Concepts
//!
//! - [`Node`]: Ordered generic tree (scalar, mapping, sequence) every document decodes into
//! - [`Gvk`] / [`ResId`]: Schema category and identity of a resource
//! - [`Resource`]: One document plus its immutable original name and namespace
//! - [`ResourceCollection`]: Ordered set with a side index keyed on identity
//! - [`ChangeBatch`]: Field writes committed all-or-nothing
//!
//! # Example
//!
//! ```rust
//! use tailor_resource::{codec, ResourceCollection};
//!
//! let text = "apiVersion: v1\nkind: Secret\nmetadata:\n  name: sec\n";
//! let resources = codec::decode_resources(text, "secret.yaml").unwrap();
//! let mut collection = ResourceCollection::from_resources(resources).unwrap();
//!
//! let id = collection.all()[0].id();
//! let renamed = collection.rename(&id, "test-sec").unwrap();
//! assert_eq!(collection.get_by_id(&renamed).unwrap().original_name(), "sec");
//! ```

#![warn(unreachable_pub)]

pub mod codec;
mod collection;
mod error;
mod gvk;
mod node;
mod resource;

pub use codec::{CodecError, Document};
pub use collection::{ChangeBatch, CommitSummary, FieldWrite, ResourceCollection};
pub use error::ResourceError;
pub use gvk::{same_namespace, Gvk, ResId};
pub use node::{ConcretePath, Mapping, Node, Scalar, Shape, Step};
pub use resource::{Provenance, Resource, NAMESPACE_FIELD, NAME_FIELD};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
