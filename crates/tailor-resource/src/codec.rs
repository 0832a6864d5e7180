//! YAML document codec
//!
//! Converts multi-document YAML text to and from [`Node`] trees using
//! serde_yaml. Mapping key order is preserved in both directions.

use serde::Deserialize;
use serde_yaml::Value;

use crate::collection::ResourceCollection;
use crate::error::ResourceError;
use crate::node::{Mapping, Node, Scalar};
use crate::resource::{Provenance, Resource};

/// Separator emitted between documents
pub const DOCUMENT_SEPARATOR: &str = "---\n";

/// A decoded document tagged with its source
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Content tree
    pub node: Node,
    /// Where the document came from
    pub provenance: Provenance,
}

/// Errors converting between text and trees
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Malformed YAML
    #[error("invalid yaml in {origin}: {source}")]
    Yaml {
        /// Source of the text
        origin: String,
        /// Parser error
        #[source]
        source: serde_yaml::Error,
    },

    /// Mapping key that cannot be represented as a string
    #[error("unsupported mapping key in {origin}: {key}")]
    UnsupportedKey {
        /// Source of the text
        origin: String,
        /// Debug rendering of the key
        key: String,
    },

    /// Two mapping keys that read the same once made strings, like `1` and `"1"`
    #[error("duplicate mapping key in {origin}: {key}")]
    DuplicateKey {
        /// Source of the text
        origin: String,
        /// Key as a string
        key: String,
    },

    /// Serialization failure
    #[error("cannot encode document: {0}")]
    Encode(#[source] serde_yaml::Error),

    /// Document is not a valid resource
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

/// Decode every non-empty document in `text`
///
/// # Errors
/// Returns [`CodecError::Yaml`] for malformed input and
/// [`CodecError::UnsupportedKey`] for mapping or sequence keys, and
/// [`CodecError::DuplicateKey`] for keys that collide once made strings.
pub fn decode_documents(text: &str, origin: &str) -> Result<Vec<Document>, CodecError> {
    let mut documents = Vec::new();

    for (index, deserializer) in serde_yaml::Deserializer::from_str(text).enumerate() {
        let value = Value::deserialize(deserializer).map_err(|source| CodecError::Yaml {
            origin: origin.to_string(),
            source,
        })?;
        if value.is_null() {
            continue;
        }

        documents.push(Document {
            node: node_from_yaml(value, origin)?,
            provenance: Provenance::new(origin, index),
        });
    }

    tracing::trace!(origin, count = documents.len(), "decoded documents");
    Ok(documents)
}

/// Decode `text` into resources
///
/// # Errors
/// Same as [`decode_documents`], plus [`CodecError::Resource`] for documents
/// lacking an identity.
pub fn decode_resources(text: &str, origin: &str) -> Result<Vec<Resource>, CodecError> {
    decode_documents(text, origin)?
        .into_iter()
        .map(|doc| Resource::from_document(doc.node, Some(doc.provenance)).map_err(CodecError::from))
        .collect()
}

/// Encode one tree as a YAML document (without separator)
///
/// # Errors
/// Returns [`CodecError::Encode`] if serialization fails
pub fn encode_node(node: &Node) -> Result<String, CodecError> {
    serde_yaml::to_string(&yaml_from_node(node)).map_err(CodecError::Encode)
}

/// Encode trees as a multi-document stream
///
/// # Errors
/// Returns [`CodecError::Encode`] if serialization fails
pub fn encode_documents<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> Result<String, CodecError> {
    let encoded = nodes
        .into_iter()
        .map(encode_node)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(encoded.join(DOCUMENT_SEPARATOR))
}

/// Encode a whole collection in insertion order
///
/// # Errors
/// Returns [`CodecError::Encode`] if serialization fails
pub fn encode_collection(collection: &ResourceCollection) -> Result<String, CodecError> {
    encode_documents(collection.documents())
}

fn node_from_yaml(value: Value, origin: &str) -> Result<Node, CodecError> {
    Ok(match value {
        Value::Null => Node::null(),
        Value::Bool(b) => Node::Scalar(Scalar::Bool(b)),
        Value::Number(n) => Node::Scalar(scalar_from_number(&n)),
        Value::String(s) => Node::string(s),
        Value::Sequence(items) => Node::Sequence(
            items
                .into_iter()
                .map(|item| node_from_yaml(item, origin))
                .collect::<Result<_, _>>()?,
        ),
        Value::Mapping(map) => {
            let mut mapping = Mapping::with_capacity(map.len());
            for (key, value) in map {
                let key = key_from_yaml(key, origin)?;
                if mapping.contains_key(&key) {
                    return Err(CodecError::DuplicateKey {
                        origin: origin.to_string(),
                        key,
                    });
                }
                mapping.insert(key, node_from_yaml(value, origin)?);
            }
            Node::Mapping(mapping)
        }
        // Tags carry no meaning for manifests
        Value::Tagged(tagged) => node_from_yaml(tagged.value, origin)?,
    })
}

fn scalar_from_number(n: &serde_yaml::Number) -> Scalar {
    if let Some(i) = n.as_i64() {
        Scalar::Int(i)
    } else if let Some(u) = n.as_u64() {
        Scalar::UInt(u)
    } else {
        Scalar::Float(n.as_f64().unwrap_or(f64::NAN))
    }
}

fn key_from_yaml(key: Value, origin: &str) -> Result<String, CodecError> {
    match key {
        Value::String(s) => Ok(s),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok("null".to_string()),
        other => Err(CodecError::UnsupportedKey {
            origin: origin.to_string(),
            key: format!("{other:?}"),
        }),
    }
}

fn yaml_from_node(node: &Node) -> Value {
    match node {
        Node::Scalar(Scalar::Null) => Value::Null,
        Node::Scalar(Scalar::Bool(b)) => Value::Bool(*b),
        Node::Scalar(Scalar::Int(i)) => Value::Number((*i).into()),
        Node::Scalar(Scalar::UInt(u)) => Value::Number((*u).into()),
        Node::Scalar(Scalar::Float(f)) => Value::Number((*f).into()),
        Node::Scalar(Scalar::Str(s)) => Value::String(s.clone()),
        Node::Sequence(items) => Value::Sequence(items.iter().map(yaml_from_node).collect()),
        Node::Mapping(map) => Value::Mapping(
            map.iter()
                .map(|(k, v)| (Value::String(k.clone()), yaml_from_node(v)))
                .collect(),
        ),
    }
}
