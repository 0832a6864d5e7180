//! Generic content trees
//!
//! Provides [`Node`], the ordered tree every manifest document is decoded
//! into, and [`ConcretePath`] for addressing a single location inside it.

use indexmap::IndexMap;
use std::fmt::{self, Display, Formatter};

use crate::error::ResourceError;

/// Ordered, string-keyed mapping (source order is preserved)
pub type Mapping = IndexMap<String, Node>;

/// Leaf value of a content tree
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// Explicit null (or an empty value)
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Integer above the signed range
    UInt(u64),
    /// Floating point number
    Float(f64),
    /// String
    Str(String),
}

impl Scalar {
    /// Borrow as string (only for [`Scalar::Str`])
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Textual form used when a non-string scalar is rewritten as a string
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::UInt(u) => u.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Str(s) => s.clone(),
        }
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            other => f.write_str(&other.to_text()),
        }
    }
}

/// Shape of a node, used in diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// A leaf value
    Scalar,
    /// A string-keyed mapping
    Mapping,
    /// An ordered sequence
    Sequence,
}

impl Display for Shape {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Scalar => "scalar",
            Self::Mapping => "mapping",
            Self::Sequence => "sequence",
        };
        f.write_str(s)
    }
}

/// Node of a content tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Leaf value
    Scalar(Scalar),
    /// Ordered mapping
    Mapping(Mapping),
    /// Ordered sequence
    Sequence(Vec<Node>),
}

impl Node {
    /// Null leaf
    #[inline]
    #[must_use]
    pub fn null() -> Self {
        Self::Scalar(Scalar::Null)
    }

    /// String leaf
    #[inline]
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::Scalar(Scalar::Str(value.into()))
    }

    /// Empty mapping
    #[inline]
    #[must_use]
    pub fn mapping() -> Self {
        Self::Mapping(Mapping::new())
    }

    /// Shape of this node
    #[inline]
    #[must_use]
    pub fn shape(&self) -> Shape {
        match self {
            Self::Scalar(_) => Shape::Scalar,
            Self::Mapping(_) => Shape::Mapping,
            Self::Sequence(_) => Shape::Sequence,
        }
    }

    /// Check for an explicit null
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Scalar(Scalar::Null))
    }

    /// Borrow as string (only for string leaves)
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => s.as_str(),
            _ => None,
        }
    }

    /// Borrow as mapping
    #[inline]
    #[must_use]
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Self::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Borrow as sequence
    #[inline]
    #[must_use]
    pub fn as_sequence(&self) -> Option<&[Node]> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Child of a mapping node by key
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    /// Follow a concrete path
    #[must_use]
    pub fn get_path(&self, path: &ConcretePath) -> Option<&Node> {
        path.steps().iter().try_fold(self, |node, step| match (node, step) {
            (Self::Mapping(m), Step::Key(k)) => m.get(k),
            (Self::Sequence(items), Step::Index(i)) => items.get(*i),
            _ => None,
        })
    }

    /// Follow a concrete path mutably
    #[must_use]
    pub fn get_path_mut(&mut self, path: &ConcretePath) -> Option<&mut Node> {
        let mut current = self;
        for step in path.steps() {
            current = match (current, step) {
                (Self::Mapping(m), Step::Key(k)) => m.get_mut(k)?,
                (Self::Sequence(items), Step::Index(i)) => items.get_mut(*i)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Write `value` at `path`
    ///
    /// Missing (or null) intermediate mapping entries are materialized as
    /// empty mappings. Sequence indices must already exist.
    ///
    /// # Errors
    /// Returns [`ResourceError::Shape`] if a step meets a node of the wrong
    /// shape, or [`ResourceError::IndexOutOfRange`] for a missing element.
    pub fn set_path(&mut self, path: &ConcretePath, value: Node) -> Result<(), ResourceError> {
        let Some((last, parents)) = path.steps().split_last() else {
            *self = value;
            return Ok(());
        };

        let mut current = self;
        for (depth, step) in parents.iter().enumerate() {
            current = descend_or_create(current, step, path, depth)?;
        }

        match (current, last) {
            (Self::Mapping(m), Step::Key(k)) => {
                m.insert(k.clone(), value);
                Ok(())
            }
            (node @ Self::Scalar(Scalar::Null), Step::Key(k)) => {
                let mut m = Mapping::new();
                m.insert(k.clone(), value);
                *node = Self::Mapping(m);
                Ok(())
            }
            (Self::Sequence(items), Step::Index(i)) => {
                let len = items.len();
                let slot = items.get_mut(*i).ok_or_else(|| ResourceError::IndexOutOfRange {
                    path: path.to_string(),
                    index: *i,
                    len,
                })?;
                *slot = value;
                Ok(())
            }
            (node, step) => Err(ResourceError::Shape {
                path: path.prefix(path.len() - 1).to_string(),
                expected: step.expected_shape(),
                found: node.shape(),
            }),
        }
    }
}

fn descend_or_create<'a>(
    node: &'a mut Node,
    step: &Step,
    path: &ConcretePath,
    depth: usize,
) -> Result<&'a mut Node, ResourceError> {
    if node.is_null() && matches!(step, Step::Key(_)) {
        *node = Node::mapping();
    }
    let found = node.shape();
    match (node, step) {
        (Node::Mapping(m), Step::Key(k)) => {
            let child = m.entry(k.clone()).or_insert_with(Node::mapping);
            if child.is_null() {
                *child = Node::mapping();
            }
            Ok(child)
        }
        (Node::Sequence(items), Step::Index(i)) => {
            let len = items.len();
            items.get_mut(*i).ok_or_else(|| ResourceError::IndexOutOfRange {
                path: path.prefix(depth + 1).to_string(),
                index: *i,
                len,
            })
        }
        (_, step) => Err(ResourceError::Shape {
            path: path.prefix(depth).to_string(),
            expected: step.expected_shape(),
            found,
        }),
    }
}

impl From<Scalar> for Node {
    fn from(scalar: Scalar) -> Self {
        Self::Scalar(scalar)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Self::string(s)
    }
}

/// One step of a concrete path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Step {
    /// Mapping key
    Key(String),
    /// Sequence index
    Index(usize),
}

impl Step {
    /// Shape of the node this step descends into
    #[inline]
    #[must_use]
    pub fn expected_shape(&self) -> Shape {
        match self {
            Self::Key(_) => Shape::Mapping,
            Self::Index(_) => Shape::Sequence,
        }
    }
}

/// Fully resolved location inside a content tree
///
/// Unlike a field path, a concrete path carries no wildcards: every
/// sequence step names the element index.
///
/// # Examples
/// - `metadata/name`
/// - `spec/template/spec/containers[0]/name`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConcretePath(Vec<Step>);

impl ConcretePath {
    /// Root path
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Path made of mapping keys only
    #[must_use]
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(keys.into_iter().map(|k| Step::Key(k.into())).collect())
    }

    /// Steps from root to leaf
    #[inline]
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.0
    }

    /// Number of steps
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check for the root path
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append a step in place
    #[inline]
    pub fn push(&mut self, step: Step) {
        self.0.push(step);
    }

    /// Remove the last step
    #[inline]
    pub fn pop(&mut self) -> Option<Step> {
        self.0.pop()
    }

    /// First `len` steps
    #[inline]
    #[must_use]
    pub fn prefix(&self, len: usize) -> Self {
        Self(self.0[..len.min(self.0.len())].to_vec())
    }

    /// Check whether the path is exactly the given key sequence
    #[must_use]
    pub fn is_keys(&self, keys: &[&str]) -> bool {
        self.0.len() == keys.len()
            && self
                .0
                .iter()
                .zip(keys)
                .all(|(step, key)| matches!(step, Step::Key(k) if k == key))
    }
}

impl Display for ConcretePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for step in &self.0 {
            match step {
                Step::Key(k) => {
                    if !first {
                        f.write_str("/")?;
                    }
                    f.write_str(&k.replace('/', "\\/"))?;
                }
                Step::Index(i) => write!(f, "[{i}]")?,
            }
            first = false;
        }
        Ok(())
    }
}

impl From<Vec<Step>> for ConcretePath {
    fn from(steps: Vec<Step>) -> Self {
        Self(steps)
    }
}
