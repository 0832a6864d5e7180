//! Identity-indexed resource collection
//!
//! Provides [`ResourceCollection`], the ordered set of resources every
//! transformer operates on, and [`ChangeBatch`] for committing a set of
//! field writes all at once.
//!
//! Identity is unique at every point in time. Writes to a name or
//! namespace field are identity changes: a batch is validated against the
//! whole collection before anything is touched, and a batch that would
//! make two resources share an identity is rejected as a unit.

use std::collections::{BTreeMap, HashMap};

use crate::error::ResourceError;
use crate::gvk::{Gvk, ResId};
use crate::node::{ConcretePath, Node};
use crate::resource::{Resource, NAMESPACE_FIELD, NAME_FIELD};

/// Ordered, identity-indexed set of resources
///
/// Iteration order is insertion order.
#[derive(Debug, Clone, Default)]
pub struct ResourceCollection {
    /// Resources in insertion order
    resources: Vec<Resource>,

    /// Side index: current identity -> position
    by_id: HashMap<ResId, usize>,

    /// Original name -> positions (original names never change)
    by_original_name: HashMap<String, Vec<usize>>,
}

impl ResourceCollection {
    /// Create empty collection
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from resources, in order
    ///
    /// # Errors
    /// Returns [`ResourceError::DuplicateIdentity`] on the first repeated identity
    pub fn from_resources(resources: impl IntoIterator<Item = Resource>) -> Result<Self, ResourceError> {
        let mut collection = Self::new();
        for resource in resources {
            collection.add(resource)?;
        }
        Ok(collection)
    }

    /// Add a resource at the end
    ///
    /// # Errors
    /// Returns [`ResourceError::DuplicateIdentity`] if the identity is taken
    pub fn add(&mut self, resource: Resource) -> Result<(), ResourceError> {
        let id = resource.id();
        if self.by_id.contains_key(&id) {
            return Err(ResourceError::DuplicateIdentity(id));
        }

        let position = self.resources.len();
        self.by_original_name
            .entry(resource.original_name().to_string())
            .or_default()
            .push(position);
        self.by_id.insert(id, position);
        self.resources.push(resource);
        Ok(())
    }

    /// Append every resource of `other`, preserving its order
    ///
    /// # Errors
    /// Returns [`ResourceError::DuplicateIdentity`] if any identity is taken;
    /// the collection is unchanged in that case.
    pub fn absorb(&mut self, other: ResourceCollection) -> Result<(), ResourceError> {
        if let Some(id) = other.by_id.keys().find(|id| self.by_id.contains_key(*id)) {
            return Err(ResourceError::DuplicateIdentity(id.clone()));
        }
        for resource in other.resources {
            self.add(resource)?;
        }
        Ok(())
    }

    /// Same resources, with every current identity taken as the original one
    ///
    /// Used when a finished collection becomes the input of another build:
    /// references inside it are already consistent with the current names.
    #[must_use]
    pub fn rebased(mut self) -> Self {
        for resource in &mut self.resources {
            resource.rebase();
        }
        self.by_original_name.clear();
        for (position, resource) in self.resources.iter().enumerate() {
            self.by_original_name
                .entry(resource.original_name().to_string())
                .or_default()
                .push(position);
        }
        self
    }

    /// Lookup by current identity components
    #[must_use]
    pub fn get(&self, gvk: &Gvk, namespace: &str, name: &str) -> Option<&Resource> {
        self.get_by_id(&ResId::new(gvk.clone(), namespace, name))
    }

    /// Lookup by current identity
    #[inline]
    #[must_use]
    pub fn get_by_id(&self, id: &ResId) -> Option<&Resource> {
        self.by_id.get(id).map(|&p| &self.resources[p])
    }

    /// Position of a resource by current identity
    #[inline]
    #[must_use]
    pub fn position_of(&self, id: &ResId) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    /// Resource at a position
    #[inline]
    #[must_use]
    pub fn resource(&self, position: usize) -> Option<&Resource> {
        self.resources.get(position)
    }

    /// All resources in insertion order
    #[inline]
    #[must_use]
    pub fn all(&self) -> &[Resource] {
        &self.resources
    }

    /// Iterate in insertion order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter()
    }

    /// Positions of resources created with `name`, in insertion order
    #[inline]
    #[must_use]
    pub fn positions_with_original_name(&self, name: &str) -> &[usize] {
        self.by_original_name
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of resources
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Rename a resource
    ///
    /// The original name is left untouched.
    ///
    /// # Errors
    /// - [`ResourceError::NotFound`] if `id` is not in the collection
    /// - [`ResourceError::IdentityCollision`] if another resource holds the new identity
    pub fn rename(&mut self, id: &ResId, new_name: &str) -> Result<ResId, ResourceError> {
        let position = self
            .position_of(id)
            .ok_or_else(|| ResourceError::NotFound(id.clone()))?;

        let mut batch = ChangeBatch::new();
        batch.push(position, ConcretePath::from_keys(NAME_FIELD), Node::string(new_name));
        self.commit(batch)?;

        Ok(self.resources[position].id())
    }

    /// Validate a batch without applying it
    ///
    /// # Errors
    /// Same as [`ResourceCollection::commit`]
    pub fn check(&self, batch: &ChangeBatch) -> Result<CommitSummary, ResourceError> {
        self.stage(batch).map(|staged| staged.summary)
    }

    /// Apply a batch of field writes atomically
    ///
    /// Every write is applied to a copy of the touched resources first; the
    /// resulting identities are validated against the whole collection, and
    /// only then swapped in. On any error the collection is unchanged.
    ///
    /// # Errors
    /// - [`ResourceError::PositionOutOfRange`] for a write to a missing position
    /// - [`ResourceError::Write`] if a write meets a node of the wrong shape
    /// - [`ResourceError::InvalidField`] if a write leaves a resource without a
    ///   name, or changes its `kind` or `apiVersion`
    /// - [`ResourceError::IdentityCollision`] if final identities are not unique
    pub fn commit(&mut self, batch: ChangeBatch) -> Result<CommitSummary, ResourceError> {
        if batch.is_empty() {
            return Ok(CommitSummary::default());
        }

        let staged = self.stage(&batch)?;
        let summary = staged.summary;

        for (position, content) in staged.contents {
            self.resources[position].replace_content(content);
        }
        if summary.identities_changed > 0 {
            self.rebuild_index();
        }

        tracing::debug!(
            fields = summary.fields_written,
            identities = summary.identities_changed,
            "committed change batch"
        );
        Ok(summary)
    }

    /// Take every current name as the one references point at
    ///
    /// Called once references were repaired after a rename.
    pub fn mark_resolved(&mut self) {
        for resource in &mut self.resources {
            resource.mark_resolved();
        }
    }

    /// Documents in insertion order
    pub fn documents(&self) -> impl Iterator<Item = &Node> {
        self.resources.iter().map(Resource::content)
    }

    fn stage(&self, batch: &ChangeBatch) -> Result<Staged, ResourceError> {
        // Group writes per resource, keeping batch order within each
        let mut grouped: BTreeMap<usize, Vec<&FieldWrite>> = BTreeMap::new();
        for write in &batch.writes {
            if write.position >= self.resources.len() {
                return Err(ResourceError::PositionOutOfRange(write.position));
            }
            grouped.entry(write.position).or_default().push(write);
        }

        let mut contents = Vec::with_capacity(grouped.len());
        let mut new_ids: BTreeMap<usize, ResId> = BTreeMap::new();
        let mut fields_written = 0;

        for (position, writes) in grouped {
            let resource = &self.resources[position];
            let mut content = resource.content().clone();
            for write in writes {
                content.set_path(&write.path, write.value.clone()).map_err(|e| {
                    ResourceError::Write {
                        resource: resource.id(),
                        path: write.path.to_string(),
                        source: Box::new(e),
                    }
                })?;
                fields_written += 1;
            }

            let new_id = staged_id(resource, &content)?;
            if new_id != resource.id() {
                new_ids.insert(position, new_id);
            }
            contents.push((position, content));
        }

        self.validate_identities(&new_ids)?;

        Ok(Staged {
            summary: CommitSummary {
                fields_written,
                identities_changed: new_ids.len(),
            },
            contents,
        })
    }

    /// Final identities must be pairwise distinct across the collection
    fn validate_identities(&self, new_ids: &BTreeMap<usize, ResId>) -> Result<(), ResourceError> {
        let mut claimed: HashMap<&ResId, usize> = HashMap::with_capacity(new_ids.len());

        for (&position, target) in new_ids {
            let renamed = self.resources[position].id();

            if let Some(&other) = claimed.get(target) {
                return Err(ResourceError::IdentityCollision {
                    target: target.clone(),
                    renamed,
                    existing: self.resources[other].id(),
                });
            }

            // A holder of the target identity that is itself moving away is fine
            if let Some(&holder) = self.by_id.get(target) {
                if holder != position && !new_ids.contains_key(&holder) {
                    return Err(ResourceError::IdentityCollision {
                        target: target.clone(),
                        renamed,
                        existing: self.resources[holder].id(),
                    });
                }
            }

            claimed.insert(target, position);
        }
        Ok(())
    }

    fn rebuild_index(&mut self) {
        self.by_id = self
            .resources
            .iter()
            .enumerate()
            .map(|(position, resource)| (resource.id(), position))
            .collect();
    }
}

impl<'a> IntoIterator for &'a ResourceCollection {
    type Item = &'a Resource;
    type IntoIter = std::slice::Iter<'a, Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.resources.iter()
    }
}

fn staged_id(resource: &Resource, content: &Node) -> Result<ResId, ResourceError> {
    // The schema category is fixed for the lifetime of a resource
    let text = |key: &str| content.get(key).and_then(Node::as_str).unwrap_or_default().to_string();
    let gvk = Gvk::from_api_version(&text("apiVersion"), text("kind"));
    if &gvk != resource.gvk() {
        return Err(ResourceError::InvalidField {
            field: "kind",
            reason: format!("write changes the schema category from {} to {gvk}", resource.gvk()),
            origin: resource.provenance().map(ToString::to_string),
        });
    }

    let read = move |keys: [&str; 2]| content.get_path(&ConcretePath::from_keys(keys));
    let name = read(NAME_FIELD)
        .and_then(Node::as_str)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ResourceError::InvalidField {
            field: "metadata.name",
            reason: "write leaves the resource without a string name".to_string(),
            origin: resource.provenance().map(ToString::to_string),
        })?;

    let namespace = match read(NAMESPACE_FIELD) {
        None => "",
        Some(node) if node.is_null() => "",
        Some(node) => node.as_str().ok_or_else(|| ResourceError::InvalidField {
            field: "metadata.namespace",
            reason: format!("expected string, found {}", node.shape()),
            origin: resource.provenance().map(ToString::to_string),
        })?,
    };

    Ok(ResId::new(gvk, namespace, name))
}

struct Staged {
    summary: CommitSummary,
    contents: Vec<(usize, Node)>,
}

/// A single planned write
#[derive(Debug, Clone, PartialEq)]
pub struct FieldWrite {
    /// Collection position of the target resource
    pub position: usize,
    /// Location inside the resource
    pub path: ConcretePath,
    /// Value to write
    pub value: Node,
}

impl FieldWrite {
    /// Check if the write targets the name or namespace field
    #[inline]
    #[must_use]
    pub fn is_identity_write(&self) -> bool {
        self.path.is_keys(&NAME_FIELD) || self.path.is_keys(&NAMESPACE_FIELD)
    }
}

/// Ordered set of planned field writes, committed as one unit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeBatch {
    writes: Vec<FieldWrite>,
}

impl ChangeBatch {
    /// Create empty batch
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Plan a write
    pub fn push(&mut self, position: usize, path: ConcretePath, value: Node) {
        self.writes.push(FieldWrite {
            position,
            path,
            value,
        });
    }

    /// Planned writes in order
    #[inline]
    #[must_use]
    pub fn writes(&self) -> &[FieldWrite] {
        &self.writes
    }

    /// Number of planned writes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Check if nothing is planned
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Check if any write targets an identity field
    #[must_use]
    pub fn touches_identity(&self) -> bool {
        self.writes.iter().any(FieldWrite::is_identity_write)
    }
}

/// Outcome of a commit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitSummary {
    /// Number of field writes applied
    pub fields_written: usize,
    /// Number of resources whose identity changed
    pub identities_changed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Mapping;

    fn resource(kind: &str, name: &str, namespace: &str) -> Resource {
        let mut metadata = Mapping::new();
        metadata.insert("name".into(), Node::string(name));
        if !namespace.is_empty() {
            metadata.insert("namespace".into(), Node::string(namespace));
        }
        let mut root = Mapping::new();
        root.insert("apiVersion".into(), Node::string("v1"));
        root.insert("kind".into(), Node::string(kind));
        root.insert("metadata".into(), Node::Mapping(metadata));
        Resource::from_document(Node::Mapping(root), None).unwrap()
    }

    fn secret_gvk() -> Gvk {
        Gvk::new("", "v1", "Secret")
    }

    fn name_path() -> ConcretePath {
        ConcretePath::from_keys(NAME_FIELD)
    }

    #[test]
    fn add_and_get() {
        let mut c = ResourceCollection::new();
        c.add(resource("Secret", "a", "")).unwrap();
        c.add(resource("Secret", "a", "prod")).unwrap();

        assert_eq!(c.len(), 2);
        assert!(c.get(&secret_gvk(), "", "a").is_some());
        assert!(c.get(&secret_gvk(), "prod", "a").is_some());
        assert!(c.get(&secret_gvk(), "dev", "a").is_none());
    }

    #[test]
    fn add_duplicate_fails() {
        let mut c = ResourceCollection::new();
        c.add(resource("Secret", "a", "")).unwrap();
        let result = c.add(resource("Secret", "a", ""));
        assert!(matches!(result, Err(ResourceError::DuplicateIdentity(_))));
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn all_keeps_insertion_order() {
        let c = ResourceCollection::from_resources([
            resource("Service", "z", ""),
            resource("Secret", "a", ""),
            resource("ConfigMap", "m", ""),
        ])
        .unwrap();
        let names: Vec<_> = c.all().iter().map(Resource::name).collect();
        assert_eq!(names, vec!["z", "a", "m"]);
    }

    #[test]
    fn rename_updates_index_and_keeps_original() {
        let mut c = ResourceCollection::from_resources([resource("Secret", "sec", "")]).unwrap();
        let old = c.all()[0].id();
        let new = c.rename(&old, "test-sec").unwrap();

        assert_eq!(new.name, "test-sec");
        assert!(c.get_by_id(&old).is_none());
        let renamed = c.get_by_id(&new).unwrap();
        assert_eq!(renamed.original_name(), "sec");
        assert_eq!(c.positions_with_original_name("sec"), &[0]);
        assert!(c.positions_with_original_name("test-sec").is_empty());
    }

    #[test]
    fn rename_onto_existing_collides() {
        let mut c = ResourceCollection::from_resources([
            resource("Secret", "a", ""),
            resource("Secret", "b", ""),
        ])
        .unwrap();
        let a = c.all()[0].id();
        let result = c.rename(&a, "b");
        assert!(matches!(result, Err(ResourceError::IdentityCollision { .. })));
        assert_eq!(c.all()[0].name(), "a");
    }

    #[test]
    fn rename_other_kind_same_name_is_fine() {
        let mut c = ResourceCollection::from_resources([
            resource("Secret", "a", ""),
            resource("ConfigMap", "b", ""),
        ])
        .unwrap();
        let a = c.all()[0].id();
        assert!(c.rename(&a, "b").is_ok());
    }

    #[test]
    fn rename_missing_resource() {
        let mut c = ResourceCollection::new();
        let id = ResId::new(secret_gvk(), "", "ghost");
        assert!(matches!(c.rename(&id, "x"), Err(ResourceError::NotFound(_))));
    }

    #[test]
    fn batch_collision_leaves_collection_untouched() {
        let mut c = ResourceCollection::from_resources([
            resource("Secret", "a", ""),
            resource("Secret", "b", ""),
        ])
        .unwrap();
        let before = c.clone();

        let mut batch = ChangeBatch::new();
        batch.push(0, name_path(), Node::string("same"));
        batch.push(1, name_path(), Node::string("same"));
        let result = c.commit(batch);

        assert!(matches!(result, Err(ResourceError::IdentityCollision { .. })));
        assert_eq!(c.all(), before.all());
        assert!(c.get(&secret_gvk(), "", "a").is_some());
    }

    #[test]
    fn batch_swap_is_allowed() {
        let mut c = ResourceCollection::from_resources([
            resource("Secret", "a", ""),
            resource("Secret", "b", ""),
        ])
        .unwrap();

        let mut batch = ChangeBatch::new();
        batch.push(0, name_path(), Node::string("b"));
        batch.push(1, name_path(), Node::string("a"));
        let summary = c.commit(batch).unwrap();

        assert_eq!(summary.identities_changed, 2);
        assert_eq!(c.get(&secret_gvk(), "", "b").unwrap().original_name(), "a");
        assert_eq!(c.get(&secret_gvk(), "", "a").unwrap().original_name(), "b");
    }

    #[test]
    fn batch_shape_error_is_atomic() {
        let mut c = ResourceCollection::from_resources([
            resource("Secret", "a", ""),
            resource("Secret", "b", ""),
        ])
        .unwrap();
        let before = c.clone();

        let mut batch = ChangeBatch::new();
        batch.push(0, name_path(), Node::string("renamed"));
        batch.push(1, ConcretePath::from_keys(["kind", "deep"]), Node::string("x"));
        let result = c.commit(batch);

        assert!(matches!(result, Err(ResourceError::Write { .. })));
        assert_eq!(c.all(), before.all());
    }

    #[test]
    fn namespace_write_is_identity_change() {
        let mut c = ResourceCollection::from_resources([resource("Secret", "a", "")]).unwrap();
        let mut batch = ChangeBatch::new();
        batch.push(0, ConcretePath::from_keys(NAMESPACE_FIELD), Node::string("prod"));
        assert!(batch.touches_identity());

        let summary = c.commit(batch).unwrap();
        assert_eq!(summary.identities_changed, 1);
        assert!(c.get(&secret_gvk(), "prod", "a").is_some());
        assert_eq!(c.all()[0].original_namespace(), "");
    }

    #[test]
    fn removing_name_is_rejected() {
        let mut c = ResourceCollection::from_resources([resource("Secret", "a", "")]).unwrap();
        let mut batch = ChangeBatch::new();
        batch.push(0, name_path(), Node::null());
        let result = c.commit(batch);
        assert!(matches!(result, Err(ResourceError::InvalidField { field: "metadata.name", .. })));
    }

    #[test]
    fn schema_category_writes_are_rejected() {
        let mut c = ResourceCollection::from_resources([resource("Secret", "a", "")]).unwrap();
        let before = c.clone();

        let mut kind = ChangeBatch::new();
        kind.push(0, ConcretePath::from_keys(["kind"]), Node::string("ConfigMap"));
        assert!(matches!(c.commit(kind), Err(ResourceError::InvalidField { field: "kind", .. })));

        let mut api_version = ChangeBatch::new();
        api_version.push(0, ConcretePath::from_keys(["apiVersion"]), Node::string("example.com/v2"));
        assert!(matches!(c.commit(api_version), Err(ResourceError::InvalidField { field: "kind", .. })));

        assert_eq!(c.all(), before.all());
        assert!(c.get(&secret_gvk(), "", "a").is_some());
    }

    #[test]
    fn rewriting_same_schema_category_is_allowed() {
        let mut c = ResourceCollection::from_resources([resource("Secret", "a", "")]).unwrap();
        let mut batch = ChangeBatch::new();
        batch.push(0, ConcretePath::from_keys(["kind"]), Node::string("Secret"));
        assert!(c.commit(batch).is_ok());
        assert_eq!(c.position_of(&ResId::new(secret_gvk(), "", "a")), Some(0));
    }

    #[test]
    fn mark_resolved_checkpoints_every_resource() {
        let mut c = ResourceCollection::from_resources([
            resource("Secret", "a", ""),
            resource("Secret", "b", ""),
        ])
        .unwrap();
        let a = c.all()[0].id();
        c.rename(&a, "x-a").unwrap();
        assert!(c.all()[0].has_pending_rename());

        c.mark_resolved();
        assert!(c.iter().all(|r| !r.has_pending_rename()));
        assert_eq!(c.all()[0].resolved_name(), "x-a");
        assert_eq!(c.all()[0].original_name(), "a");
        assert_eq!(c.all()[1].resolved_name(), "b");
    }

    #[test]
    fn check_does_not_mutate() {
        let c = ResourceCollection::from_resources([resource("Secret", "a", "")]).unwrap();
        let mut batch = ChangeBatch::new();
        batch.push(0, name_path(), Node::string("b"));
        let summary = c.check(&batch).unwrap();
        assert_eq!(summary.identities_changed, 1);
        assert_eq!(c.all()[0].name(), "a");
    }

    #[test]
    fn absorb_rejects_duplicates_atomically() {
        let mut c = ResourceCollection::from_resources([resource("Secret", "a", "")]).unwrap();
        let other = ResourceCollection::from_resources([
            resource("Secret", "b", ""),
            resource("Secret", "a", ""),
        ])
        .unwrap();
        assert!(matches!(c.absorb(other), Err(ResourceError::DuplicateIdentity(_))));
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn rebased_takes_current_names_as_original() {
        let mut c = ResourceCollection::from_resources([resource("Secret", "sec", "")]).unwrap();
        let id = c.all()[0].id();
        c.rename(&id, "x-sec").unwrap();

        let c = c.rebased();
        assert_eq!(c.all()[0].original_name(), "x-sec");
        assert_eq!(c.positions_with_original_name("x-sec"), &[0]);
        assert!(c.positions_with_original_name("sec").is_empty());
        assert!(c.get(&secret_gvk(), "", "x-sec").is_some());
    }

    #[test]
    fn absorb_keeps_original_names() {
        let mut base = ResourceCollection::from_resources([resource("Secret", "a", "")]).unwrap();
        let id = base.all()[0].id();
        base.rename(&id, "x-a").unwrap();

        let mut overlay = ResourceCollection::from_resources([resource("ConfigMap", "m", "")]).unwrap();
        overlay.absorb(base).unwrap();

        assert_eq!(overlay.len(), 2);
        assert_eq!(overlay.positions_with_original_name("a"), &[1]);
        assert_eq!(overlay.all()[1].name(), "x-a");
    }
}
