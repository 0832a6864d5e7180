//! Transformer pipeline
//!
//! Runs transformers in order over one collection. After every step that
//! changed an identity, the name-reference engine runs before the next step
//! sees the collection.
//!
//! # Failure
//! The first failing step halts the run. The collection then holds exactly
//! the state committed by the steps before it: transformers commit
//! atomically, and a step whose reference repair fails is rolled back.

use std::sync::Arc;

use tailor_resource::ResourceCollection;

use crate::catalog::ReferenceCatalog;
use crate::error::{PipelineError, TransformError, Warning};
use crate::nameref::NameReferenceEngine;
use crate::transformer::{TransformOutcome, Transformer};

/// What one step did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    /// Transformer name
    pub transformer: String,
    /// Transformer outcome
    pub outcome: TransformOutcome,
    /// Reference fields rewritten after the step
    pub references_rewritten: usize,
}

/// Result of a successful run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// One entry per step, in order
    pub steps: Vec<StepReport>,
    /// Recoverable conditions from every step
    pub warnings: Vec<Warning>,
}

impl RunReport {
    /// Total number of field writes, references included
    #[must_use]
    pub fn total_writes(&self) -> usize {
        self.steps
            .iter()
            .map(|s| s.outcome.fields_written + s.references_rewritten)
            .sum()
    }
}

/// Ordered list of transformers plus the reference engine
#[derive(Debug, Default)]
pub struct Pipeline {
    steps: Vec<Box<dyn Transformer>>,
    engine: NameReferenceEngine,
}

impl Pipeline {
    /// Create empty pipeline over the built-in catalog
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create empty pipeline over a custom catalog
    #[inline]
    #[must_use]
    pub fn with_catalog(catalog: Arc<ReferenceCatalog>) -> Self {
        Self {
            steps: Vec::new(),
            engine: NameReferenceEngine::new(catalog),
        }
    }

    /// Append a step
    pub fn push(&mut self, step: impl Transformer + 'static) {
        self.steps.push(Box::new(step));
    }

    /// Append a boxed step
    pub fn push_boxed(&mut self, step: Box<dyn Transformer>) {
        self.steps.push(step);
    }

    /// Append a step, builder style
    #[must_use]
    pub fn with(mut self, step: impl Transformer + 'static) -> Self {
        self.push(step);
        self
    }

    /// Number of steps
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if there are no steps
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step in order
    ///
    /// # Errors
    /// Returns [`PipelineError`] for the first failing step, carrying the
    /// warnings collected so far. The collection reflects every step before
    /// the failing one.
    pub fn run(&self, collection: &mut ResourceCollection) -> Result<RunReport, PipelineError> {
        let mut report = RunReport::default();

        for (index, step) in self.steps.iter().enumerate() {
            let name = step.name().to_string();
            let fail = |source: TransformError, warnings: Vec<Warning>| PipelineError {
                step: index,
                transformer: name.clone(),
                source,
                warnings,
            };

            let snapshot = collection.clone();
            let outcome = match step.transform(collection) {
                Ok(outcome) => outcome,
                Err(e) => return Err(fail(e, report.warnings)),
            };

            let mut references_rewritten = 0;
            if outcome.is_identity_changing() {
                match self.engine.run(collection) {
                    Ok(refs) => {
                        references_rewritten = refs.rewrites;
                        report.warnings.extend(refs.warnings);
                    }
                    Err(e) => {
                        *collection = snapshot;
                        return Err(fail(e, report.warnings));
                    }
                }
            }

            tracing::info!(
                step = index,
                transformer = %name,
                fields = outcome.fields_written,
                renamed = outcome.identities_changed,
                references = references_rewritten,
                "pipeline step complete"
            );
            report.steps.push(StepReport {
                transformer: name.clone(),
                outcome,
                references_rewritten,
            });
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefix_suffix::PrefixSuffixTransformer;
    use tailor_fieldspec::FieldSpec;
    use tailor_resource::codec::decode_resources;
    use tailor_resource::Node;

    /// Always fails
    #[derive(Debug)]
    struct Broken;

    impl Transformer for Broken {
        fn name(&self) -> &str {
            "Broken"
        }

        fn transform(&self, _collection: &mut ResourceCollection) -> Result<TransformOutcome, TransformError> {
            Err(TransformError::InvalidConfig("broken on purpose".into()))
        }
    }

    fn collection(yaml: &str) -> ResourceCollection {
        ResourceCollection::from_resources(decode_resources(yaml, "test.yaml").unwrap()).unwrap()
    }

    #[test]
    fn steps_run_in_order() {
        let mut c = collection("kind: Secret\nmetadata:\n  name: sec\n");
        let pipeline = Pipeline::new()
            .with(PrefixSuffixTransformer::for_names("a-", ""))
            .with(PrefixSuffixTransformer::for_names("b-", ""));
        let report = pipeline.run(&mut c).unwrap();

        assert_eq!(c.all()[0].name(), "b-a-sec");
        assert_eq!(report.steps.len(), 2);
        assert_eq!(report.total_writes(), 2);
    }

    #[test]
    fn references_follow_every_rename_step() {
        let mut c = collection(
            "kind: Secret\nmetadata:\n  name: sec\n---\nkind: Pod\nmetadata:\n  name: p\nspec:\n  volumes:\n  - name: v\n    secret:\n      secretName: sec\n",
        );
        let only_secrets = |prefix: &str| {
            PrefixSuffixTransformer::new(prefix, "", vec![FieldSpec::for_kind("Secret", "metadata/name".parse().unwrap())])
        };
        let pipeline = Pipeline::new().with(only_secrets("a-")).with(only_secrets("b-"));

        let report = pipeline.run(&mut c).unwrap();

        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
        assert_eq!(report.steps[0].references_rewritten, 1);
        assert_eq!(report.steps[1].references_rewritten, 1);
        assert_eq!(c.all()[0].name(), "b-a-sec");
        let pod = c.all()[1].content();
        let volumes = pod.get("spec").and_then(|s| s.get("volumes")).and_then(Node::as_sequence).unwrap();
        assert_eq!(
            volumes[0].get("secret").and_then(|s| s.get("secretName")).and_then(Node::as_str),
            Some("b-a-sec")
        );
    }

    #[test]
    fn failing_step_keeps_prior_state() {
        let mut c = collection("kind: Secret\nmetadata:\n  name: sec\n");
        let pipeline = Pipeline::new()
            .with(PrefixSuffixTransformer::for_names("a-", ""))
            .with(Broken)
            .with(PrefixSuffixTransformer::for_names("c-", ""));
        let err = pipeline.run(&mut c).unwrap_err();

        assert_eq!(err.step, 1);
        assert_eq!(err.transformer, "Broken");
        assert_eq!(c.all()[0].name(), "a-sec");
    }

    #[test]
    fn empty_pipeline_is_a_no_op() {
        let mut c = collection("kind: Secret\nmetadata:\n  name: sec\n");
        let report = Pipeline::new().run(&mut c).unwrap();
        assert!(report.steps.is_empty());
        assert_eq!(c.all()[0].name(), "sec");
    }
}
