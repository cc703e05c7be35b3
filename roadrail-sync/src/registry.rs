//! Run-scoped extension registry.
//!
//! Extensions (bridges, structures, anything that hangs off an alignment)
//! are registered on the converter that runs them, never globally.

use crate::identity::AlignmentIdentityMap;
use roadrail_storage::TargetStore;
use roadrail_types::ScopeId;
use std::sync::Arc;
use tracing::{debug, error};

/// A converter plugged in after the road/rail phases.
pub trait ConversionExtension: Send + Sync {
    fn name(&self) -> &str;

    /// Called once per run with the final alignment identity map.
    fn on_alignments_converted(
        &self,
        scope: &ScopeId,
        alignments: &AlignmentIdentityMap,
        store: &dyn TargetStore,
    ) -> anyhow::Result<()>;
}

/// Ordered set of extensions for one converter.
#[derive(Default, Clone)]
pub struct ExtensionRegistry {
    extensions: Vec<Arc<dyn ConversionExtension>>,
}

impl ExtensionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, extension: Arc<dyn ConversionExtension>) {
        self.extensions.push(extension);
    }

    #[must_use]
    pub fn with(mut self, extension: Arc<dyn ConversionExtension>) -> Self {
        self.register(extension);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Runs every extension in registration order. Failures are logged and
    /// returned as `name: error` strings; they never stop the others.
    pub fn notify(
        &self,
        scope: &ScopeId,
        alignments: &AlignmentIdentityMap,
        store: &dyn TargetStore,
    ) -> Vec<String> {
        let mut failures = Vec::new();
        for ext in &self.extensions {
            match ext.on_alignments_converted(scope, alignments, store) {
                Ok(()) => debug!(extension = ext.name(), "extension complete"),
                Err(e) => {
                    error!(extension = ext.name(), "extension failed: {e:#}");
                    failures.push(format!("{}: {e:#}", ext.name()));
                }
            }
        }
        failures
    }
}

impl std::fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.extensions.iter().map(|e| e.name()))
            .finish()
    }
}
