//! One-shot, process-wide module loader.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::info;
use unoloader_core::{ChildFirstLoader, ModuleLinker, ModuleResolver, NoopLinker};

use crate::classpath::ResourceListBuilder;
use crate::search_path::SearchPathResolver;

/// Lazily builds the [`ChildFirstLoader`] on first use.
///
/// Concurrent first callers wait for a single construction; every caller
/// receives the same instance. The loader is never rebuilt.
pub struct LoaderCell {
    builder: ResourceListBuilder,
    parent: Arc<dyn ModuleResolver>,
    linker: Arc<dyn ModuleLinker>,
    loader: OnceCell<Arc<ChildFirstLoader>>,
}

impl std::fmt::Debug for LoaderCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderCell")
            .field("builder", &self.builder)
            .field("initialized", &self.loader.initialized())
            .finish_non_exhaustive()
    }
}

impl LoaderCell {
    pub fn new(builder: ResourceListBuilder, parent: Arc<dyn ModuleResolver>) -> Self {
        Self {
            builder,
            parent,
            linker: Arc::new(NoopLinker),
            loader: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn with_linker(mut self, linker: Arc<dyn ModuleLinker>) -> Self {
        self.linker = linker;
        self
    }

    /// The loader, building it if this is the first call.
    pub async fn get(&self) -> Arc<ChildFirstLoader> {
        self.loader
            .get_or_init(|| async {
                let search_path = self.builder.build().await;
                info!(locations = search_path.len(), "Created module loader");
                let local = Arc::new(SearchPathResolver::new(search_path.clone()));
                let loader = ChildFirstLoader::new(search_path, local, Arc::clone(&self.parent))
                    .with_linker(Arc::clone(&self.linker));
                Arc::new(loader)
            })
            .await
            .clone()
    }

    /// The loader if it has been built.
    pub fn try_get(&self) -> Option<Arc<ChildFirstLoader>> {
        self.loader.get().cloned()
    }
}
