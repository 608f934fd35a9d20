//! CLI bootstrap - the composition root.
//!
//! Wires the installation finder, the `unoinfo` helper, the resource list
//! builder and the one-shot loader together, then runs the entry module.
//!
//! The loader's parent is a chain of the native modules followed by the
//! ambient search path (the environment-supplied locations alone), so
//! modules on the full search path shadow both.

use std::sync::Arc;

use tracing::info;
use unoloader_core::{
    ChildFirstLoader, InstallationFinder, NativeModules, ResolverChain, ResourceHelperPort,
};
use unoloader_runtime::{
    DefaultInstallationFinder, EntryInvoker, LoaderCell, ProgramLinker, ResourceListBuilder,
    SearchPathResolver, UnoinfoHelper,
};

use crate::config::BootstrapConfig;
use crate::entry::discover_entry;
use crate::error::CliError;

/// Fully composed bootstrap.
#[derive(Debug)]
pub struct Bootstrap {
    args: Vec<String>,
    ambient: SearchPathResolver,
    linker: Arc<ProgramLinker>,
    loader: LoaderCell,
}

impl Bootstrap {
    /// Compose the bootstrap with host discovery and the real helper.
    pub fn new(config: BootstrapConfig) -> Self {
        let finder = Arc::new(DefaultInstallationFinder::new(config.uno_path.clone()));
        Self::with_ports(config, finder, Arc::new(UnoinfoHelper::new()))
    }

    /// Compose the bootstrap around the given installation ports.
    pub fn with_ports(
        config: BootstrapConfig,
        finder: Arc<dyn InstallationFinder>,
        helper: Arc<dyn ResourceHelperPort>,
    ) -> Self {
        let builder =
            ResourceListBuilder::new(config.search_path, config.base_dir, finder, helper);
        let ambient = SearchPathResolver::new(builder.environment_locations());

        let parent = ResolverChain::new()
            .then(Arc::new(NativeModules::with_builtins()))
            .then(Arc::new(ambient.clone()));
        let linker = Arc::new(ProgramLinker::new());
        let loader = LoaderCell::new(builder, Arc::new(parent)).with_linker(linker.clone());

        Self {
            args: config.args,
            ambient,
            linker,
            loader,
        }
    }

    /// The process's module loader, built on first use.
    pub async fn loader(&self) -> Arc<ChildFirstLoader> {
        self.loader.get().await
    }

    /// Discover the entry module, load it and invoke its `fizz` entry point.
    pub async fn run(self) -> Result<(), CliError> {
        let entry = discover_entry(&self.ambient, self.args.clone())?;

        let loader = self.loader().await;
        let module = {
            let loader = Arc::clone(&loader);
            let identifier = entry.identifier.clone();
            // Resolution reads directories and archives synchronously.
            tokio::task::spawn_blocking(move || loader.load_named(&identifier, true))
                .await
                .map_err(|e| CliError::Task(format!("loading {}: {e}", entry.identifier)))??
        };
        info!(module = %module.name(), origin = %module.origin(), args = entry.args.len(), "Starting application");

        EntryInvoker::new(Arc::clone(&self.linker))
            .invoke_main(&module, &entry.args, loader.search_path())
            .await?;
        Ok(())
    }
}

/// Run a bootstrap composed from `config`.
pub async fn run(config: BootstrapConfig) -> Result<(), CliError> {
    Bootstrap::new(config).run().await
}
