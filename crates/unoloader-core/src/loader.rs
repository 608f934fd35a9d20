//! Child-first module loader.
//!
//! The loader consults its own search path before its parent, the reverse of
//! the usual parent-first delegation. Application modules therefore shadow
//! any same-named module the parent can see. When the local search path has
//! no such module, or refuses to define it, the parent resolves it instead.
//!
//! Resolution is serialized per loader: one lookup is in flight at a time, so
//! a name is never defined twice.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tracing::debug;

use crate::module::{DescriptorError, Module, NameError, QualifiedName};
use crate::ports::{ModuleResolver, Resolution};
use crate::resource::ResourceList;

/// Namespace reserved for modules compiled into the bootstrap binary.
/// Resource locations may not define names inside it.
pub const PROTECTED_NAMESPACE: &str = "unoloader";

/// Errors raised while loading a module.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Neither the loader nor its parent has the module.
    #[error("module not found: {0}")]
    NotFound(QualifiedName),

    /// The parent refused to define the module as well.
    #[error("module {name} may not be defined: {reason}")]
    Forbidden { name: QualifiedName, reason: String },

    /// The requested name is not a valid qualified name.
    #[error("invalid module name: {0}")]
    InvalidName(#[from] NameError),

    /// The module's descriptor exists but is malformed.
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    /// The module was found but could not be linked.
    #[error("failed to link {name}: {reason}")]
    Link { name: QualifiedName, reason: String },
}

/// Port for linking a loaded module: making every entry point runnable.
pub trait ModuleLinker: Send + Sync {
    fn link(&self, module: &Module) -> Result<(), LoadError>;
}

/// Linker that accepts every module as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLinker;

impl ModuleLinker for NoopLinker {
    fn link(&self, _module: &Module) -> Result<(), LoadError> {
        Ok(())
    }
}

/// Module loader with child-first delegation.
pub struct ChildFirstLoader {
    search_path: ResourceList,
    local: Arc<dyn ModuleResolver>,
    parent: Arc<dyn ModuleResolver>,
    linker: Arc<dyn ModuleLinker>,
    loaded: Mutex<HashMap<QualifiedName, Arc<Module>>>,
}

impl std::fmt::Debug for ChildFirstLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChildFirstLoader")
            .field("search_path", &self.search_path)
            .finish_non_exhaustive()
    }
}

impl ChildFirstLoader {
    /// Create a loader over `search_path`.
    ///
    /// `local` must resolve against exactly that search path; `parent` is
    /// consulted whenever `local` does not define a name.
    pub fn new(
        search_path: ResourceList,
        local: Arc<dyn ModuleResolver>,
        parent: Arc<dyn ModuleResolver>,
    ) -> Self {
        Self {
            search_path,
            local,
            parent,
            linker: Arc::new(NoopLinker),
            loaded: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn with_linker(mut self, linker: Arc<dyn ModuleLinker>) -> Self {
        self.linker = linker;
        self
    }

    /// The locations this loader searches, in order.
    pub const fn search_path(&self) -> &ResourceList {
        &self.search_path
    }

    /// Load a module by name, linking it first when `resolve` is set.
    pub fn load(&self, name: &QualifiedName, resolve: bool) -> Result<Arc<Module>, LoadError> {
        let mut loaded = self.loaded.lock().unwrap_or_else(PoisonError::into_inner);

        let module = if let Some(module) = loaded.get(name) {
            Arc::clone(module)
        } else {
            match self.local.resolve(name)? {
                Resolution::Found(module) => {
                    debug!(module = %name, origin = %module.origin(), "Defined module from own search path");
                    loaded.insert(name.clone(), Arc::clone(&module));
                    module
                }
                Resolution::NotFound => {
                    debug!(module = %name, "Not on own search path, delegating to parent");
                    self.delegate(name)?
                }
                Resolution::Forbidden(reason) => {
                    debug!(module = %name, %reason, "Own search path may not define module, delegating to parent");
                    self.delegate(name)?
                }
            }
        };

        if resolve {
            self.linker.link(&module)?;
        }
        Ok(module)
    }

    /// Parse `name` and load it.
    pub fn load_named(&self, name: &str, resolve: bool) -> Result<Arc<Module>, LoadError> {
        let name: QualifiedName = name.parse()?;
        self.load(&name, resolve)
    }

    /// Link an already loaded module.
    pub fn link(&self, module: &Module) -> Result<(), LoadError> {
        self.linker.link(module)
    }

    fn delegate(&self, name: &QualifiedName) -> Result<Arc<Module>, LoadError> {
        match self.parent.resolve(name)? {
            Resolution::Found(module) => Ok(module),
            Resolution::NotFound => Err(LoadError::NotFound(name.clone())),
            Resolution::Forbidden(reason) => Err(LoadError::Forbidden {
                name: name.clone(),
                reason,
            }),
        }
    }
}
