//! Core domain types and port definitions for unoloader.
//!
//! This crate holds everything about *where resources are and how modules are
//! loaded from them* that does not touch processes or the filesystem layout
//! of a particular platform:
//!
//! - [`resource`]: resource locations and ordered search paths
//! - [`envelope`]: decoding of the `unoinfo` helper's output
//! - [`manifest`]: packaging metadata manifests
//! - [`module`]: modules, entry points and module descriptors
//! - [`loader`]: the child-first module loader
//! - [`native`]: modules compiled into the bootstrap binary
//! - [`ports`]: traits implemented by `unoloader-runtime`

#![deny(unsafe_code)]

pub mod envelope;
pub mod loader;
pub mod manifest;
pub mod module;
pub mod native;
pub mod ports;
pub mod resource;

// Re-export commonly used types for convenience
pub use envelope::{Envelope, EnvelopeError};
pub use loader::{ChildFirstLoader, LoadError, ModuleLinker, NoopLinker, PROTECTED_NAMESPACE};
pub use manifest::{APPLICATION_CLASS, LOADER_ENTRY, MANIFEST_RESOURCE, Manifest, ManifestError};
pub use module::{
    DescriptorError, ENTRY_METHOD, EntryPoint, EntryTarget, Invocation, Module, ModuleOrigin,
    NameError, NativeEntry, ParamType, QualifiedName, ReturnType, Signature, define_module,
};
pub use native::{INFO_MODULE, NativeModules};
pub use ports::{
    FixedInstallation, InstallationFinder, ModuleResolver, NoInstallation, Resolution,
    ResolverChain, ResourceHelperPort,
};
pub use resource::{
    PATH_LIST_SEPARATOR, ResourceError, ResourceList, ResourceLocation, locations_from_paths,
    parse_path_list,
};
