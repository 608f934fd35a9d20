//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the core domain expects from infrastructure.
//! They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No process, archive or filesystem details in any signature
//! - Failures that the bootstrap tolerates are absorbed by the implementation
//!   and surface as empty results, never as errors

pub mod helper;
pub mod installation;
pub mod resolver;

pub use helper::ResourceHelperPort;
pub use installation::{FixedInstallation, InstallationFinder, NoInstallation};
pub use resolver::{ModuleResolver, Resolution, ResolverChain};
