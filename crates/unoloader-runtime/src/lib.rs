//! Process and filesystem adapters for unoloader.
//!
//! Implements the ports declared in `unoloader-core`: installation discovery,
//! the `unoinfo` helper query, module lookup across directories and
//! archives, and running entry points.

#![deny(unsafe_code)]

pub mod classpath;
mod drain;
pub mod finder;
pub mod invoke;
pub mod loader_cell;
pub mod search_path;
pub mod unoinfo;

pub use classpath::ResourceListBuilder;
pub use finder::{DefaultInstallationFinder, UNO_PATH_ENV};
pub use invoke::{CONTEXT_PATH_ENV, EntryInvoker, InvokeError, ProgramLinker};
pub use loader_cell::LoaderCell;
pub use search_path::{FoundResource, SearchPathResolver};
pub use unoinfo::{
    DEFAULT_OUTPUT_CEILING, HELPER_ECOSYSTEM, HELPER_NAME, HelperError, UnoinfoHelper,
    read_bounded,
};
