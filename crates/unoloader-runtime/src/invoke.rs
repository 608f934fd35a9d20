//! Linking and invoking module entry points.
//!
//! Command entry points whose program is addressed relative to their
//! location are linked before they run: in a directory location the program
//! must exist, from an archive it is extracted into a private scratch
//! directory that lives as long as the linker.
//!
//! A running entry program inherits stdio and receives the loader's search
//! path in [`CONTEXT_PATH_ENV`], which makes the loader its context loader.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};

use tempfile::TempDir;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};
use unoloader_core::{
    ENTRY_METHOD, EntryPoint, EntryTarget, Invocation, LoadError, Module, ModuleLinker,
    ModuleOrigin, QualifiedName, ResourceList, ResourceLocation, Signature,
};

use crate::search_path::read_archive_entry;

/// Environment variable carrying the loader's search path to entry programs.
pub const CONTEXT_PATH_ENV: &str = "UNOLOADER_CONTEXT_PATH";

/// Errors raised while invoking an entry point.
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("{module} has no entry point {entry}{expected}")]
    EntryPointNotFound {
        module: QualifiedName,
        entry: String,
        expected: Signature,
    },

    #[error("entry point {module}.{entry} has signature {found}, expected {expected}")]
    SignatureMismatch {
        module: QualifiedName,
        entry: String,
        found: Signature,
        expected: Signature,
    },

    #[error(transparent)]
    Link(#[from] LoadError),

    #[error("failed to start {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{module}.{entry} exited with status {code}")]
    ExitCode {
        module: QualifiedName,
        entry: String,
        code: i32,
    },

    #[error("{module}.{entry} terminated by signal")]
    Terminated { module: QualifiedName, entry: String },

    #[error("{module}.{entry} failed: {reason}")]
    Native {
        module: QualifiedName,
        entry: String,
        reason: String,
    },
}

#[derive(Default)]
struct Materialized {
    scratch: Option<TempDir>,
    programs: HashMap<(ResourceLocation, String), PathBuf>,
}

/// Resolves and, for archives, extracts entry programs.
#[derive(Default)]
pub struct ProgramLinker {
    state: Mutex<Materialized>,
}

impl std::fmt::Debug for ProgramLinker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgramLinker").finish_non_exhaustive()
    }
}

impl ProgramLinker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path to execute for `program` as declared by `module`.
    ///
    /// Bare names and absolute paths are returned unchanged; bare names are
    /// looked up on `PATH` when spawned.
    pub fn program_path(&self, module: &Module, program: &str) -> Result<PathBuf, LoadError> {
        if !EntryTarget::is_location_relative(program) {
            return Ok(PathBuf::from(program));
        }
        if Path::new(program)
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(link_error(module, format!("program {program} leaves its location")));
        }

        match module.origin() {
            ModuleOrigin::Directory(location) => match module.program_path(program) {
                Some(path) if path.is_file() => Ok(path),
                _ => Err(link_error(
                    module,
                    format!("program {program} not found in {location}"),
                )),
            },
            ModuleOrigin::Archive(location) => self.materialize(module, location, program),
            ModuleOrigin::Native => Err(link_error(
                module,
                "native modules have no programs".to_string(),
            )),
        }
    }

    fn materialize(
        &self,
        module: &Module,
        location: &ResourceLocation,
        program: &str,
    ) -> Result<PathBuf, LoadError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let key = (location.clone(), program.to_string());
        if let Some(path) = state.programs.get(&key) {
            return Ok(path.clone());
        }

        let bytes = read_archive_entry(&location.path(), program)
            .map_err(|e| link_error(module, format!("reading {program}: {e}")))?
            .ok_or_else(|| link_error(module, format!("program {program} not in {location}")))?;

        let scratch = match &state.scratch {
            Some(dir) => dir.path().to_path_buf(),
            None => {
                let dir = tempfile::Builder::new()
                    .prefix("unoloader-")
                    .tempdir()
                    .map_err(|e| link_error(module, format!("creating scratch directory: {e}")))?;
                let path = dir.path().to_path_buf();
                state.scratch = Some(dir);
                path
            }
        };

        // One subdirectory per archive program keeps equal names apart.
        let target = scratch.join(state.programs.len().to_string()).join(program);
        write_executable(&target, &bytes)
            .map_err(|e| link_error(module, format!("extracting {program}: {e}")))?;
        debug!(program = %program, target = %target.display(), "Extracted entry program");

        state.programs.insert(key, target.clone());
        Ok(target)
    }
}

impl ModuleLinker for ProgramLinker {
    fn link(&self, module: &Module) -> Result<(), LoadError> {
        for entry in module.entry_points() {
            if let EntryTarget::Command { program, .. } = &entry.target {
                self.program_path(module, program)?;
            }
        }
        Ok(())
    }
}

fn link_error(module: &Module, reason: String) -> LoadError {
    LoadError::Link {
        name: module.name().clone(),
        reason,
    }
}

fn write_executable(target: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(target, bytes)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(target, fs::Permissions::from_mode(0o755))?;
    }
    Ok(())
}

/// Runs entry points of loaded modules.
#[derive(Debug, Clone)]
pub struct EntryInvoker {
    linker: Arc<ProgramLinker>,
}

impl EntryInvoker {
    pub const fn new(linker: Arc<ProgramLinker>) -> Self {
        Self { linker }
    }

    /// Invoke the module's `fizz(string[]) -> void` entry point.
    pub async fn invoke_main(
        &self,
        module: &Module,
        args: &[String],
        context_path: &ResourceList,
    ) -> Result<(), InvokeError> {
        let expected = Signature::main();
        let entry = match module.entry_point(ENTRY_METHOD, &expected) {
            Some(entry) => entry,
            None => {
                return Err(match module.entry_point_named(ENTRY_METHOD) {
                    Some(found) => InvokeError::SignatureMismatch {
                        module: module.name().clone(),
                        entry: ENTRY_METHOD.to_string(),
                        found: found.signature.clone(),
                        expected,
                    },
                    None => InvokeError::EntryPointNotFound {
                        module: module.name().clone(),
                        entry: ENTRY_METHOD.to_string(),
                        expected,
                    },
                });
            }
        };
        self.invoke(module, entry, args, context_path).await
    }

    /// Invoke one entry point with `args`.
    pub async fn invoke(
        &self,
        module: &Module,
        entry: &EntryPoint,
        args: &[String],
        context_path: &ResourceList,
    ) -> Result<(), InvokeError> {
        match &entry.target {
            EntryTarget::Native(native) => {
                debug!(module = %module.name(), entry = %entry.name, "Invoking native entry point");
                native
                    .invoke(&Invocation { args, context_path })
                    .map_err(|e| InvokeError::Native {
                        module: module.name().clone(),
                        entry: entry.name.clone(),
                        reason: format!("{e:#}"),
                    })
            }
            EntryTarget::Command {
                program,
                args: fixed,
            } => {
                let path = self.linker.program_path(module, program)?;
                info!(module = %module.name(), program = %path.display(), "Invoking entry point");

                let status = Command::new(&path)
                    .args(fixed)
                    .args(args)
                    .env(CONTEXT_PATH_ENV, context_path.to_path_list())
                    .stdin(Stdio::inherit())
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit())
                    .status()
                    .await
                    .map_err(|source| InvokeError::Spawn {
                        program: path.clone(),
                        source,
                    })?;

                if status.success() {
                    return Ok(());
                }
                Err(status.code().map_or_else(
                    || InvokeError::Terminated {
                        module: module.name().clone(),
                        entry: entry.name.clone(),
                    },
                    |code| InvokeError::ExitCode {
                        module: module.name().clone(),
                        entry: entry.name.clone(),
                        code,
                    },
                ))
            }
        }
    }
}
