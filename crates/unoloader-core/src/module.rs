//! Loadable modules and their entry points.
//!
//! A module is addressed by a dotted [`QualifiedName`]. Modules found in
//! resource locations are described by a JSON descriptor stored at
//! `a/b/Name.module.json`; native modules are compiled into the binary.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::resource::{ResourceList, ResourceLocation};

/// File suffix of module descriptors inside a resource location.
pub const DESCRIPTOR_SUFFIX: &str = ".module.json";

/// Name of the entry point invoked by the bootstrap.
pub const ENTRY_METHOD: &str = "fizz";

/// Errors for malformed qualified names.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NameError {
    #[error("module name is empty")]
    Empty,

    #[error("invalid segment {segment:?} in module name {name:?}")]
    InvalidSegment { name: String, segment: String },
}

/// Dotted module name such as `com.example.office.Demo`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName(String);

impl QualifiedName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// Whether the name lies inside `namespace` (a dotted prefix).
    pub fn is_within(&self, namespace: &str) -> bool {
        self.0
            .strip_prefix(namespace)
            .is_some_and(|rest| rest.starts_with('.'))
    }

    /// Relative resource path of the module's descriptor.
    pub fn descriptor_path(&self) -> String {
        format!("{}{DESCRIPTOR_SUFFIX}", self.0.replace('.', "/"))
    }
}

impl FromStr for QualifiedName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(NameError::Empty);
        }
        for segment in s.split('.') {
            let mut chars = segment.chars();
            let valid_start = chars
                .next()
                .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$');
            if !valid_start || !chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$') {
                return Err(NameError::InvalidSegment {
                    name: s.to_string(),
                    segment: segment.to_string(),
                });
            }
        }
        Ok(Self(s.to_string()))
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parameter types an entry point may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ParamType {
    #[serde(rename = "string")]
    String,
    #[serde(rename = "string[]")]
    StringArray,
    #[serde(rename = "int")]
    Int,
}

/// Return types an entry point may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnType {
    #[default]
    Void,
    Int,
}

/// Typed shape of an entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub parameters: Vec<ParamType>,
    pub returns: ReturnType,
}

impl Signature {
    /// `(string[]) -> void`, the only shape the bootstrap invokes.
    pub fn main() -> Self {
        Self {
            parameters: vec![ParamType::StringArray],
            returns: ReturnType::Void,
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<&str> = self
            .parameters
            .iter()
            .map(|p| match p {
                ParamType::String => "string",
                ParamType::StringArray => "string[]",
                ParamType::Int => "int",
            })
            .collect();
        let returns = match self.returns {
            ReturnType::Void => "void",
            ReturnType::Int => "int",
        };
        write!(f, "({}) -> {returns}", params.join(", "))
    }
}

/// Arguments and context handed to an invoked entry point.
#[derive(Debug, Clone)]
pub struct Invocation<'a> {
    pub args: &'a [String],
    /// Search path of the loader that resolved the module.
    pub context_path: &'a ResourceList,
}

/// Entry point implemented inside the bootstrap binary.
pub trait NativeEntry: Send + Sync {
    fn invoke(&self, invocation: &Invocation<'_>) -> anyhow::Result<()>;
}

impl<F> NativeEntry for F
where
    F: Fn(&Invocation<'_>) -> anyhow::Result<()> + Send + Sync,
{
    fn invoke(&self, invocation: &Invocation<'_>) -> anyhow::Result<()> {
        self(invocation)
    }
}

/// What running an entry point executes.
#[derive(Clone)]
pub enum EntryTarget {
    /// An external program; `args` precede the forwarded arguments.
    Command { program: String, args: Vec<String> },
    /// A function compiled into the bootstrap binary.
    Native(Arc<dyn NativeEntry>),
}

impl fmt::Debug for EntryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command { program, args } => f
                .debug_struct("Command")
                .field("program", program)
                .field("args", args)
                .finish(),
            Self::Native(_) => f.write_str("Native"),
        }
    }
}

impl EntryTarget {
    /// Whether a command's program is addressed relative to its location.
    pub fn is_location_relative(program: &str) -> bool {
        program.contains('/') && !Path::new(program).is_absolute()
    }
}

/// A named entry point of a module.
#[derive(Debug, Clone)]
pub struct EntryPoint {
    pub name: String,
    pub signature: Signature,
    pub target: EntryTarget,
}

/// Where a module was defined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleOrigin {
    /// A directory resource location.
    Directory(ResourceLocation),
    /// An archive resource location.
    Archive(ResourceLocation),
    /// Compiled into the bootstrap binary.
    Native,
}

impl ModuleOrigin {
    pub const fn location(&self) -> Option<&ResourceLocation> {
        match self {
            Self::Directory(location) | Self::Archive(location) => Some(location),
            Self::Native => None,
        }
    }
}

impl fmt::Display for ModuleOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directory(location) | Self::Archive(location) => write!(f, "{location}"),
            Self::Native => f.write_str("native"),
        }
    }
}

/// A defined module.
#[derive(Debug, Clone)]
pub struct Module {
    name: QualifiedName,
    origin: ModuleOrigin,
    entry_points: Vec<EntryPoint>,
}

impl Module {
    pub const fn new(name: QualifiedName, origin: ModuleOrigin, entry_points: Vec<EntryPoint>) -> Self {
        Self {
            name,
            origin,
            entry_points,
        }
    }

    pub const fn name(&self) -> &QualifiedName {
        &self.name
    }

    pub const fn origin(&self) -> &ModuleOrigin {
        &self.origin
    }

    pub fn entry_points(&self) -> &[EntryPoint] {
        &self.entry_points
    }

    /// Find an entry point by name and exact signature.
    pub fn entry_point(&self, name: &str, signature: &Signature) -> Option<&EntryPoint> {
        self.entry_points
            .iter()
            .find(|e| e.name == name && &e.signature == signature)
    }

    /// Find any entry point with the given name.
    pub fn entry_point_named(&self, name: &str) -> Option<&EntryPoint> {
        self.entry_points.iter().find(|e| e.name == name)
    }

    /// Path a location-relative program resolves to inside a directory origin.
    pub fn program_path(&self, program: &str) -> Option<PathBuf> {
        match &self.origin {
            ModuleOrigin::Directory(location) => Some(location.path().join(program)),
            ModuleOrigin::Archive(_) | ModuleOrigin::Native => None,
        }
    }
}

/// Errors reading a module descriptor.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("invalid module descriptor for {name}: {source}")]
    Json {
        name: QualifiedName,
        #[source]
        source: serde_json::Error,
    },

    #[error("module descriptor for {0} declares no entry points")]
    NoEntryPoints(QualifiedName),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DescriptorFile {
    entry_points: BTreeMap<String, EntryPointFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EntryPointFile {
    #[serde(default)]
    parameters: Vec<ParamType>,
    #[serde(default)]
    returns: ReturnType,
    program: String,
    #[serde(default)]
    args: Vec<String>,
}

/// Define a module from descriptor bytes read out of `origin`.
pub fn define_module(
    name: QualifiedName,
    origin: ModuleOrigin,
    descriptor: &[u8],
) -> Result<Module, DescriptorError> {
    let file: DescriptorFile =
        serde_json::from_slice(descriptor).map_err(|source| DescriptorError::Json {
            name: name.clone(),
            source,
        })?;
    if file.entry_points.is_empty() {
        return Err(DescriptorError::NoEntryPoints(name));
    }

    let entry_points = file
        .entry_points
        .into_iter()
        .map(|(entry_name, entry)| EntryPoint {
            name: entry_name,
            signature: Signature {
                parameters: entry.parameters,
                returns: entry.returns,
            },
            target: EntryTarget::Command {
                program: entry.program,
                args: entry.args,
            },
        })
        .collect();

    Ok(Module::new(name, origin, entry_points))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> QualifiedName {
        s.parse().unwrap()
    }

    #[test]
    fn test_qualified_name_validation() {
        assert!("com.example.App".parse::<QualifiedName>().is_ok());
        assert!("App$Inner".parse::<QualifiedName>().is_ok());
        assert_eq!("".parse::<QualifiedName>(), Err(NameError::Empty));
        assert!("com..App".parse::<QualifiedName>().is_err());
        assert!("com.1App".parse::<QualifiedName>().is_err());
        assert!("com/example/App".parse::<QualifiedName>().is_err());
    }

    #[test]
    fn test_descriptor_path() {
        assert_eq!(
            name("com.example.App").descriptor_path(),
            "com/example/App.module.json"
        );
    }

    #[test]
    fn test_is_within_namespace() {
        assert!(name("unoloader.Info").is_within("unoloader"));
        assert!(!name("unoloaderx.Info").is_within("unoloader"));
        assert!(!name("unoloader").is_within("unoloader"));
    }

    #[test]
    fn test_define_module_reads_entry_points() {
        let json = br#"{
            "entry_points": {
                "fizz": { "parameters": ["string[]"], "returns": "void", "program": "bin/run.sh", "args": ["-x"] },
                "count": { "parameters": ["string"], "returns": "int", "program": "wc" }
            }
        }"#;
        let module = define_module(name("com.example.App"), ModuleOrigin::Native, json).unwrap();
        let fizz = module.entry_point(ENTRY_METHOD, &Signature::main()).unwrap();
        match &fizz.target {
            EntryTarget::Command { program, args } => {
                assert_eq!(program, "bin/run.sh");
                assert_eq!(args, &vec!["-x".to_string()]);
            }
            EntryTarget::Native(_) => panic!("expected command target"),
        }
        assert!(module.entry_point("count", &Signature::main()).is_none());
        assert!(module.entry_point_named("count").is_some());
    }

    #[test]
    fn test_define_module_rejects_unknown_types() {
        let json = br#"{ "entry_points": { "fizz": { "parameters": ["bytes"], "program": "x" } } }"#;
        let err = define_module(name("a.B"), ModuleOrigin::Native, json).unwrap_err();
        assert!(matches!(err, DescriptorError::Json { .. }));
    }

    #[test]
    fn test_define_module_requires_entry_points() {
        let err = define_module(name("a.B"), ModuleOrigin::Native, br#"{ "entry_points": {} }"#)
            .unwrap_err();
        assert!(matches!(err, DescriptorError::NoEntryPoints(_)));
    }

    #[test]
    fn test_signature_display() {
        assert_eq!(Signature::main().to_string(), "(string[]) -> void");
    }

    #[test]
    fn test_location_relative_programs() {
        assert!(EntryTarget::is_location_relative("bin/run.sh"));
        assert!(!EntryTarget::is_location_relative("sh"));
        assert!(!EntryTarget::is_location_relative("/bin/sh"));
    }
}
