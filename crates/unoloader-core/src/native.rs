//! Modules compiled into the bootstrap binary.
//!
//! Native modules live in the protected `unoloader.` namespace, which no
//! resource location may define, so they can only be reached through the
//! loader's parent.

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use crate::loader::{LoadError, PROTECTED_NAMESPACE};
use crate::module::{
    ENTRY_METHOD, EntryPoint, EntryTarget, Invocation, Module, ModuleOrigin, NativeEntry,
    QualifiedName, Signature,
};
use crate::ports::{ModuleResolver, Resolution};

/// Name of the built-in module that prints the loader's search path.
pub const INFO_MODULE: &str = "unoloader.Info";

/// Registry of native modules.
#[derive(Debug, Clone, Default)]
pub struct NativeModules {
    modules: HashMap<QualifiedName, Arc<Module>>,
}

impl NativeModules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in modules.
    pub fn with_builtins() -> Self {
        let mut modules = Self::new();
        modules.register_main(INFO_MODULE, Arc::new(print_search_path));
        modules
    }

    /// Register `entry` as the `fizz` entry point of module `name`.
    ///
    /// Names outside the protected namespace are ignored: they would be
    /// shadowed by resource locations anyway.
    pub fn register_main(&mut self, name: &str, entry: Arc<dyn NativeEntry>) -> bool {
        let Ok(qualified) = name.parse::<QualifiedName>() else {
            return false;
        };
        if !qualified.is_within(PROTECTED_NAMESPACE) {
            return false;
        }
        let module = Module::new(
            qualified.clone(),
            ModuleOrigin::Native,
            vec![EntryPoint {
                name: ENTRY_METHOD.to_string(),
                signature: Signature::main(),
                target: EntryTarget::Native(entry),
            }],
        );
        self.modules.insert(qualified, Arc::new(module));
        true
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl ModuleResolver for NativeModules {
    fn resolve(&self, name: &QualifiedName) -> Result<Resolution, LoadError> {
        Ok(self
            .modules
            .get(name)
            .map_or(Resolution::NotFound, |m| Resolution::Found(Arc::clone(m))))
    }
}

fn print_search_path(invocation: &Invocation<'_>) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for location in invocation.context_path {
        writeln!(out, "{location}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceList;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_builtins_include_info_module() {
        let modules = NativeModules::with_builtins();
        let resolution = modules.resolve(&INFO_MODULE.parse().unwrap()).unwrap();
        match resolution {
            Resolution::Found(module) => {
                assert_eq!(module.origin(), &ModuleOrigin::Native);
                assert!(module.entry_point(ENTRY_METHOD, &Signature::main()).is_some());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_names_outside_protected_namespace_are_refused() {
        let mut modules = NativeModules::new();
        let registered = modules.register_main("com.example.App", Arc::new(print_search_path));
        assert!(!registered);
        assert!(modules.is_empty());
    }

    #[test]
    fn test_registered_entry_is_invocable() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let mut modules = NativeModules::new();
        modules.register_main(
            "unoloader.Count",
            Arc::new(move |inv: &Invocation<'_>| {
                seen.fetch_add(inv.args.len(), Ordering::SeqCst);
                Ok(())
            }),
        );

        let Resolution::Found(module) = modules.resolve(&"unoloader.Count".parse().unwrap()).unwrap()
        else {
            panic!("module not registered");
        };
        let entry = module.entry_point(ENTRY_METHOD, &Signature::main()).unwrap();
        let EntryTarget::Native(native) = &entry.target else {
            panic!("expected native target");
        };
        let args = vec!["a".to_string(), "b".to_string()];
        let path = ResourceList::new();
        native
            .invoke(&Invocation {
                args: &args,
                context_path: &path,
            })
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
