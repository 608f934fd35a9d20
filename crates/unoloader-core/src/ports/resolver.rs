//! Module resolver port.
//!
//! A resolver looks a qualified name up in some source of modules and reports
//! a tagged outcome. "Not here" and "not allowed here" are ordinary outcomes
//! that let a caller fall back to another resolver; only genuine failures
//! (an unreadable or malformed descriptor) are errors.

use std::sync::Arc;

use crate::loader::LoadError;
use crate::module::{Module, QualifiedName};

/// Outcome of a single resolution attempt.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// The module was defined by this resolver.
    Found(Arc<Module>),
    /// This resolver has no module of that name.
    NotFound,
    /// The name may not be defined by this resolver.
    Forbidden(String),
}

impl Resolution {
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// Port for looking modules up by name.
pub trait ModuleResolver: Send + Sync {
    fn resolve(&self, name: &QualifiedName) -> Result<Resolution, LoadError>;
}

/// Resolvers consulted in order; the first `Found` wins.
#[derive(Clone, Default)]
pub struct ResolverChain {
    resolvers: Vec<Arc<dyn ModuleResolver>>,
}

impl ResolverChain {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn then(mut self, resolver: Arc<dyn ModuleResolver>) -> Self {
        self.resolvers.push(resolver);
        self
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

impl std::fmt::Debug for ResolverChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverChain")
            .field("resolvers", &self.resolvers.len())
            .finish()
    }
}

impl ModuleResolver for ResolverChain {
    fn resolve(&self, name: &QualifiedName) -> Result<Resolution, LoadError> {
        let mut forbidden = None;
        for resolver in &self.resolvers {
            match resolver.resolve(name)? {
                found @ Resolution::Found(_) => return Ok(found),
                Resolution::Forbidden(reason) => {
                    forbidden.get_or_insert(reason);
                }
                Resolution::NotFound => {}
            }
        }
        Ok(forbidden.map_or(Resolution::NotFound, Resolution::Forbidden))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ModuleOrigin;

    struct Fixed(Resolution);

    impl ModuleResolver for Fixed {
        fn resolve(&self, _name: &QualifiedName) -> Result<Resolution, LoadError> {
            Ok(self.0.clone())
        }
    }

    fn module(name: &str) -> Arc<Module> {
        Arc::new(Module::new(name.parse().unwrap(), ModuleOrigin::Native, vec![]))
    }

    #[test]
    fn test_chain_returns_first_found() {
        let first = module("a.First");
        let chain = ResolverChain::new()
            .then(Arc::new(Fixed(Resolution::NotFound)))
            .then(Arc::new(Fixed(Resolution::Found(first.clone()))))
            .then(Arc::new(Fixed(Resolution::Found(module("a.Second")))));
        match chain.resolve(&"a.First".parse().unwrap()).unwrap() {
            Resolution::Found(m) => assert!(Arc::ptr_eq(&m, &first)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_chain_reports_forbidden_when_nothing_found() {
        let chain = ResolverChain::new()
            .then(Arc::new(Fixed(Resolution::Forbidden("protected".into()))))
            .then(Arc::new(Fixed(Resolution::NotFound)));
        assert!(matches!(
            chain.resolve(&"a.B".parse().unwrap()).unwrap(),
            Resolution::Forbidden(reason) if reason == "protected"
        ));
    }

    #[test]
    fn test_empty_chain_finds_nothing() {
        let chain = ResolverChain::new();
        assert!(chain.is_empty());
        assert!(matches!(
            chain.resolve(&"a.B".parse().unwrap()).unwrap(),
            Resolution::NotFound
        ));
    }
}
