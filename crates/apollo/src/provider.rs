#![forbid(unsafe_code)]

//! Data providers: named loaders a component pulls its data from.
//!
//! Name resolution runs, in order: providers registered on the
//! [`ProviderRegistry`], the configured resolver function, the default
//! provider. If all of them come up empty the lookup fails with
//! [`ProviderError::NotFound`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use apollo_core::logging::PROVIDER_TARGET;
use serde_json::{Map, Value};

/// Request passed to a provider. The mount glue always sets
/// [`COMPONENT_NAME_KEY`].
pub type ProviderRequest = Map<String, Value>;

/// Request key carrying the requesting component's tag.
pub const COMPONENT_NAME_KEY: &str = "component-name";

/// Provider lookup and load failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// No provider matches the name.
    NotFound { name: String },
    /// The component names no provider.
    MissingName,
    /// The provider failed.
    Load { name: String, reason: String },
    /// The component was mounted without the data provider capability.
    Disabled,
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { name } => write!(f, "there is no data provider matching the name {name}"),
            Self::MissingName => write!(f, "data provider was not set for this component"),
            Self::Load { name, reason } => write!(f, "data provider {name} failed: {reason}"),
            Self::Disabled => write!(f, "component was mounted without the data provider capability"),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Something that can load data for a component.
pub trait DataProvider {
    /// Load data for `request`.
    ///
    /// # Errors
    ///
    /// Provider-specific; usually [`ProviderError::Load`].
    fn load(&self, request: &ProviderRequest) -> Result<Value, ProviderError>;
}

impl<F> DataProvider for F
where
    F: Fn(&ProviderRequest) -> Result<Value, ProviderError>,
{
    fn load(&self, request: &ProviderRequest) -> Result<Value, ProviderError> {
        self(request)
    }
}

/// Provider that always returns the same value.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticProvider(pub Value);

impl DataProvider for StaticProvider {
    fn load(&self, _request: &ProviderRequest) -> Result<Value, ProviderError> {
        Ok(self.0.clone())
    }
}

/// Shared provider handle.
pub type SharedProvider = Rc<dyn DataProvider>;

type Resolver = Rc<dyn Fn(&str) -> Option<SharedProvider>>;

/// Named providers plus the fallbacks used for unknown names.
///
/// Clones share the same provider table.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Rc<RefCell<HashMap<String, SharedProvider>>>,
    resolver: Option<Resolver>,
    default: Option<SharedProvider>,
}

impl ProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver consulted for names that are not registered.
    #[must_use]
    pub fn with_resolver(mut self, resolver: impl Fn(&str) -> Option<SharedProvider> + 'static) -> Self {
        self.resolver = Some(Rc::new(resolver));
        self
    }

    /// Provider used when neither the table nor the resolver knows a name.
    #[must_use]
    pub fn with_default(mut self, provider: impl DataProvider + 'static) -> Self {
        self.default = Some(Rc::new(provider));
        self
    }

    /// Register `provider` under `name`. Returns `true` if an existing
    /// provider was replaced.
    pub fn register(&self, name: impl Into<String>, provider: impl DataProvider + 'static) -> bool {
        let name = name.into();
        let replaced = self
            .providers
            .borrow_mut()
            .insert(name.clone(), Rc::new(provider))
            .is_some();
        if replaced {
            tracing::info!(target: PROVIDER_TARGET, "overriding existing data provider {name}");
        }
        replaced
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.providers.borrow().contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.borrow().keys().cloned().collect();
        names.sort();
        names
    }

    /// Find the provider for `name`.
    ///
    /// # Errors
    ///
    /// [`ProviderError::MissingName`] for an empty name,
    /// [`ProviderError::NotFound`] when every fallback is exhausted.
    pub fn resolve(&self, name: &str) -> Result<SharedProvider, ProviderError> {
        if name.is_empty() {
            return Err(ProviderError::MissingName);
        }
        if let Some(provider) = self.providers.borrow().get(name) {
            return Ok(Rc::clone(provider));
        }
        if let Some(resolver) = &self.resolver {
            if let Some(provider) = resolver(name) {
                return Ok(provider);
            }
            tracing::info!(target: PROVIDER_TARGET, "resolver returned nothing for {name}");
        }
        self.default
            .clone()
            .ok_or_else(|| ProviderError::NotFound { name: name.to_owned() })
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("names", &self.names())
            .field("resolver", &self.resolver.is_some())
            .field("default", &self.default.is_some())
            .finish()
    }
}
