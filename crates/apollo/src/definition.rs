#![forbid(unsafe_code)]

//! Component definitions: which capabilities a component type opts into
//! and the declarations each capability reads.

use std::fmt;
use std::rc::Rc;

use apollo_core::config::{ApolloConfig, Capability};
use apollo_events::EventDescriptor;
use apollo_runtime::component::Component;
use apollo_runtime::sync::SyncSource;
use serde_json::Value;

use crate::provider::ProviderRequest;

/// Called with freshly loaded data when a component auto-loads.
pub type DataLoadedFn = Rc<dyn Fn(&Component, &Value)>;
/// Builds the provider request when `load_data` is called without one.
pub type ProviderConfigFn = Rc<dyn Fn(&Component) -> ProviderRequest>;

/// Declarative description of a component type.
#[derive(Clone, Default)]
pub struct ComponentDefinition {
    pub(crate) capabilities: Vec<Capability>,
    pub(crate) sync: SyncSource,
    pub(crate) events: Vec<EventDescriptor>,
    pub(crate) default_data_provider: Option<String>,
    pub(crate) auto_load: bool,
    pub(crate) after_data_loaded: Option<DataLoadedFn>,
    pub(crate) provider_config: Option<ProviderConfigFn>,
}

impl ComponentDefinition {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opt into a capability. Duplicates are ignored.
    #[must_use]
    pub fn with_capability(mut self, capability: Capability) -> Self {
        if !self.capabilities.contains(&capability) {
            self.capabilities.push(capability);
        }
        self
    }

    /// Where sync entries come from. Implies [`Capability::DataSync`].
    #[must_use]
    pub fn with_sync(mut self, source: SyncSource) -> Self {
        self.sync = source;
        self.with_capability(Capability::DataSync)
    }

    /// Declared events. Implies [`Capability::Events`].
    #[must_use]
    pub fn with_events<I, D>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<EventDescriptor>,
    {
        self.events = events.into_iter().map(Into::into).collect();
        self.with_capability(Capability::Events)
    }

    /// Provider name used when the instance does not name one. Implies
    /// [`Capability::DataProvider`].
    #[must_use]
    pub fn with_default_data_provider(mut self, name: impl Into<String>) -> Self {
        self.default_data_provider = Some(name.into());
        self.with_capability(Capability::DataProvider)
    }

    /// Load data as part of mounting and hand it to `on_loaded`.
    #[must_use]
    pub fn auto_load(mut self, on_loaded: impl Fn(&Component, &Value) + 'static) -> Self {
        self.auto_load = true;
        self.after_data_loaded = Some(Rc::new(on_loaded));
        self.with_capability(Capability::DataProvider)
    }

    /// Request auto-loading without a completion callback. Mounting will
    /// warn and skip the load.
    #[must_use]
    pub fn auto_load_without_callback(mut self) -> Self {
        self.auto_load = true;
        self.with_capability(Capability::DataProvider)
    }

    /// Request builder used when `load_data` receives no request.
    #[must_use]
    pub fn with_provider_config(
        mut self,
        config: impl Fn(&Component) -> ProviderRequest + 'static,
    ) -> Self {
        self.provider_config = Some(Rc::new(config));
        self
    }

    /// The definition's own capabilities, in declaration order.
    #[must_use]
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    #[must_use]
    pub fn events(&self) -> &[EventDescriptor] {
        &self.events
    }

    /// Capabilities a component with `tag` ends up with: the config's global
    /// capabilities first, then the definition's own, without duplicates.
    #[must_use]
    pub fn resolve_capabilities(&self, config: &ApolloConfig, tag: &str) -> Vec<Capability> {
        let mut resolved: Vec<Capability> = Vec::new();
        for capability in config
            .global_capabilities_for(tag)
            .into_iter()
            .chain(self.capabilities.iter().copied())
        {
            if !resolved.contains(&capability) {
                resolved.push(capability);
            }
        }
        resolved
    }
}

impl fmt::Debug for ComponentDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDefinition")
            .field("capabilities", &self.capabilities)
            .field("sync", &self.sync)
            .field("events", &self.events.len())
            .field("default_data_provider", &self.default_data_provider)
            .field("auto_load", &self.auto_load)
            .finish()
    }
}
