#![forbid(unsafe_code)]

//! A component wired into an [`ApolloContext`](crate::ApolloContext).

use std::cell::Cell;
use std::fmt;

use apollo_core::config::Capability;
use apollo_core::logging::{COMPONENT_TARGET, PROVIDER_TARGET};
use apollo_events::EventBindings;
use apollo_runtime::component::Component;
use apollo_runtime::sync::SyncHandle;
use serde_json::Value;

use crate::definition::{ComponentDefinition, DataLoadedFn, ProviderConfigFn};
use crate::provider::{COMPONENT_NAME_KEY, ProviderError, ProviderRegistry, ProviderRequest};

/// Declared property naming an instance-level data provider.
pub const PROVIDER_PROPERTY: &str = "dataProvider";

/// A mounted component and the guards holding its wiring.
///
/// Dropping it (or calling [`unmount`](Self::unmount)) releases the
/// component's registry entries and DOM listeners.
#[must_use = "dropping a MountedComponent immediately unmounts it"]
pub struct MountedComponent {
    component: Component,
    capabilities: Vec<Capability>,
    sync: Option<SyncHandle>,
    events: Option<EventBindings>,
    providers: ProviderRegistry,
    default_provider: Option<String>,
    provider_config: Option<ProviderConfigFn>,
    after_data_loaded: Option<DataLoadedFn>,
    loading: Cell<bool>,
    data_loaded: Cell<bool>,
}

impl MountedComponent {
    pub(crate) fn new(
        component: Component,
        capabilities: Vec<Capability>,
        sync: Option<SyncHandle>,
        events: Option<EventBindings>,
        providers: ProviderRegistry,
        definition: &ComponentDefinition,
    ) -> Self {
        Self {
            component,
            capabilities,
            sync,
            events,
            providers,
            default_provider: definition.default_data_provider.clone(),
            provider_config: definition.provider_config.clone(),
            after_data_loaded: definition.after_data_loaded.clone(),
            loading: Cell::new(false),
            data_loaded: Cell::new(false),
        }
    }

    #[must_use]
    pub fn component(&self) -> &Component {
        &self.component
    }

    /// Resolved capabilities in application order.
    #[must_use]
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    #[must_use]
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Sync wiring, when the component has [`Capability::DataSync`].
    #[must_use]
    pub fn sync(&self) -> Option<&SyncHandle> {
        self.sync.as_ref()
    }

    /// Event wiring, when the component has [`Capability::Events`].
    #[must_use]
    pub fn events(&self) -> Option<&EventBindings> {
        self.events.as_ref()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading.get()
    }

    #[must_use]
    pub fn is_data_loaded(&self) -> bool {
        self.data_loaded.get()
    }

    /// Provider name for this instance: a non-empty `dataProvider` property,
    /// else the definition's default.
    #[must_use]
    pub fn data_provider_name(&self) -> Option<String> {
        match self.component.get(PROVIDER_PROPERTY) {
            Some(Value::String(name)) if !name.is_empty() => Some(name),
            _ => self.default_provider.clone(),
        }
    }

    /// Load data through the component's provider.
    ///
    /// Without a `request`, the definition's provider config builds one (or
    /// an empty request is used). [`COMPONENT_NAME_KEY`] is always set to the
    /// component's tag.
    ///
    /// # Errors
    ///
    /// [`ProviderError::Disabled`] without the data provider capability,
    /// otherwise whatever resolution or the provider reports. Every error
    /// is also logged at `warn`.
    pub fn load_data(&self, request: Option<ProviderRequest>) -> Result<Value, ProviderError> {
        let result = self.try_load(request);
        if let Err(err) = &result {
            tracing::warn!(
                target: PROVIDER_TARGET,
                component = %self.component.id(),
                tag = self.component.tag(),
                "{err}"
            );
        }
        result
    }

    fn try_load(&self, request: Option<ProviderRequest>) -> Result<Value, ProviderError> {
        if !self.has_capability(Capability::DataProvider) {
            return Err(ProviderError::Disabled);
        }
        let name = self.data_provider_name().ok_or(ProviderError::MissingName)?;
        let provider = self.providers.resolve(&name)?;

        let mut request = request
            .or_else(|| self.provider_config.as_ref().map(|f| f(&self.component)))
            .unwrap_or_default();
        request.insert(
            COMPONENT_NAME_KEY.to_owned(),
            Value::String(self.component.tag().to_owned()),
        );

        self.loading.set(true);
        let result = provider.load(&request);
        self.loading.set(false);
        if result.is_ok() {
            self.data_loaded.set(true);
        }
        result
    }

    pub(crate) fn auto_load(&self) {
        let Some(on_loaded) = self.after_data_loaded.clone() else {
            tracing::warn!(
                target: PROVIDER_TARGET,
                component = %self.component.id(),
                "auto load is set but no data loaded callback was provided"
            );
            return;
        };
        if let Ok(data) = self.load_data(None) {
            on_loaded(&self.component, &data);
        }
    }

    /// Release all wiring and hand the component back.
    pub fn unmount(mut self) -> Component {
        if let Some(mut sync) = self.sync.take() {
            sync.release();
        }
        if let Some(mut events) = self.events.take() {
            events.detach();
        }
        tracing::debug!(
            target: COMPONENT_TARGET,
            component = %self.component.id(),
            "unmounted"
        );
        self.component
    }
}

impl fmt::Debug for MountedComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountedComponent")
            .field("component", &self.component)
            .field("capabilities", &self.capabilities)
            .field("sync", &self.sync)
            .field("events", &self.events)
            .field("loading", &self.loading.get())
            .field("data_loaded", &self.data_loaded.get())
            .finish()
    }
}
