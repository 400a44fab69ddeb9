#![forbid(unsafe_code)]

//! The injected service object every mounted component shares.

use std::rc::Rc;

use apollo_core::clock::{SharedClock, SystemClock};
use apollo_core::config::{ApolloConfig, Capability};
use apollo_core::logging::COMPONENT_TARGET;
use apollo_events::EventDispatcher;
use apollo_runtime::component::Component;
use apollo_runtime::sync::{PropertyChangeRegistry, SyncBinder};

use crate::definition::ComponentDefinition;
use crate::mount::MountedComponent;
use crate::provider::ProviderRegistry;

/// Configuration, the property change registry, and the data providers for
/// one application.
///
/// Components mounted through different contexts never see each other's
/// property changes.
#[derive(Debug, Clone)]
pub struct ApolloContext {
    config: ApolloConfig,
    binder: SyncBinder,
    providers: ProviderRegistry,
}

impl ApolloContext {
    /// Context measuring dedup windows with the system clock.
    #[must_use]
    pub fn new(config: ApolloConfig) -> Self {
        Self::with_clock(config, Rc::new(SystemClock))
    }

    /// Context using `clock` for dedup windows.
    #[must_use]
    pub fn with_clock(config: ApolloConfig, clock: SharedClock) -> Self {
        let registry = PropertyChangeRegistry::with_clock(&config, clock);
        let binder = SyncBinder::new(registry, &config);
        tracing::info!(target: COMPONENT_TARGET, ?config, "initializing");
        Self {
            config,
            binder,
            providers: ProviderRegistry::new(),
        }
    }

    /// Replace the provider registry (to install a resolver or default).
    #[must_use]
    pub fn with_providers(mut self, providers: ProviderRegistry) -> Self {
        self.providers = providers;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ApolloConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &PropertyChangeRegistry {
        self.binder.registry()
    }

    #[must_use]
    pub fn binder(&self) -> &SyncBinder {
        &self.binder
    }

    #[must_use]
    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// Wire `component` according to `definition`.
    ///
    /// Capabilities are the config's global ones followed by the
    /// definition's own. Data sync is bound first, then events, then the
    /// optional auto-load runs. Nothing here fails: every problem is logged
    /// and visible through the returned handle's reports.
    pub fn mount(&self, component: Component, definition: &ComponentDefinition) -> MountedComponent {
        let capabilities = definition.resolve_capabilities(&self.config, component.tag());
        tracing::debug!(
            target: COMPONENT_TARGET,
            component = %component.id(),
            tag = component.tag(),
            ?capabilities,
            "mounting"
        );

        let sync = capabilities
            .contains(&Capability::DataSync)
            .then(|| self.binder.bind(&component, &definition.sync));
        let events = capabilities
            .contains(&Capability::Events)
            .then(|| EventDispatcher::attach(&component, &definition.events));

        let mounted = MountedComponent::new(
            component,
            capabilities,
            sync,
            events,
            self.providers.clone(),
            definition,
        );
        if definition.auto_load && mounted.has_capability(Capability::DataProvider) {
            mounted.auto_load();
        }
        mounted
    }
}
