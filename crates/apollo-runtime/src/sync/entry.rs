#![forbid(unsafe_code)]

//! Per-property sync participation.

/// Method invoked on a listening component when no other callback is named.
pub const DEFAULT_SYNC_CALLBACK: &str = "onDataSync";

/// How one property of one component takes part in synchronization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncEntry {
    /// Declared property name on the owning component.
    pub name: String,
    /// Subscribe to changes reported by other components.
    pub listen: bool,
    /// Report local mutations to other components.
    pub trigger: bool,
    /// Sync method to call on a received change.
    pub callback_name: String,
    /// Assign the property directly when the callback method is absent.
    pub set_data_when_no_callback: bool,
}

impl SyncEntry {
    /// Full two-way participation with the default callback and direct
    /// assignment fallback. This is the shape pattern matching produces.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            listen: true,
            trigger: true,
            callback_name: DEFAULT_SYNC_CALLBACK.to_owned(),
            set_data_when_no_callback: true,
        }
    }

    /// Receive changes only.
    #[must_use]
    pub fn listener(name: impl Into<String>) -> Self {
        Self {
            trigger: false,
            ..Self::new(name)
        }
    }

    /// Report changes only.
    #[must_use]
    pub fn trigger(name: impl Into<String>) -> Self {
        Self {
            listen: false,
            ..Self::new(name)
        }
    }

    #[must_use]
    pub fn with_callback(mut self, callback_name: impl Into<String>) -> Self {
        self.callback_name = callback_name.into();
        self
    }

    #[must_use]
    pub fn with_set_data_when_no_callback(mut self, set: bool) -> Self {
        self.set_data_when_no_callback = set;
        self
    }
}
