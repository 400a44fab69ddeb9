#![forbid(unsafe_code)]

//! Host configuration consumed by the Apollo engines.
//!
//! [`ApolloConfig`] carries the default synchronization pattern, the dedup
//! window and its policy, the reporter self-notification switch, logging
//! verbosity, and the global capability hook applied to every component.
//!
//! Configuration can be assembled in code with the `with_*` builders, read
//! from `APOLLO_*` environment variables, or (with the `config-file`
//! feature) parsed from a JSON document.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Bad regex source | `dataSyncPattern` does not compile | Surfaces when a component binds; that component skips sync |
//! | Bad env value | `APOLLO_DEBUG=maybe` | [`ConfigError::InvalidValue`] |
//! | Bad JSON | Malformed document | [`ConfigError::Parse`] |

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use regex::Regex;

use crate::logging::CONFIG_TARGET;

/// Default coalescing window for identical reports of the same property.
pub const DEFAULT_DEDUP_WINDOW: Duration = Duration::from_millis(500);

/// Errors from configuration loading and pattern compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A synchronization pattern source failed to compile.
    InvalidPattern { pattern: String, reason: String },
    /// A configuration key held a value of the wrong shape.
    InvalidValue { key: String, value: String },
    /// A configuration document could not be parsed.
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPattern { pattern, reason } => {
                write!(f, "invalid sync pattern '{pattern}': {reason}")
            }
            Self::InvalidValue { key, value } => {
                write!(f, "invalid value '{value}' for {key}")
            }
            Self::Parse(msg) => write!(f, "config parse error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// A property-name pattern selecting which properties participate in sync.
///
/// Either regex source text (compiled when a component binds) or an already
/// compiled [`Regex`].
#[derive(Debug, Clone)]
pub enum SyncPattern {
    Source(String),
    Compiled(Regex),
}

impl SyncPattern {
    /// Compile (or clone) the underlying regex.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidPattern`] when the source text is not a valid
    /// regular expression.
    pub fn compile(&self) -> Result<Regex, ConfigError> {
        match self {
            Self::Compiled(regex) => Ok(regex.clone()),
            Self::Source(source) => {
                Regex::new(source).map_err(|err| ConfigError::InvalidPattern {
                    pattern: source.clone(),
                    reason: err.to_string(),
                })
            }
        }
    }

    /// The pattern's source text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Source(source) => source,
            Self::Compiled(regex) => regex.as_str(),
        }
    }

    /// An empty pattern selects nothing and counts as no pattern at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }
}

impl From<&str> for SyncPattern {
    fn from(source: &str) -> Self {
        Self::Source(source.to_owned())
    }
}

impl From<String> for SyncPattern {
    fn from(source: String) -> Self {
        Self::Source(source)
    }
}

impl From<Regex> for SyncPattern {
    fn from(regex: Regex) -> Self {
        Self::Compiled(regex)
    }
}

/// What a suppressed (deduplicated) report does to the last-change record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config-file", derive(serde::Deserialize))]
#[cfg_attr(feature = "config-file", serde(rename_all = "camelCase"))]
pub enum SuppressedReportPolicy {
    /// Suppressed reports move the record's timestamp forward, so a steady
    /// stream of identical values stays suppressed for as long as the gaps
    /// between reports remain inside the window.
    #[default]
    RefreshTimestamp,
    /// Suppressed reports leave the record untouched; the window is anchored
    /// at the last delivered report.
    Keep,
}

/// A behavior a component opts into at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Property synchronization across component instances.
    DataSync,
    /// Convention-driven DOM event wiring.
    Events,
    /// Named data provider lookup.
    DataProvider,
}

type CapabilityHook = Rc<dyn Fn(&str) -> Vec<Capability>>;

/// Host configuration for the Apollo engines.
#[derive(Clone)]
pub struct ApolloConfig {
    /// Default property-name pattern for components without their own.
    pub data_sync_pattern: Option<SyncPattern>,
    /// Window inside which an identical report is suppressed.
    pub dedup_window: Duration,
    /// Whether suppressed reports refresh the last-change timestamp.
    pub suppressed_report_policy: SuppressedReportPolicy,
    /// Deliver a report back to the owner that issued it.
    pub notify_reporter: bool,
    /// Emit debug-level diagnostics.
    pub debug: bool,
    /// Silence all diagnostics.
    pub no_log: bool,
    global_capabilities: Option<CapabilityHook>,
}

impl Default for ApolloConfig {
    fn default() -> Self {
        Self {
            data_sync_pattern: None,
            dedup_window: DEFAULT_DEDUP_WINDOW,
            suppressed_report_policy: SuppressedReportPolicy::default(),
            notify_reporter: false,
            debug: false,
            no_log: false,
            global_capabilities: None,
        }
    }
}

impl fmt::Debug for ApolloConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApolloConfig")
            .field(
                "data_sync_pattern",
                &self.data_sync_pattern.as_ref().map(SyncPattern::as_str),
            )
            .field("dedup_window", &self.dedup_window)
            .field("suppressed_report_policy", &self.suppressed_report_policy)
            .field("notify_reporter", &self.notify_reporter)
            .field("debug", &self.debug)
            .field("no_log", &self.no_log)
            .field("global_capabilities", &self.global_capabilities.is_some())
            .finish()
    }
}

impl ApolloConfig {
    /// Default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_data_sync_pattern(mut self, pattern: impl Into<SyncPattern>) -> Self {
        self.data_sync_pattern = Some(pattern.into());
        self
    }

    #[must_use]
    pub fn with_dedup_window(mut self, window: Duration) -> Self {
        self.dedup_window = window;
        self
    }

    #[must_use]
    pub fn with_suppressed_report_policy(mut self, policy: SuppressedReportPolicy) -> Self {
        self.suppressed_report_policy = policy;
        self
    }

    #[must_use]
    pub fn with_notify_reporter(mut self, notify: bool) -> Self {
        self.notify_reporter = notify;
        self
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[must_use]
    pub fn with_no_log(mut self, no_log: bool) -> Self {
        self.no_log = no_log;
        self
    }

    /// Install the hook that returns capabilities injected into every
    /// component created with the given tag.
    #[must_use]
    pub fn with_global_capabilities(
        mut self,
        hook: impl Fn(&str) -> Vec<Capability> + 'static,
    ) -> Self {
        self.global_capabilities = Some(Rc::new(hook));
        self
    }

    /// Capabilities the global hook injects for `tag` (empty without a hook).
    #[must_use]
    pub fn global_capabilities_for(&self, tag: &str) -> Vec<Capability> {
        self.global_capabilities
            .as_ref()
            .map(|hook| hook(tag))
            .unwrap_or_default()
    }

    /// Read configuration from `APOLLO_*` environment variables.
    ///
    /// Recognized: `APOLLO_DATA_SYNC_PATTERN`, `APOLLO_DEDUP_WINDOW_MS`,
    /// `APOLLO_NOTIFY_REPORTER`, `APOLLO_DEBUG`, `APOLLO_NO_LOG`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] for unparseable numbers or booleans.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] for unparseable numbers or booleans.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        match lookup("APOLLO_DATA_SYNC_PATTERN") {
            Some(pattern) if pattern.is_empty() => {
                tracing::warn!(target: CONFIG_TARGET, "ignoring empty APOLLO_DATA_SYNC_PATTERN");
            }
            Some(pattern) => config.data_sync_pattern = Some(SyncPattern::Source(pattern)),
            None => {}
        }
        if let Some(ms) = lookup("APOLLO_DEDUP_WINDOW_MS") {
            let ms = ms.trim().parse::<u64>().map_err(|_| {
                let err = ConfigError::InvalidValue {
                    key: "APOLLO_DEDUP_WINDOW_MS".into(),
                    value: ms.clone(),
                };
                tracing::warn!(target: CONFIG_TARGET, "{err}");
                err
            })?;
            config.dedup_window = Duration::from_millis(ms);
        }
        if let Some(v) = lookup("APOLLO_NOTIFY_REPORTER") {
            config.notify_reporter = parse_flag("APOLLO_NOTIFY_REPORTER", &v)?;
        }
        if let Some(v) = lookup("APOLLO_DEBUG") {
            config.debug = parse_flag("APOLLO_DEBUG", &v)?;
        }
        if let Some(v) = lookup("APOLLO_NO_LOG") {
            config.no_log = parse_flag("APOLLO_NO_LOG", &v)?;
        }
        tracing::debug!(target: CONFIG_TARGET, ?config, "loaded configuration from environment");
        Ok(config)
    }

    /// Parse a JSON configuration document.
    ///
    /// ```
    /// # #[cfg(feature = "config-file")] {
    /// let config = apollo_core::ApolloConfig::from_json(
    ///     r#"{ "dataSyncPattern": "^shared", "dedupWindowMs": 250 }"#,
    /// ).unwrap();
    /// assert_eq!(config.dedup_window.as_millis(), 250);
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] when the document is malformed.
    #[cfg(feature = "config-file")]
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let doc: ConfigDocument =
            serde_json::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))?;
        let mut config = Self::default();
        config.data_sync_pattern = doc
            .data_sync_pattern
            .filter(|p| !p.is_empty())
            .map(SyncPattern::Source);
        if let Some(ms) = doc.dedup_window_ms {
            config.dedup_window = Duration::from_millis(ms);
        }
        if let Some(policy) = doc.suppressed_report_policy {
            config.suppressed_report_policy = policy;
        }
        config.notify_reporter = doc.notify_reporter.unwrap_or(false);
        config.debug = doc.debug.unwrap_or(false);
        config.no_log = doc.no_log.unwrap_or(false);
        Ok(config)
    }
}

#[cfg(feature = "config-file")]
#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ConfigDocument {
    data_sync_pattern: Option<String>,
    dedup_window_ms: Option<u64>,
    suppressed_report_policy: Option<SuppressedReportPolicy>,
    notify_reporter: Option<bool>,
    debug: Option<bool>,
    no_log: Option<bool>,
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => {
            let err = ConfigError::InvalidValue {
                key: key.to_owned(),
                value: value.to_owned(),
            };
            tracing::warn!(target: CONFIG_TARGET, "{err}");
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = ApolloConfig::default();
        assert!(config.data_sync_pattern.is_none());
        assert_eq!(config.dedup_window, Duration::from_millis(500));
        assert_eq!(
            config.suppressed_report_policy,
            SuppressedReportPolicy::RefreshTimestamp
        );
        assert!(!config.notify_reporter);
        assert!(config.global_capabilities_for("any-tag").is_empty());
    }

    #[test]
    fn builders_chain() {
        let config = ApolloConfig::new()
            .with_data_sync_pattern("^sync")
            .with_dedup_window(Duration::from_millis(100))
            .with_notify_reporter(true)
            .with_debug(true);
        assert_eq!(
            config.data_sync_pattern.as_ref().map(SyncPattern::as_str),
            Some("^sync")
        );
        assert_eq!(config.dedup_window, Duration::from_millis(100));
        assert!(config.notify_reporter);
        assert!(config.debug);
    }

    #[test]
    fn pattern_compiles_from_source() {
        let regex = SyncPattern::from("^shared[A-Z]").compile().unwrap();
        assert!(regex.is_match("sharedCount"));
        assert!(!regex.is_match("count"));
    }

    #[test]
    fn pattern_compile_failure_reports_source() {
        let err = SyncPattern::from("([unclosed").compile().unwrap_err();
        match err {
            ConfigError::InvalidPattern { pattern, .. } => assert_eq!(pattern, "([unclosed"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn precompiled_pattern_round_trips() {
        let regex = Regex::new("^a").unwrap();
        let pattern = SyncPattern::from(regex);
        assert_eq!(pattern.as_str(), "^a");
        assert!(pattern.compile().unwrap().is_match("abc"));
    }

    #[test]
    fn global_capabilities_hook_receives_tag() {
        let config = ApolloConfig::new().with_global_capabilities(|tag| {
            if tag.starts_with("sync-") {
                vec![Capability::DataSync]
            } else {
                Vec::new()
            }
        });
        assert_eq!(
            config.global_capabilities_for("sync-counter"),
            vec![Capability::DataSync]
        );
        assert!(config.global_capabilities_for("plain").is_empty());
    }

    #[test]
    fn env_vars_populate_config() {
        let config = ApolloConfig::from_vars(vars(&[
            ("APOLLO_DATA_SYNC_PATTERN", "^dataSync"),
            ("APOLLO_DEDUP_WINDOW_MS", "750"),
            ("APOLLO_DEBUG", "true"),
            ("APOLLO_NO_LOG", "0"),
        ]))
        .unwrap();
        assert_eq!(
            config.data_sync_pattern.as_ref().map(SyncPattern::as_str),
            Some("^dataSync")
        );
        assert_eq!(config.dedup_window, Duration::from_millis(750));
        assert!(config.debug);
        assert!(!config.no_log);
    }

    #[test]
    fn env_rejects_bad_values() {
        let err = ApolloConfig::from_vars(vars(&[("APOLLO_DEBUG", "maybe")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: "APOLLO_DEBUG".into(),
                value: "maybe".into()
            }
        );
        assert!(ApolloConfig::from_vars(vars(&[("APOLLO_DEDUP_WINDOW_MS", "soon")])).is_err());
    }

    #[test]
    fn empty_pattern_env_is_ignored() {
        let config = ApolloConfig::from_vars(vars(&[("APOLLO_DATA_SYNC_PATTERN", "")])).unwrap();
        assert!(config.data_sync_pattern.is_none());
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn json_document() {
        let config = ApolloConfig::from_json(
            r#"{
                "dataSyncPattern": "^dataSync",
                "dedupWindowMs": 300,
                "suppressedReportPolicy": "keep",
                "notifyReporter": true,
                "noLog": true
            }"#,
        )
        .unwrap();
        assert_eq!(config.dedup_window, Duration::from_millis(300));
        assert_eq!(config.suppressed_report_policy, SuppressedReportPolicy::Keep);
        assert!(config.notify_reporter);
        assert!(config.no_log);
        assert!(!config.debug);
    }

    #[test]
    fn empty_pattern_is_empty() {
        assert!(SyncPattern::from("").is_empty());
        assert!(SyncPattern::from(Regex::new("").unwrap()).is_empty());
        assert!(!SyncPattern::from("^a").is_empty());
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn empty_pattern_in_json_is_ignored() {
        let config = ApolloConfig::from_json(r#"{ "dataSyncPattern": "" }"#).unwrap();
        assert!(config.data_sync_pattern.is_none());
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn json_parse_error() {
        assert!(matches!(
            ApolloConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn debug_output_hides_hook() {
        let config = ApolloConfig::new().with_global_capabilities(|_| Vec::new());
        let dbg = format!("{config:?}");
        assert!(dbg.contains("global_capabilities: true"));
    }
}
