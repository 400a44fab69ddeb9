#![forbid(unsafe_code)]

//! Sync binder: decide which properties of a component participate, then
//! wire each one into the registry.
//!
//! Two strategies, exactly one of which applies:
//!
//! - **Explicit**: a [`SyncSource`] carrying a config function (or a fixed
//!   entry list) supplies the [`SyncEntry`] list directly.
//! - **Pattern**: a regular expression is tested against each declared
//!   property name. The first pattern found wins: the source's own pattern,
//!   then a string held in a declared [`PATTERN_PROPERTY`] property, then the
//!   config's `data_sync_pattern`. An empty pattern is skipped.
//!
//! Every failure is non-fatal: it is logged at `warn` under
//! [`SYNC_TARGET`], recorded in the [`SyncReport`], and the component is
//! simply left (partly) unsynchronized.

use std::fmt;
use std::rc::Rc;

use apollo_core::config::{ApolloConfig, ConfigError, SyncPattern};
use apollo_core::logging::SYNC_TARGET;
use serde_json::Value;

use super::entry::SyncEntry;
use super::registry::{PropertyChangeRegistry, RegistrationId, ReportOutcome};
use crate::component::{Component, ComponentId, WeakComponent};
use crate::reactive::BindingScope;

/// Declared property that may hold a component-level pattern. It never
/// participates in sync itself.
pub const PATTERN_PROPERTY: &str = "dataSyncPattern";

/// Explicit sync configuration. Returning `None` means "no descriptor".
pub type SyncConfigFn = Rc<dyn Fn(&Component) -> Option<Vec<SyncEntry>>>;

/// Non-fatal sync setup failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// No explicit config and no pattern anywhere.
    NoPattern,
    /// A pattern string did not compile.
    InvalidPattern { pattern: String, reason: String },
    /// The explicit config function produced nothing.
    MissingDescriptor,
    /// An explicit entry names a property the component does not declare.
    UnknownProperty { name: String },
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPattern => write!(
                f,
                "no pattern was found for the data sync; provide {PATTERN_PROPERTY} on the component or in the config"
            ),
            Self::InvalidPattern { pattern, reason } => {
                write!(f, "pattern '{pattern}' is not a valid regular expression: {reason}")
            }
            Self::MissingDescriptor => write!(f, "sync config returned no entries"),
            Self::UnknownProperty { name } => {
                write!(f, "sync entry '{name}' does not name a declared property")
            }
        }
    }
}

impl std::error::Error for SyncError {}

impl From<ConfigError> for SyncError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::InvalidPattern { pattern, reason } => {
                Self::InvalidPattern { pattern, reason }
            }
            other => Self::InvalidPattern {
                pattern: String::new(),
                reason: other.to_string(),
            },
        }
    }
}

/// Where a component's sync entries come from.
#[derive(Clone, Default)]
pub struct SyncSource {
    config: Option<SyncConfigFn>,
    pattern: Option<SyncPattern>,
}

impl SyncSource {
    /// No component-level choice; fall back to the config's pattern.
    #[must_use]
    pub fn inherit() -> Self {
        Self::default()
    }

    /// Entries computed by a function of the component.
    #[must_use]
    pub fn explicit(config: impl Fn(&Component) -> Option<Vec<SyncEntry>> + 'static) -> Self {
        Self {
            config: Some(Rc::new(config)),
            pattern: None,
        }
    }

    /// A fixed entry list.
    #[must_use]
    pub fn entries(entries: Vec<SyncEntry>) -> Self {
        Self::explicit(move |_| Some(entries.clone()))
    }

    /// A component-level name pattern.
    #[must_use]
    pub fn pattern(pattern: impl Into<SyncPattern>) -> Self {
        Self {
            config: None,
            pattern: Some(pattern.into()),
        }
    }

    #[must_use]
    pub fn is_explicit(&self) -> bool {
        self.config.is_some()
    }
}

impl fmt::Debug for SyncSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncSource")
            .field("explicit", &self.config.is_some())
            .field("pattern", &self.pattern.as_ref().map(SyncPattern::as_str))
            .finish()
    }
}

/// Which strategy produced the entry list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    Explicit,
    Pattern,
}

/// Outcome of one [`SyncBinder::bind`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// `None` when setup failed before any entry list was produced.
    pub strategy: Option<SyncStrategy>,
    /// Entries that were wired.
    pub entries: Vec<SyncEntry>,
    /// Failures, in the order they were encountered.
    pub skipped: Vec<SyncError>,
}

/// Wires components into a shared [`PropertyChangeRegistry`].
#[derive(Debug, Clone)]
pub struct SyncBinder {
    registry: PropertyChangeRegistry,
    default_pattern: Option<SyncPattern>,
}

impl SyncBinder {
    #[must_use]
    pub fn new(registry: PropertyChangeRegistry, config: &ApolloConfig) -> Self {
        Self {
            registry,
            default_pattern: config.data_sync_pattern.clone(),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &PropertyChangeRegistry {
        &self.registry
    }

    /// Compute the entry list for `component` without wiring anything.
    ///
    /// # Errors
    ///
    /// [`SyncError::MissingDescriptor`], [`SyncError::NoPattern`] or
    /// [`SyncError::InvalidPattern`] when no entry list can be produced.
    pub fn resolve_entries(
        &self,
        component: &Component,
        source: &SyncSource,
    ) -> Result<(SyncStrategy, Vec<SyncEntry>), SyncError> {
        if let Some(config) = &source.config {
            return config(component)
                .map(|entries| (SyncStrategy::Explicit, entries))
                .ok_or(SyncError::MissingDescriptor);
        }

        let pattern = usable(source.pattern.as_ref())
            .or_else(|| component_pattern(component))
            .or_else(|| usable(self.default_pattern.as_ref()))
            .ok_or(SyncError::NoPattern)?;
        let regex = pattern.compile()?;

        let entries = component
            .property_names()
            .filter(|name| *name != PATTERN_PROPERTY && regex.is_match(name))
            .map(SyncEntry::new)
            .collect();
        Ok((SyncStrategy::Pattern, entries))
    }

    /// Resolve and wire the component's sync entries.
    ///
    /// Never fails: problems are logged and listed in the handle's
    /// [`SyncReport`].
    pub fn bind(&self, component: &Component, source: &SyncSource) -> SyncHandle {
        let owner = component.id();
        let mut handle = SyncHandle {
            owner,
            component: component.downgrade(),
            registry: self.registry.clone(),
            registrations: Vec::new(),
            scope: BindingScope::new(),
            report: SyncReport::default(),
        };

        let (strategy, entries) = match self.resolve_entries(component, source) {
            Ok(resolved) => resolved,
            Err(err) => {
                tracing::warn!(target: SYNC_TARGET, %owner, tag = component.tag(), "{err}");
                handle.report.skipped.push(err);
                return handle;
            }
        };
        handle.report.strategy = Some(strategy);

        for entry in entries {
            let Some(observable) = component.property(&entry.name) else {
                let err = SyncError::UnknownProperty {
                    name: entry.name.clone(),
                };
                tracing::warn!(target: SYNC_TARGET, %owner, tag = component.tag(), "{err}");
                handle.report.skipped.push(err);
                continue;
            };

            if entry.listen {
                let id = self.listen(component, &entry);
                handle.registrations.push(id);
            }

            if entry.trigger {
                let registry = self.registry.clone();
                let name = entry.name.clone();
                handle.scope.subscribe(&observable, move |new: &Value, old: &Value| {
                    registry.report_property_changed(owner, &name, new, old);
                });
            }

            handle.report.entries.push(entry);
        }

        tracing::debug!(
            target: SYNC_TARGET,
            %owner,
            tag = component.tag(),
            ?strategy,
            entries = handle.report.entries.len(),
            "data sync bound"
        );
        handle
    }

    fn listen(&self, component: &Component, entry: &SyncEntry) -> RegistrationId {
        let weak = component.downgrade();
        let callback_name = entry.callback_name.clone();
        let set_data = entry.set_data_when_no_callback;
        self.registry.register_for_property_change(
            component.id(),
            &entry.name,
            move |name, new, old| {
                let Some(this) = weak.upgrade() else {
                    return;
                };
                if !this.call_sync(&callback_name, name, new, old) && set_data {
                    this.set(name, new.clone());
                }
            },
        )
    }
}

fn usable(pattern: Option<&SyncPattern>) -> Option<SyncPattern> {
    pattern.filter(|p| !p.is_empty()).cloned()
}

fn component_pattern(component: &Component) -> Option<SyncPattern> {
    match component.get(PATTERN_PROPERTY)? {
        Value::String(source) if !source.is_empty() => Some(SyncPattern::Source(source)),
        _ => None,
    }
}

/// Live sync wiring for one component.
///
/// Dropping the handle (or calling [`release`](Self::release)) removes the
/// component's registrations and stops reporting its mutations.
#[must_use = "dropping a SyncHandle immediately unbinds the component"]
pub struct SyncHandle {
    owner: ComponentId,
    component: WeakComponent,
    registry: PropertyChangeRegistry,
    registrations: Vec<RegistrationId>,
    scope: BindingScope,
    report: SyncReport,
}

impl SyncHandle {
    #[must_use]
    pub fn owner(&self) -> ComponentId {
        self.owner
    }

    #[must_use]
    pub fn report(&self) -> &SyncReport {
        &self.report
    }

    /// Live listen-side registrations.
    #[must_use]
    pub fn registration_count(&self) -> usize {
        self.registrations.len()
    }

    /// Live trigger-side subscriptions.
    #[must_use]
    pub fn trigger_count(&self) -> usize {
        self.scope.binding_count()
    }

    /// Report the bound component's current value of `property` as if it
    /// had just changed. Useful for pushing initial state to components
    /// bound later. `None` when the component is gone or lacks the property.
    pub fn push(&self, property: &str) -> Option<ReportOutcome> {
        let value = self.component.upgrade()?.get(property)?;
        Some(
            self.registry
                .report_property_changed(self.owner, property, &value, &Value::Null),
        )
    }

    /// Undo all wiring now. Idempotent.
    pub fn release(&mut self) {
        self.scope.clear();
        let removed = self
            .registrations
            .drain(..)
            .filter(|id| self.registry.unregister(*id))
            .count();
        if removed > 0 {
            tracing::debug!(target: SYNC_TARGET, owner = %self.owner, removed, "data sync released");
        }
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for SyncHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncHandle")
            .field("owner", &self.owner)
            .field("registrations", &self.registrations.len())
            .field("triggers", &self.scope.binding_count())
            .field("report", &self.report)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Method;
    use apollo_core::clock::ManualClock;
    use serde_json::json;
    use std::cell::RefCell;

    fn setup(config: &ApolloConfig) -> (ManualClock, SyncBinder) {
        let clock = ManualClock::new();
        let registry = PropertyChangeRegistry::with_clock(config, Rc::new(clock.clone()));
        (clock, SyncBinder::new(registry, config))
    }

    fn counter(tag: &str) -> Component {
        Component::builder(tag)
            .property("count", json!(0))
            .property("label", json!("x"))
            .build()
    }

    #[test]
    fn no_pattern_is_reported_not_fatal() {
        let (_, binder) = setup(&ApolloConfig::default());
        let a = counter("a");
        let handle = binder.bind(&a, &SyncSource::inherit());
        assert_eq!(handle.report().strategy, None);
        assert_eq!(handle.report().skipped, vec![SyncError::NoPattern]);
        assert_eq!(handle.registration_count(), 0);
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let (_, binder) = setup(&ApolloConfig::default());
        let handle = binder.bind(&counter("a"), &SyncSource::pattern("(unclosed"));
        assert!(matches!(
            handle.report().skipped.as_slice(),
            [SyncError::InvalidPattern { pattern, .. }] if pattern == "(unclosed"
        ));
    }

    #[test]
    fn missing_descriptor_from_config_fn() {
        let (_, binder) = setup(&ApolloConfig::default());
        let handle = binder.bind(&counter("a"), &SyncSource::explicit(|_| None));
        assert_eq!(handle.report().skipped, vec![SyncError::MissingDescriptor]);
    }

    #[test]
    fn global_pattern_selects_matching_properties() {
        let config = ApolloConfig::default().with_data_sync_pattern("^cou");
        let (_, binder) = setup(&config);
        let handle = binder.bind(&counter("a"), &SyncSource::inherit());
        assert_eq!(handle.report().strategy, Some(SyncStrategy::Pattern));
        assert_eq!(handle.report().entries, vec![SyncEntry::new("count")]);
        assert_eq!(handle.registration_count(), 1);
        assert_eq!(handle.trigger_count(), 1);
    }

    #[test]
    fn source_pattern_beats_global() {
        let config = ApolloConfig::default().with_data_sync_pattern("^cou");
        let (_, binder) = setup(&config);
        let handle = binder.bind(&counter("a"), &SyncSource::pattern("^lab"));
        assert_eq!(handle.report().entries, vec![SyncEntry::new("label")]);
    }

    #[test]
    fn pattern_property_is_used_and_excluded() {
        let (_, binder) = setup(&ApolloConfig::default());
        let c = Component::builder("c")
            .property(PATTERN_PROPERTY, json!("a"))
            .property("dataA", json!(1))
            .property("other", json!(2))
            .build();
        let handle = binder.bind(&c, &SyncSource::inherit());
        let names: Vec<_> = handle.report().entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["dataA"]);
    }

    #[test]
    fn methods_never_match_pattern() {
        let (_, binder) = setup(&ApolloConfig::default());
        let c = Component::builder("c")
            .property("syncValue", json!(1))
            .method("syncReset", Method::sync(|_, _, _, _| {}))
            .build();
        let handle = binder.bind(&c, &SyncSource::pattern("^sync"));
        assert_eq!(handle.report().entries, vec![SyncEntry::new("syncValue")]);
    }

    #[test]
    fn compiled_regex_pattern() {
        let (_, binder) = setup(&ApolloConfig::default());
        let regex = regex::Regex::new("count|label").unwrap();
        let handle = binder.bind(&counter("a"), &SyncSource::pattern(regex));
        assert_eq!(handle.report().entries.len(), 2);
    }

    #[test]
    fn unknown_explicit_entry_is_skipped() {
        let (_, binder) = setup(&ApolloConfig::default());
        let source = SyncSource::entries(vec![SyncEntry::new("missing"), SyncEntry::new("count")]);
        let handle = binder.bind(&counter("a"), &source);
        assert_eq!(handle.report().strategy, Some(SyncStrategy::Explicit));
        assert_eq!(
            handle.report().skipped,
            vec![SyncError::UnknownProperty {
                name: "missing".into()
            }]
        );
        assert_eq!(handle.report().entries, vec![SyncEntry::new("count")]);
    }

    #[test]
    fn direct_assignment_without_callback() {
        let (_, binder) = setup(&ApolloConfig::default());
        let source = SyncSource::pattern("^count$");
        let a = counter("a");
        let b = counter("b");
        let _ha = binder.bind(&a, &source);
        let _hb = binder.bind(&b, &source);

        a.set("count", json!(5));
        assert_eq!(b.get("count"), Some(json!(5)));
    }

    #[test]
    fn named_callback_preferred_over_assignment() {
        let (_, binder) = setup(&ApolloConfig::default());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let b = Component::builder("b")
            .property("count", json!(0))
            .on_sync("onDataSync", move |_, name, new, old| {
                s.borrow_mut().push((name.to_owned(), new.clone(), old.clone()));
            })
            .build();
        let a = counter("a");
        let source = SyncSource::pattern("^count$");
        let _ha = binder.bind(&a, &source);
        let _hb = binder.bind(&b, &source);

        a.set("count", json!(3));
        assert_eq!(b.get("count"), Some(json!(0)));
        assert_eq!(*seen.borrow(), vec![("count".to_owned(), json!(3), json!(0))]);
    }

    #[test]
    fn no_assignment_when_disabled() {
        let (_, binder) = setup(&ApolloConfig::default());
        let a = counter("a");
        let b = counter("b");
        let _ha = binder.bind(&a, &SyncSource::entries(vec![SyncEntry::trigger("count")]));
        let _hb = binder.bind(
            &b,
            &SyncSource::entries(vec![
                SyncEntry::listener("count").with_set_data_when_no_callback(false),
            ]),
        );
        a.set("count", json!(1));
        assert_eq!(b.get("count"), Some(json!(0)));
    }

    #[test]
    fn listener_only_does_not_report() {
        let (_, binder) = setup(&ApolloConfig::default());
        let a = counter("a");
        let b = counter("b");
        let _ha = binder.bind(&a, &SyncSource::entries(vec![SyncEntry::listener("count")]));
        let _hb = binder.bind(&b, &SyncSource::entries(vec![SyncEntry::listener("count")]));
        a.set("count", json!(1));
        assert_eq!(b.get("count"), Some(json!(0)));
    }

    #[test]
    fn release_unbinds_both_sides() {
        let (_, binder) = setup(&ApolloConfig::default());
        let source = SyncSource::pattern("^count$");
        let a = counter("a");
        let b = counter("b");
        let _ha = binder.bind(&a, &source);
        let mut hb = binder.bind(&b, &source);

        hb.release();
        hb.release();
        assert_eq!(hb.registration_count(), 0);
        assert_eq!(hb.trigger_count(), 0);
        assert_eq!(binder.registry().subscriber_count("count"), 1);

        a.set("count", json!(9));
        assert_eq!(b.get("count"), Some(json!(0)));
    }

    #[test]
    fn drop_removes_last_registration_and_record() {
        let (_, binder) = setup(&ApolloConfig::default());
        let a = counter("a");
        {
            let _h = binder.bind(&a, &SyncSource::pattern("^count$"));
            assert!(binder.registry().last_change("count").is_some());
        }
        assert!(binder.registry().last_change("count").is_none());
        assert!(binder.registry().properties().is_empty());
    }

    #[test]
    fn dropped_component_is_skipped_by_fanout() {
        let (_, binder) = setup(&ApolloConfig::default());
        let source = SyncSource::pattern("^count$");
        let a = counter("a");
        let _ha = binder.bind(&a, &source);
        let hb = {
            let b = counter("b");
            binder.bind(&b, &source)
        };
        assert!(a.set("count", json!(2)));
        assert_eq!(binder.registry().subscriber_count("count"), 2);
        drop(hb);
        assert_eq!(binder.registry().subscriber_count("count"), 1);
    }

    #[test]
    fn push_reports_current_value() {
        let (_, binder) = setup(&ApolloConfig::default());
        let source = SyncSource::pattern("^count$");
        let a = Component::builder("a").property("count", json!(4)).build();
        let b = counter("b");
        let ha = binder.bind(&a, &source);
        let _hb = binder.bind(&b, &source);

        let outcome = ha.push("count");
        assert_eq!(outcome, Some(ReportOutcome::Delivered { notified: 1 }));
        assert_eq!(b.get("count"), Some(json!(4)));
        assert!(ha.push("nope").is_none());
    }

    #[test]
    fn push_reads_only_the_bound_component() {
        let (clock, binder) = setup(&ApolloConfig::default());
        let source = SyncSource::pattern("^count$");
        let a = Component::builder("a").property("count", json!(1)).build();
        let b = Component::builder("b").property("count", json!(2)).build();
        let ha = binder.bind(&a, &source);
        let _hb = binder.bind(&b, &source);

        // Reported by b, so only a receives it.
        binder
            .registry()
            .report_property_changed(b.id(), "count", &json!(8), &json!(2));
        assert_eq!((a.get("count"), b.get("count")), (Some(json!(8)), Some(json!(2))));

        clock.advance_ms(600);
        assert_eq!(ha.push("count"), Some(ReportOutcome::Delivered { notified: 1 }));
        assert_eq!(b.get("count"), Some(json!(8)));

        drop(a);
        assert_eq!(ha.push("count"), None);
    }

    #[test]
    fn empty_global_pattern_counts_as_missing() {
        let config = ApolloConfig::default().with_data_sync_pattern("");
        let (_, binder) = setup(&config);
        let c = Component::builder("c")
            .property("count", json!(0))
            .property("localPage", json!(1))
            .build();
        let handle = binder.bind(&c, &SyncSource::inherit());
        assert_eq!(handle.report().strategy, None);
        assert_eq!(handle.report().skipped, vec![SyncError::NoPattern]);
        assert!(handle.report().entries.is_empty());
        assert_eq!(binder.registry().registration_count(), 0);
    }

    #[test]
    fn empty_source_pattern_falls_through() {
        let config = ApolloConfig::default().with_data_sync_pattern("^count$");
        let (_, binder) = setup(&config);
        let handle = binder.bind(&counter("a"), &SyncSource::pattern(""));
        assert_eq!(handle.report().entries, vec![SyncEntry::new("count")]);

        let (_, bare) = setup(&ApolloConfig::default());
        let handle = bare.bind(&counter("b"), &SyncSource::pattern(""));
        assert_eq!(handle.report().skipped, vec![SyncError::NoPattern]);
    }

    #[test]
    fn error_display() {
        assert!(SyncError::NoPattern.to_string().contains(PATTERN_PROPERTY));
        assert_eq!(
            SyncError::UnknownProperty { name: "x".into() }.to_string(),
            "sync entry 'x' does not name a declared property"
        );
    }
}
