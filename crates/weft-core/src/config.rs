#![forbid(unsafe_code)]

//! Declared, intercepted configuration properties.
//!
//! # Design
//!
//! Every configurable type owns a [`ConfigStore`] whose shape is fixed by a
//! static [`ConfigSchema`]: one [`ConfigDescriptor`] per property, declared
//! once per type. All writes go through a single entry point, [`apply`]
//! (surfaced as [`Configurable::set_config`]), which runs
//!
//! ```text
//! legal-value check -> before_set(new, old) -> store -> after_set(new, old)
//! ```
//!
//! synchronously and in that order. The value returned by `before_set` is
//! the value stored, so hooks can coerce a candidate or decline it. An
//! `after_set` hook never changes storage; it exists for side effects such
//! as rebuilding part of a virtual tree or cascading into other properties.
//!
//! # Invariants
//!
//! 1. `after_set` observes the `(new, old)` pair of *its own* write; `old`
//!    is read from the store at the moment the write begins.
//! 2. `after_set` only fires when the stored value actually changed.
//! 3. On the first write (`old == None`) `after_set` is skipped unless the
//!    descriptor opts in with [`ConfigDescriptor::after_on_init`].
//! 4. A candidate outside `legal_values`, or one declined by `before_set`,
//!    leaves the stored value untouched. Under [`RejectPolicy::Silent`] the
//!    write reports [`SetOutcome::Rejected`] instead of failing.
//!
//! # Failure Modes
//!
//! - **Re-entrant write**: a `before_set` hook writing the property it is
//!   intercepting fails with [`ReentrantMutationError`]. Writes to other
//!   properties from inside hooks are fine.
//! - **Use after destroy**: once [`ConfigStore::clear`] has run, every read
//!   and write fails with [`DestroyedInstanceError`].

use crate::error::{
    DestroyedInstanceError, Error, ReentrantMutationError, Result, ValidationRejected,
};
use crate::value::ConfigValue;
use ahash::AHashMap;
use std::fmt;

/// Runs before a value is stored. Returns the value to store; an
/// `Err(Error::Validation(_))` declines the candidate.
pub type BeforeSet<C> = fn(&mut C, ConfigValue, Option<&ConfigValue>) -> Result<ConfigValue>;

/// Runs after a changed value has been stored.
pub type AfterSet<C> = fn(&mut C, &ConfigValue, Option<&ConfigValue>) -> Result<()>;

/// Maps the stored value to the value a reader sees.
pub type BeforeGet<C> = fn(&C, ConfigValue) -> ConfigValue;

// ---------------------------------------------------------------------------
// Descriptors
// ---------------------------------------------------------------------------

/// Declaration of one configurable property.
pub struct ConfigDescriptor<C> {
    name: &'static str,
    default: ConfigValue,
    legal_values: Option<Vec<ConfigValue>>,
    before_set: Option<BeforeSet<C>>,
    after_set: Option<AfterSet<C>>,
    before_get: Option<BeforeGet<C>>,
    after_on_init: bool,
}

impl<C> ConfigDescriptor<C> {
    /// A plain stored field with the given default and no hooks.
    pub fn new(name: &'static str, default: impl Into<ConfigValue>) -> Self {
        Self {
            name,
            default: default.into(),
            legal_values: None,
            before_set: None,
            after_set: None,
            before_get: None,
            after_on_init: false,
        }
    }

    /// Restrict the property to an enumerated set of values.
    #[must_use]
    pub fn legal_values<V: Into<ConfigValue>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.legal_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn before_set(mut self, hook: BeforeSet<C>) -> Self {
        self.before_set = Some(hook);
        self
    }

    #[must_use]
    pub fn after_set(mut self, hook: AfterSet<C>) -> Self {
        self.after_set = Some(hook);
        self
    }

    #[must_use]
    pub fn before_get(mut self, hook: BeforeGet<C>) -> Self {
        self.before_get = Some(hook);
        self
    }

    /// Also run `after_set` for the very first write, with `old == None`.
    #[must_use]
    pub fn after_on_init(mut self) -> Self {
        self.after_on_init = true;
        self
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn default_value(&self) -> &ConfigValue {
        &self.default
    }

    #[must_use]
    pub fn legal(&self) -> Option<&[ConfigValue]> {
        self.legal_values.as_deref()
    }

    /// True when the descriptor carries any interception hook.
    #[must_use]
    pub fn has_hooks(&self) -> bool {
        self.before_set.is_some() || self.after_set.is_some() || self.before_get.is_some()
    }
}

impl<C> fmt::Debug for ConfigDescriptor<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigDescriptor")
            .field("name", &self.name)
            .field("default", &self.default)
            .field("legal_values", &self.legal_values)
            .field("before_set", &self.before_set.is_some())
            .field("after_set", &self.after_set.is_some())
            .field("before_get", &self.before_get.is_some())
            .field("after_on_init", &self.after_on_init)
            .finish()
    }
}

/// Ordered descriptor table for one configurable type.
///
/// Declaration order is the order in which initial values are applied.
pub struct ConfigSchema<C> {
    type_name: &'static str,
    entries: Vec<ConfigDescriptor<C>>,
    index: AHashMap<&'static str, usize>,
}

impl<C> ConfigSchema<C> {
    #[must_use]
    pub fn builder(type_name: &'static str) -> ConfigSchemaBuilder<C> {
        ConfigSchemaBuilder {
            schema: Self {
                type_name,
                entries: Vec::new(),
                index: AHashMap::new(),
            },
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ConfigDescriptor<C>> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigDescriptor<C>> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<C> fmt::Debug for ConfigSchema<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigSchema")
            .field("type_name", &self.type_name)
            .field("entries", &self.entries)
            .finish()
    }
}

/// Builder for a [`ConfigSchema`].
pub struct ConfigSchemaBuilder<C> {
    schema: ConfigSchema<C>,
}

impl<C> ConfigSchemaBuilder<C> {
    /// Add a property. Re-declaring a name replaces the earlier descriptor
    /// in place, so a derived type can override a base declaration.
    #[must_use]
    pub fn declare(mut self, descriptor: ConfigDescriptor<C>) -> Self {
        match self.schema.index.get(descriptor.name) {
            Some(&i) => self.schema.entries[i] = descriptor,
            None => {
                self.schema
                    .index
                    .insert(descriptor.name, self.schema.entries.len());
                self.schema.entries.push(descriptor);
            }
        }
        self
    }

    #[must_use]
    pub fn build(self) -> ConfigSchema<C> {
        self.schema
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// What to do when a candidate value is declined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RejectPolicy {
    /// Keep the previous value and report [`SetOutcome::Rejected`].
    #[default]
    Silent,
    /// Fail the write with [`ValidationRejected`].
    Strict,
}

/// Result of a successful write.
#[derive(Debug, Clone, PartialEq)]
pub enum SetOutcome {
    /// The value changed and hooks ran.
    Stored,
    /// The final value equals the stored one; `after_set` did not run.
    Unchanged,
    /// The candidate was declined and the previous value kept.
    Rejected(ValidationRejected),
}

impl SetOutcome {
    #[must_use]
    pub fn is_stored(&self) -> bool {
        matches!(self, Self::Stored)
    }

    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

/// Per-instance property values.
pub struct ConfigStore<C: 'static> {
    schema: &'static ConfigSchema<C>,
    owner: String,
    values: AHashMap<&'static str, ConfigValue>,
    /// Properties whose `before_set` is currently on the stack.
    in_flight: Vec<&'static str>,
    policy: RejectPolicy,
    cleared: bool,
}

impl<C: 'static> ConfigStore<C> {
    /// An empty store. `owner` labels diagnostics (usually the instance id).
    pub fn new(schema: &'static ConfigSchema<C>, owner: impl Into<String>) -> Self {
        Self {
            schema,
            owner: owner.into(),
            values: AHashMap::with_capacity(schema.len()),
            in_flight: Vec::new(),
            policy: RejectPolicy::default(),
            cleared: false,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RejectPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn set_policy(&mut self, policy: RejectPolicy) {
        self.policy = policy;
    }

    #[must_use]
    pub fn schema(&self) -> &'static ConfigSchema<C> {
        self.schema
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn policy(&self) -> RejectPolicy {
        self.policy
    }

    /// Stored value without running `before_get`. `None` if never written.
    #[must_use]
    pub fn raw(&self, name: &str) -> Option<&ConfigValue> {
        self.values.get(name)
    }

    /// True once the property has been written at least once.
    #[must_use]
    pub fn is_set(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Stored values in declaration order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(&'static str, ConfigValue)> {
        self.schema
            .iter()
            .filter_map(|d| self.values.get(d.name).map(|v| (d.name, v.clone())))
            .collect()
    }

    /// Drop every value. The store rejects all access afterwards.
    pub fn clear(&mut self) {
        self.values.clear();
        self.in_flight.clear();
        self.cleared = true;
        tracing::trace!(target: "weft.config", owner = %self.owner, "config store cleared");
    }

    #[must_use]
    pub fn is_cleared(&self) -> bool {
        self.cleared
    }

    /// Fail with [`DestroyedInstanceError`] if the store was cleared.
    pub fn ensure_live(&self, operation: &str) -> Result<()> {
        if self.cleared {
            return Err(DestroyedInstanceError::new(&self.owner, operation).into());
        }
        Ok(())
    }

    fn descriptor(&self, name: &str) -> Result<&'static ConfigDescriptor<C>> {
        let schema: &'static ConfigSchema<C> = self.schema;
        schema.get(name).ok_or_else(|| Error::UnknownProperty {
            owner: self.owner.clone(),
            property: name.to_owned(),
        })
    }
}

impl<C: 'static> fmt::Debug for ConfigStore<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigStore")
            .field("type", &self.schema.type_name)
            .field("owner", &self.owner)
            .field("values", &self.snapshot())
            .field("cleared", &self.cleared)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// A type that owns a [`ConfigStore`] over itself.
pub trait Configurable: Sized + 'static {
    fn config(&self) -> &ConfigStore<Self>;
    fn config_mut(&mut self) -> &mut ConfigStore<Self>;

    /// Write a property through the full hook pipeline.
    fn set_config(&mut self, name: &str, value: impl Into<ConfigValue>) -> Result<SetOutcome> {
        apply(self, name, value.into())
    }

    /// Read a property, running its `before_get` hook.
    ///
    /// A property that was never written reads as its declared default.
    fn get_config(&self, name: &str) -> Result<ConfigValue> {
        let store = self.config();
        store.ensure_live("get_config")?;
        let descriptor = store.descriptor(name)?;
        let raw = store
            .raw(descriptor.name)
            .cloned()
            .unwrap_or_else(|| descriptor.default.clone());
        Ok(match descriptor.before_get {
            Some(hook) => hook(self, raw),
            None => raw,
        })
    }
}

/// Single write entry point: legal check, `before_set`, store, `after_set`.
pub fn apply<C: Configurable>(target: &mut C, name: &str, value: ConfigValue) -> Result<SetOutcome> {
    let store = target.config();
    store.ensure_live("set_config")?;
    let descriptor = store.descriptor(name)?;
    let key = descriptor.name;

    if store.in_flight.contains(&key) {
        return Err(ReentrantMutationError {
            owner: store.owner.clone(),
            property: key.to_owned(),
        }
        .into());
    }

    let old = store.values.get(key).cloned();

    if let Some(legal) = descriptor.legal_values.as_deref()
        && !legal.contains(&value)
    {
        let rejected = ValidationRejected::new(key, format!("{value} is not a legal value"));
        return reject(target.config(), rejected);
    }

    let candidate = match descriptor.before_set {
        Some(hook) => {
            target.config_mut().in_flight.push(key);
            let result = hook(target, value, old.as_ref());
            let in_flight = &mut target.config_mut().in_flight;
            if let Some(pos) = in_flight.iter().rposition(|n| *n == key) {
                in_flight.remove(pos);
            }
            match result {
                Ok(v) => v,
                Err(Error::Validation(rejected)) => return reject(target.config(), rejected),
                Err(other) => return Err(other),
            }
        }
        None => value,
    };

    if old.as_ref() == Some(&candidate) {
        return Ok(SetOutcome::Unchanged);
    }

    {
        let store = target.config_mut();
        // A hook may have destroyed the owner.
        store.ensure_live("set_config")?;
        tracing::trace!(
            target: "weft.config",
            owner = %store.owner,
            property = key,
            new = %candidate,
            "config stored"
        );
        store.values.insert(key, candidate.clone());
    }

    if let Some(hook) = descriptor.after_set
        && (old.is_some() || descriptor.after_on_init)
    {
        hook(target, &candidate, old.as_ref())?;
    }

    Ok(SetOutcome::Stored)
}

fn reject<C>(store: &ConfigStore<C>, rejected: ValidationRejected) -> Result<SetOutcome> {
    match store.policy {
        RejectPolicy::Silent => {
            tracing::debug!(
                target: "weft.config",
                owner = %store.owner,
                property = %rejected.property,
                reason = %rejected.reason,
                "config value rejected, previous value kept"
            );
            Ok(SetOutcome::Rejected(rejected))
        }
        RejectPolicy::Strict => Err(rejected.into()),
    }
}

/// Apply declared defaults, overridden by `overrides`, in declaration order.
///
/// Each value goes through [`apply`] with `old == None`, so `before_set`
/// hooks see initial values too. Unknown override names fail.
pub fn initialize<C, I, K>(target: &mut C, overrides: I) -> Result<()>
where
    C: Configurable,
    I: IntoIterator<Item = (K, ConfigValue)>,
    K: Into<String>,
{
    let schema = target.config().schema;
    let mut pending: AHashMap<String, ConfigValue> = overrides
        .into_iter()
        .map(|(k, v)| (k.into(), v))
        .collect();

    if let Some(unknown) = pending.keys().find(|k| schema.get(k).is_none()) {
        return Err(Error::UnknownProperty {
            owner: target.config().owner.clone(),
            property: unknown.clone(),
        });
    }

    for descriptor in schema.iter() {
        let value = pending
            .remove(descriptor.name)
            .unwrap_or_else(|| descriptor.default.clone());
        apply(target, descriptor.name, value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::LazyLock;

    struct Probe {
        config: ConfigStore<Probe>,
        log: Vec<String>,
    }

    impl Configurable for Probe {
        fn config(&self) -> &ConfigStore<Self> {
            &self.config
        }
        fn config_mut(&mut self) -> &mut ConfigStore<Self> {
            &mut self.config
        }
    }

    fn clamp_width(_: &mut Probe, value: ConfigValue, _: Option<&ConfigValue>) -> Result<ConfigValue> {
        let width = value.as_int().ok_or_else(|| ValidationRejected::new("width", "not an int"))?;
        Ok(ConfigValue::Int(width.clamp(0, 100)))
    }

    fn log_after(probe: &mut Probe, new: &ConfigValue, old: Option<&ConfigValue>) -> Result<()> {
        let old = old.map_or_else(|| "-".to_owned(), ToString::to_string);
        probe.log.push(format!("{old}->{new}"));
        Ok(())
    }

    fn loop_back(probe: &mut Probe, value: ConfigValue, _: Option<&ConfigValue>) -> Result<ConfigValue> {
        probe.set_config("looping", 0)?;
        Ok(value)
    }

    fn cascade(probe: &mut Probe, new: &ConfigValue, _: Option<&ConfigValue>) -> Result<()> {
        let width = new.as_int().unwrap_or(0);
        probe.set_config("width", width * 2)?;
        Ok(())
    }

    static SCHEMA: LazyLock<ConfigSchema<Probe>> = LazyLock::new(|| {
        ConfigSchema::builder("Probe")
            .declare(
                ConfigDescriptor::new("width", 10)
                    .before_set(clamp_width)
                    .after_set(log_after),
            )
            .declare(ConfigDescriptor::new("align", "start").legal_values(["start", "end"]))
            .declare(ConfigDescriptor::new("looping", 0).before_set(loop_back))
            .declare(ConfigDescriptor::new("half", 1).after_set(cascade))
            .build()
    });

    fn probe() -> Probe {
        let mut p = Probe {
            config: ConfigStore::new(&SCHEMA, "probe"),
            log: Vec::new(),
        };
        initialize(&mut p, Vec::<(&str, ConfigValue)>::new()).expect("init");
        p
    }

    #[test]
    fn initial_write_skips_after_hook() {
        let p = probe();
        assert!(p.log.is_empty());
        assert_eq!(p.get_config("width").unwrap(), ConfigValue::Int(10));
    }

    #[test]
    fn before_hook_coerces() {
        let mut p = probe();
        p.set_config("width", 500).unwrap();
        assert_eq!(p.get_config("width").unwrap(), ConfigValue::Int(100));
        assert_eq!(p.log, vec!["10->100"]);
    }

    #[test]
    fn illegal_enum_value_is_silently_kept() {
        let mut p = probe();
        let outcome = p.set_config("align", "middle").unwrap();
        assert!(outcome.is_rejected());
        assert_eq!(p.get_config("align").unwrap(), ConfigValue::from("start"));
    }

    #[test]
    fn strict_policy_surfaces_rejection() {
        let mut p = probe();
        p.config.policy = RejectPolicy::Strict;
        let err = p.set_config("align", "middle").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn before_hook_declining_keeps_previous() {
        let mut p = probe();
        let outcome = p.set_config("width", "wide").unwrap();
        assert!(outcome.is_rejected());
        assert_eq!(p.get_config("width").unwrap(), ConfigValue::Int(10));
        assert!(p.log.is_empty());
    }

    #[test]
    fn unchanged_value_skips_after_hook() {
        let mut p = probe();
        assert_eq!(p.set_config("width", 10).unwrap(), SetOutcome::Unchanged);
        assert!(p.log.is_empty());
    }

    #[test]
    fn reentrant_before_hook_fails() {
        let mut p = probe();
        let err = p.set_config("looping", 5).unwrap_err();
        assert!(matches!(err, Error::Reentrant(ref e) if e.property == "looping"));
        // The guard is released after the failure.
        assert!(p.config.in_flight.is_empty());
    }

    #[test]
    fn after_hook_cascades_to_other_property() {
        let mut p = probe();
        p.set_config("half", 20).unwrap();
        assert_eq!(p.get_config("width").unwrap(), ConfigValue::Int(40));
        assert_eq!(p.log, vec!["10->40"]);
    }

    #[test]
    fn cleared_store_rejects_access() {
        let mut p = probe();
        p.config.clear();
        assert!(p.set_config("width", 1).unwrap_err().is_destroyed());
        assert!(p.get_config("width").unwrap_err().is_destroyed());
    }

    #[test]
    fn unknown_property_is_an_error() {
        let mut p = probe();
        assert!(matches!(
            p.set_config("nope", 1),
            Err(Error::UnknownProperty { .. })
        ));
        let mut fresh = Probe {
            config: ConfigStore::new(&SCHEMA, "fresh"),
            log: Vec::new(),
        };
        assert!(initialize(&mut fresh, [("nope", ConfigValue::Int(1))]).is_err());
    }

    #[test]
    fn overrides_replace_defaults() {
        let mut p = Probe {
            config: ConfigStore::new(&SCHEMA, "p"),
            log: Vec::new(),
        };
        initialize(&mut p, [("align", ConfigValue::from("end"))]).unwrap();
        assert_eq!(p.get_config("align").unwrap(), ConfigValue::from("end"));
    }
}
