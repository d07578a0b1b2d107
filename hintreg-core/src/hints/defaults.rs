//! The default hint layer.
//!
//! A [`DefaultsStore`] holds hints that apply when a caller does not say
//! otherwise. It is an explicit object: pass it to whatever builds hint sets or
//! registries. [`DefaultsStore::global`] is the one process-wide instance, for
//! callers that want the convenience.

use super::{key::HintKey, set::HintSet, value::HintValue};
use crate::error::HintError;
use parking_lot::RwLock;
use std::sync::{Arc, LazyLock};

/// Identifies a change listener registered with [`DefaultsStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A change to the default layer, passed to listeners.
#[derive(Debug)]
pub struct DefaultsChange<'a> {
    /// The key whose default changed.
    pub key: &'a HintKey,
    /// The previous default, if any.
    pub old: Option<&'a HintValue>,
    /// The new default, `None` when the default was removed.
    pub new: Option<&'a HintValue>,
}

type Listener = Arc<dyn Fn(&DefaultsChange<'_>) + Send + Sync>;

#[derive(Default)]
struct Inner {
    values: HintSet,
    listeners: Vec<(ListenerId, Listener)>,
    next_id: u64,
}

/// A shared, mutable layer of default hints with change notification.
///
/// Cloning the store clones the handle; all clones see the same defaults.
#[derive(Clone, Default)]
pub struct DefaultsStore {
    inner: Arc<RwLock<Inner>>,
}

static GLOBAL: LazyLock<DefaultsStore> = LazyLock::new(DefaultsStore::new);

impl DefaultsStore {
    /// A new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide store.
    pub fn global() -> &'static DefaultsStore {
        &GLOBAL
    }

    /// Set the default for `key`, returning the previous default.
    ///
    /// Listeners are notified when the value actually changed.
    pub fn set(
        &self,
        key: &HintKey,
        value: impl Into<HintValue>,
    ) -> Result<Option<HintValue>, HintError> {
        let value = value.into();
        let (old, listeners) = {
            let mut inner = self.inner.write();
            let old = inner.values.insert(key, value.clone())?;
            (old, inner.listeners.clone())
        };
        if old.as_ref() != Some(&value) {
            tracing::debug!(key = %key, value = %value, "system default hint set");
            notify(
                &listeners,
                &DefaultsChange {
                    key,
                    old: old.as_ref(),
                    new: Some(&value),
                },
            );
        }
        Ok(old)
    }

    /// Remove the default for `key`, returning it.
    pub fn remove(&self, key: &HintKey) -> Option<HintValue> {
        let (old, listeners) = {
            let mut inner = self.inner.write();
            let old = inner.values.remove(key);
            (old, inner.listeners.clone())
        };
        if let Some(previous) = &old {
            tracing::debug!(key = %key, "system default hint removed");
            notify(
                &listeners,
                &DefaultsChange {
                    key,
                    old: Some(previous),
                    new: None,
                },
            );
        }
        old
    }

    /// The default for `key`.
    pub fn get(&self, key: &HintKey) -> Option<HintValue> {
        self.inner.read().values.get(key).cloned()
    }

    /// A fresh hint set holding a copy of the current defaults.
    pub fn hint_set(&self) -> HintSet {
        self.inner.read().values.clone()
    }

    /// Fill the keys absent from `hints` with the current defaults.
    pub fn apply_to(&self, hints: &mut HintSet) -> bool {
        hints.add_defaults(&self.inner.read().values)
    }

    /// Number of defaults.
    pub fn len(&self) -> usize {
        self.inner.read().values.len()
    }

    /// Whether no default is set.
    pub fn is_empty(&self) -> bool {
        self.inner.read().values.is_empty()
    }

    /// Register a listener called after every effective change.
    ///
    /// Listeners run after the store's lock is released, so they may read or
    /// modify the store.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&DefaultsChange<'_>) + Send + Sync + 'static,
    {
        let mut inner = self.inner.write();
        let id = ListenerId(inner.next_id);
        inner.next_id += 1;
        inner.listeners.push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut inner = self.inner.write();
        let before = inner.listeners.len();
        inner.listeners.retain(|(other, _)| *other != id);
        inner.listeners.len() != before
    }

    /// Read defaults from the environment.
    ///
    /// For each key, the variable `<PREFIX>_<NAME>` is read, where `NAME` is the
    /// key name upper-cased with every non-alphanumeric character replaced by
    /// `_`. Unset variables are skipped. Returns the number of defaults set.
    pub fn load_env(&self, prefix: &str, keys: &[&HintKey]) -> Result<usize, HintError> {
        self.load_with(prefix, keys, |name| std::env::var(name).ok())
    }

    /// Like [`load_env`](Self::load_env), reading variables through `lookup`.
    pub fn load_with<F>(&self, prefix: &str, keys: &[&HintKey], lookup: F) -> Result<usize, HintError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut loaded = 0;
        for key in keys {
            let name = env_name(prefix, key.name());
            if let Some(raw) = lookup(&name) {
                let value = key.parse(&raw)?;
                self.set(key, value)?;
                loaded += 1;
            }
        }
        Ok(loaded)
    }
}

impl std::fmt::Debug for DefaultsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("DefaultsStore")
            .field("values", &inner.values)
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

fn notify(listeners: &[(ListenerId, Listener)], change: &DefaultsChange<'_>) {
    for (_, listener) in listeners {
        listener(change);
    }
}

fn env_name(prefix: &str, key: &str) -> String {
    let name: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    if prefix.is_empty() {
        name
    } else {
        format!("{prefix}_{name}")
    }
}
