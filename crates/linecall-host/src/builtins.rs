//! Demonstration procedures served by the `linecall` binary.
//!
//! | Name | Arguments | Result |
//! | --- | --- | --- |
//! | `ping` | none | `"pong"` |
//! | `echo` | anything | `{"args": [...], "kwargs": {...}}` |
//! | `add` | `a`, `b` (integers) | `a + b` |
//! | `kv.set` | `key`, `value` | previous value or `null` |
//! | `kv.get` | `key`, optional `default` | stored value or `default` |
//! | `kv.delete` | `key` | removed value |
//! | `kv.keys` | none | sorted keys |

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use linecall::{Call, ProcedureError, ProcedureRegistry};
use serde_json::{Value, json};

/// Error category for arithmetic that leaves the 64-bit integer range.
pub const OVERFLOW_ERROR: &str = "OverflowError";
/// Error category for lookups of absent keys.
pub const KEY_ERROR: &str = "KeyError";

/// Registers every demonstration procedure, backing the `kv.*` family with
/// `store`.
pub fn register_builtins(registry: &mut ProcedureRegistry, store: &KvStore) {
    registry.register("ping", ping);
    registry.register("echo", echo);
    registry.register("add", add);
    store.register(registry);
}

fn ping(call: &Call) -> Result<&'static str, ProcedureError> {
    call.at_most(0)?;
    Ok("pong")
}

fn echo(call: &Call) -> Result<Value, ProcedureError> {
    Ok(json!({ "args": call.args(), "kwargs": call.kwargs() }))
}

fn add(call: &Call) -> Result<i64, ProcedureError> {
    call.at_most(2)?;
    let a: i64 = call.param(0, "a")?;
    let b: i64 = call.param(1, "b")?;
    a.checked_add(b).ok_or_else(|| {
        ProcedureError::new(OVERFLOW_ERROR, format!("{a} + {b} does not fit in 64 bits"))
    })
}

/// In-memory key/value store shared by the `kv.*` procedures.
///
/// Cloning yields another handle onto the same entries.
#[derive(Debug, Clone, Default)]
pub struct KvStore {
    entries: Arc<Mutex<BTreeMap<String, Value>>>,
}

impl KvStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, returning the value it replaced.
    pub fn set(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.lock().insert(key.into(), value)
    }

    /// Returns a copy of the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().get(key).cloned()
    }

    /// Removes `key`, returning its value.
    pub fn delete(&self, key: &str) -> Option<Value> {
        self.lock().remove(key)
    }

    /// Stored keys in sorted order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` when nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Registers `kv.set`, `kv.get`, `kv.delete` and `kv.keys` against this
    /// store.
    pub fn register(&self, registry: &mut ProcedureRegistry) {
        let setter = self.clone();
        registry.register("kv.set", move |call: &Call| {
            call.at_most(2)?;
            let key: String = call.param(0, "key")?;
            let value: Value = call.param(1, "value")?;
            Ok(setter.set(key, value))
        });

        let getter = self.clone();
        registry.register("kv.get", move |call: &Call| {
            call.at_most(2)?;
            let key: String = call.param(0, "key")?;
            let default: Option<Value> = call.optional(1, "default")?;
            Ok(getter.get(&key).or(default).unwrap_or(Value::Null))
        });

        let deleter = self.clone();
        registry.register("kv.delete", move |call: &Call| {
            call.at_most(1)?;
            let key: String = call.param(0, "key")?;
            deleter
                .delete(&key)
                .ok_or_else(|| ProcedureError::new(KEY_ERROR, format!("'{key}'")))
        });

        let lister = self.clone();
        registry.register("kv.keys", move |call: &Call| {
            call.at_most(0)?;
            Ok(lister.keys())
        });
    }

    // A panicking procedure must not take the store down with it.
    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Value>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
