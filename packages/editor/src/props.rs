//! # Props Store
//!
//! Ordered key-path → value map owned by a [`Node`](crate::Node).
//!
//! Paths are dotted (`style.color`, `items.0.label`); numeric segments index
//! into arrays. Keys wrapped in the reserved `___key___` namespace hold
//! framework metadata ("extras") and are exported separately from user props.

use serde_json::{Map, Value};

use crate::event_bus::{EventBus, Unsubscribe};
use crate::schema::TransformStage;

pub const EXTRA_KEY_PREFIX: &str = "___";

/// Built-in extras seeded once per node, with their default values
pub const BUILTIN_EXTRAS: [(&str, bool); 2] = [("isHidden", false), ("isLocked", false)];

/// Convert a user-facing extra key into the reserved namespace.
///
/// Only the first path segment is wrapped: `a.b` → `___a___.b`.
pub fn extra_key(key: &str) -> String {
    match key.split_once('.') {
        Some((head, rest)) => format!("{EXTRA_KEY_PREFIX}{head}{EXTRA_KEY_PREFIX}.{rest}"),
        None => format!("{EXTRA_KEY_PREFIX}{key}{EXTRA_KEY_PREFIX}"),
    }
}

/// The user-facing name of a top-level extra key, if `key` is one
pub fn strip_extra_key(key: &str) -> Option<&str> {
    key.strip_prefix(EXTRA_KEY_PREFIX)
        .and_then(|k| k.strip_suffix(EXTRA_KEY_PREFIX))
        .filter(|k| !k.is_empty())
}

pub fn is_extra_key(key: &str) -> bool {
    strip_extra_key(key).is_some()
}

fn builtin_default(name: &str) -> Option<Value> {
    BUILTIN_EXTRAS
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, default)| Value::Bool(*default))
}

fn parse_path(path: &str) -> Option<Vec<&str>> {
    if path.is_empty() {
        return None;
    }
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return None;
    }
    Some(segments)
}

/// Emitted for every successful `set` and every effective `unset`
#[derive(Debug, Clone, PartialEq)]
pub struct PropChange {
    pub key: String,
    pub new_value: Option<Value>,
    pub old_value: Option<Value>,
}

pub struct Props {
    items: Map<String, Value>,
    purged: bool,
    emitter: EventBus<PropChange>,
}

impl Props {
    /// Build from schema `props` plus schema-level extras
    pub fn new(props: Map<String, Value>, extras: Map<String, Value>) -> Self {
        let mut this = Self {
            items: Map::new(),
            purged: false,
            emitter: EventBus::new("Props"),
        };
        this.fill(props, extras);
        this
    }

    fn fill(&mut self, props: Map<String, Value>, extras: Map<String, Value>) {
        self.items = props;
        for (key, value) in extras {
            self.items.insert(extra_key(&key), value);
        }
    }

    /// Replace every value without emitting per-key changes
    pub fn import(&mut self, props: Map<String, Value>, extras: Map<String, Value>) {
        if self.purged {
            return;
        }
        self.fill(props, extras);
    }

    /// Split into `(props, extras)` with the field set selected by `stage`
    pub fn export(&self, stage: TransformStage) -> (Map<String, Value>, Map<String, Value>) {
        let mut props = Map::new();
        let mut extras = Map::new();

        for (key, value) in &self.items {
            let Some(name) = strip_extra_key(key) else {
                props.insert(key.clone(), value.clone());
                continue;
            };

            let default = builtin_default(name);
            let keep = match stage {
                TransformStage::Serialize => true,
                TransformStage::Render => default.is_some(),
                TransformStage::Save => default.as_ref() != Some(value),
            };
            if keep {
                extras.insert(name.to_string(), value.clone());
            }
        }

        (props, extras)
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        let segments = parse_path(path)?;
        let (first, rest) = segments.split_first()?;

        let mut current = self.items.get(*first)?;
        for segment in rest {
            current = match current {
                Value::Object(map) => map.get(*segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn has(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Set `path` to `value`.
    ///
    /// Missing intermediate containers are created (as objects) only when
    /// `create_missing` is set; a scalar intermediate is never overwritten.
    /// Returns `false` without emitting when the path cannot be reached.
    pub fn set(&mut self, path: &str, value: Value, create_missing: bool) -> bool {
        if self.purged {
            return false;
        }
        let Some(segments) = parse_path(path) else {
            return false;
        };
        if !self.can_set(&segments, create_missing) {
            return false;
        }

        let mut root = Value::Object(std::mem::take(&mut self.items));
        let old_value = write_path(&mut root, &segments, value.clone());
        if let Value::Object(map) = root {
            self.items = map;
        }

        self.emitter.emit(&PropChange {
            key: path.to_string(),
            new_value: Some(value),
            old_value,
        });
        true
    }

    fn can_set(&self, segments: &[&str], create_missing: bool) -> bool {
        let Some((last, parents)) = segments.split_last() else {
            return false;
        };

        let mut current: Option<&Value> = None;
        for (depth, segment) in parents.iter().enumerate() {
            let next = match (depth, current) {
                (0, _) => self.items.get(*segment),
                (_, Some(Value::Object(map))) => map.get(*segment),
                // array slots are never created
                (_, Some(Value::Array(items))) => match segment.parse::<usize>().ok().and_then(|i| items.get(i)) {
                    Some(v) => Some(v),
                    None => return false,
                },
                _ => return false,
            };
            match next {
                // everything below a created container is created too
                None => return create_missing,
                Some(v) if v.is_object() || v.is_array() => current = Some(v),
                Some(_) => return false,
            }
        }

        match current {
            None | Some(Value::Object(_)) => true,
            Some(Value::Array(items)) => matches!(last.parse::<usize>(), Ok(i) if i <= items.len()),
            Some(_) => false,
        }
    }

    /// Seed `key` with `value` unless present; never emits
    pub fn seed(&mut self, key: &str, value: Value) -> bool {
        if self.purged || self.items.contains_key(key) {
            return false;
        }
        self.items.insert(key.to_string(), value);
        true
    }

    /// Remove `path`; emits only when something was actually removed
    pub fn unset(&mut self, path: &str) -> bool {
        if self.purged {
            return false;
        }
        let Some(segments) = parse_path(path) else {
            return false;
        };
        let Some((last, parents)) = segments.split_last() else {
            return false;
        };

        let removed = if parents.is_empty() {
            self.items.shift_remove(*last)
        } else {
            let mut current = match self.items.get_mut(parents[0]) {
                Some(v) => v,
                None => return false,
            };
            for segment in &parents[1..] {
                current = match current {
                    Value::Object(map) => match map.get_mut(*segment) {
                        Some(v) => v,
                        None => return false,
                    },
                    Value::Array(items) => match segment.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
                        Some(v) => v,
                        None => return false,
                    },
                    _ => return false,
                };
            }
            match current {
                Value::Object(map) => map.shift_remove(*last),
                Value::Array(items) => match last.parse::<usize>() {
                    Ok(i) if i < items.len() => Some(items.remove(i)),
                    _ => None,
                },
                _ => None,
            }
        };

        let Some(old_value) = removed else {
            return false;
        };

        self.emitter.emit(&PropChange {
            key: path.to_string(),
            new_value: None,
            old_value: Some(old_value),
        });
        true
    }

    /// Detach every value; idempotent
    pub fn purge(&mut self) {
        if self.purged {
            return;
        }
        self.purged = true;
        self.items.clear();
        self.emitter.clear();
    }

    pub fn is_purged(&self) -> bool {
        self.purged
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Top-level keys in insertion order (extras in their reserved form)
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    pub fn on_change(&self, listener: impl Fn(&PropChange) + 'static) -> Unsubscribe {
        self.emitter.on(listener)
    }
}

impl std::fmt::Debug for Props {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Props")
            .field("items", &self.items)
            .field("purged", &self.purged)
            .finish()
    }
}

/// Write along a path already checked by `Props::can_set`
fn write_path(target: &mut Value, segments: &[&str], value: Value) -> Option<Value> {
    match segments {
        [] => None,
        [last] => match target {
            Value::Object(map) => map.insert(last.to_string(), value),
            Value::Array(items) => {
                let index = last.parse::<usize>().ok()?;
                if index < items.len() {
                    Some(std::mem::replace(&mut items[index], value))
                } else {
                    items.push(value);
                    None
                }
            }
            _ => None,
        },
        [head, rest @ ..] => {
            let next = match target {
                Value::Object(map) => map
                    .entry(head.to_string())
                    .or_insert_with(|| Value::Object(Map::new())),
                Value::Array(items) => items.get_mut(head.parse::<usize>().ok()?)?,
                _ => return None,
            };
            write_path(next, rest, value)
        }
    }
}
