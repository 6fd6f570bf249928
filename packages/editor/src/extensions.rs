//! # Extensions
//!
//! Named capability extensions attached to a [`Document`](crate::Document)
//! when it is built. Plugins register a value under a name and look it up
//! again with its concrete type; core types are never patched.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

#[derive(Default)]
pub struct Extensions {
    entries: HashMap<String, Box<dyn Any>>,
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `value` under `name`, returning `false` if the name was taken
    pub fn register<T: Any>(&mut self, name: impl Into<String>, value: T) -> bool {
        let name = name.into();
        if self.entries.contains_key(&name) {
            tracing::warn!(extension = %name, "extension already registered");
            return false;
        }
        self.entries.insert(name, Box::new(value));
        true
    }

    /// `None` when missing or registered with a different type
    pub fn get<T: Any>(&self, name: &str) -> Option<&T> {
        self.entries.get(name)?.downcast_ref::<T>()
    }

    pub fn get_mut<T: Any>(&mut self, name: &str) -> Option<&mut T> {
        self.entries.get_mut(name)?.downcast_mut::<T>()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}
