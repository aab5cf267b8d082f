//! Localised string lookup
//!
//! Translation tables live outside this crate. Anything that can answer a
//! lookup by key can be plugged in; missing keys fall back to English.

use std::collections::HashMap;

pub trait Messages {
    fn lookup(&self, key: &str) -> Option<String>;
}

/// Built-in English strings only.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMessages;

impl Messages for DefaultMessages {
    fn lookup(&self, _key: &str) -> Option<String> {
        None
    }
}

impl Messages for HashMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}
