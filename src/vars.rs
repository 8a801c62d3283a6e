// SPDX: CC0-1.0

//! Slider parameters and the host notification contract.

use crate::{shell::most_similar, Number, Params};
use core::fmt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VariableConfig {
    pub min: Number,
    pub max: Number,
    pub step: Number,
    pub value: Number,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl VariableConfig {
    pub fn clamp(&self, value: Number) -> Number {
        // NaN would poison every curve
        if value.is_nan() {
            self.value
        } else {
            value.clamp(self.min, self.max)
        }
    }

    pub fn label<'a>(&'a self, key: &'a str) -> &'a str {
        self.label.as_deref().unwrap_or(key)
    }
}

/// Parameter values as persisted by the host.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedState {
    #[serde(default)]
    pub variables: Params,
}

/// Message sent to the host on every parameter change.
///
/// Serializes as `{"action":"update_state","payload":{"state":{...}}}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload", rename_all = "snake_case")]
pub enum HostMessage {
    UpdateState { state: SavedState },
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum VarError {
    #[error("unknown variable '{key}'")]
    Unknown { key: String, suggestion: Option<String> },
}

pub type Notifier = Box<dyn FnMut(&HostMessage)>;

/// Current parameter values of one plot.
pub struct Variables {
    entries: BTreeMap<String, VariableConfig>,
    notify: Option<Notifier>,
}

impl fmt::Debug for Variables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variables")
            .field("entries", &self.entries)
            .field("notify", &self.notify.is_some())
            .finish()
    }
}

impl Variables {
    /// Seeds from configuration. Out of range seed values are clamped.
    pub fn new(entries: BTreeMap<String, VariableConfig>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(key, mut config)| {
                let clamped = config.clamp(config.value);
                if clamped != config.value {
                    log::warn!(
                        "variable '{key}' starts at {} outside [{}, {}], using {clamped}",
                        config.value,
                        config.min,
                        config.max
                    );
                    config.value = clamped;
                }
                (key, config)
            })
            .collect();
        Self {
            entries,
            notify: None,
        }
    }

    pub fn set_notifier(&mut self, notify: Option<Notifier>) {
        self.notify = notify;
    }

    /// Replays a saved state. Unknown keys are ignored and nothing is
    /// reported to the host.
    pub fn restore(&mut self, saved: &SavedState) {
        for (key, &value) in &saved.variables {
            match self.entries.get_mut(key) {
                Some(config) => config.value = config.clamp(value),
                None => log::warn!("saved state names unknown variable '{key}'"),
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&VariableConfig> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &VariableConfig)> {
        self.entries.iter().map(|(key, config)| (key.as_str(), config))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn values(&self) -> Params {
        self.entries
            .iter()
            .map(|(key, config)| (key.clone(), config.value))
            .collect()
    }

    pub fn state(&self) -> SavedState {
        SavedState {
            variables: self.values(),
        }
    }

    /// Stores `value` clamped to the variable's range.
    ///
    /// Returns whether the stored value changed. The host is notified only
    /// on change, so repeating a write is a no-op.
    pub fn set_value(&mut self, key: &str, value: Number) -> Result<bool, VarError> {
        let config = match self.entries.get_mut(key) {
            Some(config) => config,
            None => return Err(self.unknown(key)),
        };
        let clamped = config.clamp(value);
        if clamped == config.value {
            return Ok(false);
        }
        config.value = clamped;
        log::debug!("variable '{key}' = {clamped}");

        let message = HostMessage::UpdateState { state: self.state() };
        if let Some(ref mut notify) = self.notify {
            notify(&message);
        }
        Ok(true)
    }

    fn unknown(&self, key: &str) -> VarError {
        log::warn!("write to unknown variable '{key}'");
        VarError::Unknown {
            key: key.to_string(),
            suggestion: most_similar(key, self.entries.keys().map(String::as_str))
                .map(str::to_string),
        }
    }

    pub fn increment(&mut self, key: &str) -> Result<bool, VarError> {
        self.nudge(key, 1.0)
    }

    pub fn decrement(&mut self, key: &str) -> Result<bool, VarError> {
        self.nudge(key, -1.0)
    }

    fn nudge(&mut self, key: &str, dir: Number) -> Result<bool, VarError> {
        let target = match self.entries.get(key) {
            Some(config) => config.value + dir * config.step,
            None => Number::NAN,
        };
        self.set_value(key, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::RefCell, rc::Rc};

    fn config(min: Number, max: Number, step: Number, value: Number) -> VariableConfig {
        VariableConfig {
            min,
            max,
            step,
            value,
            label: None,
        }
    }

    fn vars() -> Variables {
        let mut entries = BTreeMap::new();
        entries.insert("a".to_string(), config(-2.0, 2.0, 0.5, 1.0));
        entries.insert("b".to_string(), config(0.0, 10.0, 1.0, 3.0));
        Variables::new(entries)
    }

    #[test]
    fn writes_are_clamped_and_idempotent() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut v = vars();
        let sink = Rc::clone(&log);
        v.set_notifier(Some(Box::new(move |msg: &HostMessage| {
            sink.borrow_mut().push(msg.clone())
        })));

        assert_eq!(v.set_value("a", 102.0), Ok(true));
        assert_eq!(v.get("a").map(|c| c.value), Some(2.0));
        assert_eq!(v.set_value("a", 102.0), Ok(false));
        assert_eq!(v.get("a").map(|c| c.value), Some(2.0));
        assert_eq!(log.borrow().len(), 1);

        let messages = log.borrow();
        let HostMessage::UpdateState { state } = &messages[0];
        assert_eq!(state.variables.get("a"), Some(&2.0));
        assert_eq!(state.variables.get("b"), Some(&3.0));
    }

    #[test]
    fn steps_respect_bounds() {
        let mut v = vars();
        assert_eq!(v.increment("a"), Ok(true));
        assert_eq!(v.get("a").map(|c| c.value), Some(1.5));
        v.increment("a").unwrap();
        assert_eq!(v.increment("a"), Ok(false));
        assert_eq!(v.get("a").map(|c| c.value), Some(2.0));
        for _ in 0..20 {
            v.decrement("b").unwrap();
        }
        assert_eq!(v.get("b").map(|c| c.value), Some(0.0));
    }

    #[test]
    fn unknown_key_is_an_error() {
        let mut v = vars();
        match v.set_value("bb", 1.0) {
            Err(VarError::Unknown { key, suggestion }) => {
                assert_eq!(key, "bb");
                assert_eq!(suggestion.as_deref(), Some("b"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(v.increment("zzz").is_err());
    }

    #[test]
    fn seed_and_restore_clamp() {
        let mut entries = BTreeMap::new();
        entries.insert("k".to_string(), config(0.0, 1.0, 0.1, 5.0));
        let mut v = Variables::new(entries);
        assert_eq!(v.get("k").map(|c| c.value), Some(1.0));

        let mut saved = SavedState::default();
        saved.variables.insert("k".to_string(), -3.0);
        saved.variables.insert("other".to_string(), 4.0);
        v.restore(&saved);
        assert_eq!(v.values().get("k"), Some(&0.0));
        assert!(v.get("other").is_none());
    }

    #[test]
    fn host_message_shape() {
        let mut state = SavedState::default();
        state.variables.insert("a".to_string(), 1.5);
        let json = serde_json::to_value(HostMessage::UpdateState { state }).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "action": "update_state",
                "payload": { "state": { "variables": { "a": 1.5 } } }
            })
        );
    }
}
