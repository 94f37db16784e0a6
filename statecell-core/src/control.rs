//! Private control action types
//!
//! The store dispatches `INIT` on construction and `REPLACE` after a reducer
//! swap; the reducer combinator probes slice reducers with a one-off unknown
//! type. All three are namespaced and salted with a random suffix so no
//! application action type can collide with them. Application reducers must
//! never match on these values.

use std::sync::OnceLock;

use rand::Rng;
use serde_json::{json, Value};

const NAMESPACE: &str = "@@statecell";
const SUFFIX_LEN: usize = 6;
const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// The control action types one store (and its combined reducers) agree on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlActions {
    init: String,
    replace: String,
}

impl ControlActions {
    /// Generate a fresh set of salted control types.
    pub fn generate() -> Self {
        Self {
            init: format!("{NAMESPACE}/INIT{}", random_suffix()),
            replace: format!("{NAMESPACE}/REPLACE{}", random_suffix()),
        }
    }

    /// The process-wide set, generated once on first use.
    pub fn global() -> &'static ControlActions {
        static GLOBAL: OnceLock<ControlActions> = OnceLock::new();
        GLOBAL.get_or_init(Self::generate)
    }

    /// Type of the action dispatched when a store is created
    pub fn init(&self) -> &str {
        &self.init
    }

    /// Type of the action dispatched after `replace_reducer`
    pub fn replace(&self) -> &str {
        &self.replace
    }

    /// A brand new type no reducer can know about.
    pub fn probe_unknown_action(&self) -> String {
        format!("{NAMESPACE}/PROBE_UNKNOWN_ACTION{}", random_suffix())
    }

    /// `{"type": INIT}`
    pub fn init_action(&self) -> Value {
        json!({ "type": self.init })
    }

    /// `{"type": REPLACE}`
    pub fn replace_action(&self) -> Value {
        json!({ "type": self.replace })
    }

    /// Whether `action` is an INIT from any control set.
    ///
    /// Matching is by namespace so a combined reducer recognizes the store's
    /// control actions even when the two were configured separately.
    pub fn is_init(action: &Value) -> bool {
        has_control_type(action, "INIT")
    }

    /// Whether `action` is a REPLACE from any control set
    pub fn is_replace(action: &Value) -> bool {
        has_control_type(action, "REPLACE")
    }
}

fn has_control_type(action: &Value, kind: &str) -> bool {
    action
        .get("type")
        .and_then(Value::as_str)
        .and_then(|ty| ty.strip_prefix(NAMESPACE))
        .and_then(|rest| rest.strip_prefix('/'))
        .and_then(|rest| rest.strip_prefix(kind))
        .is_some_and(|suffix| suffix.starts_with('.'))
}

impl Default for ControlActions {
    fn default() -> Self {
        Self::global().clone()
    }
}

// Base-36 characters joined with dots, e.g. ".k.3.z.0.q.b"
fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..SUFFIX_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..ALPHABET.len());
            format!(".{}", ALPHABET[idx] as char)
        })
        .collect()
}
