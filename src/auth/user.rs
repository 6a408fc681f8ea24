//! Hub user model.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A user record as returned by the Hub for a valid session cookie.
///
/// Only `name` is interpreted; every other field the Hub sends (`admin`,
/// `groups`, `server`, ...) is kept in `extra` and serialized back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubUser {
    /// Unique user name
    pub name: String,
    /// Remaining fields of the Hub's user model
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HubUser {
    /// Creates a record with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extra: Map::new(),
        }
    }

    /// Returns an extra field by key.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Whether the Hub flags this user as an admin.
    pub fn is_admin(&self) -> bool {
        self.field("admin").and_then(Value::as_bool).unwrap_or(false)
    }
}
