use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::errors::ModelError;

/// Authenticated user as returned by `/auth/login` and `/auth/signup`.
///
/// Only `id` is required to be meaningful; any additional fields the
/// server sends are kept in `extra` so the persisted record round-trips
/// without loss.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct User {
    #[serde(default, deserialize_with = "id_from_value")]
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    pub fn new(id: impl Into<String>, username: impl Into<String>, email: impl Into<String>) -> Self {
        Self { id: id.into(), username: username.into(), email: email.into(), extra: Map::new() }
    }

    /// A user record is usable for a session only with a non-empty identifier.
    pub fn has_identity(&self) -> bool {
        !self.id.trim().is_empty()
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.has_identity() {
            Ok(())
        } else {
            Err(ModelError::Validation("user id required".into()))
        }
    }

    /// Parse a persisted user record and check it carries an identifier.
    pub fn parse_record(raw: &str) -> Result<Self, ModelError> {
        let user: User = serde_json::from_str(raw).map_err(|e| ModelError::Parse(e.to_string()))?;
        user.validate()?;
        Ok(user)
    }

    pub fn to_record(&self) -> Result<String, ModelError> {
        serde_json::to_string(self).map_err(|e| ModelError::Parse(e.to_string()))
    }
}

// Server ids are UUID strings, but numeric ids are accepted too.
fn id_from_value<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!("unsupported id type: {other}"))),
    }
}
