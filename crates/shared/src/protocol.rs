use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};

use crate::domain::{UpdateOrigin, WidgetInstanceId};

/// Arguments pushed by the host on every render of the embedding page.
///
/// Every field is optional and tolerant: a field of the wrong JSON type is
/// treated as absent instead of failing the whole message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostRenderArgs {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(
        default,
        alias = "description",
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub caption: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub storage_key: Option<String>,
}

impl HostRenderArgs {
    /// The storage key override, if it is a non-blank string after trimming.
    pub fn storage_key_override(&self) -> Option<&str> {
        self.storage_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueChanged {
    pub primary_count: u64,
    pub counts: Vec<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<UpdateOrigin>,
}

impl ValueChanged {
    pub fn total(&self) -> u64 {
        self.counts
            .iter()
            .fold(0u64, |acc, count| acc.saturating_add(*count))
    }
}

/// Frames sent from the widget to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum HostMessage {
    Ready { instance_id: WidgetInstanceId },
    ValueChanged(ValueChanged),
    Resize { height_px: u32 },
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
