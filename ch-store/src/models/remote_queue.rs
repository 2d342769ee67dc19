use serde::{Deserialize, Deserializer, Serialize};

/// A staff member's published remote-queue link.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RemoteQueueRecord {
    #[serde(default)]
    pub url: String,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub active: bool,
}

impl RemoteQueueRecord {
    pub fn new(url: impl Into<String>, active: bool) -> Self {
        Self {
            url: url.into(),
            active,
        }
    }

    /// The URL to surface, only when the owner is active and a URL is set.
    pub fn active_url(&self) -> Option<&str> {
        (self.active && !self.url.trim().is_empty()).then_some(self.url.as_str())
    }
}

/// Older logs stored the raw checkbox value (`"on"`) instead of a bool.
fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
        Null(()),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Text(s) => ch_core::constants::is_checked(&s),
        Flag::Null(()) => false,
    })
}
