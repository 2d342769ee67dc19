use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use ch_core::error::ChError;

/// Timestamp layout of `BroadcastRecord::datetime`. The client poller strips
/// the fractional part for display and uses the full string as the "seen" id.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Who a broadcast is shown to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    #[default]
    Staff,
    All,
}

impl Audience {
    pub fn as_str(&self) -> &'static str {
        match self {
            Audience::Staff => "staff",
            Audience::All => "all",
        }
    }

    /// Audience selected by the `everyone` checkbox.
    pub fn from_everyone(everyone: Option<&str>) -> Self {
        match everyone {
            Some(v) if ch_core::constants::is_checked(v) => Audience::All,
            _ => Audience::Staff,
        }
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Audience {
    type Err = ChError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "staff" => Ok(Audience::Staff),
            "all" | "everyone" => Ok(Audience::All),
            other => Err(ChError::Validation(format!("unknown audience: {other}"))),
        }
    }
}

/// One broadcast message. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastRecord {
    pub msg: String,
    pub creator: String,
    #[serde(default)]
    pub audience: Audience,
    pub datetime: String,
}

impl BroadcastRecord {
    /// Build a record stamped with the current local time.
    pub fn new_now(msg: impl Into<String>, creator: impl Into<String>, audience: Audience) -> Self {
        Self {
            msg: msg.into(),
            creator: creator.into(),
            audience,
            datetime: chrono::Local::now().format(DATETIME_FORMAT).to_string(),
        }
    }

    pub fn is_staff_only(&self) -> bool {
        self.audience == Audience::Staff
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audience_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Audience::All).unwrap(), "\"all\"");
        let a: Audience = serde_json::from_str("\"staff\"").unwrap();
        assert_eq!(a, Audience::Staff);
    }

    #[test]
    fn test_audience_from_everyone() {
        assert_eq!(Audience::from_everyone(Some("on")), Audience::All);
        assert_eq!(Audience::from_everyone(Some("")), Audience::Staff);
        assert_eq!(Audience::from_everyone(None), Audience::Staff);
    }

    #[test]
    fn test_audience_from_str() {
        assert_eq!("ALL".parse::<Audience>().unwrap(), Audience::All);
        assert!("nobody".parse::<Audience>().is_err());
    }

    #[test]
    fn test_new_now_datetime_shape() {
        let record = BroadcastRecord::new_now("hi", "alice", Audience::All);
        // 2024-01-01 12:00:00.000000
        assert_eq!(record.datetime.len(), 26);
        assert_eq!(&record.datetime[19..20], ".");
        assert!(!record.is_staff_only());
    }

    #[test]
    fn test_record_json_field_names() {
        let record = BroadcastRecord {
            msg: "m".into(),
            creator: "c".into(),
            audience: Audience::Staff,
            datetime: "2024-01-01 00:00:00.000000".into(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["msg"], "m");
        assert_eq!(value["creator"], "c");
        assert_eq!(value["audience"], "staff");
        assert_eq!(value["datetime"], "2024-01-01 00:00:00.000000");
    }
}
