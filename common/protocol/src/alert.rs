//! Streaming alert types.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// Alert severity, totally ordered by [`AlertSeverity::rank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Info,
    Warning,
    Error,
}

impl AlertSeverity {
    pub fn rank(&self) -> u8 {
        match self {
            Self::Info => 0,
            Self::Warning => 1,
            Self::Error => 2,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "info" => Some(Self::Info),
            "warning" => Some(Self::Warning),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

/// One alert candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Category the event filter matches against (e.g. `console_error`).
    pub category: String,
    pub severity: AlertSeverity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
    /// Explicit dedup key; defaults to `category:message`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

impl Alert {
    pub fn new(category: &str, severity: AlertSeverity, message: impl Into<String>) -> Self {
        Self {
            category: category.to_string(),
            severity,
            message: message.into(),
            detail: None,
            fingerprint: None,
        }
    }

    /// The key used for the dedup window.
    pub fn effective_fingerprint(&self) -> String {
        self.fingerprint
            .clone()
            .unwrap_or_else(|| format!("{}:{}", self.category, self.message))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::Alert;
    use super::AlertSeverity;

    #[test]
    fn severity_rank_is_total() {
        assert!(AlertSeverity::Info.rank() < AlertSeverity::Warning.rank());
        assert!(AlertSeverity::Warning.rank() < AlertSeverity::Error.rank());
    }

    #[test]
    fn fingerprint_defaults_to_category_and_message() {
        let alert = Alert::new("console_error", AlertSeverity::Error, "boom");
        assert_eq!(alert.effective_fingerprint(), "console_error:boom");

        let mut tagged = alert;
        tagged.fingerprint = Some("custom".to_string());
        assert_eq!(tagged.effective_fingerprint(), "custom");
    }

    #[test]
    fn parse_rejects_unknown() {
        assert_eq!(AlertSeverity::parse("warning"), Some(AlertSeverity::Warning));
        assert_eq!(AlertSeverity::parse("critical"), None);
    }
}
