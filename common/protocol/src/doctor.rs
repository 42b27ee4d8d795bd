//! Doctor readiness types and the aggregate verdict.

use serde::Deserialize;
use serde::Serialize;

/// Tri-state outcome of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// One entry in the doctor battery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorCheck {
    pub name: String,
    pub status: CheckStatus,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix: Option<String>,
}

impl DoctorCheck {
    pub fn pass(name: &str, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Pass,
            detail: detail.into(),
            fix: None,
        }
    }

    pub fn warn(name: &str, detail: impl Into<String>, fix: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warn,
            detail: detail.into(),
            fix: Some(fix.into()),
        }
    }

    pub fn fail(name: &str, detail: impl Into<String>, fix: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Fail,
            detail: detail.into(),
            fix: Some(fix.into()),
        }
    }
}

/// Aggregate health verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// The full doctor report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorReport {
    pub status: HealthStatus,
    pub ready_for_interaction: bool,
    pub checks: Vec<DoctorCheck>,
}

impl DoctorReport {
    /// `unhealthy` iff any fail; `degraded` iff any warn but no fail;
    /// `healthy` otherwise. Ready for interaction iff healthy.
    pub fn aggregate(checks: Vec<DoctorCheck>) -> Self {
        let any_fail = checks.iter().any(|c| c.status == CheckStatus::Fail);
        let any_warn = checks.iter().any(|c| c.status == CheckStatus::Warn);
        let status = if any_fail {
            HealthStatus::Unhealthy
        } else if any_warn {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };
        Self {
            status,
            ready_for_interaction: status == HealthStatus::Healthy,
            checks,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::DoctorCheck;
    use super::DoctorReport;
    use super::HealthStatus;

    #[test]
    fn all_pass_is_healthy_and_ready() {
        let report = DoctorReport::aggregate(vec![
            DoctorCheck::pass("extension_connected", "polled 1s ago"),
            DoctorCheck::pass("circuit_breaker", "closed"),
        ]);
        assert_eq!(report.status, HealthStatus::Healthy);
        assert!(report.ready_for_interaction);
    }

    #[test]
    fn warn_without_fail_is_degraded() {
        let report = DoctorReport::aggregate(vec![
            DoctorCheck::pass("extension_connected", "ok"),
            DoctorCheck::warn("tracked_tab", "no tab tracked", "open a tab"),
        ]);
        assert_eq!(report.status, HealthStatus::Degraded);
        assert!(!report.ready_for_interaction);
    }

    #[test]
    fn fail_dominates_warn() {
        let report = DoctorReport::aggregate(vec![
            DoctorCheck::warn("pilot_enabled", "disabled", "enable it"),
            DoctorCheck::fail("circuit_breaker", "open: rate_exceeded", "clear the circuit"),
        ]);
        assert_eq!(report.status, HealthStatus::Unhealthy);
        assert!(!report.ready_for_interaction);
    }
}
