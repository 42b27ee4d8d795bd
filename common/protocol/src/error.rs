//! Structured tool-level errors.
//!
//! Tool failures are values, not JSON-RPC errors: the dispatcher renders a
//! [`ToolError`] into an `isError: true` tool result whose text block is the
//! structured JSON body. JSON-RPC error objects stay reserved for framing
//! failures.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use strum::AsRefStr;

use crate::envelope::ToolResult;

/// Canonical tool error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ToolErrorCode {
    MissingParam,
    InvalidParam,
    InvalidJson,
    NotInitialized,
    NoErrorContext,
    NoActionsCaptured,
    NoBaseline,
    TestFileNotFound,
    SelectorInjectionDetected,
    PathNotAllowed,
    BatchTooLarge,
    ClassificationUncertain,
    ElementNotFound,
    AmbiguousTarget,
    StaleElementId,
    ScopeNotFound,
    Timeout,
    Expired,
}

/// An ordered recovery plan attached to interact failures with known
/// playbooks, so the caller can self-recover without guessing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryPlan {
    pub detection_signal: String,
    pub ordered_recovery_steps: Vec<String>,
    pub stop_and_report_condition: String,
    pub retry_guidance: String,
}

/// A structured tool error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolError {
    pub error_code: ToolErrorCode,
    pub message: String,
    pub retry_guidance: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
}

impl ToolError {
    pub fn new(
        error_code: ToolErrorCode,
        message: impl Into<String>,
        retry_guidance: impl Into<String>,
    ) -> Self {
        Self {
            error_code,
            message: message.into(),
            retry_guidance: retry_guidance.into(),
            hint: None,
            param: None,
        }
    }

    /// Missing required parameter `param`.
    pub fn missing_param(param: &str) -> Self {
        Self::new(
            ToolErrorCode::MissingParam,
            format!("missing required parameter `{param}`"),
            format!("retry with `{param}` set"),
        )
        .with_param(param)
    }

    /// Invalid value for `param`; `valid` names the accepted values.
    pub fn invalid_param(param: &str, valid: &[&str]) -> Self {
        Self::new(
            ToolErrorCode::InvalidParam,
            format!("invalid value for `{param}`; valid values: {}", valid.join(", ")),
            "retry with one of the listed values",
        )
        .with_param(param)
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.param = Some(param.into());
        self
    }

    /// Render into the `isError: true` envelope, attaching the recovery
    /// plan when this code has a known playbook.
    pub fn into_result(self) -> ToolResult {
        let mut body = match serde_json::to_value(&self) {
            Ok(Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };
        if let Some(plan) = recovery_plan(self.error_code) {
            if let Ok(plan) = serde_json::to_value(&plan) {
                body.insert("recovery_plan".to_string(), plan);
            }
        }
        let mut result = ToolResult::json(&Value::Object(body));
        result.is_error = Some(true);
        result.set_meta("error_code", Value::String(self.error_code.as_ref().to_string()));
        result
    }
}

impl From<ToolError> for ToolResult {
    fn from(err: ToolError) -> Self {
        err.into_result()
    }
}

/// Known recovery playbooks for interact failure codes.
pub fn recovery_plan(code: ToolErrorCode) -> Option<RecoveryPlan> {
    match code {
        ToolErrorCode::Timeout | ToolErrorCode::Expired => Some(RecoveryPlan {
            detection_signal: "command did not complete before its deadline".to_string(),
            ordered_recovery_steps: vec![
                "confirm the extension is connected (configure what=health)".to_string(),
                "observe errors for page-level failures".to_string(),
                "retry the command once with a longer timeout_ms".to_string(),
            ],
            stop_and_report_condition: "two consecutive timeouts for the same selector"
                .to_string(),
            retry_guidance: "retry once with timeout_ms doubled".to_string(),
        }),
        ToolErrorCode::ElementNotFound => Some(RecoveryPlan {
            detection_signal: "selector matched zero elements".to_string(),
            ordered_recovery_steps: vec![
                "analyze dom with a broader selector to inspect the page".to_string(),
                "wait for navigation or rendering to settle, then retry".to_string(),
            ],
            stop_and_report_condition: "selector still matches nothing after a broadened query"
                .to_string(),
            retry_guidance: "verify the selector against the live DOM before retrying"
                .to_string(),
        }),
        ToolErrorCode::AmbiguousTarget => Some(RecoveryPlan {
            detection_signal: "selector matched more than one element".to_string(),
            ordered_recovery_steps: vec![
                "narrow the selector with an id, test-id, or :nth-of-type".to_string(),
                "re-run analyze dom to list the matches".to_string(),
            ],
            stop_and_report_condition: "no distinguishing attribute exists".to_string(),
            retry_guidance: "retry with a selector that matches exactly one element".to_string(),
        }),
        ToolErrorCode::StaleElementId => Some(RecoveryPlan {
            detection_signal: "element id refers to a detached DOM node".to_string(),
            ordered_recovery_steps: vec![
                "re-query the element with analyze dom".to_string(),
                "retry the interaction with the fresh element".to_string(),
            ],
            stop_and_report_condition: "element keeps detaching across retries".to_string(),
            retry_guidance: "always re-query after navigation or re-render".to_string(),
        }),
        _ => None,
    }
}

#[cfg(test)]
#[path = "error.test.rs"]
mod tests;
