//! Fast-completion diagnostics.
//!
//! A command that "completes" in a few milliseconds while the browser shows
//! no recent signs of life usually means the extension acknowledged without
//! actually doing the work. The post-processor attaches a warning so the
//! caller does not trust a phantom success.

use std::time::Duration;

use gasoline_protocol::CommandStatus;

/// Completions faster than this are suspicious.
pub const FAST_COMPLETION_MS: u64 = 10;

/// Readiness signals older than this count as stale.
pub const READINESS_STALE: Duration = Duration::from_secs(5);

/// Inputs to the heuristic, gathered by the caller.
#[derive(Debug, Clone, Default)]
pub struct FastCompletionCheck {
    pub elapsed_ms: u64,
    pub status: Option<CommandStatus>,
    pub selector: Option<String>,
    /// Age of the last extension long-poll, if any.
    pub last_poll_age: Option<Duration>,
    /// Age of the last draw-mode start, if any.
    pub last_draw_age: Option<Duration>,
    /// Last terminal status recorded for the same selector.
    pub prior_selector_failure: Option<CommandStatus>,
}

/// Returns the `diagnostic_warning` text when the completion looks
/// untrustworthy, `None` otherwise.
pub fn diagnostic_warning(check: &FastCompletionCheck) -> Option<String> {
    if check.status != Some(CommandStatus::Complete) {
        return None;
    }
    if check.elapsed_ms >= FAST_COMPLETION_MS {
        return None;
    }

    let freshest_signal = match (check.last_poll_age, check.last_draw_age) {
        (Some(poll), Some(draw)) => Some(poll.min(draw)),
        (Some(poll), None) => Some(poll),
        (None, Some(draw)) => Some(draw),
        (None, None) => None,
    };
    let readiness_stale = freshest_signal.is_none_or(|age| age > READINESS_STALE);

    let prior_hard_failure = check
        .prior_selector_failure
        .is_some_and(|status| status.is_hard_failure());

    if !readiness_stale && !prior_hard_failure {
        return None;
    }

    let elapsed = check.elapsed_ms;
    let mut warning =
        format!("command reported complete unusually fast ({elapsed}ms)");
    if readiness_stale {
        warning.push_str("; the browser readiness signal is stale");
    }
    if prior_hard_failure {
        if let Some(selector) = &check.selector {
            warning.push_str(&format!(
                "; the previous command for `{selector}` ended in timeout/expired"
            ));
        }
    }
    warning.push_str("; the page may not have applied the action");
    Some(warning)
}

#[cfg(test)]
#[path = "diagnostics.test.rs"]
mod tests;
