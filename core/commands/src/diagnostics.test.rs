use std::time::Duration;

use gasoline_protocol::CommandStatus;

use super::FastCompletionCheck;
use super::diagnostic_warning;

fn base_check() -> FastCompletionCheck {
    FastCompletionCheck {
        elapsed_ms: 3,
        status: Some(CommandStatus::Complete),
        selector: Some("#go".to_string()),
        last_poll_age: Some(Duration::from_millis(500)),
        last_draw_age: None,
        prior_selector_failure: None,
    }
}

#[test]
fn fresh_fast_completion_is_trusted() {
    assert!(diagnostic_warning(&base_check()).is_none());
}

#[test]
fn fast_completion_with_stale_readiness_warns() {
    let check = FastCompletionCheck {
        last_poll_age: Some(Duration::from_secs(30)),
        ..base_check()
    };
    let warning = diagnostic_warning(&check).expect("warning expected");
    assert!(warning.contains("unusually fast"));
    assert!(warning.contains("stale"));
}

#[test]
fn missing_readiness_signals_count_as_stale() {
    let check = FastCompletionCheck {
        last_poll_age: None,
        last_draw_age: None,
        ..base_check()
    };
    assert!(diagnostic_warning(&check).is_some());
}

#[test]
fn fresh_draw_signal_rescues_a_stale_poll() {
    let check = FastCompletionCheck {
        last_poll_age: Some(Duration::from_secs(60)),
        last_draw_age: Some(Duration::from_secs(1)),
        ..base_check()
    };
    assert!(diagnostic_warning(&check).is_none());
}

#[test]
fn prior_timeout_for_same_selector_warns_even_when_fresh() {
    let check = FastCompletionCheck {
        prior_selector_failure: Some(CommandStatus::Timeout),
        ..base_check()
    };
    let warning = diagnostic_warning(&check).expect("warning expected");
    assert!(warning.contains("#go"));
}

#[test]
fn slow_or_failed_completions_never_warn() {
    let slow = FastCompletionCheck {
        elapsed_ms: 250,
        last_poll_age: None,
        ..base_check()
    };
    assert!(diagnostic_warning(&slow).is_none());

    let failed = FastCompletionCheck {
        status: Some(CommandStatus::Timeout),
        last_poll_age: None,
        ..base_check()
    };
    assert!(diagnostic_warning(&failed).is_none());
}
