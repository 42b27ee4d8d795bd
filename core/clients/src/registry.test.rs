use pretty_assertions::assert_eq;

use gasoline_protocol::TelemetryCounts;

use super::ClientRegistry;

fn counts(logs: u64, actions: u64) -> TelemetryCounts {
    TelemetryCounts {
        logs,
        actions,
        ..TelemetryCounts::default()
    }
}

#[test]
fn first_call_reports_everything_as_new() {
    let registry = ClientRegistry::new();
    let delta = registry.delta_and_advance("cli-1", counts(5, 2), "observe");
    assert_eq!(delta.logs, 5);
    assert_eq!(delta.actions, 2);
}

#[test]
fn second_call_reports_only_the_gap() {
    let registry = ClientRegistry::new();
    registry.delta_and_advance("cli-1", counts(5, 2), "observe");

    let delta = registry.delta_and_advance("cli-1", counts(8, 2), "observe");
    assert_eq!(delta.logs, 3);
    assert_eq!(delta.actions, 0);
    assert!(!delta.is_zero());

    let delta = registry.delta_and_advance("cli-1", counts(8, 2), "observe");
    assert!(delta.is_zero());
}

#[test]
fn clients_are_isolated() {
    let registry = ClientRegistry::new();
    registry.delta_and_advance("cli-1", counts(5, 0), "observe");

    // A different client still sees all five entries as new.
    let delta = registry.delta_and_advance("ide-2", counts(5, 0), "observe");
    assert_eq!(delta.logs, 5);
}

#[test]
fn cursors_and_last_tool_are_recorded() {
    let registry = ClientRegistry::new();
    registry.delta_and_advance("cli-1", counts(4, 1), "interact");

    let record = registry.get("cli-1").expect("present");
    assert_eq!(record.cursors.logs, 4);
    assert_eq!(record.last_tool.as_deref(), Some("interact"));
}

#[test]
fn touch_registers_and_updates_cwd() {
    let registry = ClientRegistry::new();
    registry.touch("cli-1", None);
    assert!(registry.get("cli-1").expect("present").cwd.is_none());

    registry.touch("cli-1", Some("/work/app".to_string()));
    assert_eq!(
        registry.get("cli-1").expect("present").cwd.as_deref(),
        Some("/work/app")
    );
    assert_eq!(registry.count(), 1);
}

#[test]
fn list_and_remove() {
    let registry = ClientRegistry::new();
    registry.touch("a", None);
    registry.touch("b", None);
    assert_eq!(registry.list().len(), 2);

    assert!(registry.remove("a"));
    assert!(!registry.remove("a"));
    assert_eq!(registry.count(), 1);
}
