use std::sync::Arc;

use super::*;
use crate::ClusterTopology;
use crate::CountingService;
use crate::Error;
use crate::HarnessConfig;
use crate::MockClusterLauncher;
use crate::MockNodeRuntime;
use crate::NodeLifecycleManager;

#[test]
fn toggle_state_codes_should_round_trip() {
    for state in [
        ToggleState::Neutral,
        ToggleState::Snapshot,
        ToggleState::Shutdown,
        ToggleState::Abort,
    ] {
        assert_eq!(ToggleState::from_code(state.code()), Some(state));
    }

    assert_eq!(ToggleState::from_code(42), None);
}

#[test]
fn new_toggle_should_read_neutral() {
    let toggle = ControlToggle::new();

    assert_eq!(toggle.read(), ToggleState::Neutral);
}

#[test]
fn request_should_accept_only_from_neutral() {
    let toggle = ControlToggle::new();

    assert!(toggle.request(ToggleState::Snapshot));
    assert_eq!(toggle.read(), ToggleState::Snapshot);

    // a second request is rejected until the engine completes the first
    assert!(!toggle.request(ToggleState::Shutdown));
    assert_eq!(toggle.read(), ToggleState::Snapshot);
}

#[test]
fn request_for_neutral_should_be_rejected() {
    let toggle = ControlToggle::new();

    assert!(!toggle.request(ToggleState::Neutral));
    assert_eq!(toggle.read(), ToggleState::Neutral);
}

#[test]
fn complete_should_reset_to_neutral_and_reopen_requests() {
    let toggle = ControlToggle::new();

    assert!(toggle.request(ToggleState::Abort));
    toggle.complete();

    assert_eq!(toggle.read(), ToggleState::Neutral);
    assert!(toggle.request(ToggleState::Shutdown));
}

#[test]
fn request_toggle_should_fail_when_the_register_is_absent() {
    let mut runtime = MockNodeRuntime::new();
    runtime.expect_control_toggle().returning(|| None);
    runtime.expect_is_closed().return_const(true);

    let topology = ClusterTopology::new(1, 0, None).unwrap();
    let manager = NodeLifecycleManager::new(
        topology,
        HarnessConfig::default(),
        Arc::new(MockClusterLauncher::new()),
    );
    let config = manager.compose_static_config(0, true).unwrap();
    let node = NodeHandle::new(config, Box::new(runtime), Arc::new(CountingService::new(0)));

    let result = request_toggle(&node, ToggleState::Snapshot);

    assert!(matches!(
        result,
        Err(Error::Control(ControlError::ToggleMissing(0)))
    ));
}
