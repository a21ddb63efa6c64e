//! Handler registration. Kept in its own test binary because the handler is
//! process-wide.

use logstat::{GateError, GateState, InterruptGate};

#[test]
fn second_install_is_rejected() {
    let first = InterruptGate::new().install().unwrap();
    assert_eq!(first.state(), GateState::Registered);

    let second = InterruptGate::new();
    assert_eq!(second.state(), GateState::Unregistered);
    assert!(matches!(
        second.install(),
        Err(GateError::AlreadyRegistered)
    ));
}
