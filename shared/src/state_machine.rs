//! Connectivity State Machine
//!
//! ```text
//! Down -> NetConnecting -> NetUp -> BrokerConnecting -> BrokerUp
//! ```
//!
//! A network failure returns to `Down`, a broker failure to `NetUp`.

/// Connectivity lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectivityState {
    #[default]
    Down,
    NetConnecting,
    NetUp,
    BrokerConnecting,
    BrokerUp,
}

impl ConnectivityState {
    /// Whether the network is associated in this state
    pub fn is_net_up(self) -> bool {
        matches!(
            self,
            Self::NetUp | Self::BrokerConnecting | Self::BrokerUp
        )
    }
}

/// Events that drive connectivity transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    /// Association with the network started
    NetConnectStarted,
    /// Network association succeeded (or was already up)
    NetConnected,
    /// Network association failed
    NetFailed,
    /// Broker connect attempt started
    BrokerConnectStarted,
    /// Broker accepted the connection
    BrokerConnected,
    /// Broker connect attempt failed
    BrokerFailed,
    /// Servicing the broker connection failed
    BrokerLost,
    /// Everything was torn down
    TornDown,
}

/// Result of a transition attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionResult {
    /// Transition was valid; carries the new state
    Success(ConnectivityState),
    /// Transition was invalid from the current state, which is unchanged
    Invalid {
        from: ConnectivityState,
        event: ConnectivityEvent,
    },
}

/// Tracks the connectivity lifecycle
#[derive(Debug, Default)]
pub struct ConnectivityStateMachine {
    current_state: ConnectivityState,
}

impl ConnectivityStateMachine {
    /// Create a new state machine in `Down`
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current state
    pub fn state(&self) -> ConnectivityState {
        self.current_state
    }

    /// Process an event and return the transition result
    pub fn process_event(&mut self, event: ConnectivityEvent) -> TransitionResult {
        match self.next_state(event) {
            Some(state) => {
                self.current_state = state;
                TransitionResult::Success(state)
            }
            None => TransitionResult::Invalid {
                from: self.current_state,
                event,
            },
        }
    }

    fn next_state(&self, event: ConnectivityEvent) -> Option<ConnectivityState> {
        use ConnectivityEvent::*;
        use ConnectivityState::*;

        match (self.current_state, event) {
            // Teardown and network loss are valid from anywhere
            (_, TornDown) | (_, NetFailed) => Some(Down),

            (Down, NetConnectStarted) => Some(NetConnecting),
            (Down | NetConnecting, NetConnected) => Some(NetUp),

            // Already associated: connecting the network is a no-op
            (state @ (NetUp | BrokerConnecting | BrokerUp), NetConnected) => Some(state),

            (NetUp | BrokerUp, BrokerConnectStarted) => Some(BrokerConnecting),
            (BrokerConnecting, BrokerConnected) => Some(BrokerUp),
            (BrokerConnecting, BrokerFailed) => Some(NetUp),

            (BrokerUp | NetUp | BrokerConnecting, BrokerLost) => Some(NetUp),

            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConnectivityEvent::*;

    #[test]
    fn test_initial_state() {
        let fsm = ConnectivityStateMachine::new();
        assert_eq!(fsm.state(), ConnectivityState::Down);
        assert!(!fsm.state().is_net_up());
    }

    #[test]
    fn test_full_connect_flow() {
        let mut fsm = ConnectivityStateMachine::new();

        let steps = [
            (NetConnectStarted, ConnectivityState::NetConnecting),
            (NetConnected, ConnectivityState::NetUp),
            (BrokerConnectStarted, ConnectivityState::BrokerConnecting),
            (BrokerConnected, ConnectivityState::BrokerUp),
        ];
        for (event, expected) in steps {
            assert_eq!(fsm.process_event(event), TransitionResult::Success(expected));
        }
        assert!(fsm.state().is_net_up());
    }

    #[test]
    fn test_failures_fall_back() {
        let mut fsm = ConnectivityStateMachine::new();
        fsm.process_event(NetConnectStarted);
        assert_eq!(
            fsm.process_event(NetFailed),
            TransitionResult::Success(ConnectivityState::Down)
        );

        fsm.process_event(NetConnected);
        fsm.process_event(BrokerConnectStarted);
        assert_eq!(
            fsm.process_event(BrokerFailed),
            TransitionResult::Success(ConnectivityState::NetUp)
        );
    }

    #[test]
    fn test_broker_lost_keeps_network() {
        let mut fsm = ConnectivityStateMachine::new();
        fsm.process_event(NetConnected);
        fsm.process_event(BrokerConnectStarted);
        fsm.process_event(BrokerConnected);

        // Reconnecting the network while up is a no-op
        assert_eq!(
            fsm.process_event(NetConnected),
            TransitionResult::Success(ConnectivityState::BrokerUp)
        );
        assert_eq!(
            fsm.process_event(BrokerLost),
            TransitionResult::Success(ConnectivityState::NetUp)
        );
        assert_eq!(
            fsm.process_event(TornDown),
            TransitionResult::Success(ConnectivityState::Down)
        );
    }

    #[test]
    fn test_invalid_transition() {
        let mut fsm = ConnectivityStateMachine::new();

        // Can't reach the broker before the network
        let result = fsm.process_event(BrokerConnectStarted);
        assert!(matches!(result, TransitionResult::Invalid { .. }));
        assert_eq!(fsm.state(), ConnectivityState::Down);
    }
}
