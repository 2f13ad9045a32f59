/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle of one managed connection.
///
/// `Stopped -> Starting -> Connected -> Stopping -> Stopped`. A failed connect
/// or subscription goes from `Starting` back to `Stopped`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum LifecycleState {
    Stopped,
    Starting,
    Connected,
    Stopping,
}

impl LifecycleState {
    fn as_u8(self) -> u8 {
        match self {
            LifecycleState::Stopped => 0,
            LifecycleState::Starting => 1,
            LifecycleState::Connected => 2,
            LifecycleState::Stopping => 3,
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => LifecycleState::Starting,
            2 => LifecycleState::Connected,
            3 => LifecycleState::Stopping,
            _ => LifecycleState::Stopped,
        }
    }

    /// States in which a connection task exists and `stop` is accepted.
    pub fn is_active(self) -> bool {
        matches!(self, LifecycleState::Starting | LifecycleState::Connected)
    }
}

impl Display for LifecycleState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleState::Stopped => write!(f, "stopped"),
            LifecycleState::Starting => write!(f, "starting"),
            LifecycleState::Connected => write!(f, "connected"),
            LifecycleState::Stopping => write!(f, "stopping"),
        }
    }
}

/// Lifecycle state shared between the caller and the connection thread.
#[derive(Debug)]
pub(crate) struct StateCell {
    state: AtomicU8,
}

impl StateCell {
    pub(crate) fn new(initial: LifecycleState) -> Self {
        Self {
            state: AtomicU8::new(initial.as_u8()),
        }
    }

    pub(crate) fn get(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn set(&self, state: LifecycleState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }

    /// Moves to `to` only from `from`. Returns `true` when the transition happened.
    pub(crate) fn transition(&self, from: LifecycleState, to: LifecycleState) -> bool {
        self.state
            .compare_exchange(from.as_u8(), to.as_u8(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::{LifecycleState, StateCell};

    #[test]
    fn transition_only_applies_from_expected_state() {
        let cell = StateCell::new(LifecycleState::Starting);

        assert!(!cell.transition(LifecycleState::Stopped, LifecycleState::Connected));
        assert_eq!(cell.get(), LifecycleState::Starting);

        assert!(cell.transition(LifecycleState::Starting, LifecycleState::Connected));
        assert_eq!(cell.get(), LifecycleState::Connected);
    }

    #[test]
    fn only_starting_and_connected_are_active() {
        assert!(LifecycleState::Starting.is_active());
        assert!(LifecycleState::Connected.is_active());
        assert!(!LifecycleState::Stopping.is_active());
        assert!(!LifecycleState::Stopped.is_active());
    }
}
