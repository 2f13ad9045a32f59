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

use async_trait::async_trait;
use channel_dispatch::{HandlerTarget, Payload};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::debug;

const CALL_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// One `perform` invocation seen by a [`RecordingTarget`].
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedCall {
    pub action: String,
    pub topic: String,
    pub payload: Payload,
}

/// Handler target that keeps every invocation for later inspection.
#[derive(Clone, Default)]
pub struct RecordingTarget {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl RecordingTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("lock recorded calls").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("lock recorded calls").len()
    }

    /// Blocks the calling thread until at least `expected` calls were seen.
    pub fn wait_for_calls(&self, expected: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.call_count() < expected {
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(CALL_POLL_INTERVAL);
        }
        true
    }
}

#[async_trait]
impl HandlerTarget for RecordingTarget {
    async fn perform(&self, action: &str, topic: &str, payload: Payload) {
        debug!(action, topic, "recording handler call");
        self.calls
            .lock()
            .expect("lock recorded calls")
            .push(RecordedCall {
                action: action.to_string(),
                topic: topic.to_string(),
                payload,
            });
    }
}
