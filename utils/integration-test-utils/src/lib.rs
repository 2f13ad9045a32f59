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

//! Shared fixtures for the `channel-dispatch` integration tests and the
//! `configurable-dispatcher` binary.

mod logging;
pub use logging::init_logging;

mod loopback;
pub use loopback::{LoopbackBus, LoopbackClient, LoopbackConnector};

mod recording_target;
pub use recording_target::{RecordedCall, RecordingTarget};
