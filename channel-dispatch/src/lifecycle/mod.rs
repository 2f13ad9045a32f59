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

//! Start/stop lifecycle of the transport connection.
//!
//! [`ChannelDispatcher`](dispatcher::ChannelDispatcher) is the caller-facing
//! controller. Each successful `start` creates one
//! [`ConnectionHandle`](connection::ConnectionHandle), which owns the
//! background runtime, the transport client and the subscriptions for the
//! lifetime of that connection.

pub(crate) mod connection;
pub(crate) mod dispatcher;
pub(crate) mod listener;
pub(crate) mod state;
