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

//! Runtime boundaries.
//!
//! Every connection gets its own OS thread hosting a current-thread tokio
//! runtime. The transport client, its subscriptions and all handler
//! invocations live on that reactor; callers only hand work over to it.

pub(crate) mod connection_runtime;
