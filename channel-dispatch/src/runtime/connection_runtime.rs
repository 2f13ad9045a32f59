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

//! Runtime helper for spawning the per-connection reactor thread.

use crate::observability::events;
use std::future::Future;
use std::io;
use std::thread;
use tokio::runtime::Builder;
use tracing::{debug, error, warn};

pub(crate) const DEFAULT_CONNECTION_RUNTIME_THREAD_NAME: &str = "dispatch-conn";
const CONNECTION_RUNTIME_THREAD_NAME_PREFIX: &str = "dispatch-";
const CONNECTION_RUNTIME_THREAD_NAME_MAX_LEN: usize = 15;
const COMPONENT: &str = "connection_runtime";

/// Builds a thread name that fits the platform limit from a connection id.
pub(crate) fn build_runtime_thread_name(connection_id: &str) -> String {
    let suffix_len =
        CONNECTION_RUNTIME_THREAD_NAME_MAX_LEN - CONNECTION_RUNTIME_THREAD_NAME_PREFIX.len();
    let suffix: String = connection_id
        .chars()
        .filter(|ch| ch.is_ascii_hexdigit())
        .take(suffix_len)
        .collect();

    if suffix.len() == suffix_len {
        format!("{CONNECTION_RUNTIME_THREAD_NAME_PREFIX}{suffix}")
    } else {
        warn!(
            event = events::RUNTIME_THREAD_NAME_FALLBACK,
            component = COMPONENT,
            connection_id,
            reason = "invalid_thread_name",
            "falling back to default runtime thread name"
        );
        DEFAULT_CONNECTION_RUNTIME_THREAD_NAME.to_string()
    }
}

/// Spawns an OS thread that drives `run_loop` to completion on a
/// current-thread tokio runtime owned by that thread alone.
pub(crate) fn spawn_connection_runtime<F, Fut>(
    thread_name: String,
    run_loop: F,
) -> io::Result<thread::JoinHandle<()>>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + 'static,
{
    debug!(
        event = events::RUNTIME_SPAWN_START,
        component = COMPONENT,
        worker_thread = thread_name.as_str(),
        "spawning connection runtime thread"
    );

    let spawned = thread::Builder::new()
        .name(thread_name.clone())
        .spawn(move || {
            let runtime = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    error!(
                        event = events::RUNTIME_BUILD_FAILED,
                        component = COMPONENT,
                        err = %err,
                        "unable to build connection runtime"
                    );
                    return;
                }
            };

            runtime.block_on(run_loop());
        });

    match &spawned {
        Ok(_) => debug!(
            event = events::RUNTIME_SPAWN_OK,
            component = COMPONENT,
            worker_thread = thread_name.as_str(),
            "connection runtime thread spawned"
        ),
        Err(err) => error!(
            event = events::RUNTIME_SPAWN_FAILED,
            component = COMPONENT,
            worker_thread = thread_name.as_str(),
            err = %err,
            "unable to spawn connection runtime thread"
        ),
    }

    spawned
}
