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

use crate::observability::{events, fields};
use crate::transport::Payload;
use async_trait::async_trait;
use tracing::debug;

/// Registry name of the built-in no-op target.
pub const DEFAULT_HANDLER_TARGET: &str = "ChannelDispatch::DefaultChannelHandler";

/// Action used when neither the channel nor the configuration names one.
pub const DEFAULT_HANDLER_ACTION: &str = "handle";

const COMPONENT: &str = "default_channel_handler";

/// Receiver of dispatched messages.
///
/// A target exposes any number of named actions; the dispatcher passes the
/// resolved action name on every call and the target decides what it means.
/// Targets backed by a work queue should enqueue and return.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use channel_dispatch::{HandlerTarget, Payload};
/// use std::sync::Mutex;
///
/// #[derive(Default)]
/// struct AuditTrail {
///     seen: Mutex<Vec<(String, Payload)>>,
/// }
///
/// #[async_trait]
/// impl HandlerTarget for AuditTrail {
///     async fn perform(&self, action: &str, topic: &str, payload: Payload) {
///         if action == "record" {
///             self.seen.lock().unwrap().push((topic.to_string(), payload));
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait HandlerTarget: Send + Sync {
    async fn perform(&self, action: &str, topic: &str, payload: Payload);
}

/// Built-in fallback target. Accepts every action and drops the message.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultChannelHandler;

#[async_trait]
impl HandlerTarget for DefaultChannelHandler {
    async fn perform(&self, action: &str, topic: &str, payload: Payload) {
        debug!(
            event = events::DEFAULT_HANDLER_DROP,
            component = COMPONENT,
            topic,
            action,
            payload_kind = fields::format_payload_kind(&payload),
            "no handler configured for channel, dropping message"
        );
    }
}
