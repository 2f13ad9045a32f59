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

use crate::handler::resolver::HandlerRef;
use crate::observability::{events, fields};
use crate::transport::{MessageListener, Payload};
use async_trait::async_trait;
use tracing::{debug, Level};

const COMPONENT: &str = "dispatch_listener";

/// Subscription callback that forwards every message to one resolved handler.
///
/// The handler is awaited inline so per-channel order follows transport
/// delivery order.
pub(crate) struct DispatchListener {
    connection_id: String,
    handler: HandlerRef,
}

impl DispatchListener {
    pub(crate) fn new(connection_id: &str, handler: HandlerRef) -> Self {
        Self {
            connection_id: connection_id.to_string(),
            handler,
        }
    }
}

#[async_trait]
impl MessageListener for DispatchListener {
    async fn on_receive(&self, topic: &str, payload: Payload) {
        if tracing::enabled!(Level::DEBUG) {
            debug!(
                event = events::MESSAGE_RECEIVED,
                component = COMPONENT,
                connection_id = self.connection_id.as_str(),
                topic,
                target = self.handler.target_name(),
                action = self.handler.action(),
                payload_kind = fields::format_payload_kind(&payload),
                payload_size = fields::format_payload_size(&payload),
                "dispatching message"
            );
        }

        self.handler.handle(payload).await;
    }
}
