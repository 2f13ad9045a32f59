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

//! Boundary traits for the pub/sub transport that the dispatcher drives.
//!
//! The dispatcher never speaks a wire protocol itself. It is handed a
//! [`TransportConnector`] and, on every start, asks it for a fresh
//! [`PubSubClient`] from inside the background connection runtime.

use async_trait::async_trait;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use thiserror::Error;

/// Message body carried on a channel.
pub type Payload = serde_json::Value;

/// Connection state as reported by the transport client.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum TransportState {
    Connecting,
    Connected,
    Disconnected,
}

impl Display for TransportState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportState::Connecting => write!(f, "connecting"),
            TransportState::Connected => write!(f, "connected"),
            TransportState::Disconnected => write!(f, "disconnected"),
        }
    }
}

/// Failures reported by a transport implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("unable to connect to {endpoint}: {reason}")]
    Connect { endpoint: String, reason: String },
    #[error("unable to subscribe to {topic}: {reason}")]
    Subscribe { topic: String, reason: String },
    #[error("unable to publish to {topic}: {reason}")]
    Publish { topic: String, reason: String },
    #[error("unable to disconnect: {0}")]
    Disconnect(String),
    #[error("transport is not connected")]
    NotConnected,
}

/// Callback registered per subscribed channel.
#[async_trait]
pub trait MessageListener: Send + Sync {
    async fn on_receive(&self, topic: &str, payload: Payload);
}

/// A connected pub/sub client.
///
/// One instance lives for exactly one connection; the dispatcher asks the
/// [`TransportConnector`] for a new one on every start.
#[async_trait]
pub trait PubSubClient: Send + Sync {
    async fn subscribe(
        &self,
        topic: &str,
        listener: Arc<dyn MessageListener>,
    ) -> Result<(), TransportError>;

    async fn publish(&self, topic: &str, payload: Payload) -> Result<(), TransportError>;

    async fn disconnect(&self) -> Result<(), TransportError>;

    fn state(&self) -> TransportState;
}

/// Opens connections to an endpoint.
///
/// `connect` runs on the dispatcher's background runtime, so implementations
/// are free to spawn tasks onto the current tokio runtime.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use channel_dispatch::{
///     MessageListener, Payload, PubSubClient, TransportConnector, TransportError, TransportState,
/// };
/// use std::sync::Arc;
///
/// struct NullClient;
///
/// #[async_trait]
/// impl PubSubClient for NullClient {
///     async fn subscribe(
///         &self,
///         _topic: &str,
///         _listener: Arc<dyn MessageListener>,
///     ) -> Result<(), TransportError> {
///         Ok(())
///     }
///
///     async fn publish(&self, _topic: &str, _payload: Payload) -> Result<(), TransportError> {
///         Ok(())
///     }
///
///     async fn disconnect(&self) -> Result<(), TransportError> {
///         Ok(())
///     }
///
///     fn state(&self) -> TransportState {
///         TransportState::Connected
///     }
/// }
///
/// struct NullConnector;
///
/// #[async_trait]
/// impl TransportConnector for NullConnector {
///     async fn connect(&self, _endpoint: &str) -> Result<Arc<dyn PubSubClient>, TransportError> {
///         Ok(Arc::new(NullClient))
///     }
/// }
/// ```
#[async_trait]
pub trait TransportConnector: Send + Sync {
    async fn connect(&self, endpoint: &str) -> Result<Arc<dyn PubSubClient>, TransportError>;
}
