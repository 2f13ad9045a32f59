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

use crate::config::ClientConfig;
use crate::error::DispatchError;
use crate::handler::registry::HandlerRegistry;
use crate::handler::resolver::{HandlerRef, HandlerResolver};
use crate::handler::target::HandlerTarget;
use crate::lifecycle::connection::ConnectionHandle;
use crate::lifecycle::state::LifecycleState;
use crate::observability::{events, fields};
use crate::transport::{Payload, TransportConnector};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const COMPONENT: &str = "channel_dispatcher";
const RUNNING_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Builds a [`ChannelDispatcher`] from a configuration and handler targets.
pub struct ChannelDispatcherBuilder {
    config: ClientConfig,
    registry: HandlerRegistry,
}

impl ChannelDispatcherBuilder {
    /// Starts from `config` and a registry holding only the built-in default target.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            registry: HandlerRegistry::new(),
        }
    }

    /// Replaces the registry wholesale.
    pub fn with_registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn register_handler(
        mut self,
        name: impl Into<String>,
        target: Arc<dyn HandlerTarget>,
    ) -> Self {
        self.registry.register(name, target);
        self
    }

    pub fn build(self, connector: Arc<dyn TransportConnector>) -> ChannelDispatcher {
        ChannelDispatcher {
            config: self.config,
            registry: self.registry,
            connector,
            connection: None,
        }
    }
}

/// Owns the connection lifecycle for one configured set of channels.
///
/// `start` resolves every channel before anything touches the transport, then
/// hands the resolved handlers to a background connection. Lifecycle calls take
/// `&mut self`; `is_running` and `publish` only need `&self`.
///
/// ```
/// use channel_dispatch::{ChannelDispatcherBuilder, ClientConfig, DispatchError};
/// # use async_trait::async_trait;
/// # use channel_dispatch::{
/// #     MessageListener, Payload, PubSubClient, TransportConnector, TransportError, TransportState,
/// # };
/// # use std::sync::Arc;
/// #
/// # struct NullClient;
/// #
/// # #[async_trait]
/// # impl PubSubClient for NullClient {
/// #     async fn subscribe(&self, _topic: &str, _listener: Arc<dyn MessageListener>) -> Result<(), TransportError> { Ok(()) }
/// #     async fn publish(&self, _topic: &str, _payload: Payload) -> Result<(), TransportError> { Ok(()) }
/// #     async fn disconnect(&self) -> Result<(), TransportError> { Ok(()) }
/// #     fn state(&self) -> TransportState { TransportState::Connected }
/// # }
/// #
/// # struct NullConnector;
/// #
/// # #[async_trait]
/// # impl TransportConnector for NullConnector {
/// #     async fn connect(&self, _endpoint: &str) -> Result<Arc<dyn PubSubClient>, TransportError> {
/// #         Ok(Arc::new(NullClient))
/// #     }
/// # }
/// use std::time::Duration;
///
/// let config = ClientConfig::new("mem://local").with_channels(["/foo", "/bar"]);
/// let mut dispatcher = ChannelDispatcherBuilder::new(config).build(Arc::new(NullConnector));
///
/// assert!(matches!(dispatcher.stop(), Err(DispatchError::NotRunning)));
///
/// dispatcher.start().unwrap();
/// assert!(matches!(dispatcher.start(), Err(DispatchError::AlreadyRunning)));
/// assert!(dispatcher.wait_for_running(Duration::from_secs(5)));
///
/// dispatcher.stop().unwrap();
/// assert!(!dispatcher.is_running());
/// ```
pub struct ChannelDispatcher {
    config: ClientConfig,
    registry: HandlerRegistry,
    connector: Arc<dyn TransportConnector>,
    connection: Option<ConnectionHandle>,
}

impl ChannelDispatcher {
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Configuration changes apply from the next `start`.
    pub fn config_mut(&mut self) -> &mut ClientConfig {
        &mut self.config
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Registry changes apply from the next `start`.
    pub fn registry_mut(&mut self) -> &mut HandlerRegistry {
        &mut self.registry
    }

    /// Resolves every configured channel against the current registry.
    pub fn resolve_handlers(&self) -> Result<Vec<HandlerRef>, DispatchError> {
        HandlerResolver::from_config(&self.registry, &self.config).resolve_all(&self.config.channels)
    }

    /// Resolves every channel and launches the background connection.
    ///
    /// Resolution errors are returned before any connection exists. Transport
    /// failures happen in the background and leave the dispatcher stopped.
    pub fn start(&mut self) -> Result<(), DispatchError> {
        info!(
            event = events::DISPATCH_START_REQUEST,
            component = COMPONENT,
            endpoint = self.config.endpoint.as_str(),
            channels = self.config.channels.len(),
            default_target = fields::format_optional(self.config.default_handler_target.as_deref()),
            "start requested"
        );

        self.reap_dead_connection();
        if let Some(connection) = &self.connection {
            warn!(
                event = events::DISPATCH_START_REJECTED,
                component = COMPONENT,
                connection_id = connection.connection_id(),
                state = %connection.state(),
                "dispatcher is already running"
            );
            return Err(DispatchError::AlreadyRunning);
        }

        let handlers = self.resolve_handlers()?;
        let connection =
            ConnectionHandle::launch(&self.config.endpoint, handlers, self.connector.clone())?;
        self.connection = Some(connection);

        Ok(())
    }

    /// Disconnects and waits for the background connection to finish.
    pub fn stop(&mut self) -> Result<(), DispatchError> {
        self.reap_dead_connection();
        let Some(connection) = self.connection.take() else {
            warn!(
                event = events::DISPATCH_STOP_REJECTED,
                component = COMPONENT,
                state = %LifecycleState::Stopped,
                "dispatcher is not running"
            );
            return Err(DispatchError::NotRunning);
        };

        let connection_id = connection.connection_id().to_string();
        info!(
            event = events::DISPATCH_STOP_REQUEST,
            component = COMPONENT,
            connection_id = connection_id.as_str(),
            state = %connection.state(),
            "stop requested"
        );
        connection.shutdown();
        info!(
            event = events::DISPATCH_STOP_OK,
            component = COMPONENT,
            connection_id = connection_id.as_str(),
            "dispatcher stopped"
        );

        Ok(())
    }

    pub fn restart(&mut self) -> Result<(), DispatchError> {
        self.stop()?;
        self.start()
    }

    pub fn is_running(&self) -> bool {
        self.connection
            .as_ref()
            .map(ConnectionHandle::is_running)
            .unwrap_or(false)
    }

    /// Polls [`is_running`](Self::is_running) until it holds or `timeout` elapses.
    pub fn wait_for_running(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.is_running() {
                return true;
            }
            if self.state() == LifecycleState::Stopped || Instant::now() >= deadline {
                return false;
            }
            thread::sleep(RUNNING_POLL_INTERVAL);
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.connection
            .as_ref()
            .map(ConnectionHandle::state)
            .unwrap_or(LifecycleState::Stopped)
    }

    pub fn connection_id(&self) -> Option<&str> {
        self.connection.as_ref().map(ConnectionHandle::connection_id)
    }

    /// Handlers bound by the current connection, empty when there is none.
    pub fn resolved_handlers(&self) -> &[HandlerRef] {
        self.connection
            .as_ref()
            .map(ConnectionHandle::handlers)
            .unwrap_or(&[])
    }

    /// Publishes `message` on `channel` through the live connection.
    ///
    /// Returns once the message is handed to the connection; transport
    /// failures are logged, not returned.
    pub fn publish(&self, channel: &str, message: Payload) -> Result<(), DispatchError> {
        if channel.is_empty() {
            return Err(DispatchError::NoChannelProvided);
        }
        if message.is_null() {
            return Err(DispatchError::NoMessageProvided);
        }

        match &self.connection {
            Some(connection) => connection.publish(channel, message),
            None => {
                debug!(
                    event = events::PUBLISH_FAILED,
                    component = COMPONENT,
                    topic = channel,
                    payload_kind = fields::format_payload_kind(&message),
                    state = %LifecycleState::Stopped,
                    "publish while stopped"
                );
                Err(DispatchError::NotRunning)
            }
        }
    }

    /// Drops a connection whose task has ended or whose transport went away.
    fn reap_dead_connection(&mut self) {
        if self.connection.as_ref().is_some_and(ConnectionHandle::is_live) {
            return;
        }
        if let Some(connection) = self.connection.take() {
            debug!(
                event = events::DISPATCH_STOP_OK,
                component = COMPONENT,
                connection_id = connection.connection_id(),
                state = %connection.state(),
                "reaping connection that is no longer live"
            );
            connection.shutdown();
        }
    }
}
