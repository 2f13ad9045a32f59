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

//! One transport connection and the background task that owns it.

use crate::error::DispatchError;
use crate::handler::resolver::HandlerRef;
use crate::lifecycle::listener::DispatchListener;
use crate::lifecycle::state::{LifecycleState, StateCell};
use crate::observability::{events, fields};
use crate::runtime::connection_runtime::{build_runtime_thread_name, spawn_connection_runtime};
use crate::transport::{
    MessageListener, Payload, PubSubClient, TransportConnector, TransportError, TransportState,
};
use std::sync::{Arc, OnceLock};
use std::thread;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use uuid::Uuid;

const COMPONENT: &str = "connection";

#[derive(Debug)]
enum ConnectionCommand {
    Publish { topic: String, payload: Payload },
}

/// Everything the background task needs, moved onto the connection thread.
struct ConnectionContext {
    connection_id: String,
    endpoint: String,
    handlers: Arc<[HandlerRef]>,
    connector: Arc<dyn TransportConnector>,
    state: Arc<StateCell>,
    client: Arc<OnceLock<Arc<dyn PubSubClient>>>,
}

/// Resets the shared state to `Stopped` however the connection thread exits.
struct StoppedOnExit(Arc<StateCell>);

impl Drop for StoppedOnExit {
    fn drop(&mut self) {
        self.0.set(LifecycleState::Stopped);
    }
}

/// Owner of one transport connection and its background task.
///
/// A handle is created by [`ConnectionHandle::launch`] and consumed by
/// [`ConnectionHandle::shutdown`]. Dropping it without shutting down signals
/// the task to stop but does not wait for it.
pub struct ConnectionHandle {
    connection_id: String,
    handlers: Arc<[HandlerRef]>,
    state: Arc<StateCell>,
    client: Arc<OnceLock<Arc<dyn PubSubClient>>>,
    command_sender: UnboundedSender<ConnectionCommand>,
    shutdown_sender: Option<oneshot::Sender<()>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl ConnectionHandle {
    /// Spawns the background task for an already resolved set of handlers.
    ///
    /// Returns as soon as the task is launched. The handle reports
    /// [`LifecycleState::Starting`] until every handler is subscribed.
    pub fn launch(
        endpoint: &str,
        handlers: Vec<HandlerRef>,
        connector: Arc<dyn TransportConnector>,
    ) -> Result<Self, DispatchError> {
        let connection_id = Uuid::new_v4().hyphenated().to_string();
        let handlers: Arc<[HandlerRef]> = handlers.into();
        let state = Arc::new(StateCell::new(LifecycleState::Starting));
        let client: Arc<OnceLock<Arc<dyn PubSubClient>>> = Arc::new(OnceLock::new());
        let (command_sender, command_receiver) = mpsc::unbounded_channel();
        let (shutdown_sender, shutdown_receiver) = oneshot::channel();

        let context = ConnectionContext {
            connection_id: connection_id.clone(),
            endpoint: endpoint.to_string(),
            handlers: handlers.clone(),
            connector,
            state: state.clone(),
            client: client.clone(),
        };

        // Owned by the run loop so it also fires when the loop never runs.
        let stopped_on_exit = StoppedOnExit(state.clone());
        let spawned = spawn_connection_runtime(
            build_runtime_thread_name(&connection_id),
            move || async move {
                let _stopped_on_exit = stopped_on_exit;
                run_connection(context, shutdown_receiver, command_receiver).await;
            },
        );

        let thread = match spawned {
            Ok(thread) => thread,
            Err(err) => {
                state.set(LifecycleState::Stopped);
                return Err(DispatchError::BackgroundTask(err));
            }
        };

        Ok(Self {
            connection_id,
            handlers,
            state,
            client,
            command_sender,
            shutdown_sender: Some(shutdown_sender),
            thread: Some(thread),
        })
    }

    /// Correlation id for this connection; appears in every log event it emits.
    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    pub fn handlers(&self) -> &[HandlerRef] {
        &self.handlers
    }

    pub fn state(&self) -> LifecycleState {
        self.state.get()
    }

    /// True when every channel is subscribed and the transport reports a live connection.
    pub fn is_running(&self) -> bool {
        self.state.get() == LifecycleState::Connected
            && self
                .client
                .get()
                .map(|client| client.state() == TransportState::Connected)
                .unwrap_or(false)
    }

    /// False once the task has ended or its transport dropped underneath it.
    pub(crate) fn is_live(&self) -> bool {
        let state = self.state.get();
        state.is_active() && (state != LifecycleState::Connected || self.is_running())
    }

    /// Hands `payload` to the connection task for publishing on `topic`.
    pub fn publish(&self, topic: &str, payload: Payload) -> Result<(), DispatchError> {
        if !self.is_running() {
            return Err(DispatchError::NotRunning);
        }

        self.command_sender
            .send(ConnectionCommand::Publish {
                topic: topic.to_string(),
                payload,
            })
            .map_err(|err| {
                warn!(
                    event = events::PUBLISH_HANDOFF_FAILED,
                    component = COMPONENT,
                    connection_id = self.connection_id.as_str(),
                    topic,
                    reason = fields::REASON_COMMAND_CHANNEL_CLOSED,
                    err = %err,
                    "connection task is gone"
                );
                DispatchError::NotRunning
            })
    }

    /// Disconnects, halts the connection runtime and waits for its thread.
    pub fn shutdown(mut self) {
        self.signal_shutdown();

        let Some(thread) = self.thread.take() else {
            return;
        };
        if thread.thread().id() == thread::current().id() {
            // Called from a handler running on the connection thread itself.
            return;
        }
        if thread.join().is_err() {
            warn!(
                event = events::RUNTIME_JOIN_FAILED,
                component = COMPONENT,
                connection_id = self.connection_id.as_str(),
                "connection thread panicked"
            );
        }
    }

    fn signal_shutdown(&mut self) {
        if let Some(shutdown_sender) = self.shutdown_sender.take() {
            if self.state.transition(LifecycleState::Connected, LifecycleState::Stopping) {
                debug!(
                    event = events::DISPATCH_STOP_REQUEST,
                    component = COMPONENT,
                    connection_id = self.connection_id.as_str(),
                    state = %LifecycleState::Stopping,
                    "stopping connection"
                );
            }
            // The task may already have exited after a failed connect.
            let _ = shutdown_sender.send(());
        }
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        if self.shutdown_sender.is_some() {
            debug!(
                event = events::DISPATCH_HANDLE_DROPPED,
                component = COMPONENT,
                connection_id = self.connection_id.as_str(),
                "connection handle dropped without shutdown"
            );
            self.signal_shutdown();
        }
    }
}

async fn run_connection(
    context: ConnectionContext,
    mut shutdown_receiver: oneshot::Receiver<()>,
    mut command_receiver: UnboundedReceiver<ConnectionCommand>,
) {
    let connection_id = context.connection_id.as_str();
    let endpoint = context.endpoint.as_str();

    info!(
        event = events::CONNECT_START,
        component = COMPONENT,
        connection_id,
        endpoint,
        channels = context.handlers.len(),
        "opening transport connection"
    );

    let client = tokio::select! {
        connected = context.connector.connect(endpoint) => match connected {
            Ok(client) => client,
            Err(err) => {
                warn!(
                    event = events::CONNECT_FAILED,
                    component = COMPONENT,
                    connection_id,
                    endpoint,
                    err = %err,
                    "unable to connect"
                );
                return;
            }
        },
        _ = &mut shutdown_receiver => {
            debug!(
                event = events::CONNECT_CANCELLED,
                component = COMPONENT,
                connection_id,
                endpoint,
                reason = fields::REASON_SHUTDOWN_REQUESTED,
                "stop requested while connecting"
            );
            return;
        }
    };

    tokio::select! {
        subscribed = subscribe_all(&context, client.as_ref()) => {
            if subscribed.is_err() {
                disconnect(&context, client.as_ref(), fields::REASON_SUBSCRIBE_ROLLBACK).await;
                return;
            }
        }
        _ = &mut shutdown_receiver => {
            debug!(
                event = events::CONNECT_CANCELLED,
                component = COMPONENT,
                connection_id,
                endpoint,
                reason = fields::REASON_SHUTDOWN_REQUESTED,
                "stop requested while subscribing"
            );
            disconnect(&context, client.as_ref(), fields::REASON_SHUTDOWN_REQUESTED).await;
            return;
        }
    }

    let _ = context.client.set(client.clone());
    if context
        .state
        .transition(LifecycleState::Starting, LifecycleState::Connected)
    {
        info!(
            event = events::CONNECT_OK,
            component = COMPONENT,
            connection_id,
            endpoint,
            state = %LifecycleState::Connected,
            "connection established and subscribed"
        );
    }

    let reason = loop {
        tokio::select! {
            _ = &mut shutdown_receiver => break fields::REASON_SHUTDOWN_REQUESTED,
            command = command_receiver.recv() => match command {
                Some(ConnectionCommand::Publish { topic, payload }) => {
                    forward_publish(&context, client.as_ref(), &topic, payload).await;
                }
                None => break fields::REASON_COMMAND_CHANNEL_CLOSED,
            },
        }
    };

    context.state.set(LifecycleState::Stopping);

    // Publishes accepted before the stop signal still go out.
    command_receiver.close();
    while let Ok(ConnectionCommand::Publish { topic, payload }) = command_receiver.try_recv() {
        forward_publish(&context, client.as_ref(), &topic, payload).await;
    }

    disconnect(&context, client.as_ref(), reason).await;
}

/// Subscribes every handler or none: the caller disconnects on the first failure.
async fn subscribe_all(
    context: &ConnectionContext,
    client: &dyn PubSubClient,
) -> Result<(), TransportError> {
    let connection_id = context.connection_id.as_str();

    for handler in context.handlers.iter() {
        let listener: Arc<dyn MessageListener> =
            Arc::new(DispatchListener::new(connection_id, handler.clone()));

        if let Err(err) = client.subscribe(handler.topic(), listener).await {
            warn!(
                event = events::SUBSCRIBE_FAILED,
                component = COMPONENT,
                connection_id,
                topic = handler.topic(),
                target = handler.target_name(),
                err = %err,
                "unable to subscribe, abandoning connection"
            );
            return Err(err);
        }

        debug!(
            event = events::SUBSCRIBE_OK,
            component = COMPONENT,
            connection_id,
            topic = handler.topic(),
            target = handler.target_name(),
            action = handler.action(),
            "subscribed channel"
        );
    }

    Ok(())
}

async fn forward_publish(
    context: &ConnectionContext,
    client: &dyn PubSubClient,
    topic: &str,
    payload: Payload,
) {
    let payload_kind = fields::format_payload_kind(&payload);

    match client.publish(topic, payload).await {
        Ok(()) => debug!(
            event = events::PUBLISH_FORWARD,
            component = COMPONENT,
            connection_id = context.connection_id.as_str(),
            topic,
            payload_kind,
            "published message"
        ),
        Err(err) => warn!(
            event = events::PUBLISH_FAILED,
            component = COMPONENT,
            connection_id = context.connection_id.as_str(),
            topic,
            payload_kind,
            err = %err,
            "unable to publish message"
        ),
    }
}

async fn disconnect(context: &ConnectionContext, client: &dyn PubSubClient, reason: &str) {
    match client.disconnect().await {
        Ok(()) => info!(
            event = events::DISCONNECT_OK,
            component = COMPONENT,
            connection_id = context.connection_id.as_str(),
            endpoint = context.endpoint.as_str(),
            reason,
            "transport disconnected"
        ),
        Err(err) => warn!(
            event = events::DISCONNECT_FAILED,
            component = COMPONENT,
            connection_id = context.connection_id.as_str(),
            endpoint = context.endpoint.as_str(),
            reason,
            err = %err,
            "unable to disconnect cleanly"
        ),
    }
}
