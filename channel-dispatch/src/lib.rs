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

//! # channel-dispatch
//!
//! `channel-dispatch` binds pub/sub channels to handler targets and owns the
//! lifecycle of the transport connection that feeds them.
//!
//! Each configured channel resolves to a [`HandlerRef`]: a registered
//! [`HandlerTarget`] plus the action to invoke on it. Bare channels derive the
//! target name from their path (`/foo/bar` under namespace `App` looks for
//! `App::Foo::BarHandler`), falling back once to a default target. Structured
//! channels may name the target and action explicitly.
//!
//! ## Quick start
//!
//! ```
//! use channel_dispatch::{
//!     ChannelDispatcherBuilder, ClientConfig, HandlerTarget, Payload, StructuredTopic,
//! };
//! # use async_trait::async_trait;
//! # use channel_dispatch::{
//! #     MessageListener, PubSubClient, TransportConnector, TransportError, TransportState,
//! # };
//! # use std::sync::Arc;
//! #
//! # struct NullClient;
//! #
//! # #[async_trait]
//! # impl PubSubClient for NullClient {
//! #     async fn subscribe(&self, _topic: &str, _listener: Arc<dyn MessageListener>) -> Result<(), TransportError> { Ok(()) }
//! #     async fn publish(&self, _topic: &str, _payload: Payload) -> Result<(), TransportError> { Ok(()) }
//! #     async fn disconnect(&self) -> Result<(), TransportError> { Ok(()) }
//! #     fn state(&self) -> TransportState { TransportState::Connected }
//! # }
//! #
//! # struct NullConnector;
//! #
//! # #[async_trait]
//! # impl TransportConnector for NullConnector {
//! #     async fn connect(&self, _endpoint: &str) -> Result<Arc<dyn PubSubClient>, TransportError> {
//! #         Ok(Arc::new(NullClient))
//! #     }
//! # }
//! use std::time::Duration;
//!
//! struct ChatHandler;
//!
//! #[async_trait::async_trait]
//! impl HandlerTarget for ChatHandler {
//!     async fn perform(&self, action: &str, topic: &str, payload: Payload) {
//!         println!("{action} {topic}: {payload}");
//!     }
//! }
//!
//! let config = ClientConfig::new("http://localhost:9292/faye")
//!     .with_handler_namespace("App")
//!     .with_channel("/chat/room")
//!     .with_channel(StructuredTopic::new("/audit").with_handler_action("record"));
//!
//! let mut dispatcher = ChannelDispatcherBuilder::new(config)
//!     .register_handler("App::Chat::RoomHandler", Arc::new(ChatHandler))
//!     .build(Arc::new(NullConnector));
//!
//! let handlers = dispatcher.resolve_handlers().unwrap();
//! assert_eq!(handlers[0].target_name(), "App::Chat::RoomHandler");
//! assert_eq!(handlers[1].target_name(), channel_dispatch::DEFAULT_HANDLER_TARGET);
//! assert_eq!(handlers[1].action(), "record");
//!
//! dispatcher.start().unwrap();
//! assert!(dispatcher.wait_for_running(Duration::from_secs(5)));
//! dispatcher.stop().unwrap();
//! ```
//!
//! ## Internal architecture map
//!
//! - Configuration: `ClientConfig` and `TopicSpec`, loadable from JSON5
//! - Handler: registry of named targets and the channel resolver
//! - Lifecycle: `ChannelDispatcher` facade and the per-connection handle
//! - Runtime: one OS thread with a current-thread tokio runtime per connection
//! - Transport: the pub/sub boundary traits a transport implements
//!
//! ## Observability model
//!
//! The crate emits `tracing` events carrying an `event` field from
//! `observability::events`. It never installs a global subscriber; binaries
//! and tests do that once at process start.

mod config;
pub use config::ClientConfig;

mod error;
pub use error::{ConfigError, DispatchError};

mod handler;
pub use handler::registry::HandlerRegistry;
pub use handler::resolver::{normalize_topic, HandlerRef, HandlerResolver};
pub use handler::target::{
    DefaultChannelHandler, HandlerTarget, DEFAULT_HANDLER_ACTION, DEFAULT_HANDLER_TARGET,
};

mod lifecycle;
pub use lifecycle::connection::ConnectionHandle;
pub use lifecycle::dispatcher::{ChannelDispatcher, ChannelDispatcherBuilder};
pub use lifecycle::state::LifecycleState;

#[doc(hidden)]
pub mod observability;
mod runtime;

mod topic_spec;
pub use topic_spec::{StructuredTopic, TopicSpec};

mod transport;
pub use transport::{
    MessageListener, Payload, PubSubClient, TransportConnector, TransportError, TransportState,
};
