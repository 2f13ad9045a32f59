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

use crate::error::ConfigError;
use crate::topic_spec::TopicSpec;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Process-wide dispatcher configuration, fixed for the lifetime of one connection.
///
/// Changing `channels` takes effect on the next start; there is no live
/// re-subscription.
///
/// ```
/// use channel_dispatch::ClientConfig;
///
/// let config = ClientConfig::from_json5_str(
///     r#"{
///         endpoint: "http://localhost:9292/faye",
///         handler_namespace: "MyClient",
///         channels: ["/foo", { name: "/bar", handler_action: "bar" }],
///         default_handler_target: "MyDefaultHandler",
///     }"#,
/// )
/// .unwrap();
///
/// assert_eq!(config.channels.len(), 2);
/// assert_eq!(config.default_handler_action, None);
/// ```
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub endpoint: String,
    #[serde(default)]
    pub handler_namespace: String,
    #[serde(default)]
    pub channels: Vec<TopicSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_handler_target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_handler_action: Option<String>,
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    pub fn with_handler_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.handler_namespace = namespace.into();
        self
    }

    pub fn with_channel(mut self, channel: impl Into<TopicSpec>) -> Self {
        self.channels.push(channel.into());
        self
    }

    pub fn with_channels<I, T>(mut self, channels: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TopicSpec>,
    {
        self.channels.extend(channels.into_iter().map(Into::into));
        self
    }

    pub fn with_default_handler_target(mut self, target: impl Into<String>) -> Self {
        self.default_handler_target = Some(target.into());
        self
    }

    pub fn with_default_handler_action(mut self, action: impl Into<String>) -> Self {
        self.default_handler_action = Some(action.into());
        self
    }

    pub fn from_json5_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(json5::from_str(contents)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json5_str(&contents)
    }
}
