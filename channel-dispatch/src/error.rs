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

use std::io;
use thiserror::Error;

/// Errors returned synchronously by resolution and lifecycle operations.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("dispatcher is already running")]
    AlreadyRunning,
    #[error("dispatcher is not running")]
    NotRunning,
    #[error("invalid topic spec: {0}")]
    InvalidTopicSpec(String),
    #[error("topic spec has no name")]
    MissingTopicName,
    #[error("cannot resolve a handler for {topic}, tried {attempted:?}")]
    CannotResolveHandler {
        topic: String,
        attempted: Vec<String>,
    },
    #[error("no channel provided")]
    NoChannelProvided,
    #[error("no message provided")]
    NoMessageProvided,
    #[error("unable to launch background connection task: {0}")]
    BackgroundTask(#[from] io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl DispatchError {
    /// True for the errors raised when `publish` is missing its channel or message.
    pub fn is_missing_publish_argument(&self) -> bool {
        matches!(
            self,
            DispatchError::NoChannelProvided | DispatchError::NoMessageProvided
        )
    }
}

/// Failures while reading or parsing a [`ClientConfig`][crate::ClientConfig].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("unable to parse config: {0}")]
    Parse(#[from] json5::Error),
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, DispatchError};
    use std::error::Error;
    use std::io;

    #[test]
    fn cannot_resolve_handler_names_every_attempt() {
        let error = DispatchError::CannotResolveHandler {
            topic: "/foo".to_string(),
            attempted: vec!["App::FooHandler".to_string(), "Fallback".to_string()],
        };

        let rendered = error.to_string();
        assert!(rendered.contains("/foo"));
        assert!(rendered.contains("App::FooHandler"));
        assert!(rendered.contains("Fallback"));
    }

    #[test]
    fn missing_publish_arguments_are_grouped() {
        assert!(DispatchError::NoChannelProvided.is_missing_publish_argument());
        assert!(DispatchError::NoMessageProvided.is_missing_publish_argument());
        assert!(!DispatchError::NotRunning.is_missing_publish_argument());
    }

    #[test]
    fn config_read_error_exposes_source() {
        let error = ConfigError::Read {
            path: "missing.json5".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };

        assert!(error.to_string().contains("missing.json5"));
        assert!(error.source().is_some());
    }
}
