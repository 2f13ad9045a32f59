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

use async_trait::async_trait;
use channel_dispatch::{ClientConfig, HandlerRegistry, HandlerResolver, HandlerTarget, Payload};
use std::collections::BTreeSet;
use tracing::info;

/// Target that logs every message it is handed.
pub(crate) struct LoggingTarget {
    name: String,
}

impl LoggingTarget {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl HandlerTarget for LoggingTarget {
    async fn perform(&self, action: &str, topic: &str, payload: Payload) {
        info!(
            target_name = self.name.as_str(),
            action,
            topic,
            payload = %payload,
            "message handled"
        );
    }
}

/// Every target name `config` can resolve to: derived names, explicit targets
/// and the configured default.
pub(crate) fn reachable_target_names(config: &ClientConfig) -> BTreeSet<String> {
    let registry = HandlerRegistry::empty();
    let resolver = HandlerResolver::from_config(&registry, config);

    let mut names: BTreeSet<String> = config
        .channels
        .iter()
        .filter(|spec| !spec.name().is_empty())
        .map(|spec| match spec.handler_target() {
            Some(explicit) => explicit.to_string(),
            None => resolver.derived_target_name(spec.name()),
        })
        .collect();
    if let Some(default_target) = &config.default_handler_target {
        names.insert(default_target.clone());
    }
    names
}
