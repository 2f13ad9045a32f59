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

//! Name-to-target bindings consulted by the resolver.

use crate::handler::target::{DefaultChannelHandler, HandlerTarget, DEFAULT_HANDLER_TARGET};
use crate::observability::events;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use tracing::debug;

const COMPONENT: &str = "handler_registry";

/// Explicit registry of handler targets keyed by name.
///
/// Names are matched exactly. Derived names look like
/// `<namespace>::<Segment>::<Segment>Handler`, so register targets under that
/// shape to have bare channels pick them up without configuration.
#[derive(Clone)]
pub struct HandlerRegistry {
    targets: HashMap<String, Arc<dyn HandlerTarget>>,
}

impl HandlerRegistry {
    /// Creates a registry holding only the built-in [`DefaultChannelHandler`].
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(DEFAULT_HANDLER_TARGET, Arc::new(DefaultChannelHandler));
        registry
    }

    /// Creates a registry without the built-in fallback target.
    pub fn empty() -> Self {
        Self {
            targets: HashMap::new(),
        }
    }

    /// Binds `name` to `target`, returning the previous binding if there was one.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        target: Arc<dyn HandlerTarget>,
    ) -> Option<Arc<dyn HandlerTarget>> {
        let name = name.into();
        let previous = self.targets.insert(name.clone(), target);
        let event = if previous.is_some() {
            events::HANDLER_REPLACED
        } else {
            events::HANDLER_REGISTERED
        };
        debug!(
            event,
            component = COMPONENT,
            target = name.as_str(),
            "handler target bound"
        );
        previous
    }

    pub fn with_target(mut self, name: impl Into<String>, target: Arc<dyn HandlerTarget>) -> Self {
        self.register(name, target);
        self
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn HandlerTarget>> {
        self.targets.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.targets.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Registered names in sorted order.
    pub fn target_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.targets.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for HandlerRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("targets", &self.target_names())
            .finish()
    }
}
