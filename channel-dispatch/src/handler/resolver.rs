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

//! Topic-spec to handler resolution.
//!
//! Bare channels derive a target name from their path segments
//! (`/foo/bar` -> `<namespace>::Foo::BarHandler`). When the derived name is
//! not registered, the configured default target is tried, or the built-in
//! default when none is configured. There are never more than two lookups.

use crate::config::ClientConfig;
use crate::error::DispatchError;
use crate::handler::registry::HandlerRegistry;
use crate::handler::target::{HandlerTarget, DEFAULT_HANDLER_ACTION, DEFAULT_HANDLER_TARGET};
use crate::observability::{events, fields};
use crate::topic_spec::TopicSpec;
use crate::transport::Payload;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use tracing::{debug, warn};

const COMPONENT: &str = "handler_resolver";
const NAMESPACE_SEPARATOR: &str = "::";
const TOPIC_SEPARATOR: char = '/';
const HANDLER_SUFFIX: &str = "Handler";
const MAX_TARGET_LOOKUPS: usize = 2;

/// A channel bound to the target and action that process its messages.
#[derive(Clone)]
pub struct HandlerRef {
    topic: String,
    target_name: String,
    action: String,
    target: Arc<dyn HandlerTarget>,
}

impl HandlerRef {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn target(&self) -> &Arc<dyn HandlerTarget> {
        &self.target
    }

    /// Invokes the bound action on the bound target.
    pub async fn handle(&self, payload: Payload) {
        self.target
            .perform(&self.action, &self.topic, payload)
            .await;
    }
}

impl Debug for HandlerRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRef")
            .field("topic", &self.topic)
            .field("target_name", &self.target_name)
            .field("action", &self.action)
            .finish()
    }
}

impl PartialEq for HandlerRef {
    fn eq(&self, other: &Self) -> bool {
        self.topic == other.topic
            && self.target_name == other.target_name
            && self.action == other.action
            && Arc::ptr_eq(&self.target, &other.target)
    }
}

/// Turns a channel path into a nested type-style name.
///
/// One leading `/` is stripped, the rest split on `/`, and each segment is
/// capitalized (first character upper case, the rest lower case).
///
/// ```
/// use channel_dispatch::normalize_topic;
///
/// assert_eq!(normalize_topic("/foo/bar"), "Foo::Bar");
/// assert_eq!(normalize_topic("chat/ROOM"), "Chat::Room");
/// ```
pub fn normalize_topic(topic: &str) -> String {
    let trimmed = topic.strip_prefix(TOPIC_SEPARATOR).unwrap_or(topic);
    trimmed
        .split(TOPIC_SEPARATOR)
        .map(capitalize_segment)
        .collect::<Vec<_>>()
        .join(NAMESPACE_SEPARATOR)
}

fn capitalize_segment(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Resolves [`TopicSpec`]s against a [`HandlerRegistry`] snapshot.
pub struct HandlerResolver<'a> {
    registry: &'a HandlerRegistry,
    namespace: &'a str,
    default_target: Option<&'a str>,
    default_action: Option<&'a str>,
}

impl<'a> HandlerResolver<'a> {
    pub fn new(registry: &'a HandlerRegistry) -> Self {
        Self {
            registry,
            namespace: "",
            default_target: None,
            default_action: None,
        }
    }

    /// Uses the namespace and defaults carried by `config`.
    pub fn from_config(registry: &'a HandlerRegistry, config: &'a ClientConfig) -> Self {
        Self::new(registry)
            .with_namespace(&config.handler_namespace)
            .with_default_target(config.default_handler_target.as_deref())
            .with_default_action(config.default_handler_action.as_deref())
    }

    pub fn with_namespace(mut self, namespace: &'a str) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn with_default_target(mut self, default_target: Option<&'a str>) -> Self {
        self.default_target = default_target;
        self
    }

    pub fn with_default_action(mut self, default_action: Option<&'a str>) -> Self {
        self.default_action = default_action;
        self
    }

    /// Target name a bare channel maps to before any fallback.
    pub fn derived_target_name(&self, topic: &str) -> String {
        let normalized = normalize_topic(topic);
        if self.namespace.is_empty() {
            format!("{normalized}{HANDLER_SUFFIX}")
        } else {
            format!(
                "{}{NAMESPACE_SEPARATOR}{normalized}{HANDLER_SUFFIX}",
                self.namespace
            )
        }
    }

    pub fn resolve(&self, spec: &TopicSpec) -> Result<HandlerRef, DispatchError> {
        let topic = spec.name();
        if topic.is_empty() {
            return Err(DispatchError::MissingTopicName);
        }

        let (target_name, target) = match spec.handler_target() {
            Some(explicit) => self.lookup_explicit(topic, explicit)?,
            None => self.lookup_derived(topic)?,
        };
        let action = spec
            .handler_action()
            .or(self.default_action)
            .unwrap_or(DEFAULT_HANDLER_ACTION)
            .to_string();

        debug!(
            event = events::HANDLER_RESOLVED,
            component = COMPONENT,
            topic,
            target = target_name.as_str(),
            action = action.as_str(),
            "resolved channel handler"
        );

        Ok(HandlerRef {
            topic: topic.to_string(),
            target_name,
            action,
            target,
        })
    }

    /// Resolves every spec, failing on the first one that cannot be resolved.
    pub fn resolve_all(&self, specs: &[TopicSpec]) -> Result<Vec<HandlerRef>, DispatchError> {
        specs.iter().map(|spec| self.resolve(spec)).collect()
    }

    fn lookup_explicit(
        &self,
        topic: &str,
        explicit: &str,
    ) -> Result<(String, Arc<dyn HandlerTarget>), DispatchError> {
        match self.registry.lookup(explicit) {
            Some(target) => Ok((explicit.to_string(), target)),
            None => {
                warn!(
                    event = events::HANDLER_UNRESOLVED,
                    component = COMPONENT,
                    topic,
                    target = explicit,
                    reason = fields::REASON_EXPLICIT_TARGET_MISSING,
                    "explicit handler target is not registered"
                );
                Err(DispatchError::CannotResolveHandler {
                    topic: topic.to_string(),
                    attempted: vec![explicit.to_string()],
                })
            }
        }
    }

    fn lookup_derived(
        &self,
        topic: &str,
    ) -> Result<(String, Arc<dyn HandlerTarget>), DispatchError> {
        let mut attempted: Vec<String> = Vec::with_capacity(MAX_TARGET_LOOKUPS);
        let mut candidate = self.derived_target_name(topic);

        loop {
            if let Some(target) = self.registry.lookup(&candidate) {
                if !attempted.is_empty() {
                    debug!(
                        event = events::HANDLER_FALLBACK,
                        component = COMPONENT,
                        topic,
                        target = candidate.as_str(),
                        attempted = %fields::format_attempted(&attempted),
                        reason = fields::REASON_DERIVED_TARGET_MISSING,
                        "derived handler target missing, using default"
                    );
                }
                return Ok((candidate, target));
            }

            attempted.push(candidate);
            if attempted.len() >= MAX_TARGET_LOOKUPS {
                warn!(
                    event = events::HANDLER_UNRESOLVED,
                    component = COMPONENT,
                    topic,
                    attempted = %fields::format_attempted(&attempted),
                    "no registered handler target for channel"
                );
                return Err(DispatchError::CannotResolveHandler {
                    topic: topic.to_string(),
                    attempted,
                });
            }

            candidate = self
                .default_target
                .unwrap_or(DEFAULT_HANDLER_TARGET)
                .to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_topic, HandlerResolver};
    use crate::config::ClientConfig;
    use crate::error::DispatchError;
    use crate::handler::registry::HandlerRegistry;
    use crate::handler::target::{
        DefaultChannelHandler, HandlerTarget, DEFAULT_HANDLER_ACTION, DEFAULT_HANDLER_TARGET,
    };
    use crate::topic_spec::{StructuredTopic, TopicSpec};
    use crate::transport::Payload;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingTarget {
        calls: Mutex<Vec<(String, String, Payload)>>,
    }

    #[async_trait]
    impl HandlerTarget for RecordingTarget {
        async fn perform(&self, action: &str, topic: &str, payload: Payload) {
            self.calls
                .lock()
                .unwrap()
                .push((action.to_string(), topic.to_string(), payload));
        }
    }

    fn registry_with(names: &[&str]) -> HandlerRegistry {
        names.iter().fold(HandlerRegistry::new(), |registry, name| {
            registry.with_target(*name, Arc::new(RecordingTarget::default()))
        })
    }

    #[test]
    fn normalize_strips_one_leading_separator_and_capitalizes_segments() {
        assert_eq!(normalize_topic("/foo"), "Foo");
        assert_eq!(normalize_topic("/foo/bar"), "Foo::Bar");
        assert_eq!(normalize_topic("foo/bar"), "Foo::Bar");
        assert_eq!(normalize_topic("/fooBar/BAZ"), "Foobar::Baz");
        assert_eq!(normalize_topic("//foo"), "::Foo");
    }

    #[test]
    fn derived_name_uses_namespace_when_present() {
        let registry = HandlerRegistry::new();

        let namespaced = HandlerResolver::new(&registry).with_namespace("MyClient");
        assert_eq!(
            namespaced.derived_target_name("/foo/bar"),
            "MyClient::Foo::BarHandler"
        );

        let bare = HandlerResolver::new(&registry);
        assert_eq!(bare.derived_target_name("/foo/bar"), "Foo::BarHandler");
    }

    #[test]
    fn bare_topic_resolves_to_registered_derived_target() {
        let registry = registry_with(&["App::Foo::BarHandler"]);
        let resolver = HandlerResolver::new(&registry).with_namespace("App");

        let handler = resolver
            .resolve(&TopicSpec::from("/foo/bar"))
            .expect("derived target is registered");

        assert_eq!(handler.topic(), "/foo/bar");
        assert!(handler.target_name().ends_with("Foo::BarHandler"));
        assert_eq!(handler.action(), DEFAULT_HANDLER_ACTION);
    }

    #[test]
    fn explicit_target_and_action_are_returned_unmodified() {
        let registry = registry_with(&["FooFooHandlerClass", "App::FoofooHandler"]);
        let resolver = HandlerResolver::new(&registry)
            .with_namespace("App")
            .with_default_action(Some("ignored_default"));

        let spec = TopicSpec::from(
            StructuredTopic::new("/foofoo")
                .with_handler_target("FooFooHandlerClass")
                .with_handler_action("foofoo_handler_method"),
        );
        let handler = resolver.resolve(&spec).expect("explicit target registered");

        assert_eq!(handler.target_name(), "FooFooHandlerClass");
        assert_eq!(handler.action(), "foofoo_handler_method");
    }

    #[test]
    fn structured_spec_without_overrides_matches_bare_spec() {
        let registry = registry_with(&["App::XHandler"]);
        let resolver = HandlerResolver::new(&registry).with_namespace("App");

        let bare = resolver.resolve(&TopicSpec::from("/x")).expect("bare");
        let structured = resolver
            .resolve(&TopicSpec::from(StructuredTopic::new("/x")))
            .expect("structured");

        assert_eq!(bare, structured);
    }

    #[test]
    fn structured_spec_with_only_action_derives_target() {
        let registry = registry_with(&["App::XHandler"]);
        let resolver = HandlerResolver::new(&registry).with_namespace("App");

        let handler = resolver
            .resolve(&TopicSpec::from(
                StructuredTopic::new("/x").with_handler_action("special"),
            ))
            .expect("derived target registered");

        assert_eq!(handler.target_name(), "App::XHandler");
        assert_eq!(handler.action(), "special");
    }

    #[test]
    fn missing_derived_target_falls_back_to_configured_default() {
        let registry = registry_with(&["MyDefaultHandler"]);
        let resolver = HandlerResolver::new(&registry)
            .with_namespace("App")
            .with_default_target(Some("MyDefaultHandler"))
            .with_default_action(Some("my_default_action"));

        let handler = resolver
            .resolve(&TopicSpec::from("/unknown"))
            .expect("configured default is registered");

        assert_eq!(handler.target_name(), "MyDefaultHandler");
        assert_eq!(handler.action(), "my_default_action");
    }

    #[test]
    fn missing_derived_target_without_configured_default_uses_builtin() {
        let registry = HandlerRegistry::new();
        let resolver = HandlerResolver::new(&registry).with_namespace("App");

        let handler = resolver
            .resolve(&TopicSpec::from("/unknown"))
            .expect("builtin default is registered");

        assert_eq!(handler.target_name(), DEFAULT_HANDLER_TARGET);
        assert_eq!(handler.action(), DEFAULT_HANDLER_ACTION);
    }

    #[test]
    fn unregistered_configured_default_is_the_last_attempt() {
        // Built-in default is registered but must not be consulted as a third lookup.
        let registry = HandlerRegistry::new();
        let resolver = HandlerResolver::new(&registry)
            .with_namespace("App")
            .with_default_target(Some("MissingDefault"));

        let err = resolver
            .resolve(&TopicSpec::from("/unknown"))
            .expect_err("two lookups then fail");

        match err {
            DispatchError::CannotResolveHandler { topic, attempted } => {
                assert_eq!(topic, "/unknown");
                assert_eq!(
                    attempted,
                    vec!["App::UnknownHandler".to_string(), "MissingDefault".to_string()]
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_registry_without_default_cannot_resolve() {
        let registry = HandlerRegistry::empty();
        let resolver = HandlerResolver::new(&registry);

        let err = resolver
            .resolve(&TopicSpec::from("/foo"))
            .expect_err("nothing registered");

        match err {
            DispatchError::CannotResolveHandler { attempted, .. } => {
                assert_eq!(attempted.len(), 2);
                assert_eq!(attempted[1], DEFAULT_HANDLER_TARGET);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unregistered_explicit_target_does_not_fall_back() {
        let registry = HandlerRegistry::new();
        let resolver = HandlerResolver::new(&registry);

        let err = resolver
            .resolve(&TopicSpec::from(
                StructuredTopic::new("/foo").with_handler_target("Nowhere"),
            ))
            .expect_err("explicit target is not registered");

        assert!(matches!(
            err,
            DispatchError::CannotResolveHandler { ref attempted, .. } if attempted == &vec!["Nowhere".to_string()]
        ));
    }

    #[test]
    fn empty_names_are_missing_topic_names() {
        let registry = HandlerRegistry::new();
        let resolver = HandlerResolver::new(&registry);

        assert!(matches!(
            resolver.resolve(&TopicSpec::from("")),
            Err(DispatchError::MissingTopicName)
        ));
        assert!(matches!(
            resolver.resolve(&TopicSpec::from(
                StructuredTopic::default().with_handler_target(DEFAULT_HANDLER_TARGET)
            )),
            Err(DispatchError::MissingTopicName)
        ));
    }

    #[test]
    fn resolve_all_stops_at_first_failure() {
        let registry = HandlerRegistry::new();
        let resolver = HandlerResolver::new(&registry);
        let specs = vec![TopicSpec::from("/ok"), TopicSpec::from(""), TopicSpec::from("/later")];

        assert!(matches!(
            resolver.resolve_all(&specs),
            Err(DispatchError::MissingTopicName)
        ));
    }

    #[test]
    fn resolution_is_repeatable_for_a_snapshot() {
        let registry = registry_with(&["App::FooHandler"]);
        let config = ClientConfig::new("mem://")
            .with_handler_namespace("App")
            .with_channels(["/foo", "/bar"]);
        let resolver = HandlerResolver::from_config(&registry, &config);

        let first = resolver.resolve_all(&config.channels).expect("first pass");
        let second = resolver.resolve_all(&config.channels).expect("second pass");

        assert_eq!(first, second);
        assert_eq!(second[1].target_name(), DEFAULT_HANDLER_TARGET);
    }

    #[tokio::test]
    async fn handle_invokes_bound_action_on_target() {
        let target = Arc::new(RecordingTarget::default());
        let registry =
            HandlerRegistry::empty().with_target("App::FooHandler", target.clone());
        let resolver = HandlerResolver::new(&registry)
            .with_namespace("App")
            .with_default_action(Some("perform_async"));

        let handler = resolver
            .resolve(&TopicSpec::from("/foo"))
            .expect("derived target registered");
        handler.handle(json!({"id": 7})).await;

        let calls = target.calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![(
                "perform_async".to_string(),
                "/foo".to_string(),
                json!({"id": 7})
            )]
        );
    }

    #[tokio::test]
    async fn builtin_default_accepts_any_action() {
        DefaultChannelHandler
            .perform("anything", "/foo", json!("dropped"))
            .await;
    }
}
