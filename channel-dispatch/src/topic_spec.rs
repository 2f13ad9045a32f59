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

//! Declarative channel entries as they appear in a [`ClientConfig`][crate::ClientConfig].

use crate::error::DispatchError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One configured channel: either a bare name or a record with handler overrides.
///
/// In configuration files a bare topic is a string and a structured topic is an
/// object. Anything else is rejected with [`DispatchError::InvalidTopicSpec`].
///
/// ```
/// use channel_dispatch::{StructuredTopic, TopicSpec};
///
/// let specs: Vec<TopicSpec> = json5::from_str(
///     r#"["/foo", { name: "/foofoo", handler_target: "FooFoo", handler_action: "run" }]"#,
/// )
/// .unwrap();
///
/// assert_eq!(specs[0], TopicSpec::from("/foo"));
/// assert_eq!(
///     specs[1],
///     TopicSpec::from(
///         StructuredTopic::new("/foofoo")
///             .with_handler_target("FooFoo")
///             .with_handler_action("run")
///     )
/// );
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum TopicSpec {
    Bare(String),
    Structured(StructuredTopic),
}

/// Record form of a [`TopicSpec`].
///
/// `handler_class_name` and `handler_method_name` are accepted as aliases of
/// `handler_target` and `handler_action`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StructuredTopic {
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "handler_class_name", skip_serializing_if = "Option::is_none")]
    pub handler_target: Option<String>,
    #[serde(default, alias = "handler_method_name", skip_serializing_if = "Option::is_none")]
    pub handler_action: Option<String>,
}

impl StructuredTopic {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handler_target: None,
            handler_action: None,
        }
    }

    pub fn with_handler_target(mut self, target: impl Into<String>) -> Self {
        self.handler_target = Some(target.into());
        self
    }

    pub fn with_handler_action(mut self, action: impl Into<String>) -> Self {
        self.handler_action = Some(action.into());
        self
    }
}

impl TopicSpec {
    /// The channel name this spec subscribes to. May be empty for a misconfigured record.
    pub fn name(&self) -> &str {
        match self {
            TopicSpec::Bare(name) => name,
            TopicSpec::Structured(structured) => &structured.name,
        }
    }

    pub fn handler_target(&self) -> Option<&str> {
        match self {
            TopicSpec::Bare(_) => None,
            TopicSpec::Structured(structured) => structured.handler_target.as_deref(),
        }
    }

    pub fn handler_action(&self) -> Option<&str> {
        match self {
            TopicSpec::Bare(_) => None,
            TopicSpec::Structured(structured) => structured.handler_action.as_deref(),
        }
    }
}

impl From<&str> for TopicSpec {
    fn from(name: &str) -> Self {
        TopicSpec::Bare(name.to_string())
    }
}

impl From<String> for TopicSpec {
    fn from(name: String) -> Self {
        TopicSpec::Bare(name)
    }
}

impl From<StructuredTopic> for TopicSpec {
    fn from(structured: StructuredTopic) -> Self {
        TopicSpec::Structured(structured)
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl TryFrom<Value> for TopicSpec {
    type Error = DispatchError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(name) => Ok(TopicSpec::Bare(name)),
            Value::Object(_) => serde_json::from_value::<StructuredTopic>(value)
                .map(TopicSpec::Structured)
                .map_err(|err| DispatchError::InvalidTopicSpec(err.to_string())),
            other => Err(DispatchError::InvalidTopicSpec(format!(
                "channel must be a name or a record, found {}",
                value_kind(&other)
            ))),
        }
    }
}

impl From<TopicSpec> for Value {
    fn from(spec: TopicSpec) -> Self {
        match spec {
            TopicSpec::Bare(name) => Value::String(name),
            TopicSpec::Structured(structured) => {
                serde_json::to_value(structured).unwrap_or(Value::Null)
            }
        }
    }
}
