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

//! Canonical structured field keys and value-format helpers.

use crate::transport::Payload;
use serde_json::Value;

pub const EVENT: &str = "event";
pub const COMPONENT: &str = "component";
pub const CONNECTION_ID: &str = "connection_id";
pub const ENDPOINT: &str = "endpoint";

pub const TOPIC: &str = "topic";
pub const TARGET: &str = "target";
pub const ACTION: &str = "action";
pub const ATTEMPTED: &str = "attempted";
pub const PAYLOAD_KIND: &str = "payload_kind";
pub const PAYLOAD_SIZE: &str = "payload_size";

pub const STATE: &str = "state";
pub const REASON: &str = "reason";
pub const ERR: &str = "err";

pub const NONE: &str = "none";
pub const REASON_DERIVED_TARGET_MISSING: &str = "derived_target_missing";
pub const REASON_EXPLICIT_TARGET_MISSING: &str = "explicit_target_missing";
pub const REASON_SUBSCRIBE_ROLLBACK: &str = "rollback_after_subscribe_failure";
pub const REASON_SHUTDOWN_REQUESTED: &str = "shutdown_requested";
pub const REASON_COMMAND_CHANNEL_CLOSED: &str = "command_channel_closed";

/// JSON type of a payload, for log correlation without dumping the body.
pub fn format_payload_kind(payload: &Payload) -> &'static str {
    match payload {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Element count for containers, byte length for strings, 1 otherwise.
pub fn format_payload_size(payload: &Payload) -> usize {
    match payload {
        Value::Null => 0,
        Value::String(text) => text.len(),
        Value::Array(items) => items.len(),
        Value::Object(entries) => entries.len(),
        Value::Bool(_) | Value::Number(_) => 1,
    }
}

pub fn format_optional(value: Option<&str>) -> &str {
    value.unwrap_or(NONE)
}

pub fn format_attempted(attempted: &[String]) -> String {
    attempted.join(" -> ")
}
