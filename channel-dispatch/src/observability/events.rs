//! Canonical structured event names used across `channel-dispatch`.

// Handler resolution events.
pub const HANDLER_RESOLVED: &str = "handler_resolved";
pub const HANDLER_FALLBACK: &str = "handler_fallback";
pub const HANDLER_UNRESOLVED: &str = "handler_unresolved";
pub const HANDLER_REGISTERED: &str = "handler_registered";
pub const HANDLER_REPLACED: &str = "handler_replaced";
pub const DEFAULT_HANDLER_DROP: &str = "default_handler_drop";

// Lifecycle events.
pub const DISPATCH_START_REQUEST: &str = "dispatch_start_request";
pub const DISPATCH_START_REJECTED: &str = "dispatch_start_rejected";
pub const DISPATCH_STOP_REQUEST: &str = "dispatch_stop_request";
pub const DISPATCH_STOP_REJECTED: &str = "dispatch_stop_rejected";
pub const DISPATCH_STOP_OK: &str = "dispatch_stop_ok";
pub const DISPATCH_HANDLE_DROPPED: &str = "dispatch_handle_dropped";

// Connection events.
pub const CONNECT_START: &str = "connect_start";
pub const CONNECT_OK: &str = "connect_ok";
pub const CONNECT_FAILED: &str = "connect_failed";
pub const CONNECT_CANCELLED: &str = "connect_cancelled";
pub const SUBSCRIBE_OK: &str = "subscribe_ok";
pub const SUBSCRIBE_FAILED: &str = "subscribe_failed";
pub const DISCONNECT_OK: &str = "disconnect_ok";
pub const DISCONNECT_FAILED: &str = "disconnect_failed";

// Data path events.
pub const MESSAGE_RECEIVED: &str = "message_received";
pub const PUBLISH_FORWARD: &str = "publish_forward";
pub const PUBLISH_FAILED: &str = "publish_failed";
pub const PUBLISH_HANDOFF_FAILED: &str = "publish_handoff_failed";

// Runtime events.
pub const RUNTIME_THREAD_NAME_FALLBACK: &str = "runtime_thread_name_fallback";
pub const RUNTIME_SPAWN_START: &str = "runtime_spawn_start";
pub const RUNTIME_SPAWN_OK: &str = "runtime_spawn_ok";
pub const RUNTIME_SPAWN_FAILED: &str = "runtime_spawn_failed";
pub const RUNTIME_BUILD_FAILED: &str = "runtime_build_failed";
pub const RUNTIME_JOIN_FAILED: &str = "runtime_join_failed";
