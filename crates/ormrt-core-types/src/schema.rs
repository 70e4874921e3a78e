//! Canonical schema constants for structured logging
//!
//! These constants keep field names identical across every emitter.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";

// Bulk operations
pub const FIELD_BATCH_ID: &str = "batch_id";
pub const FIELD_POSITION: &str = "position";
pub const FIELD_ATTEMPTED: &str = "attempted";
pub const FIELD_FAILED: &str = "failed";
pub const FIELD_FATAL: &str = "fatal";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
