/// Time-left computation for exam events
pub mod countdown;
/// HTTP health endpoints
pub mod health;
/// Per-minute reminder delivery
pub mod reminder;
/// Reminder rules and the due check
pub mod scheduler;
/// Serialized, persisted rule changes
pub mod subscription;
