use tracing::{debug, error, info, warn};

/// Logs command start with consistent format
pub fn log_command_start(command: &str, user: &str, chat_id: i64, details: Option<&str>) {
    match details {
        Some(d) => info!("CMD_START: {} by {} in chat {} - {}", command, user, chat_id, d),
        None => info!("CMD_START: {} by {} in chat {}", command, user, chat_id),
    }
}

/// Logs command completion with consistent format
pub fn log_command_success(command: &str, chat_id: i64, details: Option<&str>) {
    match details {
        Some(d) => info!("CMD_SUCCESS: {} in chat {} - {}", command, chat_id, d),
        None => info!("CMD_SUCCESS: {} in chat {}", command, chat_id),
    }
}

/// Logs command errors with consistent format
pub fn log_command_error(command: &str, chat_id: i64, error: &str) {
    error!("CMD_ERROR: {} in chat {} - {}", command, chat_id, error);
}

/// Logs rejected user input
pub fn log_validation_error(command: &str, value: &str, error: &str, chat_id: i64) {
    warn!(
        "VALIDATION_ERROR: {} - input '{}' invalid: {} - chat {}",
        command, value, error, chat_id
    );
}

/// Logs database operations with consistent format
pub fn log_database_operation(operation: &str, table: &str, details: Option<&str>) {
    match details {
        Some(d) => debug!("DB_OP: {} on {} - {}", operation, table, d),
        None => debug!("DB_OP: {} on {}", operation, table),
    }
}

/// Logs database errors with consistent format
pub fn log_database_error(operation: &str, table: &str, error: &str, details: Option<&str>) {
    match details {
        Some(d) => error!("DB_ERROR: {} on {} failed: {} - {}", operation, table, error, d),
        None => error!("DB_ERROR: {} on {} failed: {}", operation, table, error),
    }
}

/// Logs the outcome of one reminder firing
pub fn log_reminder_dispatch(subscriber_id: i64, exams: &str, outcome: Result<(), &str>) {
    match outcome {
        Ok(()) => info!("REMINDER: sent to {} for [{}]", subscriber_id, exams),
        Err(e) => error!("REMINDER: delivery to {} for [{}] failed: {}", subscriber_id, exams, e),
    }
}

/// Logs system events with consistent format
pub fn log_system_event(event: &str, details: Option<&str>) {
    match details {
        Some(d) => info!("SYSTEM: {} - {}", event, d),
        None => info!("SYSTEM: {}", event),
    }
}
