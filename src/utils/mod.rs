/// Date display helpers
pub mod datetime;
/// Uniform chat replies
pub mod feedback;
/// Persian calendar conversion
pub mod jalali;
/// Consistent log line formats
pub mod logging;
/// MarkdownV2 escaping
pub mod markdown;
/// Parsing and validation of user input
pub mod validation;
