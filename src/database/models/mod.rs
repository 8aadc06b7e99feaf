pub mod reminder_rule;
pub mod study;
pub mod subscriber;

pub use reminder_rule::*;
pub use study::*;
pub use subscriber::*;
