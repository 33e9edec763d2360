// Utility functions

pub mod logger;
pub mod template;
pub mod throttle;

pub use logger::*;
pub use template::{PromptTemplate, TemplateError};
pub use throttle::{GovernorThrottle, Throttle, Unthrottled};
