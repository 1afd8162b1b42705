//! Route handlers. Each one extracts path/query/body, calls the Api and
//! renders JSON; errors convert through `ApiError: IntoResponse`.

pub mod docs;
pub mod groups;
pub mod timers;
