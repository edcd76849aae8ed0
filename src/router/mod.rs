//! Method and path routing.
//!
//! A [`Router`] is built once, before serving begins, and is read-only
//! afterwards. Lookups are pure: the first registered route whose method
//! and [`PathTemplate`] match wins.

mod error;
mod template;
mod table;
mod tests;

// Re-export public items
pub use error::Error;
pub use template::PathTemplate;
pub use table::{Route, RouteMatch, Router, RouterBuilder};
