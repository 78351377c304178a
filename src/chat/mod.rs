//! Chat commands: intent classification, delete parsing and dispatch.

pub mod delete;
pub mod dispatcher;
pub mod intent;
pub mod routes;

pub use delete::DeleteCommand;
pub use dispatcher::{DispatchLimits, Dispatcher};
pub use intent::{Intent, classify};
