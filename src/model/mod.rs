//! Model records and their ranking.

pub mod record;
pub mod score;

pub use record::{DEFAULT_CONTEXT_LENGTH, DEFAULT_TEMPERATURE, ModelRecord};
pub use score::score;
