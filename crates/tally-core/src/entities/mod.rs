//! Entity structs for Tally domain objects.
//!
//! Each entity maps to a table in the task database. All structs derive
//! `Serialize` and `Deserialize` for the JSON API.

mod task;

pub use task::Task;
