//! Conversions between parsed definitions and task graphs.

mod check;
mod generate;
mod index;
mod synthesize;

pub use check::check;
pub use generate::to_dsl_text;
pub use synthesize::to_graph;
