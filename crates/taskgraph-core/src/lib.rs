//! Taskgraph Core Types
//!
//! This crate provides the value types shared by the composed task DSL
//! parser and the graph tooling built on top of it:
//!
//! - **Graph**: The node/link representation consumed by graphical editors
//!   ([`graph::Graph`])
//! - **Descriptor**: The uniform `{message, range}` error shape reported
//!   at the tooling boundary ([`descriptor::Descriptor`])

pub mod descriptor;
pub mod graph;
