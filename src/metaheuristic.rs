pub mod aco;
mod solution;

pub use aco::Optimizer;
pub use solution::{Route, UNREACHABLE};
