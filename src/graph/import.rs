mod error;
mod sop;

pub use error::ImportError;
pub use sop::{parse_sop, read_sop, Bounds, Problem};
