pub mod position;
pub mod valuation;

pub use position::*;
pub use valuation::*;
