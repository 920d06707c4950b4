pub mod journal;
pub mod trade;

pub use journal::*;
pub use trade::*;
