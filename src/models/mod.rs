pub mod record;
pub mod verdict;

pub use record::*;
pub use verdict::*;
