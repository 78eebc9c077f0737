pub mod catalogue;
pub mod language;
pub mod unit;

pub use catalogue::*;
pub use language::*;
pub use unit::*;
