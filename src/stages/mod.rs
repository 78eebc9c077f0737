pub mod stage1_format;
pub mod stage2_refine;
pub mod stage3_parse;

pub use stage1_format::*;
pub use stage2_refine::*;
pub use stage3_parse::*;
