pub mod comment_record;
pub mod dataset;
pub mod target;

pub use comment_record::*;
pub use dataset::{Cell, Dataset};
pub use target::*;
