pub mod console;
pub mod json;
pub mod summary;

pub use summary::{Delimiter, SummaryWriter, SUMMARY_HEADER};
