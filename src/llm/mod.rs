pub mod assistant;
pub mod client;
pub mod prompts;
pub mod types;
pub mod utils;

pub use assistant::*;
pub use client::*;
pub use types::*;
pub use utils::dump_rows;
pub use prompts::{INSIGHTS_TITLE, NEGATIVE_VALUES_TITLE};
