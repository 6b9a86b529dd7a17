//! Shared helpers: text normalization/casing and the clock abstraction

pub mod text;
pub mod time;

pub use text::{is_blank, normalize, to_title_words, to_upper_words};
pub use time::{Clock, ManualClock, SystemClock};
