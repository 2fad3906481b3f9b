//! Parsing helpers shared by the listing, metrics and section modules.

#[cfg(feature = "sections")]
pub mod textblock;
pub mod utils;
