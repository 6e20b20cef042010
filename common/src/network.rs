//! Network-level vocabulary: addresses, ranges, targets and host evidence.

pub mod host;
pub mod interface;
pub mod range;
pub mod target;
