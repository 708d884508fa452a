pub mod disjoint_set;
pub mod distance;
pub mod error_kinds;
pub mod fingerprint;
pub mod matches;
pub mod search;
pub mod video_dup_finder;
