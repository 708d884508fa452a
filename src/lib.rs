#![allow(clippy::len_without_is_empty)]

//! # Overview
//! keyframe_dedup_lib finds near-duplicate videos (re-exports, trimmed copies, re-encodes) by
//! comparing perceptual fingerprints of their sampled keyframes, rather than their bytes.
//!
//! # How it works
//! * Each keyframe is reduced to a 64 bit [Fingerprint]: the frame is resampled to 32x32,
//!   converted to luminance, and the signs of its 8x8 lowest [discrete cosine transform](http://hackerfactor.com/blog/index.php%3F/archives/432-Looks-Like-It.html)
//!   coefficients relative to their median become the bits. This discards colour, brightness,
//!   scale and fine texture, and keeps coarse structure.
//! * Two videos are compared by counting every pair of their fingerprints that lie within a
//!   hamming distance threshold ([is_duplicate]).
//! * The videos of a batch are grouped greedily in a stable order ([cluster]).
//!
//! # High Level API
//! Sample keyframes of every video into its own directory (one directory per video, named after
//! the video), then point [find_duplicates] at the parent directory:
//! ```rust,no_run
//! use keyframe_dedup_lib::{find_duplicates, PipelineCfg};
//!
//! let report = find_duplicates("input/keyframes", &PipelineCfg::default()).unwrap();
//! for group in report.groups() {
//!     for dup in group.duplicates() {
//!         println!("{} duplicates {}", dup, group.root());
//!     }
//! }
//! for skipped in report.skipped() {
//!     println!("not checked: {} ({})", skipped.asset_id(), skipped.reason());
//! }
//! report.groups().write_json("duplicates.json").unwrap();
//! ```
//!
//! The lower layers are available individually: [fingerprint] / [fingerprint_path] for single
//! frames, [is_duplicate] for two sets of fingerprints, and [cluster] for a map of fingerprint
//! sets that were produced elsewhere.
//!
//! # Limitations
//! Grouping is greedy: once a video has been claimed as a duplicate it is not compared again.
//! Because similarity is not transitive, the groups can depend on processing order.
//! [ClusterPolicy::Transitive] groups by the transitive closure instead, at the cost of
//! comparing every pair.
//!
//! Decoding video is not part of this library. Keyframes must already be still images in a
//! format the `image` crate can read.

#[macro_use]
extern crate log;

pub(crate) mod dct_hasher;
pub(crate) mod definitions;
pub(crate) mod pipeline;
pub(crate) mod utils;
pub(crate) mod video_hashing;

pub use dct_hasher::{fingerprint, fingerprint_path};
pub use definitions::{DEFAULT_DISTANCE_THRESHOLD, DEFAULT_MATCH_RATIO, DEFAULT_MAX_IN_FLIGHT, FINGERPRINT_BITS};
pub use pipeline::*;
pub use video_hashing::{
    distance::{is_duplicate, match_ratio, MatchCfg},
    error_kinds::*,
    fingerprint::Fingerprint,
    matches::duplicate_groups::{DuplicateGroup, DuplicateGroups, GroupsIoErrorKind},
    video_dup_finder::*,
};

#[doc(hidden)]
pub use video_hashing::fingerprint::test_util;
