// Frame definitions (pre hashing)
pub const RESIZE_IMAGE_X: u32 = 32;
pub const RESIZE_IMAGE_Y: u32 = 32;

// Fingerprint definitions
pub const HASH_IMAGE_X: usize = 8;
pub const HASH_IMAGE_Y: usize = 8;
pub const FINGERPRINT_BITS: usize = HASH_IMAGE_X * HASH_IMAGE_Y;

// Comparison defaults. The distance threshold is counted in bits out of FINGERPRINT_BITS.
pub const DEFAULT_DISTANCE_THRESHOLD: u32 = 5;
pub const DEFAULT_MATCH_RATIO: f64 = 0.5;

// Pipeline defaults
pub const DEFAULT_MAX_IN_FLIGHT: usize = 100;
pub const DEFAULT_FRAME_EXT: &str = "jpg";
