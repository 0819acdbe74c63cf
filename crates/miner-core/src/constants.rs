pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
/// Block id stamped into every transaction segment.
pub const BLOCK_ID: &str = "000000001000";
pub const TARGET_WIDTH: usize = 8;
pub const NONCE_TOKEN_LEN: usize = 8;
pub const DEFAULT_SEARCH_START: u64 = 0;
pub const DEFAULT_SEARCH_END: u64 = 10_000_000_000;
pub const DEFAULT_PARTITION: u64 = 100_000_000;
pub const DEFAULT_CHUNK_SIZE: u64 = 1_000_000;
pub const DEFAULT_CHECK_INTERVAL: u64 = 1024;
