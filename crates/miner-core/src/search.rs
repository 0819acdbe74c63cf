//! Bounded nonce search.
//!
//! Candidates are scanned in ascending order over a half-open range that is
//! split into fixed-size chunks. Chunks are the unit of work for rayon; the
//! stop signal is polled every `check_interval` candidates inside a chunk.

use crate::constants::{
    DEFAULT_CHECK_INTERVAL, DEFAULT_CHUNK_SIZE, DEFAULT_PARTITION, DEFAULT_SEARCH_END,
    DEFAULT_SEARCH_START, NONCE_TOKEN_LEN,
};
use crate::error::{MinerError, Result};
use crate::session::Payload;
use crate::target::DifficultyTarget;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Hashes `payload || decimal(nonce)` into lowercase hex.
///
/// `absorb` runs once per search so implementations can keep a midstate.
pub trait CandidateHasher: Sync {
    type Prefix: Sync;

    fn absorb(&self, payload: &[u8]) -> Self::Prefix;

    fn digest_hex(&self, prefix: &Self::Prefix, nonce: u64) -> String;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Sha256Hasher;

impl CandidateHasher for Sha256Hasher {
    type Prefix = Sha256;

    fn absorb(&self, payload: &[u8]) -> Sha256 {
        let mut hasher = Sha256::new();
        hasher.update(payload);
        hasher
    }

    fn digest_hex(&self, prefix: &Sha256, nonce: u64) -> String {
        let mut buf = [0u8; 20];
        let mut hasher = prefix.clone();
        hasher.update(decimal(nonce, &mut buf));
        hex::encode(hasher.finalize())
    }
}

fn decimal(mut n: u64, buf: &mut [u8; 20]) -> &[u8] {
    let mut i = buf.len();
    loop {
        i -= 1;
        buf[i] = b'0' + (n % 10) as u8;
        n /= 10;
        if n == 0 {
            break;
        }
    }
    &buf[i..]
}

/// Half-open nonce range `[start, end)`.
///
/// The range is viewed as consecutive partitions of `partition` nonces; the
/// first nonce of every partition (`n % partition == 0`, which includes 0
/// itself) is never evaluated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchSpace {
    pub start: u64,
    pub end: u64,
    pub partition: u64,
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self {
            start: DEFAULT_SEARCH_START,
            end: DEFAULT_SEARCH_END,
            partition: DEFAULT_PARTITION,
        }
    }
}

impl SearchSpace {
    pub fn new(start: u64, end: u64) -> Self {
        Self {
            start,
            end,
            partition: DEFAULT_PARTITION,
        }
    }

    pub fn with_partition(mut self, partition: u64) -> Self {
        self.partition = partition;
        self
    }

    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_skipped(&self, nonce: u64) -> bool {
        nonce % self.partition == 0
    }

    /// Nonces of `range` that will actually be hashed, ascending.
    pub fn candidates_in(&self, range: Range<u64>) -> impl Iterator<Item = u64> {
        let space = *self;
        range.filter(move |n| !space.is_skipped(*n))
    }

    pub fn chunk_count(&self, chunk_size: u64) -> u64 {
        self.len().div_ceil(chunk_size)
    }

    pub fn chunk(&self, index: u64, chunk_size: u64) -> Range<u64> {
        let start = self.start + index * chunk_size;
        start..start.saturating_add(chunk_size).min(self.end)
    }

    fn validate(&self) -> Result<()> {
        if self.partition == 0 {
            return Err(MinerError::InvalidConfig("partition must be non-zero".into()));
        }
        if self.start > self.end {
            return Err(MinerError::InvalidConfig(format!(
                "search start {} is past end {}",
                self.start, self.end
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchMode {
    /// One thread, ascending.
    Sequential,
    /// Worker pool; still returns the lowest satisfying nonce.
    #[default]
    Parallel,
    /// Worker pool; returns whichever satisfying nonce is found first.
    /// Not reproducible across runs.
    ParallelAny,
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchMode::Sequential => write!(f, "sequential"),
            SearchMode::Parallel => write!(f, "parallel"),
            SearchMode::ParallelAny => write!(f, "parallel-any"),
        }
    }
}

impl FromStr for SearchMode {
    type Err = MinerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sequential" => Ok(SearchMode::Sequential),
            "parallel" => Ok(SearchMode::Parallel),
            "parallel-any" => Ok(SearchMode::ParallelAny),
            other => Err(MinerError::InvalidConfig(format!(
                "unknown search mode {other:?} (expected sequential, parallel or parallel-any)"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    pub space: SearchSpace,
    pub mode: SearchMode,
    /// Dedicated pool size; `None` uses rayon's global pool.
    pub threads: Option<usize>,
    pub chunk_size: u64,
    pub check_interval: u64,
    pub timeout_ms: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            space: SearchSpace::default(),
            mode: SearchMode::default(),
            threads: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            check_interval: DEFAULT_CHECK_INTERVAL,
            timeout_ms: None,
        }
    }
}

impl SearchConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<()> {
        self.space.validate()?;
        if self.chunk_size == 0 {
            return Err(MinerError::InvalidConfig("chunk_size must be non-zero".into()));
        }
        if self.check_interval == 0 {
            return Err(MinerError::InvalidConfig(
                "check_interval must be non-zero".into(),
            ));
        }
        if self.threads == Some(0) {
            return Err(MinerError::InvalidConfig("threads must be non-zero".into()));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchStatus {
    Found,
    /// Whole range scanned without a match.
    Exhausted,
    TimedOut,
    Cancelled,
}

impl fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchStatus::Found => write!(f, "found"),
            SearchStatus::Exhausted => write!(f, "exhausted"),
            SearchStatus::TimedOut => write!(f, "timed out"),
            SearchStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MiningResult {
    status: SearchStatus,
    nonce: Option<u64>,
    accepted_digest: Option<String>,
    nonce_token: Option<String>,
    #[serde(rename = "elapsed_seconds", serialize_with = "serialize_secs")]
    elapsed: Duration,
    candidates_tested: u64,
}

fn serialize_secs<S: Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

impl MiningResult {
    fn new(status: SearchStatus, hit: Option<Hit>, elapsed: Duration, tested: u64) -> Self {
        let (nonce, accepted_digest) = match hit {
            Some(Hit { nonce, digest }) => (Some(nonce), Some(digest)),
            None => (None, None),
        };
        let nonce_token = accepted_digest
            .as_deref()
            .map(|d| d.chars().take(NONCE_TOKEN_LEN).collect());
        Self {
            status,
            nonce,
            accepted_digest,
            nonce_token,
            elapsed,
            candidates_tested: tested,
        }
    }

    pub fn status(&self) -> SearchStatus {
        self.status
    }

    pub fn is_found(&self) -> bool {
        self.status == SearchStatus::Found
    }

    pub fn nonce(&self) -> Option<u64> {
        self.nonce
    }

    pub fn accepted_digest(&self) -> Option<&str> {
        self.accepted_digest.as_deref()
    }

    /// Leading hex characters of the accepted digest, used as a short proof.
    pub fn nonce_token(&self) -> Option<&str> {
        self.nonce_token.as_deref()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    pub fn candidates_tested(&self) -> u64 {
        self.candidates_tested
    }

    /// Hashes per second over the whole search.
    pub fn hash_rate(&self) -> f64 {
        let secs = self.elapsed_seconds();
        if secs > 0.0 {
            self.candidates_tested as f64 / secs
        } else {
            0.0
        }
    }
}

#[derive(Debug)]
struct Hit {
    nonce: u64,
    digest: String,
}

/// Signals shared by every worker of one search.
struct Control<'a> {
    stop: AtomicBool,
    lowest: AtomicU64,
    tested: AtomicU64,
    timed_out: AtomicBool,
    cancelled: AtomicBool,
    deadline: Option<Instant>,
    cancel: &'a AtomicBool,
}

impl<'a> Control<'a> {
    fn new(deadline: Option<Instant>, cancel: &'a AtomicBool) -> Self {
        Self {
            stop: AtomicBool::new(false),
            lowest: AtomicU64::new(u64::MAX),
            tested: AtomicU64::new(0),
            timed_out: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            deadline,
            cancel,
        }
    }

    /// `chunk_start` is set for ordered scans: a chunk lying entirely above
    /// an already-found nonce cannot improve the answer.
    fn should_stop(&self, chunk_start: Option<u64>) -> bool {
        if self.stop.load(Ordering::Relaxed) {
            return true;
        }
        if self.cancel.load(Ordering::Relaxed) {
            self.cancelled.store(true, Ordering::Relaxed);
            self.stop.store(true, Ordering::Relaxed);
            return true;
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            self.timed_out.store(true, Ordering::Relaxed);
            self.stop.store(true, Ordering::Relaxed);
            return true;
        }
        chunk_start.is_some_and(|s| self.lowest.load(Ordering::Relaxed) < s)
    }

    fn record(&self, nonce: u64, halt: bool) {
        self.lowest.fetch_min(nonce, Ordering::Relaxed);
        if halt {
            self.stop.store(true, Ordering::Relaxed);
        }
    }
}

/// Scans a [`SearchSpace`] for the first nonce whose digest satisfies a
/// [`DifficultyTarget`].
pub struct NonceSearchEngine<H = Sha256Hasher> {
    config: SearchConfig,
    hasher: H,
    pool: Option<ThreadPool>,
}

impl NonceSearchEngine<Sha256Hasher> {
    pub fn new(config: SearchConfig) -> Result<Self> {
        Self::with_hasher(config, Sha256Hasher)
    }
}

impl<H: CandidateHasher> NonceSearchEngine<H> {
    pub fn with_hasher(config: SearchConfig, hasher: H) -> Result<Self> {
        config.validate()?;
        let pool = match (config.mode, config.threads) {
            (SearchMode::Sequential, _) | (_, None) => None,
            (_, Some(n)) => Some(
                ThreadPoolBuilder::new()
                    .num_threads(n)
                    .thread_name(|i| format!("nonce-search-{i}"))
                    .build()?,
            ),
        };
        Ok(Self {
            config,
            hasher,
            pool,
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    pub fn search(&self, payload: &Payload, target: &DifficultyTarget) -> MiningResult {
        let never = AtomicBool::new(false);
        self.search_with_cancel(payload, target, &never)
    }

    /// Like [`search`](Self::search), but stops promptly once `cancel` is set.
    ///
    /// If a timeout or cancellation lands after a parallel search has already
    /// found a nonce, the lowest nonce found so far is returned.
    pub fn search_with_cancel(
        &self,
        payload: &Payload,
        target: &DifficultyTarget,
        cancel: &AtomicBool,
    ) -> MiningResult {
        let started = Instant::now();
        let prefix = self.hasher.absorb(payload.as_bytes());
        let ctl = Control::new(self.config.timeout().map(|t| started + t), cancel);

        let hit = match self.config.mode {
            SearchMode::Sequential => self.scan_sequential(&prefix, target, &ctl),
            SearchMode::Parallel => {
                self.install(|| self.scan_parallel_lowest(&prefix, target, &ctl))
            }
            SearchMode::ParallelAny => {
                self.install(|| self.scan_parallel_any(&prefix, target, &ctl))
            }
        };

        let elapsed = started.elapsed();
        let status = if hit.is_some() {
            SearchStatus::Found
        } else if ctl.cancelled.load(Ordering::Relaxed) {
            SearchStatus::Cancelled
        } else if ctl.timed_out.load(Ordering::Relaxed) {
            warn!(?elapsed, "nonce search timed out");
            SearchStatus::TimedOut
        } else {
            SearchStatus::Exhausted
        };

        MiningResult::new(status, hit, elapsed, ctl.tested.load(Ordering::Relaxed))
    }

    fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    fn scan_sequential(
        &self,
        prefix: &H::Prefix,
        target: &DifficultyTarget,
        ctl: &Control<'_>,
    ) -> Option<Hit> {
        let chunk_size = self.config.chunk_size;
        for i in 0..self.config.space.chunk_count(chunk_size) {
            let chunk = self.config.space.chunk(i, chunk_size);
            if let Some(hit) = self.scan_chunk(prefix, target, chunk, ctl, false, true) {
                return Some(hit);
            }
            if ctl.stop.load(Ordering::Relaxed) {
                break;
            }
        }
        None
    }

    fn scan_parallel_lowest(
        &self,
        prefix: &H::Prefix,
        target: &DifficultyTarget,
        ctl: &Control<'_>,
    ) -> Option<Hit> {
        let chunk_size = self.config.chunk_size;
        let space = self.config.space;
        (0..space.chunk_count(chunk_size))
            .into_par_iter()
            .filter_map(|i| {
                let chunk = space.chunk(i, chunk_size);
                self.scan_chunk(prefix, target, chunk, ctl, true, false)
            })
            .min_by_key(|hit| hit.nonce)
    }

    fn scan_parallel_any(
        &self,
        prefix: &H::Prefix,
        target: &DifficultyTarget,
        ctl: &Control<'_>,
    ) -> Option<Hit> {
        let chunk_size = self.config.chunk_size;
        let space = self.config.space;
        (0..space.chunk_count(chunk_size))
            .into_par_iter()
            .find_map_any(|i| {
                let chunk = space.chunk(i, chunk_size);
                self.scan_chunk(prefix, target, chunk, ctl, false, true)
            })
    }

    fn scan_chunk(
        &self,
        prefix: &H::Prefix,
        target: &DifficultyTarget,
        chunk: Range<u64>,
        ctl: &Control<'_>,
        ordered: bool,
        halt_on_hit: bool,
    ) -> Option<Hit> {
        let chunk_start = ordered.then_some(chunk.start);
        let mut until_check = 0u64;
        let mut tested = 0u64;
        let mut hit = None;

        for nonce in self.config.space.candidates_in(chunk) {
            if until_check == 0 {
                if ctl.should_stop(chunk_start) {
                    break;
                }
                until_check = self.config.check_interval;
            }
            until_check -= 1;

            let digest = self.hasher.digest_hex(prefix, nonce);
            tested += 1;
            if target.matches(&digest) {
                debug!(nonce, %digest, "candidate accepted");
                ctl.record(nonce, halt_on_hit);
                hit = Some(Hit { nonce, digest });
                break;
            }
        }

        ctl.tested.fetch_add(tested, Ordering::Relaxed);
        hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{sha256_hex, Session};
    use std::sync::Mutex;

    /// Real SHA-256, but remembers every nonce it was asked to hash.
    #[derive(Default)]
    struct RecordingHasher {
        seen: Mutex<Vec<u64>>,
    }

    impl RecordingHasher {
        fn seen(&self) -> Vec<u64> {
            let mut seen = self.seen.lock().unwrap().clone();
            seen.sort_unstable();
            seen
        }
    }

    impl CandidateHasher for RecordingHasher {
        type Prefix = Vec<u8>;

        fn absorb(&self, payload: &[u8]) -> Vec<u8> {
            payload.to_vec()
        }

        fn digest_hex(&self, prefix: &Vec<u8>, nonce: u64) -> String {
            self.seen.lock().unwrap().push(nonce);
            let mut bytes = prefix.clone();
            bytes.extend_from_slice(nonce.to_string().as_bytes());
            sha256_hex(bytes)
        }
    }

    fn payload() -> Payload {
        Session::new(DifficultyTarget::from_ticker("BTC").unwrap())
            .with_transaction("alice", "bob", "100")
            .unwrap()
            .payload()
            .unwrap()
    }

    fn config(mode: SearchMode, start: u64, end: u64) -> SearchConfig {
        SearchConfig {
            space: SearchSpace::new(start, end),
            mode,
            chunk_size: 1_000,
            ..SearchConfig::default()
        }
    }

    fn digest_of(payload: &Payload, nonce: u64) -> String {
        let mut bytes = payload.as_bytes().to_vec();
        bytes.extend_from_slice(nonce.to_string().as_bytes());
        sha256_hex(bytes)
    }

    #[test]
    fn decimal_examples() {
        let mut buf = [0u8; 20];
        assert_eq!(decimal(0, &mut buf), b"0");
        assert_eq!(decimal(7, &mut buf), b"7");
        assert_eq!(decimal(1_000_000_000, &mut buf), b"1000000000");
        assert_eq!(decimal(u64::MAX, &mut buf), u64::MAX.to_string().as_bytes());
    }

    #[test]
    fn sha256_hasher_appends_decimal_nonce() {
        let hasher = Sha256Hasher;
        let prefix = hasher.absorb(b"abc");
        assert_eq!(hasher.digest_hex(&prefix, 123), sha256_hex("abc123"));
        // midstate is reusable across candidates
        assert_eq!(hasher.digest_hex(&prefix, 9), sha256_hex("abc9"));
    }

    #[test]
    fn nonce_zero_is_never_hashed() {
        let engine = NonceSearchEngine::with_hasher(
            config(SearchMode::Sequential, 0, 50),
            RecordingHasher::default(),
        )
        .unwrap();
        let result = engine.search(&payload(), &DifficultyTarget::from_prefix("x"));

        let seen = engine.hasher().seen();
        assert!(!seen.contains(&0));
        assert_eq!(seen, (1..50).collect::<Vec<_>>());
        assert_eq!(result.status(), SearchStatus::Exhausted);
        assert_eq!(result.candidates_tested(), 49);
    }

    #[test]
    fn partition_heads_are_skipped() {
        let mut cfg = config(SearchMode::Sequential, 0, 35);
        cfg.space = cfg.space.with_partition(10);
        cfg.chunk_size = 7;
        let engine = NonceSearchEngine::with_hasher(cfg, RecordingHasher::default()).unwrap();
        let result = engine.search(&payload(), &DifficultyTarget::from_prefix("x"));

        let seen = engine.hasher().seen();
        for skipped in [0, 10, 20, 30] {
            assert!(!seen.contains(&skipped));
        }
        assert_eq!(seen.len(), 31);
        assert_eq!(result.candidates_tested(), 31);
    }

    #[test]
    fn parallel_never_hashes_zero() {
        let mut cfg = config(SearchMode::Parallel, 0, 5_000);
        cfg.chunk_size = 100;
        cfg.threads = Some(3);
        let engine = NonceSearchEngine::with_hasher(cfg, RecordingHasher::default()).unwrap();
        let result = engine.search(&payload(), &DifficultyTarget::from_prefix("x"));

        assert_eq!(result.status(), SearchStatus::Exhausted);
        assert_eq!(engine.hasher().seen(), (1..5_000).collect::<Vec<_>>());
    }

    #[test]
    fn sequential_returns_first_match() {
        let payload = payload();
        let target = DifficultyTarget::from_prefix("0");
        let engine = NonceSearchEngine::new(config(SearchMode::Sequential, 0, 10_000)).unwrap();
        let result = engine.search(&payload, &target);

        assert!(result.is_found());
        let nonce = result.nonce().unwrap();
        let digest = result.accepted_digest().unwrap();
        assert_eq!(digest, digest_of(&payload, nonce));
        assert!(digest.starts_with('0'));
        assert_eq!(result.nonce_token(), Some(&digest[..8]));
        for earlier in 1..nonce {
            assert!(!target.matches(&digest_of(&payload, earlier)));
        }
        assert_eq!(result.candidates_tested(), nonce);
    }

    #[test]
    fn parallel_agrees_with_sequential() {
        let payload = payload();
        let target = DifficultyTarget::from_prefix("00");

        let sequential = NonceSearchEngine::new(config(SearchMode::Sequential, 0, 200_000))
            .unwrap()
            .search(&payload, &target);
        let mut cfg = config(SearchMode::Parallel, 0, 200_000);
        cfg.threads = Some(4);
        let parallel = NonceSearchEngine::new(cfg).unwrap().search(&payload, &target);

        assert!(sequential.is_found());
        assert_eq!(sequential.nonce(), parallel.nonce());
        assert_eq!(sequential.accepted_digest(), parallel.accepted_digest());
    }

    #[test]
    fn parallel_any_returns_a_valid_match() {
        let payload = payload();
        let target = DifficultyTarget::from_prefix("00");
        let mut cfg = config(SearchMode::ParallelAny, 0, 200_000);
        cfg.threads = Some(4);
        let result = NonceSearchEngine::new(cfg).unwrap().search(&payload, &target);

        assert!(result.is_found());
        let nonce = result.nonce().unwrap();
        assert_ne!(nonce, 0);
        assert_eq!(result.accepted_digest().unwrap(), digest_of(&payload, nonce));
        assert!(target.matches(result.accepted_digest().unwrap()));
    }

    #[test]
    fn parallel_modes_stop_after_hit() {
        let payload = payload();
        let target = DifficultyTarget::from_prefix("00");
        for mode in [SearchMode::Parallel, SearchMode::ParallelAny] {
            let cfg = SearchConfig {
                mode,
                threads: Some(4),
                timeout_ms: Some(30_000),
                ..SearchConfig::default()
            };
            let result = NonceSearchEngine::new(cfg).unwrap().search(&payload, &target);

            assert_eq!(result.status(), SearchStatus::Found, "{mode}");
            assert!(
                result.candidates_tested() < 1_000_000,
                "{mode} kept scanning: {} candidates",
                result.candidates_tested()
            );
            assert!(target.matches(result.accepted_digest().unwrap()));
        }
    }

    #[test]
    fn impossible_target_exhausts() {
        // longer than any digest
        let target = DifficultyTarget::from_prefix("0".repeat(65));
        for mode in [SearchMode::Sequential, SearchMode::Parallel, SearchMode::ParallelAny] {
            let result = NonceSearchEngine::new(config(mode, 0, 3_000))
                .unwrap()
                .search(&payload(), &target);
            assert_eq!(result.status(), SearchStatus::Exhausted, "{mode}");
            assert_eq!(result.nonce(), None);
            assert_eq!(result.accepted_digest(), None);
            assert_eq!(result.nonce_token(), None);
            assert_eq!(result.candidates_tested(), 2_999);
        }
    }

    #[test]
    fn empty_space_exhausts_immediately() {
        let result = NonceSearchEngine::new(config(SearchMode::Sequential, 42, 42))
            .unwrap()
            .search(&payload(), &DifficultyTarget::from_prefix(""));
        assert_eq!(result.status(), SearchStatus::Exhausted);
        assert_eq!(result.candidates_tested(), 0);
    }

    #[test]
    fn empty_prefix_accepts_first_candidate() {
        let result = NonceSearchEngine::new(config(SearchMode::Sequential, 0, 100))
            .unwrap()
            .search(&payload(), &DifficultyTarget::from_prefix(""));
        assert_eq!(result.nonce(), Some(1));
    }

    #[test]
    fn timeout_stops_search() {
        for mode in [SearchMode::Sequential, SearchMode::Parallel] {
            let cfg = SearchConfig {
                mode,
                timeout_ms: Some(20),
                threads: Some(2),
                ..SearchConfig::default()
            };
            let result = NonceSearchEngine::new(cfg)
                .unwrap()
                .search(&payload(), &DifficultyTarget::from_prefix("g"));
            assert_eq!(result.status(), SearchStatus::TimedOut, "{mode}");
            assert!(result.elapsed() >= Duration::from_millis(20));
            assert!(result.nonce().is_none());
        }
    }

    #[test]
    fn cancel_flag_stops_search() {
        let cancel = AtomicBool::new(true);
        let result = NonceSearchEngine::new(SearchConfig::default())
            .unwrap()
            .search_with_cancel(&payload(), &DifficultyTarget::from_prefix("g"), &cancel);
        assert_eq!(result.status(), SearchStatus::Cancelled);
        assert_eq!(result.candidates_tested(), 0);
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let bad = [
            SearchConfig {
                chunk_size: 0,
                ..SearchConfig::default()
            },
            SearchConfig {
                check_interval: 0,
                ..SearchConfig::default()
            },
            SearchConfig {
                threads: Some(0),
                ..SearchConfig::default()
            },
            SearchConfig {
                space: SearchSpace::new(10, 5),
                ..SearchConfig::default()
            },
            SearchConfig {
                space: SearchSpace::new(0, 5).with_partition(0),
                ..SearchConfig::default()
            },
        ];
        for cfg in bad {
            assert!(matches!(
                NonceSearchEngine::new(cfg),
                Err(MinerError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn chunking_covers_space() {
        let space = SearchSpace::new(5, 27);
        assert_eq!(space.chunk_count(10), 3);
        assert_eq!(space.chunk(0, 10), 5..15);
        assert_eq!(space.chunk(2, 10), 25..27);
        assert_eq!(SearchSpace::new(0, 0).chunk_count(10), 0);
    }

    #[test]
    fn default_space_geometry() {
        let space = SearchSpace::default();
        assert_eq!(space.len(), 10_000_000_000);
        assert!(space.is_skipped(0));
        assert!(space.is_skipped(100_000_000));
        assert!(!space.is_skipped(100_000_001));
        assert_eq!(space.candidates_in(0..4).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(
            space
                .candidates_in(99_999_999..100_000_002)
                .collect::<Vec<_>>(),
            vec![99_999_999, 100_000_001]
        );
    }

    #[test]
    fn mode_parse_and_display() {
        for mode in [SearchMode::Sequential, SearchMode::Parallel, SearchMode::ParallelAny] {
            assert_eq!(mode.to_string().parse::<SearchMode>().unwrap(), mode);
        }
        assert!("fastest".parse::<SearchMode>().is_err());
    }

    #[test]
    fn config_from_partial_json() {
        let cfg: SearchConfig =
            serde_json::from_str(r#"{"mode":"sequential","space":{"end":500},"timeout_ms":1000}"#)
                .unwrap();
        assert_eq!(cfg.mode, SearchMode::Sequential);
        assert_eq!(cfg.space.start, 0);
        assert_eq!(cfg.space.end, 500);
        assert_eq!(cfg.space.partition, DEFAULT_PARTITION);
        assert_eq!(cfg.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(cfg.timeout(), Some(Duration::from_secs(1)));

        assert!(serde_json::from_str::<SearchConfig>(r#"{"difficulty":3}"#).is_err());
    }

    #[test]
    fn result_serializes_for_reports() {
        let result = NonceSearchEngine::new(config(SearchMode::Sequential, 0, 100))
            .unwrap()
            .search(&payload(), &DifficultyTarget::from_prefix(""));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "found");
        assert_eq!(json["nonce"], 1);
        assert_eq!(json["candidates_tested"], 1);
        assert!(json["elapsed_seconds"].is_f64());
        assert_eq!(
            json["nonce_token"].as_str().unwrap(),
            &json["accepted_digest"].as_str().unwrap()[..8]
        );
    }
}
