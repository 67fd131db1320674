//! Store tuning options

/// Default per-fid message cap enforced by the pruner
pub const DEFAULT_PRUNE_SIZE_LIMIT: usize = 10_000;

/// Configuration for a single per-message-type store
///
/// # Example
///
/// ```
/// use hubdb_store::StoreOptions;
///
/// let options = StoreOptions {
///     prune_time_limit: Some(60 * 60 * 24), // one day
///     ..Default::default()
/// };
/// assert_eq!(options.prune_size_limit, 10_000);
/// ```
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Maximum number of messages retained per fid; the pruner evicts
    /// the earliest messages beyond this count
    pub prune_size_limit: usize,

    /// Maximum message age in seconds, if set; the pruner evicts
    /// messages older than this regardless of count
    pub prune_time_limit: Option<u32>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            prune_size_limit: DEFAULT_PRUNE_SIZE_LIMIT,
            prune_time_limit: None,
        }
    }
}
