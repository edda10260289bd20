/// Engine tunables; the walletd binary fills these from CLI arguments.
#[derive(Debug, Clone)]
pub struct Config {
    /// Block records older than tip height minus this are pruned.
    pub prune_depth: u32,
    /// Maximum height span per address-history query during import.
    pub import_chunk_size: u32,
    /// Expected address count used to size new bloom filters.
    pub filter_capacity: u32,
    /// Target bloom false-positive rate.
    pub filter_fpr: f64,
    /// Wallet record cache entries.
    pub wallet_cache_size: usize,
    /// Queued tasks beyond this are rejected immediately.
    pub queue_bound: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prune_depth: 288,
            import_chunk_size: 5_000,
            filter_capacity: 10_000,
            filter_fpr: 0.0001,
            wallet_cache_size: 1_024,
            queue_bound: 1_000,
        }
    }
}
