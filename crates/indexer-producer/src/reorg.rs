/// Rollback range `[max(0, tip - rollback_window + 1), tip]` for a reorg
/// observed at `tip`.
pub fn compute_rollback_range(tip: u64, rollback_window: u64) -> (u64, u64) {
    let from = tip.saturating_sub(rollback_window.saturating_sub(1));
    (from, tip)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorgOutcome {
    NoReorg,
    Recoverable { from_block: u64, to_block: u64 },
}
