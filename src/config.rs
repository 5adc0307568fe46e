use serde::Serialize;

use crate::clock::DEFAULT_RESET_CYCLES;
use crate::strobe::StrobeCoverage;
use crate::transaction::DEFAULT_MAX_HANDSHAKE_CYCLES;

/// Clock cycles a run may start iterations in when no budget is given.
pub const DEFAULT_CYCLE_BUDGET: u64 = 2000;

/// Idle clock cycles between two iterations.
pub const DEFAULT_IDLE_CYCLES: u32 = 10;

/// When a verification run stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunBudget {
    /// Start new iterations while fewer than this many clock cycles have elapsed.
    Cycles(u64),
    /// Run exactly this many write/read iterations.
    Iterations(u64),
}

impl Default for RunBudget {
    fn default() -> Self {
        RunBudget::Cycles(DEFAULT_CYCLE_BUDGET)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunConfig {
    pub budget: RunBudget,
    pub seed: u64,
    pub reset_cycles: u32,
    pub max_handshake_cycles: u32,
    /// Clock cycles stepped with the bus idle between iterations.
    pub idle_cycles: u32,
    pub strobe_coverage: StrobeCoverage,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            budget: RunBudget::default(),
            seed: 0,
            reset_cycles: DEFAULT_RESET_CYCLES,
            max_handshake_cycles: DEFAULT_MAX_HANDSHAKE_CYCLES,
            idle_cycles: DEFAULT_IDLE_CYCLES,
            strobe_coverage: StrobeCoverage::default(),
        }
    }
}
