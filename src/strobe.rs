use std::fmt;

use rand::Rng;
use serde::Serialize;

/// Per-lane write enable for a 32-bit word. Bit `i` gates bits `[8i, 8i + 8)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ByteStrobe(u8);

impl ByteStrobe {
    pub const NONE: ByteStrobe = ByteStrobe(0x0);
    pub const FULL: ByteStrobe = ByteStrobe(0xF);

    /// Bits above the four lanes are dropped.
    pub fn new(bits: u8) -> Self {
        ByteStrobe(bits & 0xF)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn lane_enabled(self, lane: u32) -> bool {
        lane < 4 && self.0 & (1 << lane) != 0
    }

    /// Expand to a word mask with `0xFF` in every enabled lane.
    pub fn lane_mask(self) -> u32 {
        (0..4)
            .filter(|&lane| self.lane_enabled(lane))
            .fold(0, |mask, lane| mask | (0xFF << (lane * 8)))
    }
}

impl fmt::Display for ByteStrobe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06b}", self.0)
    }
}

/// Which byte lanes the randomized driver exercises.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StrobeCoverage {
    /// Full 4-bit strobe and 32-bit data.
    #[default]
    AllLanes,
    /// Strobe drawn from `[0, 7]` with 24-bit data, so lane 3 is never written.
    LowerThreeLanes,
}

impl StrobeCoverage {
    /// Lanes this coverage mode can ever enable.
    pub fn data_mask(self) -> u32 {
        match self {
            StrobeCoverage::AllLanes => 0xFFFF_FFFF,
            StrobeCoverage::LowerThreeLanes => 0x00FF_FFFF,
        }
    }

    pub fn random_strobe<R: Rng + ?Sized>(self, rng: &mut R) -> ByteStrobe {
        match self {
            StrobeCoverage::AllLanes => ByteStrobe::new(rng.gen_range(0..=0xF)),
            StrobeCoverage::LowerThreeLanes => ByteStrobe::new(rng.gen_range(0..=0x7)),
        }
    }

    pub fn random_data<R: Rng + ?Sized>(self, rng: &mut R) -> u32 {
        rng.gen_range(0..=self.data_mask())
    }
}
