use log::debug;

use crate::device::BusDevice;

/// Number of clock periods the reset sequencer holds reset by default.
pub const DEFAULT_RESET_CYCLES: u32 = 10;

/// Receives waveform sample points from the clock driver.
pub trait TraceRecorder {
    fn record_sample(&mut self, timestamp: u64);
}

/// Recorder used when no trace is requested.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTrace;

impl TraceRecorder for NoTrace {
    fn record_sample(&mut self, _timestamp: u64) {}
}

/// Keeps every sample timestamp in memory.
#[derive(Debug, Default, Clone)]
pub struct SampleLog {
    pub timestamps: Vec<u64>,
}

impl TraceRecorder for SampleLog {
    fn record_sample(&mut self, timestamp: u64) {
        self.timestamps.push(timestamp);
    }
}

/// Steps a device one clock period at a time and owns the cycle counter.
#[derive(Debug, Default)]
pub struct ClockDriver<R = NoTrace> {
    cycles: u64,
    recorder: R,
}

impl ClockDriver<NoTrace> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: TraceRecorder> ClockDriver<R> {
    pub fn with_recorder(recorder: R) -> Self {
        Self {
            cycles: 0,
            recorder,
        }
    }

    /// Cycles elapsed since this driver was created.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn recorder(&self) -> &R {
        &self.recorder
    }

    pub fn into_recorder(self) -> R {
        self.recorder
    }

    /// One full clock period: low phase evaluated twice so staged inputs
    /// settle, then the rising edge.
    pub fn advance_one_cycle<D: BusDevice + ?Sized>(&mut self, device: &mut D) {
        self.cycles += 1;

        device.set_clock(false);
        device.evaluate();

        device.set_clock(false);
        device.evaluate();
        self.recorder.record_sample(10 * self.cycles + 5);

        device.set_clock(true);
        device.evaluate();
        self.recorder.record_sample(10 * self.cycles + 10);
    }

    /// Clock the device `cycles` times with reset held, then release reset.
    ///
    /// The caller asserts reset beforehand; this only releases it.
    pub fn reset<D: BusDevice + ?Sized>(&mut self, device: &mut D, cycles: u32) {
        debug!("holding reset for {} cycles", cycles);
        for _ in 0..cycles {
            self.advance_one_cycle(device);
        }
        device.set_reset(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MemoryDevice;

    #[test]
    fn test_one_cycle_is_three_evaluations_and_one_edge() {
        let mut device = MemoryDevice::new();
        let mut clock = ClockDriver::new();

        clock.advance_one_cycle(&mut device);

        assert_eq!(clock.cycles(), 1);
        assert_eq!(device.evaluations(), 3);
        assert_eq!(device.rising_edges(), 1);
    }

    #[test]
    fn test_sample_timestamps() {
        let mut device = MemoryDevice::new();
        let mut clock = ClockDriver::with_recorder(SampleLog::default());

        clock.advance_one_cycle(&mut device);
        clock.advance_one_cycle(&mut device);

        assert_eq!(clock.recorder().timestamps, vec![15, 20, 25, 30]);
    }

    #[test]
    fn test_reset_consumes_exact_cycles_and_releases() {
        let mut device = MemoryDevice::new();
        let mut clock = ClockDriver::new();

        device.set_reset(true);
        clock.reset(&mut device, DEFAULT_RESET_CYCLES);

        assert_eq!(clock.cycles(), u64::from(DEFAULT_RESET_CYCLES));
        assert_eq!(device.edges_in_reset(), u64::from(DEFAULT_RESET_CYCLES));
        assert!(!device.in_reset());
    }

    #[test]
    fn test_zero_cycle_reset_still_releases() {
        let mut device = MemoryDevice::new();
        let mut clock = ClockDriver::new();

        device.set_reset(true);
        clock.reset(&mut device, 0);

        assert_eq!(clock.cycles(), 0);
        assert!(!device.in_reset());
    }
}
