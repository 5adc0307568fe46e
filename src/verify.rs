//! Randomized write-then-readback checking over an address map.

use std::fmt;

use log::{error, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::addrmap::{AddressMap, AddressRegion};
use crate::clock::{ClockDriver, NoTrace, TraceRecorder};
use crate::config::{RunBudget, RunConfig};
use crate::device::BusDevice;
use crate::error::{HarnessError, Result};
use crate::strobe::{ByteStrobe, StrobeCoverage};
use crate::transaction::TransactionEngine;

/// A read-back that disagreed with what was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationFailure {
    pub region_id: u32,
    pub region_path: String,
    pub region_base: u32,
    pub region_size: u32,
    pub address: u32,
    pub strobe: ByteStrobe,
    /// Written payload, disabled lanes already zeroed.
    pub expected: u32,
    /// Raw word returned by the read.
    pub actual: u32,
}

impl VerificationFailure {
    pub fn lane_mask(&self) -> u32 {
        self.strobe.lane_mask()
    }
}

impl fmt::Display for VerificationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Addrmap: {}", self.region_path)?;
        writeln!(
            f,
            "  Range: {:#x} - {:#x}",
            self.region_base,
            u64::from(self.region_base) + u64::from(self.region_size)
        )?;
        writeln!(f, "  Size: {:#x}", self.region_size)?;
        writeln!(f, "  ID: {}", self.region_id)?;
        writeln!(f, "Written to addr: {:#010x} strobe {}", self.address, self.strobe)?;
        writeln!(f, "  WR_Data: {:#010x}", self.expected)?;
        write!(
            f,
            "  RD_Data: {:#010x} (masked {:#010x})",
            self.actual,
            self.actual & self.lane_mask()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IterationOutcome {
    Passed,
    Failed(VerificationFailure),
}

/// Random inputs for one write/read iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stimulus {
    pub region_index: usize,
    pub address: u32,
    pub strobe: ByteStrobe,
    pub payload: u32,
}

/// Uniformly pick a 4-byte aligned address whose whole word lies in `region`.
pub fn random_aligned_address<R: Rng + ?Sized>(region: &AddressRegion, rng: &mut R) -> Result<u32> {
    if region.size < 4 {
        return Err(HarnessError::PreconditionViolation(format!(
            "region {} is {} bytes, smaller than one word",
            region.path, region.size
        )));
    }

    let first = (u64::from(region.base) + 3) & !3;
    let last = (region.end() - 4) & !3;
    if first > last {
        return Err(HarnessError::PreconditionViolation(format!(
            "region {} holds no aligned word",
            region.path
        )));
    }

    let slot = rng.gen_range(0..=(last - first) / 4);
    Ok((first + slot * 4) as u32)
}

/// Draw region, strobe, payload and address, in that order.
pub fn draw_stimulus<R: Rng + ?Sized>(
    map: &AddressMap,
    coverage: StrobeCoverage,
    rng: &mut R,
) -> Result<Stimulus> {
    let regions = map.regions();
    if regions.is_empty() {
        return Err(HarnessError::PreconditionViolation(
            "address map is empty".to_string(),
        ));
    }

    let region_index = rng.gen_range(0..regions.len());
    let strobe = coverage.random_strobe(rng);
    let payload = coverage.random_data(rng) & strobe.lane_mask();
    let address = random_aligned_address(&regions[region_index], rng)?;

    Ok(Stimulus {
        region_index,
        address,
        strobe,
        payload,
    })
}

/// Totals for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    pub seed: u64,
    pub iterations: u64,
    pub passed: u64,
    pub cycles: u64,
    pub failures: Vec<VerificationFailure>,
}

impl VerificationReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, outcome: IterationOutcome) {
        self.iterations += 1;
        match outcome {
            IterationOutcome::Passed => self.passed += 1,
            IterationOutcome::Failed(failure) => self.failures.push(failure),
        }
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "seed {}: {} iterations, {} passed, {} failed, {} cycles",
            self.seed,
            self.iterations,
            self.passed,
            self.failures.len(),
            self.cycles
        )
    }
}

/// Runs randomized write/read iterations against a device.
#[derive(Debug)]
pub struct Verifier<T = NoTrace> {
    engine: TransactionEngine<T>,
    coverage: StrobeCoverage,
}

impl Verifier<NoTrace> {
    pub fn new(coverage: StrobeCoverage) -> Self {
        Self::with_engine(TransactionEngine::new(), coverage)
    }
}

impl<T: TraceRecorder> Verifier<T> {
    pub fn with_engine(engine: TransactionEngine<T>, coverage: StrobeCoverage) -> Self {
        Self { engine, coverage }
    }

    pub fn engine(&self) -> &TransactionEngine<T> {
        &self.engine
    }

    pub fn clock(&self) -> &ClockDriver<T> {
        self.engine.clock()
    }

    pub fn into_engine(self) -> TransactionEngine<T> {
        self.engine
    }

    /// Write a random payload to a random word of a random region and read it
    /// back. Only lanes enabled by the strobe take part in the comparison.
    pub fn run_iteration<D, R>(
        &mut self,
        device: &mut D,
        map: &AddressMap,
        rng: &mut R,
    ) -> Result<IterationOutcome>
    where
        D: BusDevice + ?Sized,
        R: Rng + ?Sized,
    {
        let stimulus = draw_stimulus(map, self.coverage, rng)?;
        let region = &map.regions()[stimulus.region_index];

        self.engine
            .write(device, stimulus.address, stimulus.payload, stimulus.strobe)?;
        let read = self.engine.read(device, stimulus.address)?;

        if read & stimulus.strobe.lane_mask() == stimulus.payload {
            return Ok(IterationOutcome::Passed);
        }

        let failure = VerificationFailure {
            region_id: region.id,
            region_path: region.path.clone(),
            region_base: region.base,
            region_size: region.size,
            address: stimulus.address,
            strobe: stimulus.strobe,
            expected: stimulus.payload,
            actual: read,
        };
        warn!("read-back mismatch\n{}", failure);
        Ok(IterationOutcome::Failed(failure))
    }

    /// Reset the device, then iterate until `budget` is spent, with
    /// `idle_cycles` between iterations.
    ///
    /// Mismatches are collected in the report. A handshake timeout ends the
    /// run with an error.
    pub fn run<D, R>(
        &mut self,
        device: &mut D,
        map: &AddressMap,
        rng: &mut R,
        config: &RunConfig,
    ) -> Result<VerificationReport>
    where
        D: BusDevice + ?Sized,
        R: Rng + ?Sized,
    {
        let mut report = VerificationReport {
            seed: config.seed,
            ..VerificationReport::default()
        };

        device.set_request(0, 0, 0, false);
        device.set_reset(true);
        self.engine.clock_mut().reset(device, config.reset_cycles);
        info!(
            "reset released after {} cycles, {} regions mapped",
            config.reset_cycles,
            map.region_count()
        );

        while !Self::budget_spent(config.budget, self.clock().cycles(), report.iterations) {
            // The first transaction follows reset release directly.
            if report.iterations > 0 {
                for _ in 0..config.idle_cycles {
                    self.engine.clock_mut().advance_one_cycle(device);
                }
            }

            match self.run_iteration(device, map, rng) {
                Ok(outcome) => report.record(outcome),
                Err(err) => {
                    report.cycles = self.clock().cycles();
                    error!("run aborted: {} ({})", err, report);
                    return Err(err);
                }
            }
        }

        report.cycles = self.clock().cycles();
        info!("{}", report);
        Ok(report)
    }

    fn budget_spent(budget: RunBudget, cycles: u64, iterations: u64) -> bool {
        match budget {
            RunBudget::Cycles(limit) => cycles >= limit,
            RunBudget::Iterations(limit) => iterations >= limit,
        }
    }
}

/// Run a full verification pass as described by `config`, seeding the
/// generator from `config.seed`.
pub fn run<D: BusDevice + ?Sized>(
    device: &mut D,
    map: &AddressMap,
    config: &RunConfig,
) -> Result<VerificationReport> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let engine = TransactionEngine::new().max_cycles(config.max_handshake_cycles);
    Verifier::with_engine(engine, config.strobe_coverage).run(device, map, &mut rng, config)
}
