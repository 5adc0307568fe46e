use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, ValueEnum};
use eyre::{Result, WrapErr};
use log::info;
use nmi_verify::config::{DEFAULT_CYCLE_BUDGET, DEFAULT_IDLE_CYCLES};
use nmi_verify::transaction::DEFAULT_MAX_HANDSHAKE_CYCLES;
use nmi_verify::{
    create_nmi_runtime, verify, AddressMap, MemoryDevice, NmiSystem, RunBudget, RunConfig,
    StrobeCoverage, VerificationReport, DEFAULT_RESET_CYCLES,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Backend {
    /// Verilator model of rtl/nmi_system.sv
    Verilator,
    /// In-process Rust model
    Behavioral,
}

/// Randomized write/read-back verification of an NMI bus device.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// JSON address map: a list of { base, size, id, path } objects
    #[arg(long)]
    map: Utf8PathBuf,

    /// Random seed; drawn at startup when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Stop starting new iterations once this many cycles have elapsed
    #[arg(long, default_value_t = DEFAULT_CYCLE_BUDGET)]
    cycles: u64,

    /// Run a fixed number of iterations instead of a cycle budget
    #[arg(long, conflicts_with = "cycles")]
    iterations: Option<u64>,

    #[arg(long, default_value_t = DEFAULT_RESET_CYCLES)]
    reset_cycles: u32,

    /// Idle cycles between iterations
    #[arg(long, default_value_t = DEFAULT_IDLE_CYCLES)]
    idle_cycles: u32,

    /// Cycles a request may wait for ready
    #[arg(long, default_value_t = DEFAULT_MAX_HANDSHAKE_CYCLES)]
    timeout_cycles: u32,

    /// Only exercise byte lanes 0-2 with 24-bit data
    #[arg(long)]
    reference_strobes: bool,

    #[arg(long, value_enum, default_value_t = Backend::Verilator)]
    backend: Backend,

    /// Ready latency of the behavioral model
    #[arg(long, default_value_t = 0)]
    latency: u32,

    /// Write the run report as JSON
    #[arg(long)]
    report_json: Option<Utf8PathBuf>,
}

impl Args {
    fn run_config(&self) -> RunConfig {
        RunConfig {
            budget: match self.iterations {
                Some(iterations) => RunBudget::Iterations(iterations),
                None => RunBudget::Cycles(self.cycles),
            },
            seed: self.seed.unwrap_or_else(rand::random),
            reset_cycles: self.reset_cycles,
            max_handshake_cycles: self.timeout_cycles,
            idle_cycles: self.idle_cycles,
            strobe_coverage: if self.reference_strobes {
                StrobeCoverage::LowerThreeLanes
            } else {
                StrobeCoverage::AllLanes
            },
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    println!("🚀 NMI bus verifier starting...");

    let map = AddressMap::load(&args.map)
        .wrap_err_with(|| format!("Failed to load address map {}", args.map))?;
    for region in map.regions() {
        println!("Path: {} Addr: {:#x} ID: {}", region.path, region.base, region.id);
    }
    if let Some((a, b)) = map.find_overlap() {
        eyre::bail!("Regions {} and {} overlap", a.path, b.path);
    }

    let config = args.run_config();
    info!("run configuration: {:?}", config);
    println!("🎲 Seed: {}", config.seed);

    let report = match args.backend {
        Backend::Verilator => {
            let runtime = create_nmi_runtime()?;
            let mut dut = runtime
                .create_model_simple::<NmiSystem>()
                .map_err(|e| eyre::eyre!("Failed to create NMI model: {:?}", e))?;
            println!("✅ NMI system model created!");
            verify::run(&mut dut, &map, &config)?
        }
        Backend::Behavioral => {
            let mut dut = MemoryDevice::new().latency(args.latency);
            verify::run(&mut dut, &map, &config)?
        }
    };

    if let Some(path) = &args.report_json {
        write_report(path, &report)?;
    }

    summarize(&report)
}

fn write_report(path: &Utf8Path, report: &VerificationReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json).wrap_err_with(|| format!("Failed to write report {}", path))
}

fn summarize(report: &VerificationReport) -> Result<()> {
    for failure in &report.failures {
        println!("❌ {}", failure);
    }
    println!("{}", report);

    if report.is_clean() {
        println!("🎉 All read-backs matched!");
        Ok(())
    } else {
        Err(eyre::eyre!(
            "{} of {} read-backs mismatched",
            report.failures.len(),
            report.iterations
        ))
    }
}
