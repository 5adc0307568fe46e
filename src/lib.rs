pub mod addrmap;
pub mod clock;
pub mod config;
pub mod device;
pub mod error;
pub mod model;
pub mod simulator;
pub mod strobe;
pub mod transaction;
pub mod verify;

pub use addrmap::{AddressMap, AddressRegion};
pub use clock::{ClockDriver, NoTrace, SampleLog, TraceRecorder, DEFAULT_RESET_CYCLES};
pub use config::{RunBudget, RunConfig};
pub use device::BusDevice;
pub use error::HarnessError;
pub use model::MemoryDevice;
pub use simulator::*;
pub use strobe::{ByteStrobe, StrobeCoverage};
pub use transaction::{Direction, HandshakeState, TransactionEngine, TransactionRequest};
pub use verify::{run, IterationOutcome, VerificationFailure, VerificationReport, Verifier};
