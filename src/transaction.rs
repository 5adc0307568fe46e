//! Single-transaction valid/ready handshake driver.
//!
//! A transaction asserts `valid`, steps the clock and checks `ready` after
//! every step. It is accepted on the first cycle where both were high and
//! `valid` is dropped straight away. Nothing is pipelined: the next
//! transaction starts only after the previous one was accepted or timed out.

use std::fmt;

use log::{debug, trace};
use serde::Serialize;

use crate::clock::{ClockDriver, NoTrace, TraceRecorder};
use crate::device::BusDevice;
use crate::error::{HarnessError, Result};
use crate::strobe::ByteStrobe;

/// Cycles a transaction may wait for `ready` before it is declared stuck.
pub const DEFAULT_MAX_HANDSHAKE_CYCLES: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Write,
    Read,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Write => f.write_str("write"),
            Direction::Read => f.write_str("read"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionRequest {
    pub address: u32,
    pub direction: Direction,
    /// Only meaningful for writes.
    pub write_data: u32,
    /// Only meaningful for writes; reads always drive an empty strobe.
    pub byte_strobe: ByteStrobe,
}

impl TransactionRequest {
    pub fn write(address: u32, write_data: u32, byte_strobe: ByteStrobe) -> Self {
        Self {
            address,
            direction: Direction::Write,
            write_data,
            byte_strobe,
        }
    }

    pub fn read(address: u32) -> Self {
        Self {
            address,
            direction: Direction::Read,
            write_data: 0,
            byte_strobe: ByteStrobe::NONE,
        }
    }
}

/// Where a transaction is in its handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    Idle,
    RequestAsserted,
    Accepted,
    TimedOut,
}

/// What the device returned when it accepted a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub read_data: u32,
    /// Clock cycles from asserting `valid` to acceptance, at least one.
    pub cycles: u32,
}

/// Drives one transaction at a time through the clock driver.
#[derive(Debug)]
pub struct TransactionEngine<R = NoTrace> {
    clock: ClockDriver<R>,
    max_cycles: u32,
    state: HandshakeState,
    last_outcome: Option<HandshakeState>,
}

impl TransactionEngine<NoTrace> {
    pub fn new() -> Self {
        Self::with_clock(ClockDriver::new())
    }
}

impl Default for TransactionEngine<NoTrace> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: TraceRecorder> TransactionEngine<R> {
    pub fn with_clock(clock: ClockDriver<R>) -> Self {
        Self {
            clock,
            max_cycles: DEFAULT_MAX_HANDSHAKE_CYCLES,
            state: HandshakeState::Idle,
            last_outcome: None,
        }
    }

    /// Zero is treated as one: every transaction takes at least one cycle.
    pub fn max_cycles(mut self, max_cycles: u32) -> Self {
        self.max_cycles = max_cycles.max(1);
        self
    }

    pub fn clock(&self) -> &ClockDriver<R> {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut ClockDriver<R> {
        &mut self.clock
    }

    /// `Idle` between transactions.
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// `Accepted` or `TimedOut` for the most recent transaction, `None`
    /// before the first one.
    pub fn last_outcome(&self) -> Option<HandshakeState> {
        self.last_outcome
    }

    fn finish(&mut self, outcome: HandshakeState) {
        self.last_outcome = Some(outcome);
        self.state = HandshakeState::Idle;
    }

    pub fn write<D: BusDevice + ?Sized>(
        &mut self,
        device: &mut D,
        address: u32,
        data: u32,
        strobe: ByteStrobe,
    ) -> Result<()> {
        self.execute(device, TransactionRequest::write(address, data, strobe))
            .map(|_| ())
    }

    pub fn read<D: BusDevice + ?Sized>(&mut self, device: &mut D, address: u32) -> Result<u32> {
        self.execute(device, TransactionRequest::read(address))
            .map(|completion| completion.read_data)
    }

    /// Run `request` until the device accepts it or the cycle bound is hit.
    /// `valid` is deasserted on both outcomes.
    pub fn execute<D: BusDevice + ?Sized>(
        &mut self,
        device: &mut D,
        request: TransactionRequest,
    ) -> Result<Completion> {
        let strobe = match request.direction {
            Direction::Write => request.byte_strobe,
            Direction::Read => ByteStrobe::NONE,
        };

        device.set_request(request.address, request.write_data, strobe.bits(), true);
        self.state = HandshakeState::RequestAsserted;
        trace!(
            "{} {:#010x} data {:#010x} strobe {}",
            request.direction,
            request.address,
            request.write_data,
            strobe
        );

        let mut cycles = 0;
        let accepted = loop {
            if cycles == self.max_cycles {
                break None;
            }
            self.clock.advance_one_cycle(device);
            cycles += 1;
            if device.ready() {
                break Some(device.read_data());
            }
        };

        device.set_request(request.address, request.write_data, strobe.bits(), false);

        match accepted {
            Some(read_data) => {
                self.finish(HandshakeState::Accepted);
                debug!(
                    "{} {:#010x} accepted after {} cycles",
                    request.direction, request.address, cycles
                );
                Ok(Completion { read_data, cycles })
            }
            None => {
                self.finish(HandshakeState::TimedOut);
                Err(HarnessError::HandshakeTimeout {
                    direction: request.direction,
                    address: request.address,
                    cycles,
                })
            }
        }
    }
}
