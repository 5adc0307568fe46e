//! Behavioral stand-in for the RTL device.
//!
//! Registers everything on the rising clock edge like `rtl/nmi_system.sv`:
//! a request is accepted `latency` edges after it is first seen, `ready`
//! pulses for one cycle and `read_data` holds the addressed word after the
//! strobed lanes were merged in.

use std::collections::HashMap;

use crate::device::BusDevice;
use crate::strobe::ByteStrobe;

#[derive(Debug, Default, Clone)]
pub struct MemoryDevice {
    // Inputs
    clock: bool,
    reset: bool,
    address: u32,
    write_data: u32,
    byte_strobe: u8,
    valid: bool,

    // Registered outputs
    ready: bool,
    read_data: u32,

    words: HashMap<u32, u32>,
    latency: u32,
    waited: u32,
    stalled: bool,
    read_corruption: u32,

    last_clock: bool,
    evaluations: u64,
    rising_edges: u64,
    edges_in_reset: u64,
}

impl MemoryDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extra rising edges a request waits before `ready` is raised.
    pub fn latency(mut self, cycles: u32) -> Self {
        self.latency = cycles;
        self
    }

    /// Never raise `ready`.
    pub fn stalled(mut self) -> Self {
        self.stalled = true;
        self
    }

    /// XOR every value presented on `read_data` with `mask`.
    pub fn corrupt_reads(mut self, mask: u32) -> Self {
        self.read_corruption = mask;
        self
    }

    /// Word stored at the aligned address containing `address`.
    pub fn peek(&self, address: u32) -> u32 {
        self.words.get(&(address & !0x3)).copied().unwrap_or(0)
    }

    pub fn poke(&mut self, address: u32, value: u32) {
        self.words.insert(address & !0x3, value);
    }

    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    pub fn rising_edges(&self) -> u64 {
        self.rising_edges
    }

    pub fn edges_in_reset(&self) -> u64 {
        self.edges_in_reset
    }

    pub fn in_reset(&self) -> bool {
        self.reset
    }

    pub fn request_valid(&self) -> bool {
        self.valid
    }

    fn on_rising_edge(&mut self) {
        self.rising_edges += 1;

        if self.reset {
            self.edges_in_reset += 1;
            self.ready = false;
            self.read_data = 0;
            self.waited = 0;
            return;
        }

        // Ready is a single-cycle pulse, so a request left asserted after
        // acceptance is not accepted twice on consecutive edges.
        if !self.valid || self.ready || self.stalled {
            self.ready = false;
            self.waited = 0;
            return;
        }

        if self.waited < self.latency {
            self.waited += 1;
            return;
        }

        let mask = ByteStrobe::new(self.byte_strobe).lane_mask();
        let merged = (self.peek(self.address) & !mask) | (self.write_data & mask);
        if mask != 0 {
            self.poke(self.address, merged);
        }

        self.ready = true;
        self.read_data = merged ^ self.read_corruption;
        self.waited = 0;
    }
}

impl BusDevice for MemoryDevice {
    fn set_clock(&mut self, high: bool) {
        self.clock = high;
    }

    fn set_reset(&mut self, asserted: bool) {
        self.reset = asserted;
    }

    fn set_request(&mut self, address: u32, write_data: u32, byte_strobe: u8, valid: bool) {
        self.address = address;
        self.write_data = write_data;
        self.byte_strobe = byte_strobe & 0xF;
        self.valid = valid;
    }

    fn evaluate(&mut self) {
        self.evaluations += 1;
        if self.clock && !self.last_clock {
            self.on_rising_edge();
        }
        self.last_clock = self.clock;
    }

    fn ready(&self) -> bool {
        self.ready
    }

    fn read_data(&self) -> u32 {
        self.read_data
    }
}
