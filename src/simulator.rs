use camino::Utf8Path;
use eyre::Result;
use marlin::{
    verilator::{VerilatorRuntime, VerilatorRuntimeOptions},
    verilog::prelude::*,
};

use crate::device::BusDevice;

// NMI slave memory used as the device under test
#[verilog(src = "rtl/nmi_system.sv", name = "nmi_system")]
pub struct NmiSystem;

pub fn create_nmi_runtime() -> Result<VerilatorRuntime> {
    let include_paths = [Utf8Path::new("rtl"), Utf8Path::new(".")];
    let src_files = [Utf8Path::new("rtl/nmi_system.sv")];

    VerilatorRuntime::new(
        Utf8Path::new("artifacts"),
        &src_files,
        &include_paths,
        [],
        VerilatorRuntimeOptions::default_logging(),
    )
    .map_err(|e| eyre::eyre!("Failed to create runtime: {}", e))
}

impl BusDevice for NmiSystem<'_> {
    fn set_clock(&mut self, high: bool) {
        self.clk = u8::from(high);
    }

    fn set_reset(&mut self, asserted: bool) {
        // rstn is active low
        self.rstn = u8::from(!asserted);
    }

    fn set_request(&mut self, address: u32, write_data: u32, byte_strobe: u8, valid: bool) {
        self.s_nmi_addr = address;
        self.s_nmi_wdata = write_data;
        self.s_nmi_wstrb = byte_strobe & 0xF;
        self.s_nmi_valid = u8::from(valid);
    }

    fn evaluate(&mut self) {
        self.eval();
    }

    fn ready(&self) -> bool {
        self.s_nmi_ready != 0
    }

    fn read_data(&self) -> u32 {
        self.s_nmi_rdata
    }
}
