//! The signal-level capability a device under test has to expose.

/// A clocked device with a single valid/ready request port.
///
/// Setters only stage input levels; nothing is visible on the outputs until
/// [`BusDevice::evaluate`] runs. Implemented by the Verilator model in
/// [`crate::simulator`] and by the behavioral [`crate::model::MemoryDevice`].
pub trait BusDevice {
    fn set_clock(&mut self, high: bool);

    /// `asserted == true` holds the device in reset, whatever the polarity of
    /// the underlying pin.
    fn set_reset(&mut self, asserted: bool);

    /// Drive the request port. A `byte_strobe` of zero signals a read.
    fn set_request(&mut self, address: u32, write_data: u32, byte_strobe: u8, valid: bool);

    /// Run one evaluation step of the device's combinational and sequential logic.
    fn evaluate(&mut self);

    fn ready(&self) -> bool;

    fn read_data(&self) -> u32;
}
