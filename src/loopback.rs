use core::cell::RefCell;

use crate::consts::{BITS_PER_SLOT, DMX_BAUD, DMX_MAX_PACKAGE_SIZE};
use crate::dmx_uart_driver::{
    DmxRecvUartDriver, DmxSendUartDriver, DmxUartDriver, DmxUartDriverError,
};
use crate::timer::DmxTimer;

/// The amount of bytes that can be on the line before writes start to overflow.
pub const LOOPBACK_CAPACITY: usize = 2 * DMX_MAX_PACKAGE_SIZE;

/// The error a [LoopbackBus] raises for injected faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LoopbackError;

impl core::fmt::Display for LoopbackError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Injected loopback fault.")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for LoopbackError {}

/// Break and mark after break durations as seen on the line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LineTiming {
    /// The amount of breaks that were followed by data.
    pub frames: usize,
    /// Data that was written without a preceding break.
    pub unframed_writes: usize,
    pub last_break_micros: Option<u64>,
    pub last_mab_micros: Option<u64>,
    pub shortest_break_micros: Option<u64>,
    pub shortest_mab_micros: Option<u64>,
}

struct LoopbackState {
    now_micros: u64,
    baud: u32,
    native_break: bool,
    break_started: Option<u64>,
    break_ended: Option<u64>,
    pending_break: Option<u64>,
    line: heapless::Deque<u8, LOOPBACK_CAPACITY>,
    failing_reads: usize,
    failing_writes: usize,
    failing_break_clears: usize,
    timing: LineTiming,
}

impl LoopbackState {
    fn end_break(&mut self, ended: u64) {
        if let Some(started) = self.break_started.take() {
            self.pending_break = Some(ended - started);
            self.break_ended = Some(ended);
        }
    }

    fn start_data(&mut self) {
        let (break_micros, break_ended) = match (self.pending_break.take(), self.break_ended.take())
        {
            (Some(break_micros), Some(break_ended)) => (break_micros, break_ended),
            _ => {
                self.timing.unframed_writes += 1;
                return;
            },
        };

        let mab_micros = self.now_micros - break_ended;
        let timing = &mut self.timing;

        timing.frames += 1;
        timing.last_break_micros = Some(break_micros);
        timing.last_mab_micros = Some(mab_micros);
        timing.shortest_break_micros = Some(
            timing
                .shortest_break_micros
                .map_or(break_micros, |shortest| shortest.min(break_micros)),
        );
        timing.shortest_mab_micros = Some(
            timing
                .shortest_mab_micros
                .map_or(mab_micros, |shortest| shortest.min(mab_micros)),
        );
    }
}

/// An in-memory RS485 line with a virtual clock.
///
/// Everything a controller writes at 250000 baud can be read back by a receiver on the same bus.
/// Bytes written at other baud rates never reach the receiver; zero bytes among them pull the
/// line low like a break. Time only advances when the bus is waited on or bytes are shifted
/// out, which makes the break and mark after break timing measurable.
///
/// Both ends use a shared reference, so `&LoopbackBus` implements the driver and the timer
/// traits.
pub struct LoopbackBus {
    state: RefCell<LoopbackState>,
}

impl Default for LoopbackBus {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopbackBus {
    /// Creates a bus whose uart supports native breaks.
    pub fn new() -> Self {
        Self::with_native_break(true)
    }

    /// Creates a bus whose uart has no break primitive.
    pub fn without_native_break() -> Self {
        Self::with_native_break(false)
    }

    fn with_native_break(native_break: bool) -> Self {
        Self {
            state: RefCell::new(LoopbackState {
                now_micros: 0,
                baud: DMX_BAUD,
                native_break,
                break_started: None,
                break_ended: None,
                pending_break: None,
                line: heapless::Deque::new(),
                failing_reads: 0,
                failing_writes: 0,
                failing_break_clears: 0,
                timing: LineTiming::default(),
            }),
        }
    }

    pub fn now_micros(&self) -> u64 {
        self.state.borrow().now_micros
    }

    /// Let time pass without any activity on the line.
    pub fn advance_micros(&self, micros: u64) {
        self.state.borrow_mut().now_micros += micros;
    }

    /// Put raw bytes onto the line as if another controller sent them.
    /// Returns the number of bytes that fit onto the line.
    pub fn inject(&self, bytes: &[u8]) -> usize {
        let mut state = self.state.borrow_mut();

        bytes
            .iter()
            .take_while(|byte| state.line.push_back(**byte).is_ok())
            .count()
    }

    /// The next `count` reads fail with a driver error.
    pub fn fail_next_reads(&self, count: usize) {
        self.state.borrow_mut().failing_reads = count;
    }

    /// The next `count` writes fail with a driver error.
    pub fn fail_next_writes(&self, count: usize) {
        self.state.borrow_mut().failing_writes = count;
    }

    /// The next `count` attempts to release a native break fail with a driver error.
    pub fn fail_next_break_clears(&self, count: usize) {
        self.state.borrow_mut().failing_break_clears = count;
    }

    /// True while the line is held low by a break that wasn't released.
    pub fn is_break_held(&self) -> bool {
        self.state.borrow().break_started.is_some()
    }

    /// The amount of bytes on the line that haven't been read yet.
    pub fn pending(&self) -> usize {
        self.state.borrow().line.len()
    }

    pub fn baud_rate(&self) -> u32 {
        self.state.borrow().baud
    }

    pub fn line_timing(&self) -> LineTiming {
        self.state.borrow().timing
    }
}

fn slot_micros(baud: u32) -> u64 {
    (BITS_PER_SLOT as u64 * 1_000_000).div_ceil(baud as u64)
}

impl DmxUartDriver for &LoopbackBus {
    type DriverError = LoopbackError;
}

impl DmxSendUartDriver for &LoopbackBus {
    fn set_baud_rate(&mut self, baud: u32) -> Result<(), DmxUartDriverError<Self::DriverError>> {
        if baud == 0 {
            return Err(DmxUartDriverError::DriverError(LoopbackError));
        }

        self.state.borrow_mut().baud = baud;
        Ok(())
    }

    fn write_frames(
        &mut self,
        buffer: &[u8],
    ) -> Result<usize, DmxUartDriverError<Self::DriverError>> {
        let mut state = self.state.borrow_mut();

        if state.failing_writes > 0 {
            state.failing_writes -= 1;
            return Err(DmxUartDriverError::DriverError(LoopbackError));
        }

        let slot_micros = slot_micros(state.baud);

        if state.baud != DMX_BAUD {
            for byte in buffer {
                if *byte == 0 {
                    // start bit and eight data bits are low
                    let low_micros = (9 * 1_000_000u64).div_ceil(state.baud as u64);
                    let started = state.now_micros;

                    state.break_started = Some(started);
                    state.end_break(started + low_micros);
                }

                state.now_micros += slot_micros;
            }

            return Ok(buffer.len());
        }

        state.start_data();

        let mut bytes_written = 0;
        for byte in buffer {
            if state.line.push_back(*byte).is_err() {
                break;
            }

            bytes_written += 1;
        }

        state.now_micros += bytes_written as u64 * slot_micros;
        Ok(bytes_written)
    }

    fn supports_native_break(&self) -> bool {
        self.state.borrow().native_break
    }

    fn set_break(&mut self) -> Result<(), DmxUartDriverError<Self::DriverError>> {
        let mut state = self.state.borrow_mut();
        if !state.native_break {
            return Err(DmxUartDriverError::Unsupported);
        }

        state.break_started = Some(state.now_micros);
        Ok(())
    }

    fn clear_break(&mut self) -> Result<(), DmxUartDriverError<Self::DriverError>> {
        let mut state = self.state.borrow_mut();
        if !state.native_break {
            return Err(DmxUartDriverError::Unsupported);
        }

        if state.failing_break_clears > 0 {
            state.failing_break_clears -= 1;
            return Err(DmxUartDriverError::DriverError(LoopbackError));
        }

        let now_micros = state.now_micros;
        state.end_break(now_micros);
        Ok(())
    }
}

impl DmxRecvUartDriver for &LoopbackBus {
    fn read_frames(
        &mut self,
        buffer: &mut [u8],
        timeout_us: u32,
    ) -> Result<usize, DmxUartDriverError<Self::DriverError>> {
        let mut state = self.state.borrow_mut();

        if state.failing_reads > 0 {
            state.failing_reads -= 1;
            return Err(DmxUartDriverError::DriverError(LoopbackError));
        }

        if state.line.is_empty() {
            state.now_micros += timeout_us as u64;
            return Err(DmxUartDriverError::TimeoutError);
        }

        let mut bytes_read = 0;
        while bytes_read < buffer.len() {
            match state.line.pop_front() {
                Some(byte) => buffer[bytes_read] = byte,
                None => break,
            }

            bytes_read += 1;
        }

        Ok(bytes_read)
    }

    fn bytes_available(&mut self) -> Result<usize, DmxUartDriverError<Self::DriverError>> {
        Ok(self.state.borrow().line.len())
    }
}

impl DmxTimer for &LoopbackBus {
    fn now_micros(&self) -> u64 {
        LoopbackBus::now_micros(self)
    }

    fn delay_micros(&mut self, micros: u32) {
        self.advance_micros(micros as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_at_dmx_baud_is_looped_back() {
        let bus = LoopbackBus::new();
        let mut sender = &bus;
        let mut receiver = &bus;

        assert_eq!(sender.write_frames(&[0, 1, 2]).unwrap(), 3);
        assert_eq!(bus.now_micros(), 3 * 44);
        assert_eq!(receiver.bytes_available().unwrap(), 3);

        let mut buffer = [0u8; 8];
        assert_eq!(receiver.read_frames(&mut buffer, 1000).unwrap(), 3);
        assert_eq!(buffer[..3], [0, 1, 2]);
        assert_eq!(bus.line_timing().unframed_writes, 1);
    }

    #[test]
    fn test_read_times_out_on_empty_line() {
        let bus = LoopbackBus::new();
        let mut receiver = &bus;
        let mut buffer = [0u8; 8];

        assert!(matches!(
            receiver.read_frames(&mut buffer, 1000),
            Err(DmxUartDriverError::TimeoutError)
        ));
        assert_eq!(bus.now_micros(), 1000);
    }

    #[test]
    fn test_low_baud_zero_byte_is_a_break() {
        let bus = LoopbackBus::without_native_break();
        let mut sender = &bus;

        sender.set_baud_rate(50_000).unwrap();
        sender.write_frames(&[0]).unwrap();
        sender.set_baud_rate(DMX_BAUD).unwrap();
        assert_eq!(bus.pending(), 0);

        sender.write_frames(&[0, 42]).unwrap();

        let timing = bus.line_timing();
        assert_eq!(timing.frames, 1);
        assert_eq!(timing.last_break_micros, Some(180));
        // the two stop bits at 50000 baud
        assert_eq!(timing.last_mab_micros, Some(40));
    }

    #[test]
    fn test_native_break() {
        let bus = LoopbackBus::new();
        let mut sender = &bus;
        let mut timer = &bus;

        assert!(sender.supports_native_break());
        sender.set_break().unwrap();
        timer.delay_micros(100);
        sender.clear_break().unwrap();
        timer.delay_micros(12);
        sender.write_frames(&[0]).unwrap();

        assert_eq!(bus.line_timing().last_break_micros, Some(100));
        assert_eq!(bus.line_timing().last_mab_micros, Some(12));
    }

    #[test]
    fn test_break_unsupported() {
        let bus = LoopbackBus::without_native_break();
        let mut sender = &bus;

        assert!(!sender.supports_native_break());
        assert!(matches!(
            sender.set_break(),
            Err(DmxUartDriverError::Unsupported)
        ));
    }

    #[test]
    fn test_overflow_and_injected_faults() {
        let bus = LoopbackBus::new();
        let mut sender = &bus;
        let mut receiver = &bus;

        assert_eq!(bus.inject(&[1u8; LOOPBACK_CAPACITY - 2]), LOOPBACK_CAPACITY - 2);
        assert_eq!(sender.write_frames(&[0, 1, 2, 3]).unwrap(), 2);

        bus.fail_next_writes(1);
        assert!(sender.write_frames(&[0]).is_err());
        assert!(sender.write_frames(&[0]).is_ok());

        bus.fail_next_reads(1);
        let mut buffer = [0u8; 1];
        assert!(matches!(
            receiver.read_frames(&mut buffer, 0),
            Err(DmxUartDriverError::DriverError(LoopbackError))
        ));
        assert_eq!(receiver.read_frames(&mut buffer, 0).unwrap(), 1);
    }
}
