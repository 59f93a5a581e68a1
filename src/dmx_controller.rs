use core::sync::atomic::{AtomicBool, Ordering};

use crate::consts::{
    BREAK_MICROS, DEFAULT_REFRESH_RATE_HZ, DMX_BAUD, DMX_NULL_START, FALLBACK_BREAK_BAUD,
    MAB_MICROS, MAX_FALLBACK_BREAK_BAUD, MAX_REFRESH_RATE_HZ, MIN_BREAK_MICROS, MIN_MAB_MICROS,
};
use crate::dmx_driver::{DmxError, DmxFrameSender};
use crate::dmx_uart_driver::DmxSendUartDriver;
use crate::timer::DmxTimer;
use crate::types::{BreakMode, TransmitState};
use crate::universe::DmxUniverse;

#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DmxControllerConfig {
    /// How long the line is held low before every frame.
    /// Values below the 88µs minimum are raised to it.
    pub break_micros: u32,
    /// How long the line idles high between break and start code.
    /// Values below the 8µs minimum are raised to it.
    pub mab_micros: u32,
    /// The baud rate used to stretch a zero byte into a break if the uart has no break primitive.
    pub fallback_break_baud: u32,
    /// Frames per second sent by [DmxController::run]. Clamped to 1-44.
    pub refresh_rate_hz: u32,
    /// Use the break primitive of the uart if it has one.
    pub prefer_native_break: bool,
}

impl Default for DmxControllerConfig {
    fn default() -> Self {
        Self {
            break_micros: BREAK_MICROS,
            mab_micros: MAB_MICROS,
            fallback_break_baud: FALLBACK_BREAK_BAUD,
            refresh_rate_hz: DEFAULT_REFRESH_RATE_HZ,
            prefer_native_break: true,
        }
    }
}

/// Counters of a [DmxController].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransmitStats {
    pub frames_sent: u32,
    pub errors: u32,
}

/// A DMX512 transmitter.
///
/// It owns the universe and puts it onto the wire as BREAK, MARK AFTER BREAK and all 513 slots
/// every time [DmxController::send_frame] gets called. Sending is fire and forget: a failed frame
/// is not retried, the next one carries the whole universe again.
pub struct DmxController<D: DmxSendUartDriver, T: DmxTimer> {
    driver: D,
    timer: T,
    config: DmxControllerConfig,
    universe: DmxUniverse,
    break_mode: BreakMode,
    state: TransmitState,
    stats: TransmitStats,
}

impl<D: DmxSendUartDriver, T: DmxTimer> DmxController<D, T> {
    /// Creates a new [DmxController] and switches the uart to 250000 baud.
    ///
    /// Whether breaks are generated natively or by the low baud fallback is decided here once.
    pub fn new(
        mut driver: D,
        timer: T,
        config: &DmxControllerConfig,
    ) -> Result<Self, DmxError<D::DriverError>> {
        driver.set_baud_rate(DMX_BAUD)?;

        let break_mode = if config.prefer_native_break && driver.supports_native_break() {
            BreakMode::Native
        } else {
            BreakMode::LowBaud
        };

        debug!(
            "dmx controller ready, native break: {}",
            break_mode == BreakMode::Native
        );

        Ok(Self {
            driver,
            timer,
            config: config.clone(),
            universe: DmxUniverse::new(),
            break_mode,
            state: TransmitState::Idle,
            stats: TransmitStats::default(),
        })
    }

    /// Get a reference to the underlying driver.
    pub fn get_driver(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn universe(&self) -> &DmxUniverse {
        &self.universe
    }

    /// The universe that goes out with the next frame.
    pub fn universe_mut(&mut self) -> &mut DmxUniverse {
        &mut self.universe
    }

    pub fn break_mode(&self) -> BreakMode {
        self.break_mode
    }

    pub fn state(&self) -> TransmitState {
        self.state
    }

    pub fn stats(&self) -> TransmitStats {
        self.stats
    }

    /// The time between two frames sent by [DmxController::run].
    pub fn frame_interval_micros(&self) -> u32 {
        1_000_000 / self.config.refresh_rate_hz.clamp(1, MAX_REFRESH_RATE_HZ)
    }

    /// Sends the universe as one frame.
    ///
    /// Call this from your own timer, typically 20 to 44 times a second. The engine doesn't
    /// schedule frames itself.
    pub fn send_frame(&mut self) -> Result<(), DmxError<D::DriverError>> {
        let result = self.transmit_frame();
        self.state = TransmitState::Idle;

        match result {
            Ok(()) => {
                self.stats.frames_sent = self.stats.frames_sent.wrapping_add(1);
                trace!("dmx frame {} sent", self.stats.frames_sent);
            },
            Err(_) => {
                self.stats.errors = self.stats.errors.wrapping_add(1);
                warn!("sending dmx frame failed, {} errors so far", self.stats.errors);
            },
        }

        result
    }

    fn transmit_frame(&mut self) -> Result<(), DmxError<D::DriverError>> {
        self.state = TransmitState::Break;
        self.send_break()?;

        self.state = TransmitState::MarkAfterBreak;
        self.timer
            .delay_micros(self.config.mab_micros.max(MIN_MAB_MICROS));

        self.state = TransmitState::Data;
        self.driver.send_slots(self.universe.as_bytes())
    }

    fn send_break(&mut self) -> Result<(), DmxError<D::DriverError>> {
        let break_micros = self.config.break_micros.max(MIN_BREAK_MICROS);

        match self.break_mode {
            BreakMode::Native => {
                self.driver.set_break()?;
                self.timer.delay_micros(break_micros);

                if self.driver.clear_break().is_err() {
                    warn!("releasing the break failed, trying again");

                    if let Err(error) = self.driver.clear_break() {
                        warn!("the line may still be held in break");
                        return Err(error.into());
                    }
                }
            },
            BreakMode::LowBaud => {
                let fallback_baud = self.config.fallback_break_baud.min(MAX_FALLBACK_BREAK_BAUD);

                self.driver.set_baud_rate(fallback_baud)?;
                let zero_written = self.driver.write_frames(&[DMX_NULL_START]);
                self.timer.delay_micros(break_micros);

                // the data rate has to come back even if the zero byte didn't go out
                self.driver.set_baud_rate(DMX_BAUD)?;
                zero_written?;
            },
        }

        Ok(())
    }

    /// Sets all channels to 0 and sends the universe `repeats` times.
    /// Meant for shutting down, so it keeps going on failed frames and reports the last error.
    pub fn blackout(&mut self, repeats: usize) -> Result<(), DmxError<D::DriverError>> {
        self.universe.blackout();

        let frame_interval = self.frame_interval_micros();
        let mut result = Ok(());
        for _ in 0..repeats {
            if let Err(error) = self.send_frame() {
                result = Err(error);
            }

            self.timer.delay_micros(frame_interval);
        }

        result
    }

    /// Sends frames at the configured refresh rate until `stop` is set.
    ///
    /// `update` gets called with the universe before every frame. The stop signal is only
    /// looked at between frames, so the uart is never left in the middle of a break or at the
    /// fallback baud rate. Failed frames are counted in [DmxController::stats] and skipped.
    pub fn run<F: FnMut(&mut DmxUniverse)>(&mut self, stop: &AtomicBool, mut update: F) {
        let frame_interval = self.frame_interval_micros() as u64;

        while !stop.load(Ordering::Acquire) {
            let frame_started = self.timer.now_micros();

            update(&mut self.universe);
            let _ = self.send_frame();

            let elapsed = self.timer.micros_since(frame_started);
            if elapsed < frame_interval {
                self.timer.delay_micros((frame_interval - elapsed) as u32);
            }
        }

        debug!("dmx controller stopped after {} frames", self.stats.frames_sent);
    }
}
