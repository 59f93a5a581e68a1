use core::sync::atomic::{AtomicBool, Ordering};

use crate::change_detector::{ChangeDetector, SlotChange};
use crate::consts::{
    DMX_MAX_PACKAGE_SIZE, DMX_NULL_START, LINK_TIMEOUT_MILLIS, READ_TIMEOUT_MICROS,
};
use crate::dmx_driver::{DmxError, DmxFrameReceiver};
use crate::dmx_uart_driver::DmxRecvUartDriver;
use crate::fixture::{get_fixture_data, Fixture};
use crate::timer::DmxTimer;
use crate::types::{FixtureChanges, FixtureData, ReceiveState};
use crate::universe::DmxUniverse;

#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DmxReceiverConfig {
    /// How long a single poll waits for data.
    pub read_timeout_us: u32,
    /// The link counts as down if no frame was committed for this long.
    pub link_timeout_ms: u32,
    /// Drop everything the uart buffered before waiting for a new frame.
    pub discard_stale_input: bool,
}

impl Default for DmxReceiverConfig {
    fn default() -> Self {
        Self {
            read_timeout_us: READ_TIMEOUT_MICROS,
            link_timeout_ms: LINK_TIMEOUT_MILLIS,
            discard_stale_input: false,
        }
    }
}

/// Reception counters of a [DmxReceiver]. They only reset with [DmxReceiver::reset].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReceptionStats {
    /// Frames that were committed to the universe.
    pub frame_count: u32,
    /// Transport faults and discarded frames.
    pub error_count: u32,
    /// Frames that were discarded because of their start code. Included in `error_count`.
    pub framing_error_count: u32,
    /// The timer value of the last committed frame.
    pub last_frame_timestamp_us: Option<u64>,
}

/// Reception statistics as shown to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatsSummary {
    pub frames: u32,
    pub errors: u32,
    /// None if no frame was received yet.
    pub last_frame_ms_ago: Option<u64>,
}

/// The result of a single [DmxReceiver::poll].
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReceiveOutcome<E> {
    /// A frame was copied into the universe.
    Committed { bytes_received: usize },
    /// Nothing arrived within the read timeout.
    NoFrame,
    /// The received data didn't start with the dimmer data start code and was dropped.
    Discarded { start_code: u8 },
    /// The transport failed. The partial read was dropped.
    Fault(DmxError<E>),
}

impl<E> ReceiveOutcome<E> {
    /// True if the universe got updated.
    pub fn is_frame(&self) -> bool {
        matches!(self, ReceiveOutcome::Committed { .. })
    }
}

/// A DMX512 receiver.
///
/// Every [DmxReceiver::poll] waits a bounded time for a frame, checks its start code and copies
/// it into the universe. Nothing that happens during a poll is fatal: timeouts, wrong start
/// codes and transport faults end up in the [ReceptionStats] and the next poll starts over.
pub struct DmxReceiver<D: DmxRecvUartDriver, T: DmxTimer> {
    driver: D,
    timer: T,
    config: DmxReceiverConfig,
    universe: DmxUniverse,
    change_detector: ChangeDetector,
    stats: ReceptionStats,
    state: ReceiveState,
    link_up: bool,
}

impl<D: DmxRecvUartDriver, T: DmxTimer> DmxReceiver<D, T> {
    /// Creates a new [DmxReceiver] and drops everything the uart received so far.
    pub fn new(
        mut driver: D,
        timer: T,
        config: &DmxReceiverConfig,
    ) -> Result<Self, DmxError<D::DriverError>> {
        let bytes_discarded = driver.discard_pending()?;
        debug!(
            "dmx receiver ready, dropped {} stale bytes",
            bytes_discarded
        );

        Ok(Self {
            driver,
            timer,
            config: config.clone(),
            universe: DmxUniverse::new(),
            change_detector: ChangeDetector::new(),
            stats: ReceptionStats::default(),
            state: ReceiveState::Idle,
            link_up: false,
        })
    }

    /// Get a reference to the underlying driver.
    pub fn get_driver(&mut self) -> &mut D {
        &mut self.driver
    }

    /// The universe as of the last committed frame.
    pub fn universe(&self) -> &DmxUniverse {
        &self.universe
    }

    pub fn change_detector(&self) -> &ChangeDetector {
        &self.change_detector
    }

    pub fn state(&self) -> ReceiveState {
        self.state
    }

    pub fn stats(&self) -> ReceptionStats {
        self.stats
    }

    /// Clears the universe, the change baseline and the statistics.
    pub fn reset(&mut self) {
        self.universe = DmxUniverse::new();
        self.change_detector = ChangeDetector::new();
        self.stats = ReceptionStats::default();
        self.state = ReceiveState::Idle;
        self.link_up = false;
    }

    /// Call this function as often as you can. It will wait for a frame for up to the configured
    /// read timeout and handle it.
    pub fn poll(&mut self) -> ReceiveOutcome<D::DriverError> {
        let outcome = self.receive();
        self.state = ReceiveState::Idle;
        self.update_link_state();

        outcome
    }

    fn receive(&mut self) -> ReceiveOutcome<D::DriverError> {
        self.state = ReceiveState::AwaitData;

        if self.config.discard_stale_input {
            match self.driver.discard_pending() {
                Ok(bytes_discarded) => {
                    if bytes_discarded > 0 {
                        trace!("dropped {} stale bytes", bytes_discarded);
                    }
                },
                Err(error) => return self.fault(error),
            }
        }

        let mut buffer = [0u8; DMX_MAX_PACKAGE_SIZE];
        let bytes_read = match self
            .driver
            .receive_frame(&mut buffer, self.config.read_timeout_us)
        {
            Ok(0) | Err(DmxError::TimeoutError) => return ReceiveOutcome::NoFrame,
            Ok(bytes_read) => bytes_read,
            Err(error) => return self.fault(error),
        };

        self.state = ReceiveState::Validate;
        let start_code = buffer[0];
        if start_code != DMX_NULL_START {
            self.state = ReceiveState::Discard;
            self.stats.error_count = self.stats.error_count.wrapping_add(1);
            self.stats.framing_error_count = self.stats.framing_error_count.wrapping_add(1);
            warn!("discarded {} bytes with start code {}", bytes_read, start_code);

            return ReceiveOutcome::Discarded { start_code };
        }

        self.state = ReceiveState::Commit;
        self.universe.copy_from_frame(&buffer[..bytes_read]);
        self.stats.frame_count = self.stats.frame_count.wrapping_add(1);
        self.stats.last_frame_timestamp_us = Some(self.timer.now_micros());
        trace!("dmx frame {} with {} bytes", self.stats.frame_count, bytes_read);

        ReceiveOutcome::Committed {
            bytes_received: bytes_read,
        }
    }

    fn fault(&mut self, error: DmxError<D::DriverError>) -> ReceiveOutcome<D::DriverError> {
        self.stats.error_count = self.stats.error_count.wrapping_add(1);
        warn!("dmx receive failed, {} errors so far", self.stats.error_count);

        ReceiveOutcome::Fault(error)
    }

    fn update_link_state(&mut self) {
        let link_up = self.is_receiving_data();
        if link_up != self.link_up {
            debug!("dmx link {}", if link_up { "up" } else { "down" });
            self.link_up = link_up;
        }
    }

    /// True if a frame was committed within the link timeout.
    pub fn is_receiving_data(&self) -> bool {
        match self.stats.last_frame_timestamp_us {
            Some(timestamp) => {
                self.timer.micros_since(timestamp) < self.config.link_timeout_ms as u64 * 1000
            },
            None => false,
        }
    }

    pub fn get_stats(&self) -> StatsSummary {
        StatsSummary {
            frames: self.stats.frame_count,
            errors: self.stats.error_count,
            last_frame_ms_ago: self
                .stats
                .last_frame_timestamp_us
                .map(|timestamp| self.timer.micros_since(timestamp) / 1000),
        }
    }

    /// The current channel values of a fixture.
    pub fn fixture_data(&self, fixture: &Fixture) -> FixtureData {
        get_fixture_data(fixture, &self.universe)
    }

    /// The channels of a fixture that changed since the last [DmxReceiver::update_last_frame].
    pub fn fixture_changes(&self, fixture: &Fixture) -> FixtureChanges {
        self.change_detector.fixture_changes(fixture, &self.universe)
    }

    /// Every slot that changed since the last [DmxReceiver::update_last_frame].
    pub fn universe_changes(&self) -> impl Iterator<Item = SlotChange> + '_ {
        self.change_detector.universe_changes(&self.universe)
    }

    /// Make the current universe the baseline for change detection.
    /// Call this once after processing a frame.
    pub fn update_last_frame(&mut self) {
        self.change_detector.update_last_frame(&self.universe);
    }

    /// Polls until `stop` is set and hands every outcome to `on_cycle`.
    ///
    /// The stop signal is only looked at between polls.
    pub fn run<F>(&mut self, stop: &AtomicBool, mut on_cycle: F)
    where
        F: FnMut(&mut Self, ReceiveOutcome<D::DriverError>),
    {
        while !stop.load(Ordering::Acquire) {
            let outcome = self.poll();
            on_cycle(self, outcome);
        }

        debug!(
            "dmx receiver stopped after {} frames and {} errors",
            self.stats.frame_count,
            self.stats.error_count
        );
    }
}
