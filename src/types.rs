use crate::consts::DMX_MAX_CHANNELS;
use crate::fixture::FixtureChange;

/// The channel values of one fixture.
pub type FixtureData = heapless::Vec<u8, DMX_MAX_CHANNELS>;
/// The changed channels of one fixture.
pub type FixtureChanges = heapless::Vec<FixtureChange, DMX_MAX_CHANNELS>;

/// The step a [crate::dmx_controller::DmxController] is in while sending a frame.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransmitState {
    /// No frame is being sent.
    Idle,
    /// The line is held low.
    Break,
    /// The line is idle high before the start code.
    MarkAfterBreak,
    /// The slots are being written.
    Data,
}

/// The step a [crate::dmx_receiver::DmxReceiver] is in while polling for a frame.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReceiveState {
    /// No poll is in progress.
    Idle,
    /// Waiting for the transport to deliver data.
    AwaitData,
    /// Checking the start code of the received data.
    Validate,
    /// Copying a valid frame into the universe.
    Commit,
    /// Dropping an invalid frame.
    Discard,
}

/// How a [crate::dmx_controller::DmxController] generates the break.
/// Selected once when the controller gets created.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BreakMode {
    /// The uart drives the break itself.
    Native,
    /// A zero byte sent at a lower baud rate keeps the line low long enough.
    ///
    /// <div class="warning">This only approximates a break. Whether the low period actually
    /// lasts 88µs depends on how the uart handles the baud rate switch.</div>
    LowBaud,
}
