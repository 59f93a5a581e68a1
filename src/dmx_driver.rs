use crate::consts::{DMX_MAX_PACKAGE_SIZE, DMX_NULL_START};
use crate::dmx_uart_driver::{
    DmxRecvUartDriver, DmxSendUartDriver, DmxUartDriver, DmxUartDriverError,
};

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmxError<E> {
    /// There were fewer bytes written to the uart then there should have been.
    UartOverflow,
    /// The request timed time out.
    /// **Important:** If you implement a driver make sure this error gets raised instead
    /// of a driver specific error.
    TimeoutError,
    /// The driver doesn't provide the requested line operation.
    Unsupported,
    /// An error raised by the uart driver.
    DriverError(E),
}

impl<E: core::fmt::Display> core::fmt::Display for DmxError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DmxError::UartOverflow => write!(f, "uart overflowed"),
            DmxError::TimeoutError => write!(f, "request timed out"),
            DmxError::Unsupported => write!(f, "operation not supported by driver"),
            DmxError::DriverError(error) => error.fmt(f),
        }
    }
}

#[cfg(feature = "std")]
impl<E: core::fmt::Display + core::fmt::Debug> std::error::Error for DmxError<E> {}

impl<E> From<DmxUartDriverError<E>> for DmxError<E> {
    fn from(value: DmxUartDriverError<E>) -> Self {
        match value {
            DmxUartDriverError::TimeoutError => Self::TimeoutError,
            DmxUartDriverError::Unsupported => Self::Unsupported,
            DmxUartDriverError::DriverError(driver_error) => Self::DriverError(driver_error),
        }
    }
}

/// Trait that ensures that the same Error is used in the [DmxFrameSender] as well as the [DmxFrameReceiver].
pub trait ControllerDriverErrorDef {
    /// The driver specific error.
    type DriverError;
}

impl<D: DmxUartDriver> ControllerDriverErrorDef for D {
    type DriverError = D::DriverError;
}

/// Trait for putting the slots of a frame onto the wire. The break has to be sent beforehand.
pub trait DmxFrameSender: ControllerDriverErrorDef {
    /// Write all slots (start code included) in one go.
    fn send_slots(&mut self, frame: &[u8]) -> Result<(), DmxError<Self::DriverError>>;
}

impl<D: DmxSendUartDriver> DmxFrameSender for D {
    fn send_slots(&mut self, frame: &[u8]) -> Result<(), DmxError<Self::DriverError>> {
        if self.write_frames(frame)? != frame.len() {
            return Err(DmxError::UartOverflow);
        }

        Ok(())
    }
}

/// Trait for reading raw DMX512 frames.
pub trait DmxFrameReceiver: ControllerDriverErrorDef {
    /// Wait up to `timeout_us` for a frame and read it into the buffer.
    ///
    /// If more complete dimmer frames are already queued behind the first one, the newest of them
    /// ends up in the buffer. Incomplete leftovers are dropped.
    /// Returns the number of bytes read.
    fn receive_frame(
        &mut self,
        buffer: &mut [u8; DMX_MAX_PACKAGE_SIZE],
        timeout_us: u32,
    ) -> Result<usize, DmxError<Self::DriverError>>;

    /// Drop everything that is already buffered by the driver.
    /// Returns the number of bytes dropped.
    fn discard_pending(&mut self) -> Result<usize, DmxError<Self::DriverError>>;
}

impl<D: DmxRecvUartDriver> DmxFrameReceiver for D {
    fn receive_frame(
        &mut self,
        buffer: &mut [u8; DMX_MAX_PACKAGE_SIZE],
        timeout_us: u32,
    ) -> Result<usize, DmxError<Self::DriverError>> {
        let bytes_read = self.read_frames(buffer, timeout_us)?;
        if bytes_read < buffer.len() {
            return Ok(bytes_read);
        }

        let mut next_frame = [0u8; DMX_MAX_PACKAGE_SIZE];
        while self.bytes_available()? > 0 {
            let next_bytes_read = match self.read_frames(&mut next_frame, 0) {
                Err(DmxUartDriverError::TimeoutError) => break,
                result => result?,
            };

            if next_bytes_read == 0 {
                break;
            }

            if next_bytes_read == next_frame.len() && next_frame[0] == DMX_NULL_START {
                buffer.copy_from_slice(&next_frame);
            }
        }

        Ok(bytes_read)
    }

    fn discard_pending(&mut self) -> Result<usize, DmxError<Self::DriverError>> {
        let mut scratch_buffer = [0u8; 64];
        let mut bytes_discarded = 0;

        loop {
            let bytes_available = self.bytes_available()?;
            if bytes_available == 0 {
                break;
            }

            let chunk_size = bytes_available.min(scratch_buffer.len());
            let bytes_read = match self.read_frames(&mut scratch_buffer[..chunk_size], 0) {
                Err(DmxUartDriverError::TimeoutError) => break,
                result => result?,
            };

            if bytes_read == 0 {
                break;
            }

            bytes_discarded += bytes_read;
        }

        Ok(bytes_discarded)
    }
}
