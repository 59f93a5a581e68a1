#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmxUartDriverError<E> {
    /// The request timed time out.
    /// IMPORTANT: If you implement a driver make sure this error gets raised instead
    /// of a driver specific error.
    TimeoutError,
    /// The driver doesn't provide the requested line operation.
    Unsupported,
    /// A driver specific error.
    DriverError(E),
}

impl<E: core::fmt::Display> core::fmt::Display for DmxUartDriverError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DmxUartDriverError::TimeoutError => write!(f, "timeout error occurred"),
            DmxUartDriverError::Unsupported => write!(f, "operation not supported by driver"),
            DmxUartDriverError::DriverError(error) => error.fmt(f),
        }
    }
}

#[cfg(feature = "std")]
impl<E: core::fmt::Display + core::fmt::Debug> std::error::Error for DmxUartDriverError<E> {}

impl<E> From<E> for DmxUartDriverError<E> {
    fn from(value: E) -> Self {
        Self::DriverError(value)
    }
}

pub trait DmxUartDriver {
    type DriverError;
}

/// Object to implement access to the uart.
/// It can write raw bytes and generate the break that precedes every frame.
/// The line format has to be 8 data bits, no parity and 2 stop bits.
pub trait DmxSendUartDriver: DmxUartDriver {
    /// Reconfigure the uart to the given baud rate. Used with [crate::consts::DMX_BAUD] for data
    /// and with a lower rate for the break fallback.
    fn set_baud_rate(&mut self, baud: u32) -> Result<(), DmxUartDriverError<Self::DriverError>>;

    /// Write raw bytes without generating a break.
    /// Returns the number of bytes actually written.
    fn write_frames(
        &mut self,
        buffer: &[u8],
    ) -> Result<usize, DmxUartDriverError<Self::DriverError>>;

    /// Whether [DmxSendUartDriver::set_break] and [DmxSendUartDriver::clear_break] drive a real
    /// break condition. Queried once when a controller gets created.
    fn supports_native_break(&self) -> bool {
        false
    }

    /// Pull the line low until [DmxSendUartDriver::clear_break] gets called.
    fn set_break(&mut self) -> Result<(), DmxUartDriverError<Self::DriverError>> {
        Err(DmxUartDriverError::Unsupported)
    }

    /// Release the line after [DmxSendUartDriver::set_break].
    fn clear_break(&mut self) -> Result<(), DmxUartDriverError<Self::DriverError>> {
        Err(DmxUartDriverError::Unsupported)
    }
}

/// Object to implement access to the uart.
/// It can read frames.
/// It has to communicate at 250000 baud.
pub trait DmxRecvUartDriver: DmxUartDriver {
    /// Wait up to `timeout_us` for data and read whatever is available into the buffer.
    /// Returns the number of bytes actually read.
    /// Raises [DmxUartDriverError::TimeoutError] if nothing arrived in time.
    fn read_frames(
        &mut self,
        buffer: &mut [u8],
        timeout_us: u32,
    ) -> Result<usize, DmxUartDriverError<Self::DriverError>>;

    /// The amount of bytes that can be read without waiting.
    fn bytes_available(&mut self) -> Result<usize, DmxUartDriverError<Self::DriverError>>;
}
