pub const DMX_NULL_START: u8 = 0x00;
/// start code + 512 byte package
pub const DMX_MAX_PACKAGE_SIZE: usize = 513;
pub const DMX_MAX_CHANNELS: usize = 512;

pub const DMX_BAUD: u32 = 250_000;
/// Baud rate used to stretch a single zero byte into a break on uarts without a break primitive.
pub const FALLBACK_BREAK_BAUD: u32 = 50_000;
/// 1 start bit + 8 data bits + 2 stop bits
pub const BITS_PER_SLOT: u32 = 11;

pub const BREAK_MICROS: u32 = 100;
pub const MIN_BREAK_MICROS: u32 = 88;
pub const MAB_MICROS: u32 = 12;
pub const MIN_MAB_MICROS: u32 = 8;

pub const DEFAULT_REFRESH_RATE_HZ: u32 = 40;
/// A full universe can't be sent faster than this.
pub const MAX_REFRESH_RATE_HZ: u32 = 44;

pub const READ_TIMEOUT_MICROS: u32 = 100_000;
pub const LINK_TIMEOUT_MILLIS: u32 = 2000;
/// Nine low bits at this rate still last 90µs.
pub const MAX_FALLBACK_BREAK_BAUD: u32 = 100_000;
