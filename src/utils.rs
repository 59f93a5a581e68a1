use core::fmt::Write;

use crate::consts::DMX_MAX_CHANNELS;
use crate::universe::DmxUniverse;

const CHANNELS_PER_ROW: usize = 16;

type HexRow = heapless::String<{ CHANNELS_PER_ROW * 3 }>;

/// Logs a hex dump of the first `max_channels` channels followed by every active channel.
///
/// Only produces output if the `defmt` or `log` feature is enabled.
pub fn log_universe(universe: &DmxUniverse, max_channels: usize) {
    let max_channels = max_channels.min(DMX_MAX_CHANNELS);

    info!(
        "universe with start code {}, {} active channels",
        universe.start_code(),
        universe.active_channels().count()
    );

    for (row_index, row) in universe.channels()[..max_channels]
        .chunks(CHANNELS_PER_ROW)
        .enumerate()
    {
        let first_channel = row_index * CHANNELS_PER_ROW + 1;
        let hex_row = hex_row(row);
        info!("{}: {}", first_channel, hex_row.as_str());
    }

    for (channel, value) in universe.active_channels() {
        debug!("channel {} = {}", channel, value);
    }
}

/// Formats up to 16 channel values as space separated hex bytes.
pub(crate) fn hex_row(values: &[u8]) -> HexRow {
    let mut row = HexRow::new();

    for (index, value) in values.iter().take(CHANNELS_PER_ROW).enumerate() {
        let separator = if index == 0 { "" } else { " " };
        write!(row, "{}{:02x}", separator, value).unwrap();
    }

    row
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_row() {
        assert_eq!(hex_row(&[0x00, 0x0A, 0xFF]).as_str(), "00 0a ff");
        assert_eq!(hex_row(&[]).as_str(), "");
    }

    #[test]
    fn test_hex_row_full_width() {
        let row = hex_row(&[0xAB; 20]);

        assert_eq!(row.len(), CHANNELS_PER_ROW * 3 - 1);
        assert!(row.as_str().starts_with("ab ab"));
    }

    #[test]
    fn test_log_universe_accepts_any_length() {
        let mut universe = DmxUniverse::new();
        universe.set(1, 255);
        universe.set(512, 1);

        log_universe(&universe, 0);
        log_universe(&universe, 40);
        log_universe(&universe, 10_000);
    }
}
