use crate::consts::{DMX_MAX_CHANNELS, DMX_MAX_PACKAGE_SIZE, DMX_NULL_START};
use crate::layouts::dmx_frame_layout;

/// One DMX512 universe: the start code followed by 512 channel slots.
///
/// The buffer always has exactly 513 bytes. Channels are addressed 1-based like on a lighting
/// desk, slot 0 is the start code. Writes to channels outside `1..=512` are ignored, matching
/// the tolerant addressing of most DMX gear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmxUniverse {
    slots: [u8; DMX_MAX_PACKAGE_SIZE],
}

impl Default for DmxUniverse {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for DmxUniverse {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "DmxUniverse {{ start_code: {=u8:#x}, active_channels: {=usize} }}",
            self.start_code(),
            self.active_channels().count()
        );
    }
}

impl DmxUniverse {
    /// Creates a blacked out universe with the dimmer data start code.
    pub const fn new() -> Self {
        Self {
            slots: [0u8; DMX_MAX_PACKAGE_SIZE],
        }
    }

    /// Sets a channel (1-512) to `value` clamped to 0-255.
    /// Channels outside of the universe are silently ignored.
    pub fn set<V: Into<i32>>(&mut self, channel: usize, value: V) {
        if !(1..=DMX_MAX_CHANNELS).contains(&channel) {
            return;
        }

        self.slots[channel] = value.into().clamp(0, u8::MAX as i32) as u8;
    }

    /// Gets the value of a channel (1-512). Returns 0 for channels outside of the universe.
    pub fn get(&self, channel: usize) -> u8 {
        if !(1..=DMX_MAX_CHANNELS).contains(&channel) {
            return 0;
        }

        self.slots[channel]
    }

    pub fn start_code(&self) -> u8 {
        dmx_frame_layout::View::new(&self.slots[..])
            .start_code()
            .read()
    }

    pub fn set_start_code(&mut self, start_code: u8) {
        dmx_frame_layout::View::new(&mut self.slots[..])
            .start_code_mut()
            .write(start_code);
    }

    /// True if the start code marks dimmer data.
    pub fn is_standard(&self) -> bool {
        self.start_code() == DMX_NULL_START
    }

    /// The 512 channel values. Index 0 is channel 1.
    pub fn channels(&self) -> &[u8] {
        &self.slots[1..]
    }

    /// The whole frame as it goes over the wire, start code first.
    pub fn as_bytes(&self) -> &[u8; DMX_MAX_PACKAGE_SIZE] {
        &self.slots
    }

    /// Sets every channel to 0. The start code stays untouched.
    pub fn blackout(&mut self) {
        dmx_frame_layout::View::new(&mut self.slots[..])
            .slots_mut()
            .fill(0);
    }

    /// Overwrites the universe with a received frame, start code first.
    ///
    /// Bytes beyond the universe are dropped. If the frame is shorter than a universe the
    /// remaining slots keep their previous values.
    /// Returns the number of bytes copied.
    pub fn copy_from_frame(&mut self, frame: &[u8]) -> usize {
        let bytes_to_copy = frame.len().min(DMX_MAX_PACKAGE_SIZE);
        self.slots[..bytes_to_copy].copy_from_slice(&frame[..bytes_to_copy]);

        bytes_to_copy
    }

    /// Sets red, green, blue and dimmer on four consecutive channels beginning at `start_channel`.
    /// Channels outside of the universe are ignored like in [DmxUniverse::set].
    pub fn set_rgb(&mut self, start_channel: usize, red: u8, green: u8, blue: u8, dimmer: u8) {
        let values = [red, green, blue, dimmer];

        for (offset, value) in values.into_iter().enumerate() {
            if let Some(channel) = start_channel.checked_add(offset) {
                self.set(channel, value);
            }
        }
    }

    /// Reads red, green and blue from three consecutive channels beginning at `start_channel`.
    /// Returns black if the channels don't fit into the universe.
    pub fn rgb(&self, start_channel: usize) -> (u8, u8, u8) {
        if !(1..=DMX_MAX_CHANNELS - 2).contains(&start_channel) {
            return (0, 0, 0);
        }

        (
            self.slots[start_channel],
            self.slots[start_channel + 1],
            self.slots[start_channel + 2],
        )
    }

    /// Iterates over all channels with a value other than 0 as `(channel, value)`.
    pub fn active_channels(&self) -> impl Iterator<Item = (usize, u8)> + '_ {
        self.channels()
            .iter()
            .enumerate()
            .filter(|(_, value)| **value != 0)
            .map(|(index, value)| (index + 1, *value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_in_range() {
        let mut universe = DmxUniverse::new();

        universe.set(1, 17);
        universe.set(512, 255);
        universe.set(256, 300);
        universe.set(257, -5);

        assert_eq!(universe.get(1), 17);
        assert_eq!(universe.get(512), 255);
        assert_eq!(universe.get(256), 255);
        assert_eq!(universe.get(257), 0);
    }

    #[test]
    fn test_set_out_of_range_is_ignored() {
        let mut universe = DmxUniverse::new();
        universe.set(0, 99);
        universe.set(513, 99);
        universe.set(usize::MAX, 99);

        assert_eq!(universe, DmxUniverse::new());
        assert_eq!(universe.start_code(), DMX_NULL_START);
        assert_eq!(universe.get(513), 0);
    }

    #[test]
    fn test_set_get_every_channel() {
        for channel in 0..=514 {
            for value in [-1, 0, 128, 255, 256] {
                let mut universe = DmxUniverse::new();
                universe.set(channel, value);

                if (1..=512).contains(&channel) {
                    assert_eq!(universe.get(channel), value.clamp(0, 255) as u8);
                } else {
                    assert_eq!(universe, DmxUniverse::new());
                }
            }
        }
    }

    #[test]
    fn test_start_code() {
        let mut universe = DmxUniverse::new();
        assert!(universe.is_standard());

        universe.set_start_code(0x17);
        assert_eq!(universe.start_code(), 0x17);
        assert_eq!(universe.as_bytes()[0], 0x17);
        assert!(!universe.is_standard());
    }

    #[test]
    fn test_copy_from_frame_keeps_stale_slots() {
        let mut universe = DmxUniverse::new();
        universe.set(10, 200);

        let copied = universe.copy_from_frame(&[0, 1, 2, 3]);

        assert_eq!(copied, 4);
        assert_eq!(universe.channels()[..3], [1, 2, 3]);
        assert_eq!(universe.get(10), 200);
    }

    #[test]
    fn test_copy_from_frame_truncates() {
        let mut universe = DmxUniverse::new();
        let frame = [7u8; 600];

        assert_eq!(universe.copy_from_frame(&frame), 513);
        assert!(universe.as_bytes().iter().all(|slot| *slot == 7));
    }

    #[test]
    fn test_blackout_keeps_start_code() {
        let mut universe = DmxUniverse::new();
        universe.set_start_code(0x55);
        universe.set_rgb(23, 255, 128, 64, 255);

        universe.blackout();

        assert_eq!(universe.start_code(), 0x55);
        assert_eq!(universe.active_channels().count(), 0);
    }

    #[test]
    fn test_rgb() {
        let mut universe = DmxUniverse::new();
        universe.set_rgb(23, 255, 0, 128, 200);

        assert_eq!(universe.rgb(23), (255, 0, 128));
        assert_eq!(universe.get(26), 200);
        assert_eq!(universe.rgb(510), (0, 0, 0));
        assert_eq!(universe.rgb(511), (0, 0, 0));
        assert_eq!(universe.rgb(0), (0, 0, 0));
    }

    #[test]
    fn test_rgb_out_of_range() {
        let mut universe = DmxUniverse::new();
        universe.set_rgb(usize::MAX, 1, 2, 3, 4);
        universe.set_rgb(usize::MAX - 1, 1, 2, 3, 4);
        assert_eq!(universe, DmxUniverse::new());

        universe.set_rgb(510, 1, 2, 3, 4);
        assert_eq!(universe.get(510), 1);
        assert_eq!(universe.get(512), 3);

        assert_eq!(universe.rgb(usize::MAX), (0, 0, 0));
        assert_eq!(universe.rgb(usize::MAX - 1), (0, 0, 0));
        assert_eq!(universe.rgb(510), (1, 2, 3));
    }

    #[test]
    fn test_active_channels() {
        let mut universe = DmxUniverse::new();
        universe.set(3, 1);
        universe.set(512, 9);

        let mut active_channels = universe.active_channels();
        assert_eq!(active_channels.next(), Some((3, 1)));
        assert_eq!(active_channels.next(), Some((512, 9)));
        assert_eq!(active_channels.next(), None);
    }
}
