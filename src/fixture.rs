use crate::consts::DMX_MAX_CHANNELS;
use crate::types::{FixtureChanges, FixtureData};
use crate::universe::DmxUniverse;

/// A lighting device occupying a contiguous window of channels in a universe.
///
/// Fixtures are plain data and can be declared in a `static` fixture table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Fixture {
    /// Display name.
    pub name: &'static str,
    /// The first dmx address (1-512) of the fixture.
    pub address: u16,
    /// The amount of channels the fixture occupies.
    pub channel_count: u16,
    /// A free form tag describing the kind of device like "Moving Head".
    pub type_tag: &'static str,
}

/// A channel of a fixture that changed between two universes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FixtureChange {
    /// The channel inside of the fixture, starting at 1.
    pub channel: u16,
    /// The absolute dmx address of the channel.
    pub dmx_address: u16,
    pub old_value: u8,
    pub new_value: u8,
}

/// The demo rig: two moving heads followed by two rgb color changers.
pub const PICO_RIG: [Fixture; 4] = [
    Fixture::new("PicoSpot 1", 1, 11, "Moving Head"),
    Fixture::new("PicoSpot 2", 12, 11, "Moving Head"),
    Fixture::new("RGB LED 1", 23, 5, "Color Changer"),
    Fixture::new("RGB LED 2", 28, 5, "Color Changer"),
];

impl Fixture {
    pub const fn new(
        name: &'static str,
        address: u16,
        channel_count: u16,
        type_tag: &'static str,
    ) -> Self {
        Self {
            name,
            address,
            channel_count,
            type_tag,
        }
    }

    /// True if the whole window of the fixture lies inside of the universe.
    pub fn is_valid(&self) -> bool {
        self.window().is_some()
    }

    /// The last dmx address occupied by the fixture.
    pub fn last_address(&self) -> u16 {
        self.address
            .saturating_add(self.channel_count)
            .saturating_sub(1)
    }

    /// True if the dmx address belongs to the fixture.
    pub fn contains(&self, dmx_address: u16) -> bool {
        self.is_valid()
            && self.channel_count > 0
            && (self.address..=self.last_address()).contains(&dmx_address)
    }

    /// The slot range of the fixture inside of [DmxUniverse::channels].
    fn window(&self) -> Option<core::ops::Range<usize>> {
        if self.address == 0 {
            return None;
        }

        let start = self.address as usize - 1;
        let end = start + self.channel_count as usize;
        if end > DMX_MAX_CHANNELS {
            return None;
        }

        Some(start..end)
    }
}

/// Get the channel values of a fixture.
///
/// If the fixture doesn't fit into the universe `channel_count` zeros are returned instead.
pub fn get_fixture_data(fixture: &Fixture, universe: &DmxUniverse) -> FixtureData {
    match fixture.window() {
        Some(window) => FixtureData::from_slice(&universe.channels()[window])
            .unwrap_or_else(|_| FixtureData::new()),
        None => {
            let mut data = FixtureData::new();
            let length = (fixture.channel_count as usize).min(DMX_MAX_CHANNELS);
            data.resize(length, 0).unwrap();
            data
        },
    }
}

/// Get the channels of a fixture that differ between `current` and `previous`.
///
/// Returns an empty list if nothing changed or if the fixture doesn't fit into the universe.
pub fn get_fixture_changes(
    fixture: &Fixture,
    current: &DmxUniverse,
    previous: &DmxUniverse,
) -> FixtureChanges {
    let mut changes = FixtureChanges::new();

    let window = match fixture.window() {
        Some(window) => window,
        None => return changes,
    };

    let current_values = &current.channels()[window.clone()];
    let previous_values = &previous.channels()[window];

    for (index, (new_value, old_value)) in current_values.iter().zip(previous_values).enumerate() {
        if new_value == old_value {
            continue;
        }

        changes
            .push(FixtureChange {
                channel: index as u16 + 1,
                dmx_address: fixture.address + index as u16,
                old_value: *old_value,
                new_value: *new_value,
            })
            .unwrap();
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_data() {
        let mut universe = DmxUniverse::new();
        universe.set(23, 255);
        universe.set(26, 255);

        let fixture = Fixture::new("RGB", 23, 4, "Color Changer");

        assert_eq!(get_fixture_data(&fixture, &universe), [255, 0, 0, 255]);
    }

    #[test]
    fn test_fixture_data_at_the_edges() {
        let mut universe = DmxUniverse::new();
        universe.set(1, 1);
        universe.set(512, 2);

        let first = Fixture::new("first", 1, 1, "Dimmer");
        let last = Fixture::new("last", 512, 1, "Dimmer");
        let everything = Fixture::new("everything", 1, 512, "Dimmer");

        assert_eq!(get_fixture_data(&first, &universe), [1]);
        assert_eq!(get_fixture_data(&last, &universe), [2]);
        assert_eq!(get_fixture_data(&everything, &universe).len(), 512);
    }

    #[test]
    fn test_invalid_fixture_reads_zeros() {
        let mut universe = DmxUniverse::new();
        universe.set(512, 77);

        let overflowing = Fixture::new("overflowing", 510, 5, "Color Changer");
        let no_address = Fixture::new("no address", 0, 3, "Dimmer");
        let huge = Fixture::new("huge", 1, 1000, "Dimmer");

        assert!(!overflowing.is_valid());
        assert!(!no_address.is_valid());
        assert_eq!(get_fixture_data(&overflowing, &universe), [0, 0, 0, 0, 0]);
        assert_eq!(get_fixture_data(&no_address, &universe), [0, 0, 0]);
        assert_eq!(get_fixture_data(&huge, &universe).len(), 512);
    }

    #[test]
    fn test_fixture_changes() {
        let previous = DmxUniverse::new();
        let mut current = DmxUniverse::new();
        current.set(23, 10);

        let fixture = Fixture::new("RGB", 23, 5, "Color Changer");
        let changes = get_fixture_changes(&fixture, &current, &previous);

        assert_eq!(
            changes,
            [FixtureChange {
                channel: 1,
                dmx_address: 23,
                old_value: 0,
                new_value: 10,
            }]
        );
    }

    #[test]
    fn test_fixture_changes_outside_of_window_are_ignored() {
        let previous = DmxUniverse::new();
        let mut current = DmxUniverse::new();
        current.set(22, 10);
        current.set(28, 10);
        current.set(27, 3);

        let fixture = Fixture::new("RGB", 23, 5, "Color Changer");
        let changes = get_fixture_changes(&fixture, &current, &previous);

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].channel, 5);
        assert_eq!(changes[0].dmx_address, 27);
        assert_eq!(changes[0].new_value, 3);
    }

    #[test]
    fn test_invalid_fixture_has_no_changes() {
        let previous = DmxUniverse::new();
        let mut current = DmxUniverse::new();
        current.set(511, 1);

        let fixture = Fixture::new("overflowing", 510, 5, "Color Changer");

        assert!(get_fixture_changes(&fixture, &current, &previous).is_empty());
    }

    #[test]
    fn test_addresses() {
        let fixture = PICO_RIG[2];

        assert_eq!(fixture.last_address(), 27);
        assert!(fixture.contains(23));
        assert!(fixture.contains(27));
        assert!(!fixture.contains(28));
        assert!(!Fixture::new("empty", 5, 0, "Dimmer").contains(5));
        assert!(PICO_RIG.iter().all(Fixture::is_valid));
    }

    #[test]
    fn test_invalid_fixture_contains_nothing() {
        let unaddressed = Fixture::new("unaddressed", 0, 3, "Dimmer");
        assert!(!unaddressed.contains(0));
        assert!(!unaddressed.contains(1));

        let overhanging = Fixture::new("overhanging", 510, 5, "Color Changer");
        assert!(!overhanging.is_valid());
        assert!(!overhanging.contains(511));
    }
}
