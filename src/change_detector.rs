use crate::fixture::{get_fixture_changes, Fixture};
use crate::types::FixtureChanges;
use crate::universe::DmxUniverse;

/// A slot of the universe that changed between two frames. Slot 0 is the start code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlotChange {
    pub slot: usize,
    pub old_value: u8,
    pub new_value: u8,
}

impl SlotChange {
    pub fn is_start_code(&self) -> bool {
        self.slot == 0
    }
}

/// Keeps the last processed frame around to compare new frames against.
///
/// The baseline only moves when [ChangeDetector::update_last_frame] gets called. If it isn't
/// called after processing a frame, every following comparison reports the same changes again.
#[derive(Debug, Clone, Default)]
pub struct ChangeDetector {
    last_frame: DmxUniverse,
}

impl ChangeDetector {
    /// Creates a detector with a blacked out baseline.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current baseline.
    pub fn last_frame(&self) -> &DmxUniverse {
        &self.last_frame
    }

    /// Make `universe` the new baseline.
    pub fn update_last_frame(&mut self, universe: &DmxUniverse) {
        self.last_frame.clone_from(universe);
    }

    /// The changed channels of a fixture compared to the baseline.
    pub fn fixture_changes(&self, fixture: &Fixture, current: &DmxUniverse) -> FixtureChanges {
        get_fixture_changes(fixture, current, &self.last_frame)
    }

    /// Every slot of the universe that differs from the baseline, start code included.
    pub fn universe_changes<'a>(
        &'a self,
        current: &'a DmxUniverse,
    ) -> impl Iterator<Item = SlotChange> + 'a {
        current
            .as_bytes()
            .iter()
            .zip(self.last_frame.as_bytes())
            .enumerate()
            .filter(|(_, (new_value, old_value))| new_value != old_value)
            .map(|(slot, (new_value, old_value))| SlotChange {
                slot,
                old_value: *old_value,
                new_value: *new_value,
            })
    }

    /// True if anything in the universe differs from the baseline.
    pub fn has_changed(&self, current: &DmxUniverse) -> bool {
        self.last_frame != *current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::FixtureChange;

    #[test]
    fn test_fixture_change_against_baseline() {
        let detector = ChangeDetector::new();
        let mut universe = DmxUniverse::new();
        universe.set(23, 10);

        let fixture = Fixture::new("RGB LED 1", 23, 5, "Color Changer");

        assert_eq!(
            detector.fixture_changes(&fixture, &universe),
            [FixtureChange {
                channel: 1,
                dmx_address: 23,
                old_value: 0,
                new_value: 10,
            }]
        );
    }

    #[test]
    fn test_changes_repeat_until_baseline_moves() {
        let mut detector = ChangeDetector::new();
        let mut universe = DmxUniverse::new();
        universe.set(24, 99);

        let fixture = Fixture::new("RGB LED 1", 23, 5, "Color Changer");

        assert_eq!(detector.fixture_changes(&fixture, &universe).len(), 1);
        assert_eq!(detector.fixture_changes(&fixture, &universe).len(), 1);

        detector.update_last_frame(&universe);
        assert!(detector.fixture_changes(&fixture, &universe).is_empty());
    }

    #[test]
    fn test_update_last_frame_twice_is_idempotent() {
        let mut detector = ChangeDetector::new();
        let mut universe = DmxUniverse::new();
        universe.set(100, 1);
        universe.set(200, 2);

        detector.update_last_frame(&universe);
        detector.update_last_frame(&universe);

        assert_eq!(detector.universe_changes(&universe).count(), 0);
        assert!(!detector.has_changed(&universe));
        assert_eq!(detector.last_frame(), &universe);
    }

    #[test]
    fn test_universe_changes_include_start_code() {
        let mut detector = ChangeDetector::new();
        let mut universe = DmxUniverse::new();
        detector.update_last_frame(&universe);

        universe.set_start_code(0x17);
        universe.set(512, 4);

        let mut changes = detector.universe_changes(&universe);
        let start_code_change = changes.next().unwrap();
        assert!(start_code_change.is_start_code());
        assert_eq!(start_code_change.new_value, 0x17);

        assert_eq!(
            changes.next(),
            Some(SlotChange {
                slot: 512,
                old_value: 0,
                new_value: 4,
            })
        );
        assert_eq!(changes.next(), None);
    }
}
