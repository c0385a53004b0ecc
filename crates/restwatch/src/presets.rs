//! Countdown presets: named durations applied with a single action.

use serde::{Deserialize, Serialize};

/// Upper bound on the preset row; adding past it drops the oldest entry.
pub const PRESET_CAP: usize = 8;

/// A reusable countdown duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    /// Label shown on the preset chip.
    pub label: String,
    /// Duration in seconds, always positive.
    pub sec: u32,
}

impl Preset {
    pub fn new(label: impl Into<String>, sec: u32) -> Self {
        Self {
            label: label.into(),
            sec,
        }
    }

    /// The stock presets the app ships with.
    pub fn defaults() -> Vec<Preset> {
        vec![
            Preset::new("30 sec", 30),
            Preset::new("1 min", 60),
            Preset::new("90 sec", 90),
            Preset::new("2 min", 120),
            Preset::new("5 min", 300),
        ]
    }
}

/// Session-scoped preset list, unique by duration.
///
/// Adding a duration that already exists replaces it and moves it to the
/// front rather than duplicating. Persistence across runs is the host's
/// concern; the initial list comes from config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresetList {
    presets: Vec<Preset>,
}

impl PresetList {
    /// Builds a list from config entries, enforcing uniqueness and the cap.
    pub fn new(presets: Vec<Preset>) -> Self {
        let mut list = Self::default();
        for preset in presets.into_iter().rev() {
            list.add(preset);
        }
        list
    }

    pub fn as_slice(&self) -> &[Preset] {
        &self.presets
    }

    pub fn get(&self, index: usize) -> Option<&Preset> {
        self.presets.get(index)
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Front-inserts a preset, removing any entry with the same duration and
    /// trimming overflow from the back.
    pub fn add(&mut self, preset: Preset) {
        self.presets.retain(|p| p.sec != preset.sec);
        self.presets.insert(0, preset);
        self.presets.truncate(PRESET_CAP);
    }

    /// Removes the preset with the given duration. Returns whether one
    /// existed.
    pub fn remove(&mut self, sec: u32) -> bool {
        let before = self.presets.len();
        self.presets.retain(|p| p.sec != sec);
        self.presets.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_replaces_duplicate_and_moves_to_front() {
        let mut list = PresetList::new(Preset::defaults());

        list.add(Preset::new("one minute", 60));

        let secs: Vec<u32> = list.as_slice().iter().map(|p| p.sec).collect();
        assert_eq!(secs, vec![60, 30, 90, 120, 300]);
        assert_eq!(list.get(0).unwrap().label, "one minute");
    }

    #[test]
    fn add_caps_the_list() {
        let mut list = PresetList::default();
        for sec in 1..=(PRESET_CAP as u32 + 3) {
            list.add(Preset::new(format!("{sec} sec"), sec));
        }

        assert_eq!(list.len(), PRESET_CAP);
        // Newest first, oldest dropped.
        assert_eq!(list.get(0).unwrap().sec, PRESET_CAP as u32 + 3);
        assert!(list.as_slice().iter().all(|p| p.sec > 3));
    }

    #[test]
    fn new_preserves_config_order() {
        let list = PresetList::new(vec![
            Preset::new("a", 10),
            Preset::new("b", 20),
            Preset::new("c", 30),
        ]);

        let secs: Vec<u32> = list.as_slice().iter().map(|p| p.sec).collect();
        assert_eq!(secs, vec![10, 20, 30]);
    }

    #[test]
    fn remove_reports_membership() {
        let mut list = PresetList::new(Preset::defaults());

        assert!(list.remove(90));
        assert!(!list.remove(90));
        assert_eq!(list.len(), 4);
    }
}
