//! In-memory snapshot of one group plus the navigation cursor
//!
//! Edits made while browsing are kept here as an overlay on the stored
//! record. Each field carries its own dirty flag so the catalog is only
//! written when the user asks for it.

use image::Rgb;
use sqldb::ImageEntry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingEntry {
    pub entry: ImageEntry,
    color_dirty: bool,
    tolerance_dirty: bool,
}

impl WorkingEntry {
    pub fn new(entry: ImageEntry) -> Self {
        Self {
            entry,
            color_dirty: false,
            tolerance_dirty: false,
        }
    }

    pub fn target_color(&self) -> Rgb<u8> {
        Rgb(self.entry.target_rgb)
    }

    pub fn tolerance(&self) -> u8 {
        self.entry.tolerance
    }

    pub fn set_target_color(&mut self, color: Rgb<u8>) {
        if self.entry.target_rgb != color.0 {
            self.entry.target_rgb = color.0;
            self.color_dirty = true;
        }
    }

    pub fn set_tolerance(&mut self, tolerance: u8) {
        if self.entry.tolerance != tolerance {
            self.entry.tolerance = tolerance;
            self.tolerance_dirty = true;
        }
    }

    pub fn is_color_dirty(&self) -> bool {
        self.color_dirty
    }

    pub fn is_tolerance_dirty(&self) -> bool {
        self.tolerance_dirty
    }

    pub fn is_dirty(&self) -> bool {
        self.color_dirty || self.tolerance_dirty
    }

    pub fn mark_clean(&mut self) {
        self.color_dirty = false;
        self.tolerance_dirty = false;
    }
}

/// Ordered entries of one group
///
/// `current` is `None` exactly when the set is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkingSet {
    entries: Vec<WorkingEntry>,
    current: Option<usize>,
}

impl WorkingSet {
    /// Build a set ordered by id ascending with the cursor on the first entry
    pub fn from_entries(mut entries: Vec<ImageEntry>) -> Self {
        entries.sort_by_key(|e| e.id);

        let current = if entries.is_empty() { None } else { Some(0) };
        Self {
            entries: entries.into_iter().map(WorkingEntry::new).collect(),
            current,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[WorkingEntry] {
        &self.entries
    }

    /// Cursor as a signed index, `-1` when empty
    pub fn current_index(&self) -> i64 {
        self.current.map_or(-1, |i| i as i64)
    }

    pub fn current(&self) -> Option<&WorkingEntry> {
        self.current.and_then(|i| self.entries.get(i))
    }

    pub fn current_mut(&mut self) -> Option<&mut WorkingEntry> {
        self.current.and_then(|i| self.entries.get_mut(i))
    }

    /// Step forward, wrapping from the last entry to the first
    pub fn advance(&mut self) -> bool {
        match self.current {
            Some(i) => {
                self.current = Some((i + 1) % self.entries.len());
                true
            }
            None => false,
        }
    }

    /// Step back, wrapping from the first entry to the last
    pub fn retreat(&mut self) -> bool {
        match self.current {
            Some(i) => {
                let len = self.entries.len();
                self.current = Some((i + len - 1) % len);
                true
            }
            None => false,
        }
    }

    /// Drop the current entry and keep the cursor in range
    ///
    /// Remaining entries keep their order. The cursor stays on the same
    /// slot, which now holds the following entry, or moves to the new last
    /// entry when the removed one was last.
    pub fn remove_current(&mut self) -> Option<WorkingEntry> {
        let i = self.current?;
        let removed = self.entries.remove(i);

        self.current = if self.entries.is_empty() {
            None
        } else {
            Some(i.min(self.entries.len() - 1))
        };

        Some(removed)
    }

    /// 1-based position and total, `(0, 0)` when nothing is selected
    pub fn position(&self) -> (usize, usize) {
        match self.current {
            Some(i) => (i + 1, self.entries.len()),
            None => (0, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: i64) -> ImageEntry {
        ImageEntry {
            id,
            group_name: "A".to_string(),
            image_path: format!("/img/{id}.png"),
            target_rgb: [255, 255, 255],
            tolerance: 10,
        }
    }

    fn ids(set: &WorkingSet) -> Vec<i64> {
        set.entries().iter().map(|e| e.entry.id).collect()
    }

    #[test]
    fn test_from_entries_sorts_by_id() {
        let set = WorkingSet::from_entries(vec![entry(5), entry(2), entry(9)]);
        assert_eq!(ids(&set), vec![2, 5, 9]);
        assert_eq!(set.current_index(), 0);
        assert_eq!(set.position(), (1, 3));
    }

    #[test]
    fn test_empty_set() {
        let mut set = WorkingSet::from_entries(vec![]);
        assert!(set.is_empty());
        assert_eq!(set.current_index(), -1);
        assert_eq!(set.position(), (0, 0));
        assert!(!set.advance());
        assert!(!set.retreat());
        assert!(set.remove_current().is_none());
    }

    #[test]
    fn test_advance_n_times_returns_to_start() {
        for n in 1..=5 {
            let mut set = WorkingSet::from_entries((1..=n).map(entry).collect());
            for _ in 0..n {
                assert!(set.advance());
            }
            assert_eq!(set.current_index(), 0);
        }
    }

    #[test]
    fn test_retreat_undoes_advance() {
        let mut set = WorkingSet::from_entries(vec![entry(1), entry(2), entry(3)]);

        set.retreat();
        assert_eq!(set.current_index(), 2);

        set.advance();
        assert_eq!(set.current_index(), 0);

        set.advance();
        set.retreat();
        assert_eq!(set.current_index(), 0);
    }

    #[test]
    fn test_single_entry_wraps_to_itself() {
        let mut set = WorkingSet::from_entries(vec![entry(1)]);
        set.advance();
        assert_eq!(set.current_index(), 0);
        set.retreat();
        assert_eq!(set.current_index(), 0);
    }

    #[test]
    fn test_remove_last_index_clamps() {
        let mut set = WorkingSet::from_entries(vec![entry(1), entry(2), entry(3)]);
        set.retreat();

        let removed = set.remove_current().unwrap();
        assert_eq!(removed.entry.id, 3);
        assert_eq!(set.current_index(), 1);
        assert_eq!(ids(&set), vec![1, 2]);
    }

    #[test]
    fn test_remove_middle_keeps_order() {
        let mut set = WorkingSet::from_entries(vec![entry(1), entry(2), entry(3)]);
        set.advance();

        set.remove_current();
        assert_eq!(set.current_index(), 1);
        assert_eq!(set.current().unwrap().entry.id, 3);
        assert_eq!(ids(&set), vec![1, 3]);
    }

    #[test]
    fn test_remove_only_entry() {
        let mut set = WorkingSet::from_entries(vec![entry(1)]);
        set.remove_current();
        assert!(set.is_empty());
        assert_eq!(set.current_index(), -1);
        assert_eq!(set.position(), (0, 0));
    }

    #[test]
    fn test_overlay_dirty_flags() {
        let mut set = WorkingSet::from_entries(vec![entry(1)]);
        let current = set.current_mut().unwrap();

        current.set_tolerance(10);
        assert!(!current.is_dirty());

        current.set_tolerance(30);
        assert!(current.is_tolerance_dirty());
        assert!(!current.is_color_dirty());

        current.set_target_color(Rgb([0, 0, 0]));
        assert!(current.is_color_dirty());
        assert_eq!(current.target_color(), Rgb([0, 0, 0]));
        assert_eq!(current.tolerance(), 30);

        current.mark_clean();
        assert!(!current.is_dirty());
    }
}
