use std::collections::VecDeque;

use super::Snapshot;

/// Manages a linear undo/redo log of settled states.
///
/// The log is a sequence of entries plus a cursor pointing at the current one.
/// Entries after the cursor form the redo tail; committing a new entry drops
/// that tail, so a new edit after an undo erases the redo history.
#[derive(Debug, Clone)]
pub struct HistoryManager<T = Snapshot> {
    /// Oldest entry first
    entries: VecDeque<T>,
    /// `None` iff `entries` is empty
    cursor: Option<usize>,
    /// Maximum number of entries, oldest evicted first. `None` is unbounded.
    capacity: Option<usize>,
}

impl<T> Default for HistoryManager<T> {
    fn default() -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: None,
            capacity: None,
        }
    }
}

impl<T: Clone> HistoryManager<T> {
    /// Creates a new, unbounded, empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty history that keeps at most `capacity` entries.
    ///
    /// A capacity of zero is treated as one: the current state is always kept.
    pub fn with_capacity_limit(capacity: Option<usize>) -> Self {
        Self {
            capacity: capacity.map(|cap| cap.max(1)),
            ..Self::default()
        }
    }

    /// Append `entry` after the cursor, discarding any redo tail.
    ///
    /// This is the only operation that grows the log.
    pub fn commit(&mut self, entry: T) {
        match self.cursor {
            Some(cursor) => self.entries.truncate(cursor + 1),
            None => self.entries.clear(),
        }
        self.entries.push_back(entry);

        if let Some(capacity) = self.capacity {
            while self.entries.len() > capacity {
                self.entries.pop_front();
            }
        }

        self.cursor = Some(self.entries.len() - 1);
        log::debug!("history commit: {} entries, cursor at {}", self.entries.len(), self.entries.len() - 1);
        debug_assert!(self.invariant_holds());
    }

    /// Step back one entry and return it, or `None` if already at the oldest entry.
    pub fn undo(&mut self) -> Option<T> {
        let cursor = self.cursor.filter(|&cursor| cursor > 0)?;
        self.cursor = Some(cursor - 1);
        debug_assert!(self.invariant_holds());
        self.entries.get(cursor - 1).cloned()
    }

    /// Step forward one entry and return it, or `None` if already at the newest entry.
    pub fn redo(&mut self) -> Option<T> {
        let cursor = self.cursor.filter(|&cursor| cursor + 1 < self.entries.len())?;
        self.cursor = Some(cursor + 1);
        debug_assert!(self.invariant_holds());
        self.entries.get(cursor + 1).cloned()
    }

    /// The entry at the cursor
    pub fn current(&self) -> Option<&T> {
        self.cursor.and_then(|cursor| self.entries.get(cursor))
    }

    /// Changes the capacity limit, evicting entries if the log is now too long.
    ///
    /// Entries before the cursor are evicted first (oldest first), then the redo
    /// tail is dropped from the newest end. The current entry always survives.
    pub fn set_capacity_limit(&mut self, capacity: Option<usize>) {
        self.capacity = capacity.map(|cap| cap.max(1));
        let (Some(capacity), Some(mut cursor)) = (self.capacity, self.cursor) else {
            return;
        };

        while self.entries.len() > capacity && cursor > 0 {
            self.entries.pop_front();
            cursor -= 1;
        }
        self.entries.truncate(capacity.max(cursor + 1));
        self.cursor = Some(cursor);
        debug_assert!(self.invariant_holds());
    }

    pub fn capacity_limit(&self) -> Option<usize> {
        self.capacity
    }

    /// Returns true if there is an older entry to step back to
    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|cursor| cursor > 0)
    }

    /// Returns true if there is a newer entry to step forward to
    pub fn can_redo(&self) -> bool {
        self.cursor.is_some_and(|cursor| cursor + 1 < self.entries.len())
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, oldest first, including the redo tail
    pub fn entries(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }

    fn invariant_holds(&self) -> bool {
        match self.cursor {
            Some(cursor) => cursor < self.entries.len(),
            None => self.entries.is_empty(),
        }
    }
}
