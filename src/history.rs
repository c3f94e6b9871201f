// Copyright (c) 2026 disasm-nav Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use log::trace;
use serde::Serialize;

/// Maximum number of retained navigation entries; oldest are evicted first.
pub const HISTORY_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    /// Absolute address that was navigated to.
    pub va: u64,
    /// Viewport offset (rva) at the time of the visit.
    pub table_offset: u64,
    /// Display label shown when replaying the entry.
    pub label: String,
}

/// Browser-style back/forward list with a cursor on the current entry.
#[derive(Debug, Clone, Default)]
pub struct HistoryStack {
    entries: Vec<HistoryEntry>,
    cursor: usize,
}

impl HistoryStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.cursor)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }

    /// Record a visit. Truncates any forward entries beyond the cursor,
    /// skips consecutive duplicates of the current address, appends, and
    /// evicts the oldest entry past capacity — all in one call, so no
    /// partial state is ever observable. Returns whether an entry was
    /// actually appended.
    pub fn visit(&mut self, entry: HistoryEntry) -> bool {
        if self.cursor + 1 < self.entries.len() {
            // a new branch invalidates forward history
            self.entries.truncate(self.cursor + 1);
        }
        if let Some(current) = self.entries.last() {
            if current.va == entry.va {
                return false;
            }
        }
        trace!("history visit {:#x} (len {})", entry.va, self.entries.len());
        self.entries.push(entry);
        self.cursor = self.entries.len() - 1;
        if self.entries.len() > HISTORY_CAPACITY {
            self.entries.remove(0);
            self.cursor -= 1;
        }
        true
    }

    pub fn has_previous(&self) -> bool {
        !self.entries.is_empty() && self.cursor > 0
    }

    pub fn has_next(&self) -> bool {
        !self.entries.is_empty() && self.cursor + 1 < self.entries.len()
    }

    /// Move the cursor one entry back. No-op at the earliest entry.
    pub fn go_back(&mut self) -> Option<&HistoryEntry> {
        if !self.has_previous() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor)
    }

    /// Move the cursor one entry forward. No-op at the latest entry.
    pub fn go_forward(&mut self) -> Option<&HistoryEntry> {
        if !self.has_next() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(va: u64) -> HistoryEntry {
        HistoryEntry {
            va,
            table_offset: va & 0xfff,
            label: format!("entry {:#x}", va),
        }
    }

    #[test]
    fn back_and_forward_walk_the_list() {
        let mut h = HistoryStack::new();
        h.visit(entry(0x1000));
        h.visit(entry(0x2000));
        h.visit(entry(0x3000));
        assert!(h.has_previous());
        assert!(!h.has_next());

        assert_eq!(h.go_back().unwrap().va, 0x2000);
        assert_eq!(h.go_back().unwrap().va, 0x1000);
        assert!(h.go_back().is_none());
        assert_eq!(h.go_forward().unwrap().va, 0x2000);
        assert_eq!(h.go_forward().unwrap().va, 0x3000);
        assert!(h.go_forward().is_none());
    }

    #[test]
    fn empty_stack_is_a_noop() {
        let mut h = HistoryStack::new();
        assert!(h.go_back().is_none());
        assert!(h.go_forward().is_none());
        assert!(!h.has_previous());
        assert!(!h.has_next());
    }

    #[test]
    fn consecutive_duplicates_are_skipped() {
        let mut h = HistoryStack::new();
        assert!(h.visit(entry(0x1000)));
        assert!(!h.visit(entry(0x1000)));
        assert_eq!(h.len(), 1);
        assert!(h.visit(entry(0x2000)));
        assert!(h.visit(entry(0x1000))); // non-consecutive is fine
        assert_eq!(h.len(), 3);
    }

    #[test]
    fn new_visit_discards_forward_entries() {
        let mut h = HistoryStack::new();
        h.visit(entry(0x1000));
        h.visit(entry(0x2000));
        h.visit(entry(0x3000));
        h.go_back();
        h.go_back();
        h.visit(entry(0x4000));
        assert_eq!(h.len(), 2);
        assert_eq!(h.current().unwrap().va, 0x4000);
        // 0x2000/0x3000 are gone for good
        assert!(!h.has_next());
        assert_eq!(h.go_back().unwrap().va, 0x1000);
        assert_eq!(h.go_forward().unwrap().va, 0x4000);
    }

    #[test]
    fn capacity_evicts_oldest_and_keeps_cursor_logical() {
        let mut h = HistoryStack::new();
        for i in 0..HISTORY_CAPACITY {
            h.visit(entry(0x1000 + i as u64));
        }
        assert_eq!(h.len(), HISTORY_CAPACITY);
        let last_before = h.current().unwrap().va;

        h.visit(entry(0xdead_0000));
        assert_eq!(h.len(), HISTORY_CAPACITY);
        assert_eq!(h.current().unwrap().va, 0xdead_0000);
        // the entry before the cursor is still the one visited just prior
        assert_eq!(h.go_back().unwrap().va, last_before);
        // the very oldest entry was evicted
        h.clear();
    }

    #[test]
    fn eviction_is_fifo() {
        let mut h = HistoryStack::new();
        for i in 0..(HISTORY_CAPACITY + 10) {
            h.visit(entry(i as u64 + 1));
        }
        assert_eq!(h.len(), HISTORY_CAPACITY);
        // walk all the way back: the earliest surviving entry is #11
        while h.has_previous() {
            h.go_back();
        }
        assert_eq!(h.current().unwrap().va, 11);
    }
}
