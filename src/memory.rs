/// A byte-addressable window over the inspected target's memory.
///
/// Pure {base, size} bookkeeping: it knows nothing about instructions and
/// owns no bytes. Reset to {0, 0} when the target goes away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryPage {
    base: u64,
    size: u64,
}

impl MemoryPage {
    pub fn new(base: u64, size: u64) -> Self {
        Self { base, size }
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn end(&self) -> u64 {
        self.base + self.size
    }

    pub fn contains(&self, va: u64) -> bool {
        va >= self.base && va < self.end()
    }

    /// Absolute address of a page-relative offset.
    pub fn va(&self, rva: u64) -> u64 {
        self.base + rva
    }

    /// Page-relative offset of an absolute address. Caller must check
    /// `contains` first.
    pub fn rva(&self, va: u64) -> u64 {
        va - self.base
    }

    /// Largest readable length starting at `rva`, capped at `len`.
    pub fn clip_len(&self, rva: u64, len: usize) -> usize {
        if rva >= self.size {
            return 0;
        }
        let remaining = self.size - rva;
        (len as u64).min(remaining) as usize
    }

    pub fn reset(&mut self) {
        self.base = 0;
        self.size = 0;
    }

    pub fn set_attributes(&mut self, base: u64, size: u64) {
        self.base = base;
        self.size = size;
    }
}
