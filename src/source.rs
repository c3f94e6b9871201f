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

/// Collaborator traits the view consumes: target memory access, branch
/// target resolution and inbound cross-reference lookup. All synchronous;
/// the owning thread drives everything one event at a time.
use crate::memory::MemoryPage;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    /// The inspected target no longer exists (process exited, page
    /// unmapped). Surfaces as an empty-page state change, never a panic.
    #[error("inspected target is unavailable")]
    TargetUnavailable,
}

/// Reads bytes from the inspected target's memory.
pub trait ByteSource {
    /// Read up to `buf.len()` bytes at absolute address `va`. Returns the
    /// number of bytes actually read; short reads at region boundaries are
    /// normal and not an error.
    fn read(&self, va: u64, buf: &mut [u8]) -> Result<usize, SourceError>;

    /// The memory page containing `va`, if any.
    fn find_page(&self, va: u64) -> Option<MemoryPage>;
}

/// Resolves a branch/call target, including pre-resolved indirect targets.
pub trait BranchResolver {
    /// Destination of the control transfer at `va`, if it is one.
    fn destination(&self, va: u64) -> Option<u64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum XrefKind {
    Data,
    Jump,
    Call,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct XrefEntry {
    pub addr: u64,
    pub kind: XrefKind,
}

/// Looks up recorded inbound references to an address.
pub trait CrossReferenceProvider {
    fn references_to(&self, va: u64) -> Vec<XrefEntry>;
}

/// Inbound references to the current selection anchor. Recomputed whenever
/// the anchor changes, discarded otherwise.
#[derive(Debug, Clone, Default)]
pub struct CrossReferenceSet {
    pub references: Vec<XrefEntry>,
}

impl CrossReferenceSet {
    pub fn clear(&mut self) {
        self.references.clear();
    }

    pub fn jump_addrs(&self) -> impl Iterator<Item = u64> + '_ {
        self.references
            .iter()
            .filter(|r| r.kind == XrefKind::Jump)
            .map(|r| r.addr)
    }
}

/// A byte-slice backed source, the page being the whole slice. Used by
/// tests and by consumers that already hold a memory snapshot.
pub struct SliceSource {
    base: u64,
    data: Vec<u8>,
    available: std::cell::Cell<bool>,
}

impl SliceSource {
    pub fn new(base: u64, data: Vec<u8>) -> Self {
        Self {
            base,
            data,
            available: std::cell::Cell::new(true),
        }
    }

    /// Simulate the target going away; subsequent reads fail with
    /// `TargetUnavailable`.
    pub fn set_available(&self, available: bool) {
        self.available.set(available);
    }
}

impl ByteSource for SliceSource {
    fn read(&self, va: u64, buf: &mut [u8]) -> Result<usize, SourceError> {
        if !self.available.get() {
            return Err(SourceError::TargetUnavailable);
        }
        if va < self.base {
            return Ok(0);
        }
        let start = (va - self.base) as usize;
        if start >= self.data.len() {
            return Ok(0);
        }
        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        Ok(n)
    }

    fn find_page(&self, va: u64) -> Option<MemoryPage> {
        if !self.available.get() {
            return None;
        }
        let page = MemoryPage::new(self.base, self.data.len() as u64);
        page.contains(va).then_some(page)
    }
}
