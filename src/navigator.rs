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

/// Converts between byte offsets and instruction-count offsets on a page
/// whose instruction boundaries can only be discovered by decoding forward,
/// and maintains the decoded viewport buffer.
use crate::decoder::{Decoder, MAX_INSTR_LEN};
use crate::instr::Instruction;
use crate::memory::MemoryPage;
use crate::source::{ByteSource, SourceError};
use log::{debug, trace};

/// Byte window handed to the decoder for a single instruction.
const DECODE_WINDOW: usize = MAX_INSTR_LEN * 2;

pub struct Navigator {
    page: MemoryPage,
    source: Box<dyn ByteSource>,
    decoder: Box<dyn Decoder>,
    viewport: Vec<Instruction>,
}

impl Navigator {
    pub fn new(source: Box<dyn ByteSource>, decoder: Box<dyn Decoder>) -> Self {
        Self {
            page: MemoryPage::default(),
            source,
            decoder,
            viewport: Vec::new(),
        }
    }

    pub fn page(&self) -> MemoryPage {
        self.page
    }

    pub fn set_page(&mut self, base: u64, size: u64) {
        self.page.set_attributes(base, size);
        self.viewport.clear();
    }

    /// Drop the page and viewport; used when the target goes away.
    pub fn reset(&mut self) {
        self.page.reset();
        self.viewport.clear();
    }

    pub fn viewport(&self) -> &[Instruction] {
        &self.viewport
    }

    pub fn source(&self) -> &dyn ByteSource {
        self.source.as_ref()
    }

    /// Read up to `len` bytes at `rva`, clipped to the page. A vanished
    /// target resets the page and yields an empty buffer; every caller then
    /// degrades to placeholders or a no-op rather than erroring.
    fn read_page(&mut self, rva: u64, len: usize) -> Vec<u8> {
        let n = self.page.clip_len(rva, len);
        if n == 0 {
            return Vec::new();
        }
        let mut buf = vec![0u8; n];
        match self.source.read(self.page.va(rva), &mut buf) {
            Ok(got) => {
                buf.truncate(got);
                buf
            }
            Err(SourceError::TargetUnavailable) => {
                debug!("target unavailable reading rva {:#x}; dropping page", rva);
                self.reset();
                Vec::new()
            }
        }
    }

    /// Decode exactly one instruction at `rva`. Undecodable bytes come back
    /// as the 1-byte placeholder so forward progress is guaranteed.
    pub fn instruction_at(&mut self, rva: u64) -> Instruction {
        let buf = self.read_page(rva, DECODE_WINDOW);
        match self.decoder.decode_one(&buf, self.page.va(rva)) {
            Some(d) if d.length >= 1 && d.length <= buf.len() => Instruction {
                rva,
                length: d.length,
                bytes: buf[..d.length].to_vec(),
                mnemonic: d.mnemonic,
                op_str: d.op_str,
                branch: d.branch,
            },
            _ => Instruction::undecodable(rva, buf.first().copied()),
        }
    }

    /// Offset of the instruction `count` positions away from `rva`. Zero is
    /// the identity; the result is always clamped into `[0, size - 1]`.
    ///
    /// Negative counts use the backward re-synchronization heuristic and
    /// are therefore best-effort (see [`Decoder::locate_backward`]).
    pub fn step(&mut self, rva: u64, count: i64) -> u64 {
        let addr = if count == 0 {
            rva
        } else if count < 0 {
            self.prev_rva(rva, count.unsigned_abs() as usize)
        } else {
            self.next_rva(rva, count as usize)
        };
        let size = self.page.size();
        if size == 0 {
            0
        } else {
            addr.min(size - 1)
        }
    }

    fn next_rva(&mut self, rva: u64, count: usize) -> u64 {
        if rva >= self.page.size() {
            return rva;
        }
        let buf = self.read_page(rva, MAX_INSTR_LEN * (count + 1));
        let mut cur = 0usize;
        for _ in 0..count {
            if cur >= buf.len() {
                break;
            }
            let window = &buf[cur..buf.len().min(cur + MAX_INSTR_LEN)];
            let len = self
                .decoder
                .decode_one(window, self.page.va(rva + cur as u64))
                .map(|d| d.length.max(1))
                .unwrap_or(1);
            cur += len;
        }
        // A decode can run past the buffer; clamp to the last readable byte
        rva + cur.min(buf.len()) as u64
    }

    fn prev_rva(&mut self, rva: u64, count: usize) -> u64 {
        let bottom = rva.saturating_sub((MAX_INSTR_LEN * (count + 3)) as u64);
        let virt = (rva - bottom) as usize;
        let buf = self.read_page(bottom, virt + 1 + MAX_INSTR_LEN);
        let located = self.decoder.locate_backward(&buf, virt, count);
        bottom + located as u64
    }

    /// Rebuild the viewport from `start`, collecting up to `target_rows`
    /// instructions. Stops at the page end or on a step that makes no
    /// progress; never loops.
    pub fn refill_viewport(&mut self, start: u64, target_rows: usize) {
        self.viewport.clear();
        let mut rva = start;
        for _ in 0..target_rows {
            if self.page.is_empty() || rva >= self.page.size() {
                break;
            }
            let inst = self.instruction_at(rva);
            if self.page.is_empty() {
                // target vanished during the read
                self.viewport.clear();
                break;
            }
            let next = inst.end_rva();
            self.viewport.push(inst);
            if next == rva {
                debug!("viewport refill stalled at rva {:#x}", rva);
                break;
            }
            rva = next;
        }
        trace!(
            "viewport refilled: {} rows from rva {:#x}",
            self.viewport.len(),
            start
        );
    }
}
