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

use crate::instr::BranchKind;

/// Upper bound on instruction length assumed by the backward seek margin.
/// Architecture-dependent; 16 covers x86 and is comfortably above any
/// fixed-width ISA.
pub const MAX_INSTR_LEN: usize = 16;

/// Result of decoding a single instruction.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub length: usize,
    pub mnemonic: String,
    pub op_str: String,
    pub branch: BranchKind,
    /// Immediate branch/call target, absolute, when statically known.
    pub destination: Option<u64>,
}

/// The instruction decoder, consumed as a black box. Implementations only
/// need `decode_one`; backward location has a default built on top of it.
pub trait Decoder {
    /// Decode exactly one instruction from the start of `bytes`. `va` is
    /// the absolute address of `bytes[0]`, used for operand rendering and
    /// destination calculation. `None` means the bytes are not a valid
    /// instruction (or the buffer is too short for one).
    fn decode_one(&self, bytes: &[u8], va: u64) -> Option<Decoded>;

    /// Locate the start of the `count`-th instruction ending at or before
    /// `from`, by decoding forward from a margin below `from` and recording
    /// each boundary.
    ///
    /// This is a best-effort heuristic, not an inverse of forward decoding:
    /// variable-length streams are not uniquely decodable backwards, and if
    /// the true stream does not re-synchronize within the margin window
    /// (`MAX_INSTR_LEN * (count + 3)` bytes) the returned offset can be
    /// wrong. Bytes that fail to decode advance the scan by exactly one.
    fn locate_backward(&self, bytes: &[u8], from: usize, count: usize) -> usize {
        let from = from.min(bytes.len());
        if count == 0 || from == 0 {
            return from;
        }
        let count = count.min(127);
        let mut ring = [0usize; 128];
        let mut recorded = 0usize;
        let mut addr = from.saturating_sub(MAX_INSTR_LEN * (count + 3));
        while addr < from {
            ring[recorded % 128] = addr;
            recorded += 1;
            let window = &bytes[addr..bytes.len().min(addr + MAX_INSTR_LEN)];
            let len = self
                .decode_one(window, addr as u64)
                .map(|d| d.length.max(1))
                .unwrap_or(1);
            addr += len;
        }
        if recorded == 0 {
            from
        } else if recorded < count {
            ring[0]
        } else {
            ring[(recorded - count) % 128]
        }
    }
}
