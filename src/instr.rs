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

use serde::Serialize;

/// Control-transfer capability of an instruction, as far as the view cares:
/// jump-like transfers that get edge lines drawn for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BranchKind {
    None,
    Conditional,
    Unconditional,
}

impl BranchKind {
    pub fn is_branch(&self) -> bool {
        !matches!(self, BranchKind::None)
    }
}

/// One decoded instruction in the viewport buffer.
///
/// Immutable once produced; the whole buffer is replaced on every reload.
#[derive(Debug, Clone, Serialize)]
pub struct Instruction {
    /// Start offset relative to the page base.
    pub rva: u64,
    /// Byte length. Always >= 1: undecodable bytes become a 1-byte
    /// placeholder so callers make forward progress.
    pub length: usize,
    pub bytes: Vec<u8>,
    pub mnemonic: String,
    pub op_str: String,
    pub branch: BranchKind,
}

impl Instruction {
    /// Offset one past the last byte of this instruction.
    pub fn end_rva(&self) -> u64 {
        self.rva + self.length as u64
    }

    /// Placeholder for bytes the decoder could not interpret, e.g. a
    /// truncated buffer at the page end. One byte long by construction.
    pub fn undecodable(rva: u64, byte: Option<u8>) -> Self {
        Self {
            rva,
            length: 1,
            bytes: byte.map(|b| vec![b]).unwrap_or_default(),
            mnemonic: "???".to_string(),
            op_str: String::new(),
            branch: BranchKind::None,
        }
    }

    pub fn is_undecodable(&self) -> bool {
        self.mnemonic == "???"
    }

    pub fn format_bytes(&self) -> String {
        let hex: Vec<String> = self.bytes.iter().map(|b| format!("{:02X}", b)).collect();
        format!("{:X}:{}:{} {}", self.rva, hex.join(" "), self.mnemonic, self.op_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undecodable_is_one_byte() {
        let inst = Instruction::undecodable(0x10, Some(0xff));
        assert_eq!(inst.length, 1);
        assert_eq!(inst.end_rva(), 0x11);
        assert!(inst.is_undecodable());
        assert_eq!(inst.branch, BranchKind::None);
    }

    #[test]
    fn serializes_to_json() {
        let inst = Instruction {
            rva: 2,
            length: 5,
            bytes: vec![0xe9, 0, 0, 0, 0],
            mnemonic: "jmp".to_string(),
            op_str: "0x1007".to_string(),
            branch: BranchKind::Unconditional,
        };
        let json = serde_json::to_string(&inst).unwrap();
        assert!(json.contains("\"mnemonic\":\"jmp\""));
        assert!(json.contains("\"branch\":\"Unconditional\""));
    }
}
