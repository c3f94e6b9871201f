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

use crate::decoder::{Decoded, Decoder};
use crate::instr::BranchKind;
use anyhow::{anyhow, Result};
use capstone::arch::arm::ArmOperandType;
use capstone::arch::x86::X86OperandType;
use capstone::arch::ArchDetail;
use capstone::prelude::*;
use capstone::InsnGroupType;

/// Capstone-backed implementation of the [`Decoder`] trait.
pub struct CapstoneDecoder {
    cs: Capstone,
}

impl CapstoneDecoder {
    /// 64-bit x86, Intel syntax.
    pub fn x86_64() -> Result<Self> {
        let cs = Capstone::new()
            .x86()
            .mode(arch::x86::ArchMode::Mode64)
            .syntax(arch::x86::ArchSyntax::Intel)
            .detail(true) // Required for branch groups and operand targets
            .build()
            .map_err(|e| anyhow!("Failed to initialize Capstone: {}", e))?;
        Ok(Self { cs })
    }

    /// ARM Thumb, as used on Cortex-M targets.
    pub fn arm_thumb() -> Result<Self> {
        let cs = Capstone::new()
            .arm()
            .mode(arch::arm::ArchMode::Thumb)
            .extra_mode([arch::arm::ArchExtraMode::V8].iter().copied())
            .detail(true)
            .build()
            .map_err(|e| anyhow!("Failed to initialize Capstone: {}", e))?;
        Ok(Self { cs })
    }
}

fn is_unconditional_mnemonic(mnemonic: &str) -> bool {
    matches!(mnemonic, "jmp" | "ljmp" | "b" | "b.w" | "bx")
}

impl Decoder for CapstoneDecoder {
    fn decode_one(&self, bytes: &[u8], va: u64) -> Option<Decoded> {
        let insns = self.cs.disasm_count(bytes, va, 1).ok()?;
        let insn = insns.first()?;
        let mnemonic = insn.mnemonic().unwrap_or("").to_string();
        let op_str = insn.op_str().unwrap_or("").to_string();
        let length = insn.bytes().len();

        let mut branch = BranchKind::None;
        let mut destination = None;
        if let Ok(detail) = self.cs.insn_detail(insn) {
            let is_jump = detail
                .groups()
                .iter()
                .any(|g| g.0 as u32 == InsnGroupType::CS_GRP_JUMP);
            let is_call = detail
                .groups()
                .iter()
                .any(|g| g.0 as u32 == InsnGroupType::CS_GRP_CALL);
            if is_jump {
                branch = if is_unconditional_mnemonic(&mnemonic) {
                    BranchKind::Unconditional
                } else {
                    BranchKind::Conditional
                };
            }
            if is_jump || is_call {
                destination = match detail.arch_detail() {
                    ArchDetail::X86Detail(x86) => x86.operands().find_map(|op| match op.op_type {
                        X86OperandType::Imm(imm) => Some(imm as u64),
                        _ => None,
                    }),
                    ArchDetail::ArmDetail(arm) => arm.operands().find_map(|op| match op.op_type {
                        ArmOperandType::Imm(imm) => Some(imm as u64),
                        _ => None,
                    }),
                    _ => None,
                };
            }
        }

        Some(Decoded {
            length,
            mnemonic,
            op_str,
            branch,
            destination,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_plain_instruction() {
        let d = CapstoneDecoder::x86_64().unwrap();
        let decoded = d.decode_one(&[0x90], 0x1000).unwrap();
        assert_eq!(decoded.length, 1);
        assert_eq!(decoded.mnemonic, "nop");
        assert_eq!(decoded.branch, BranchKind::None);
        assert!(decoded.destination.is_none());
    }

    #[test]
    fn classifies_conditional_jump() {
        let d = CapstoneDecoder::x86_64().unwrap();
        // jne +0x02
        let decoded = d.decode_one(&[0x75, 0x02], 0x1000).unwrap();
        assert_eq!(decoded.length, 2);
        assert_eq!(decoded.branch, BranchKind::Conditional);
        assert_eq!(decoded.destination, Some(0x1004));
    }

    #[test]
    fn classifies_unconditional_jump() {
        let d = CapstoneDecoder::x86_64().unwrap();
        // jmp -0x20
        let decoded = d.decode_one(&[0xeb, 0xde], 0x1040).unwrap();
        assert_eq!(decoded.branch, BranchKind::Unconditional);
        assert_eq!(decoded.destination, Some(0x1020));
    }

    #[test]
    fn call_is_not_a_jump_edge() {
        let d = CapstoneDecoder::x86_64().unwrap();
        // call +0x10
        let decoded = d.decode_one(&[0xe8, 0x10, 0x00, 0x00, 0x00], 0x1000).unwrap();
        assert_eq!(decoded.branch, BranchKind::None);
        assert_eq!(decoded.destination, Some(0x1015));
    }

    #[test]
    fn empty_buffer_fails_decode() {
        let d = CapstoneDecoder::x86_64().unwrap();
        assert!(d.decode_one(&[], 0).is_none());
    }
}
