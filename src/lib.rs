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

//! Instruction-aligned navigation for disassembly views over variable-length
//! instruction sets. Forward decoding is exact; backward movement
//! re-synchronizes heuristically by decoding forward from a safety margin.
//! On top of the address mathematics sit a selection model, a back/forward
//! navigation history, and a per-row classifier for the jump-edge column.

pub mod capstone;
pub mod decoder;
pub mod edges;
pub mod history;
pub mod instr;
pub mod memory;
pub mod navigator;
pub mod protocol;
pub mod selection;
pub mod source;
pub mod view;

pub use crate::capstone::CapstoneDecoder;
pub use crate::decoder::{Decoded, Decoder, MAX_INSTR_LEN};
pub use crate::edges::{branch_direction, BranchDirection, EdgeClassifier, EdgeShape};
pub use crate::history::{HistoryEntry, HistoryStack, HISTORY_CAPACITY};
pub use crate::instr::{BranchKind, Instruction};
pub use crate::memory::MemoryPage;
pub use crate::navigator::Navigator;
pub use crate::protocol::{event_to_notification, ViewEvent};
pub use crate::selection::{Selection, SelectionModel, StepDirection};
pub use crate::source::{
    BranchResolver, ByteSource, CrossReferenceProvider, CrossReferenceSet, SliceSource,
    SourceError, XrefEntry, XrefKind,
};
pub use crate::view::{DisasmView, SelectionVa, TargetState};
