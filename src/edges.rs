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

/// Per-row control-flow edge geometry relative to the current selection:
/// either the selected instruction's own branch span, or the span of
/// inbound jump cross-references when the selection is not a branch.
use crate::instr::BranchKind;
use crate::memory::MemoryPage;
use crate::source::CrossReferenceSet;
use serde::Serialize;

/// Shape of the edge column segment drawn on one viewport row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EdgeShape {
    None,
    /// The edge passes straight through this row.
    VerticalThrough,
    /// Edge origin, continuing upward.
    FootToTop,
    /// Edge origin, continuing downward.
    FootToBottom,
    /// Arrowhead fed from above.
    HeadFromTop,
    /// Arrowhead fed from below.
    HeadFromBottom,
    /// Arrowhead fed from both sides.
    HeadFromBoth,
    /// A referencing row joining the vertical trunk.
    Corner,
}

/// Direction glyph for an instruction's own branch, independent of the
/// selection-relative classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BranchDirection {
    None,
    Up,
    Down,
}

/// Direction of a branch at `va` toward `destination`. Unresolved, null and
/// self targets have no direction.
pub fn branch_direction(va: u64, destination: Option<u64>) -> BranchDirection {
    match destination {
        None | Some(0) => BranchDirection::None,
        Some(dest) if dest == va => BranchDirection::None,
        Some(dest) if dest < va => BranchDirection::Up,
        Some(_) => BranchDirection::Down,
    }
}

#[derive(Debug, Clone, PartialEq)]
enum EdgeSource {
    None,
    /// The selection start is a branch landing inside the page.
    Branch { head_rva: u64, dest_rva: u64 },
    /// Inbound jump references to the anchor, in absolute addresses.
    Xrefs {
        anchor_va: u64,
        min_va: u64,
        max_va: u64,
        jump_refs: Vec<u64>,
    },
}

/// Snapshot classification of edge shapes for the current viewport.
/// Rebuilt whenever the selection or viewport changes; `shape_at` is then a
/// pure per-row lookup.
#[derive(Debug, Clone)]
pub struct EdgeClassifier {
    page: MemoryPage,
    source: EdgeSource,
}

impl Default for EdgeClassifier {
    fn default() -> Self {
        Self::empty()
    }
}

impl EdgeClassifier {
    pub fn empty() -> Self {
        Self {
            page: MemoryPage::default(),
            source: EdgeSource::None,
        }
    }

    /// Classify relative to the selection. `head_rva` is the selection
    /// start and `head_branch`/`head_dest_va` describe the instruction
    /// there; `anchor_va` is the selection anchor, whose inbound references
    /// are in `xrefs`.
    pub fn compute(
        page: MemoryPage,
        head_rva: u64,
        head_branch: BranchKind,
        head_dest_va: Option<u64>,
        anchor_va: u64,
        xrefs: &CrossReferenceSet,
    ) -> Self {
        let source = if head_branch.is_branch() {
            match head_dest_va {
                Some(dest) if page.contains(dest) => EdgeSource::Branch {
                    head_rva,
                    dest_rva: page.rva(dest),
                },
                _ => EdgeSource::None,
            }
        } else {
            let jump_refs: Vec<u64> = xrefs.jump_addrs().collect();
            if jump_refs.is_empty() {
                EdgeSource::None
            } else {
                let min_va = jump_refs.iter().copied().min().unwrap_or(anchor_va).min(anchor_va);
                let max_va = jump_refs.iter().copied().max().unwrap_or(anchor_va).max(anchor_va);
                if min_va == max_va {
                    // every reference sits on the anchor itself
                    EdgeSource::None
                } else {
                    EdgeSource::Xrefs {
                        anchor_va,
                        min_va,
                        max_va,
                        jump_refs,
                    }
                }
            }
        };
        Self { page, source }
    }

    pub fn shape_at(&self, rva: u64) -> EdgeShape {
        match &self.source {
            EdgeSource::None => EdgeShape::None,
            EdgeSource::Branch { head_rva, dest_rva } => {
                let (head, dest) = (*head_rva, *dest_rva);
                if dest < head {
                    if rva == dest {
                        EdgeShape::HeadFromBottom
                    } else if rva > dest && rva < head {
                        EdgeShape::VerticalThrough
                    } else if rva == head {
                        EdgeShape::FootToTop
                    } else {
                        EdgeShape::None
                    }
                } else if dest > head {
                    if rva == head {
                        EdgeShape::FootToBottom
                    } else if rva > head && rva < dest {
                        EdgeShape::VerticalThrough
                    } else if rva == dest {
                        EdgeShape::HeadFromTop
                    } else {
                        EdgeShape::None
                    }
                } else {
                    EdgeShape::None
                }
            }
            EdgeSource::Xrefs {
                anchor_va,
                min_va,
                max_va,
                jump_refs,
            } => {
                let va = self.page.va(rva);
                let mut shape = if jump_refs.contains(&va) {
                    EdgeShape::Corner
                } else {
                    EdgeShape::None
                };
                if va == *anchor_va {
                    shape = if *max_va == *anchor_va {
                        EdgeShape::HeadFromTop
                    } else if *min_va == *anchor_va {
                        EdgeShape::HeadFromBottom
                    } else {
                        EdgeShape::HeadFromBoth
                    };
                } else if va < *anchor_va && va == *min_va {
                    shape = EdgeShape::FootToBottom;
                } else if va > *anchor_va && va == *max_va {
                    shape = EdgeShape::FootToTop;
                }
                if shape == EdgeShape::None && va > *min_va && va < *max_va {
                    shape = EdgeShape::VerticalThrough;
                }
                shape
            }
        }
    }
}
