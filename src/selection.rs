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

/// Instruction-aligned selection state. All offsets are instruction starts;
/// the tagged representation makes inverted ranges and mid-instruction
/// bounds unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Single(u64),
    Range { anchor: u64, lo: u64, hi: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDirection {
    Backward,
    Forward,
}

#[derive(Debug, Clone)]
pub struct SelectionModel {
    sel: Selection,
}

impl Default for SelectionModel {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionModel {
    pub fn new() -> Self {
        Self {
            sel: Selection::Single(0),
        }
    }

    pub fn get(&self) -> Selection {
        self.sel
    }

    /// The instruction the range expands from.
    pub fn anchor(&self) -> u64 {
        match self.sel {
            Selection::Single(s) => s,
            Selection::Range { anchor, .. } => anchor,
        }
    }

    pub fn lo(&self) -> u64 {
        match self.sel {
            Selection::Single(s) => s,
            Selection::Range { lo, .. } => lo,
        }
    }

    pub fn hi(&self) -> u64 {
        match self.sel {
            Selection::Single(s) => s,
            Selection::Range { hi, .. } => hi,
        }
    }

    pub fn select_single(&mut self, offset: u64) {
        self.sel = Selection::Single(offset);
    }

    /// Grow the range toward `target` (an instruction start). A target on
    /// the anchor collapses back to a single selection; targets on either
    /// side move only that side, leaving the other untouched.
    pub fn expand_to(&mut self, target: u64) {
        let anchor = self.anchor();
        if target == anchor {
            self.sel = Selection::Single(anchor);
        } else if target < anchor {
            self.sel = Selection::Range {
                anchor,
                lo: target,
                hi: self.hi(),
            };
        } else {
            self.sel = Selection::Range {
                anchor,
                lo: self.lo(),
                hi: target,
            };
        }
    }

    pub fn contains(&self, offset: u64) -> bool {
        self.lo() <= offset && offset <= self.hi()
    }

    /// Move or grow the selection by one instruction. `step` resolves
    /// instruction-count offsets (Navigator::step); it is only ever called
    /// with counts of magnitude one.
    ///
    /// Without `expand` the selection collapses onto the neighbour of the
    /// current edge. With `expand`, the edge away from the anchor grows by
    /// one instruction, except that reversing direction first retraces the
    /// previously grown edge back toward the anchor.
    pub fn step<F>(&mut self, direction: StepDirection, expand: bool, mut step: F) -> u64
    where
        F: FnMut(u64, i64) -> u64,
    {
        if !expand {
            let next = match direction {
                StepDirection::Forward => step(self.hi(), 1),
                StepDirection::Backward => step(self.lo(), -1),
            };
            self.sel = Selection::Single(next);
            return next;
        }

        match (direction, self.sel) {
            (StepDirection::Forward, Selection::Single(s)) => {
                let hi = step(s, 1);
                if hi > s {
                    self.sel = Selection::Range { anchor: s, lo: s, hi };
                }
            }
            (StepDirection::Forward, Selection::Range { anchor, lo, hi })
                if hi == anchor && lo < anchor =>
            {
                // range was grown upward; retrace instead of growing down
                let lo = step(lo, 1).min(anchor);
                self.sel = if lo >= hi {
                    Selection::Single(anchor)
                } else {
                    Selection::Range { anchor, lo, hi }
                };
            }
            (StepDirection::Forward, Selection::Range { anchor, lo, hi }) => {
                self.sel = Selection::Range {
                    anchor,
                    lo,
                    hi: step(hi, 1).max(hi),
                };
            }
            (StepDirection::Backward, Selection::Single(s)) => {
                let lo = step(s, -1);
                if lo < s {
                    self.sel = Selection::Range { anchor: s, lo, hi: s };
                }
            }
            (StepDirection::Backward, Selection::Range { anchor, lo, hi })
                if lo == anchor && hi > anchor =>
            {
                // range was grown downward; retrace instead of growing up
                let hi = step(hi, -1).max(anchor);
                self.sel = if hi <= lo {
                    Selection::Single(anchor)
                } else {
                    Selection::Range { anchor, lo, hi }
                };
            }
            (StepDirection::Backward, Selection::Range { anchor, lo, hi }) => {
                self.sel = Selection::Range {
                    anchor,
                    lo: step(lo, -1).min(lo),
                    hi,
                };
            }
        }
        self.anchor()
    }
}
