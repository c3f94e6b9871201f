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

/// The disassembly view state machine: wires the Navigator, SelectionModel,
/// HistoryStack and EdgeClassifier together and turns discrete external
/// events (jump-to-address, selection keys, scrolls, target state changes)
/// into a consistent viewport snapshot. Single-threaded by design; every
/// operation runs to completion before the next event is looked at.
use crate::decoder::Decoder;
use crate::edges::{branch_direction, BranchDirection, EdgeClassifier, EdgeShape};
use crate::history::{HistoryEntry, HistoryStack};
use crate::instr::Instruction;
use crate::navigator::Navigator;
use crate::protocol::ViewEvent;
use crate::selection::{SelectionModel, StepDirection};
use crate::source::{BranchResolver, ByteSource, CrossReferenceProvider, CrossReferenceSet};
use log::debug;

const DEFAULT_VISIBLE_ROWS: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    Running,
    Paused,
    Stopped,
}

/// Selection bounds as absolute addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionVa {
    pub anchor: u64,
    pub lo: u64,
    pub hi: u64,
}

type Observer = Box<dyn FnMut(&ViewEvent)>;

pub struct DisasmView {
    nav: Navigator,
    selection: SelectionModel,
    history: HistoryStack,
    resolver: Box<dyn BranchResolver>,
    xref_provider: Box<dyn CrossReferenceProvider>,
    xrefs: CrossReferenceSet,
    edges: EdgeClassifier,
    observers: Vec<Observer>,
    table_offset: u64,
    visible_rows: usize,
    cip_rva: u64,
    running: bool,
    title: String,
}

impl DisasmView {
    pub fn new(
        source: Box<dyn ByteSource>,
        decoder: Box<dyn Decoder>,
        resolver: Box<dyn BranchResolver>,
        xref_provider: Box<dyn CrossReferenceProvider>,
    ) -> Self {
        Self {
            nav: Navigator::new(source, decoder),
            selection: SelectionModel::new(),
            history: HistoryStack::new(),
            resolver,
            xref_provider,
            xrefs: CrossReferenceSet::default(),
            edges: EdgeClassifier::empty(),
            observers: Vec::new(),
            table_offset: 0,
            visible_rows: DEFAULT_VISIBLE_ROWS,
            cip_rva: 0,
            running: false,
            title: String::new(),
        }
    }

    /// Register a notification callback. Events are delivered synchronously
    /// on the owning thread, in registration order.
    pub fn on_event(&mut self, observer: impl FnMut(&ViewEvent) + 'static) {
        self.observers.push(Box::new(observer));
    }

    fn emit(&mut self, event: ViewEvent) {
        for observer in &mut self.observers {
            observer(&event);
        }
    }

    pub fn set_visible_rows(&mut self, rows: usize) {
        self.visible_rows = rows.max(1);
    }

    pub fn set_window_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    // ---- navigation -----------------------------------------------------

    /// Navigate to `va` recording history; the common "jump to address"
    /// entry point.
    pub fn navigate(&mut self, va: u64, cip: u64) {
        self.disassemble_at(va, cip, true, None);
    }

    /// Re-disassemble at `va`. `cip` is the current instruction pointer
    /// (absolute). `record_history` is false for history replays; an
    /// explicit `table_offset` pins the viewport instead of letting the
    /// view decide.
    pub fn disassemble_at(
        &mut self,
        va: u64,
        cip: u64,
        record_history: bool,
        table_offset: Option<u64>,
    ) {
        let Some(page) = self.nav.source().find_page(va) else {
            debug!("no page for va {:#x}; ignoring navigation", va);
            return;
        };
        if page.base() == 0 || page.is_empty() {
            return;
        }
        let rva = page.rva(va);

        // Remember where we are leaving from. The very first navigation has
        // no origin worth recording, so only a non-empty stack grows here.
        if record_history && !self.history.is_empty() {
            let from_va = self.nav.page().va(self.selection.anchor());
            if from_va != 0 {
                self.history.visit(HistoryEntry {
                    va: from_va,
                    table_offset: self.table_offset,
                    label: self.title.clone(),
                });
            }
        }

        // Viewport snapshot from before the page swap, used to keep the
        // table offset stable when the target row is already on screen.
        let vp_first = self.nav.viewport().first().map(|i| (i.rva, i.length));
        let vp_last_rva = self.nav.viewport().last().map(|i| i.rva);
        let aligned = self.nav.viewport().iter().any(|i| i.rva == rva);

        self.nav.set_page(page.base(), page.size());
        self.selection.select_single(rva);
        self.cip_rva = cip.wrapping_sub(page.base());

        let new_offset = match table_offset {
            Some(offset) => offset,
            None => match (vp_first, vp_last_rva) {
                (Some((first_rva, _)), Some(last_rva)) if rva >= first_rva && rva < last_rva => {
                    if aligned {
                        self.table_offset
                    } else {
                        rva
                    }
                }
                (Some((first_rva, first_len)), Some(last_rva)) if rva == last_rva => {
                    // target is the last visible row: scroll down one instruction
                    first_rva + first_len as u64
                }
                _ => rva,
            },
        };

        if record_history && table_offset.is_none() {
            self.history.visit(HistoryEntry {
                va,
                table_offset: new_offset,
                label: self.title.clone(),
            });
        }

        self.table_offset = new_offset;
        self.nav.refill_viewport(self.table_offset, self.visible_rows);
        self.selection_changed();
        self.rebuild_edges();
        self.emit(ViewEvent::NavigatedTo {
            va,
            cip,
            recorded_history: record_history,
            table_offset: new_offset,
        });
    }

    /// Forget the page, viewport, selection and history; used when the
    /// inspected target goes away.
    pub fn clear(&mut self) {
        self.history.clear();
        self.nav.reset();
        self.selection.select_single(0);
        self.xrefs.clear();
        self.edges = EdgeClassifier::empty();
        self.table_offset = 0;
        self.emit(ViewEvent::SelectionChanged { va: 0 });
    }

    pub fn target_state_changed(&mut self, state: TargetState) {
        match state {
            TargetState::Stopped => self.clear(),
            TargetState::Paused => self.running = false,
            TargetState::Running => self.running = true,
        }
    }

    // ---- history --------------------------------------------------------

    pub fn go_back(&mut self) {
        let Some(entry) = self.history.go_back().cloned() else {
            return;
        };
        let cip = self.nav.page().va(self.cip_rva);
        self.disassemble_at(entry.va, cip, false, Some(entry.table_offset));
        self.emit(ViewEvent::WindowTitleChanged { title: entry.label });
    }

    pub fn go_forward(&mut self) {
        let Some(entry) = self.history.go_forward().cloned() else {
            return;
        };
        let cip = self.nav.page().va(self.cip_rva);
        self.disassemble_at(entry.va, cip, false, Some(entry.table_offset));
        self.emit(ViewEvent::WindowTitleChanged { title: entry.label });
    }

    pub fn has_previous(&self) -> bool {
        self.history.has_previous()
    }

    pub fn has_next(&self) -> bool {
        self.history.has_next()
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    // ---- selection ------------------------------------------------------

    pub fn select_next(&mut self, expand: bool) {
        self.move_selection(StepDirection::Forward, expand);
    }

    pub fn select_previous(&mut self, expand: bool) {
        self.move_selection(StepDirection::Backward, expand);
    }

    fn move_selection(&mut self, direction: StepDirection, expand: bool) {
        if self.nav.page().is_empty() {
            return;
        }
        let bottom = self.table_offset;
        let top = self
            .nav
            .step(self.table_offset, self.visible_rows.saturating_sub(1) as i64);

        let nav = &mut self.nav;
        self.selection
            .step(direction, expand, |rva, count| nav.step(rva, count));

        // Keep the selection on screen, the way the key handler does it:
        // snap up to the selection start, or re-anchor below the end.
        let (lo, hi) = (self.selection.lo(), self.selection.hi());
        if lo < bottom {
            self.table_offset = lo;
        } else if hi >= top {
            self.table_offset = self.nav.step(hi, -(self.visible_rows as i64) + 2);
        }

        self.nav.refill_viewport(self.table_offset, self.visible_rows);
        self.selection_changed();
        self.rebuild_edges();
    }

    /// Collapse the selection onto the instruction starting at `rva`.
    pub fn select_at(&mut self, rva: u64) {
        if self.nav.page().is_empty() {
            return;
        }
        self.selection.select_single(rva);
        self.selection_changed();
        self.rebuild_edges();
    }

    /// Grow the selection from its anchor to the instruction at `rva`
    /// (shift-click / drag).
    pub fn extend_selection_to(&mut self, rva: u64) {
        if self.nav.page().is_empty() {
            return;
        }
        let anchor = self.selection.anchor();
        self.selection.select_single(anchor);
        self.selection.expand_to(rva);
        self.selection_changed();
        self.rebuild_edges();
    }

    pub fn is_selected(&self, rva: u64) -> bool {
        self.selection.contains(rva)
    }

    /// Selection bounds as absolute addresses.
    pub fn selection(&self) -> SelectionVa {
        let page = self.nav.page();
        SelectionVa {
            anchor: page.va(self.selection.anchor()),
            lo: page.va(self.selection.lo()),
            hi: page.va(self.selection.hi()),
        }
    }

    pub fn selected_va(&self) -> u64 {
        self.nav.page().va(self.selection.anchor())
    }

    fn selection_changed(&mut self) {
        if self.nav.page().is_empty() {
            self.xrefs.clear();
            self.emit(ViewEvent::SelectionChanged { va: 0 });
            return;
        }
        let va = self.selected_va();
        self.xrefs = CrossReferenceSet {
            references: self.xref_provider.references_to(va),
        };
        self.emit(ViewEvent::SelectionChanged { va });
    }

    // ---- scrolling ------------------------------------------------------

    /// Realign an arbitrary byte offset onto an instruction boundary by
    /// stepping one instruction back and one forward.
    pub fn align_offset(&mut self, offset: u64) -> u64 {
        if offset == 0 {
            return 0;
        }
        let back = self.nav.step(offset, -1);
        self.nav.step(back, 1)
    }

    pub fn scroll_to(&mut self, offset: u64) {
        self.table_offset = self.align_offset(offset);
        self.nav.refill_viewport(self.table_offset, self.visible_rows);
        self.rebuild_edges();
    }

    pub fn scroll_by(&mut self, delta: i64) {
        self.table_offset = self.nav.step(self.table_offset, delta);
        self.nav.refill_viewport(self.table_offset, self.visible_rows);
        self.rebuild_edges();
    }

    // ---- edges ----------------------------------------------------------

    fn rebuild_edges(&mut self) {
        let page = self.nav.page();
        if page.is_empty() {
            self.edges = EdgeClassifier::empty();
            return;
        }
        let head_rva = self.selection.lo();
        let head = self.nav.instruction_at(head_rva);
        let head_dest = self.resolver.destination(page.va(head_rva));
        let anchor_va = page.va(self.selection.anchor());
        self.edges = EdgeClassifier::compute(page, head_rva, head.branch, head_dest, anchor_va, &self.xrefs);
    }

    /// Edge shape for a viewport row, relative to the current selection.
    pub fn edge_shape(&self, rva: u64) -> EdgeShape {
        self.edges.shape_at(rva)
    }

    /// Direction glyph for the row's own branch, independent of the
    /// selection-relative edge.
    pub fn branch_indicator(&self, rva: u64) -> BranchDirection {
        let Some(inst) = self.nav.viewport().iter().find(|i| i.rva == rva) else {
            return BranchDirection::None;
        };
        if !inst.branch.is_branch() {
            return BranchDirection::None;
        }
        let va = self.nav.page().va(rva);
        branch_direction(va, self.resolver.destination(va))
    }

    /// Resolved branch target of the selected instruction, for
    /// follow-branch navigation.
    pub fn follow_branch_target(&self) -> Option<u64> {
        self.resolver.destination(self.selected_va())
    }

    // ---- accessors ------------------------------------------------------

    /// The current decoded viewport snapshot, in address order.
    pub fn viewport_instructions(&self) -> &[Instruction] {
        self.nav.viewport()
    }

    pub fn cross_references(&self) -> &CrossReferenceSet {
        &self.xrefs
    }

    pub fn table_offset(&self) -> u64 {
        self.table_offset
    }

    pub fn base(&self) -> u64 {
        self.nav.page().base()
    }

    pub fn size(&self) -> u64 {
        self.nav.page().size()
    }

    pub fn rva_to_va(&self, rva: u64) -> u64 {
        self.nav.page().va(rva)
    }

    pub fn cip_rva(&self) -> u64 {
        self.cip_rva
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}
