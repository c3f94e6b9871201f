use disasm_nav::{
    BranchDirection, BranchKind, BranchResolver, ByteSource, CrossReferenceProvider, Decoded,
    Decoder, DisasmView, EdgeShape, MemoryPage, Selection, SliceSource, SourceError, TargetState,
    ViewEvent, XrefEntry, XrefKind,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// First byte's low nibble is the instruction length; the high nibble marks
/// branches (0x80 unconditional, 0x40 conditional). Zero length fails.
struct NibbleDecoder;

impl Decoder for NibbleDecoder {
    fn decode_one(&self, bytes: &[u8], _va: u64) -> Option<Decoded> {
        let b = *bytes.first()?;
        let len = (b & 0x0f) as usize;
        if len == 0 || len > bytes.len() {
            return None;
        }
        let branch = match b & 0xf0 {
            0x80 => BranchKind::Unconditional,
            0x40 => BranchKind::Conditional,
            _ => BranchKind::None,
        };
        Some(Decoded {
            length: len,
            mnemonic: if branch.is_branch() { "jmp" } else { "op" }.to_string(),
            op_str: String::new(),
            branch,
            destination: None,
        })
    }
}

struct MapResolver(HashMap<u64, u64>);

impl BranchResolver for MapResolver {
    fn destination(&self, va: u64) -> Option<u64> {
        self.0.get(&va).copied()
    }
}

struct MapXrefs(HashMap<u64, Vec<XrefEntry>>);

impl CrossReferenceProvider for MapXrefs {
    fn references_to(&self, va: u64) -> Vec<XrefEntry> {
        self.0.get(&va).cloned().unwrap_or_default()
    }
}

/// Lets the test keep a handle on the source after the view takes ownership.
struct Shared(Rc<SliceSource>);

impl ByteSource for Shared {
    fn read(&self, va: u64, buf: &mut [u8]) -> Result<usize, SourceError> {
        self.0.read(va, buf)
    }
    fn find_page(&self, va: u64) -> Option<MemoryPage> {
        self.0.find_page(va)
    }
}

const BASE: u64 = 0x1000;

fn build_view(
    data: Vec<u8>,
    branches: &[(u64, u64)],
    xrefs: &[(u64, Vec<XrefEntry>)],
) -> (DisasmView, Rc<SliceSource>, Rc<RefCell<Vec<ViewEvent>>>) {
    let source = Rc::new(SliceSource::new(BASE, data));
    let mut view = DisasmView::new(
        Box::new(Shared(source.clone())),
        Box::new(NibbleDecoder),
        Box::new(MapResolver(branches.iter().copied().collect())),
        Box::new(MapXrefs(xrefs.iter().cloned().collect())),
    );
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    view.on_event(move |e| sink.borrow_mut().push(e.clone()));
    (view, source, events)
}

fn jump(addr: u64) -> XrefEntry {
    XrefEntry {
        addr,
        kind: XrefKind::Jump,
    }
}

#[test]
fn navigate_fills_viewport_and_reports() {
    let (mut view, _, events) = build_view(vec![1u8; 0x40], &[], &[]);
    view.set_visible_rows(4);
    view.navigate(BASE, BASE);

    let rvas: Vec<u64> = view.viewport_instructions().iter().map(|i| i.rva).collect();
    assert_eq!(rvas, vec![0, 1, 2, 3]);
    assert_eq!(view.selected_va(), BASE);
    assert_eq!(view.table_offset(), 0);

    let events = events.borrow();
    assert_eq!(events[0], ViewEvent::SelectionChanged { va: BASE });
    assert_eq!(
        events[1],
        ViewEvent::NavigatedTo {
            va: BASE,
            cip: BASE,
            recorded_history: true,
            table_offset: 0,
        }
    );
}

#[test]
fn navigate_keeps_offset_when_target_is_on_screen() {
    let (mut view, _, _) = build_view(vec![1u8; 0x40], &[], &[]);
    view.set_visible_rows(8);
    view.navigate(BASE, BASE);
    assert_eq!(view.table_offset(), 0);

    // target already visible and aligned: the viewport does not move
    view.navigate(BASE + 4, BASE);
    assert_eq!(view.table_offset(), 0);
    assert_eq!(view.selected_va(), BASE + 4);

    // target on the last visible row: scroll down by one instruction
    view.navigate(BASE + 7, BASE);
    assert_eq!(view.table_offset(), 1);
}

#[test]
fn history_walks_back_and_forward() {
    let (mut view, _, events) = build_view(vec![1u8; 0x40], &[], &[]);
    view.set_visible_rows(4);
    view.set_window_title("main");
    view.navigate(BASE, BASE);
    view.navigate(BASE + 0x20, BASE);
    assert!(view.has_previous());
    assert!(!view.has_next());

    view.go_back();
    assert_eq!(view.selected_va(), BASE);
    assert!(view.has_next());
    assert!(events
        .borrow()
        .iter()
        .any(|e| matches!(e, ViewEvent::WindowTitleChanged { title } if title == "main")));

    view.go_forward();
    assert_eq!(view.selected_va(), BASE + 0x20);
    assert!(!view.has_next());
}

#[test]
fn history_replay_does_not_record() {
    let (mut view, _, _) = build_view(vec![1u8; 0x40], &[], &[]);
    view.navigate(BASE, BASE);
    view.navigate(BASE + 0x10, BASE);
    view.navigate(BASE + 0x20, BASE);
    let len = view.history().len();
    view.go_back();
    view.go_back();
    view.go_forward();
    assert_eq!(view.history().len(), len);
}

#[test]
fn selection_keys_follow_the_viewport() {
    let (mut view, _, _) = build_view(vec![1u8; 0x40], &[], &[]);
    view.set_visible_rows(4);
    view.navigate(BASE, BASE);

    view.select_next(false);
    assert_eq!(view.selected_va(), BASE + 1);
    assert_eq!(view.table_offset(), 0);

    view.select_next(false);
    view.select_next(false);
    // selection reached the last visible row: viewport re-anchors below it
    assert_eq!(view.selected_va(), BASE + 3);
    assert_eq!(view.table_offset(), 1);

    view.select_previous(false);
    assert_eq!(view.selected_va(), BASE + 2);
    assert_eq!(view.table_offset(), 1);
}

#[test]
fn shift_selection_grows_and_retraces() {
    let (mut view, _, _) = build_view(vec![1u8; 0x40], &[], &[]);
    view.set_visible_rows(8);
    view.navigate(BASE, BASE);
    view.select_at(2);

    view.select_next(true);
    view.select_next(true);
    let sel = view.selection();
    assert_eq!((sel.anchor, sel.lo, sel.hi), (BASE + 2, BASE + 2, BASE + 4));
    assert!(view.is_selected(3));
    assert!(!view.is_selected(5));

    // reversing shrinks the grown edge back toward the anchor
    view.select_previous(true);
    view.select_previous(true);
    let sel = view.selection();
    assert_eq!((sel.lo, sel.hi), (BASE + 2, BASE + 2));
}

#[test]
fn extend_selection_spans_from_anchor() {
    let (mut view, _, _) = build_view(vec![1u8; 0x40], &[], &[]);
    view.set_visible_rows(8);
    view.navigate(BASE, BASE);
    view.select_at(3);
    view.extend_selection_to(6);
    let sel = view.selection();
    assert_eq!((sel.anchor, sel.lo, sel.hi), (BASE + 3, BASE + 3, BASE + 6));

    // re-extending from the same anchor replaces the old range
    view.extend_selection_to(1);
    let sel = view.selection();
    assert_eq!((sel.anchor, sel.lo, sel.hi), (BASE + 3, BASE + 1, BASE + 3));
}

#[test]
fn branch_selection_draws_edge_span() {
    // unconditional 1-byte branch at rva 0x10 targeting rva 4
    let mut data = vec![1u8; 0x40];
    data[0x10] = 0x81;
    let (mut view, _, _) = build_view(data, &[(BASE + 0x10, BASE + 4)], &[]);
    view.set_visible_rows(20);
    view.navigate(BASE + 0x10, BASE);

    assert_eq!(view.edge_shape(0x10), EdgeShape::FootToTop);
    assert_eq!(view.edge_shape(4), EdgeShape::HeadFromBottom);
    assert_eq!(view.edge_shape(8), EdgeShape::VerticalThrough);
    assert_eq!(view.edge_shape(0x11), EdgeShape::None);
    assert_eq!(view.branch_indicator(0x10), BranchDirection::Up);
    assert_eq!(view.follow_branch_target(), Some(BASE + 4));
}

#[test]
fn non_branch_selection_draws_inbound_references() {
    let refs = vec![jump(BASE + 0x18), jump(BASE + 0x28)];
    let (mut view, _, _) = build_view(vec![1u8; 0x40], &[], &[(BASE + 0x20, refs)]);
    view.set_visible_rows(20);
    view.navigate(BASE + 0x20, BASE);

    assert_eq!(view.edge_shape(0x20), EdgeShape::HeadFromBoth);
    assert_eq!(view.edge_shape(0x18), EdgeShape::FootToBottom);
    assert_eq!(view.edge_shape(0x28), EdgeShape::FootToTop);
    assert_eq!(view.edge_shape(0x1c), EdgeShape::VerticalThrough);
    assert_eq!(view.cross_references().references.len(), 2);
}

#[test]
fn scrolling_realigns_to_instruction_starts() {
    // lengths [2, 5, 1] at the start of the page, then 1-byte filler
    let mut data = vec![1u8; 0x40];
    data[0] = 2;
    data[2] = 5;
    data[7] = 1;
    let (mut view, _, _) = build_view(data, &[], &[]);
    view.set_visible_rows(4);
    view.navigate(BASE, BASE);

    view.scroll_to(4); // mid-instruction byte offset
    let rvas: Vec<u64> = view.viewport_instructions().iter().map(|i| i.rva).collect();
    assert_eq!(rvas[0], view.table_offset());
    assert!(rvas.iter().all(|&r| r != 4));

    view.scroll_by(1);
    assert_eq!(view.viewport_instructions()[0].rva, view.table_offset());
}

#[test]
fn vanished_target_empties_the_view() {
    let (mut view, source, _) = build_view(vec![1u8; 0x40], &[], &[]);
    view.set_visible_rows(4);
    view.navigate(BASE, BASE);
    assert_eq!(view.viewport_instructions().len(), 4);

    source.set_available(false);
    view.scroll_by(1);
    assert!(view.viewport_instructions().is_empty());
    assert_eq!(view.base(), 0);
    assert_eq!(view.size(), 0);

    // later navigations are silently ignored while the target is gone
    view.navigate(BASE, BASE);
    assert!(view.viewport_instructions().is_empty());
}

#[test]
fn target_stop_clears_state() {
    let (mut view, _, events) = build_view(vec![1u8; 0x40], &[], &[]);
    view.navigate(BASE, BASE);
    view.navigate(BASE + 0x10, BASE);
    view.target_state_changed(TargetState::Running);
    assert!(view.is_running());
    view.target_state_changed(TargetState::Paused);
    assert!(!view.is_running());

    view.target_state_changed(TargetState::Stopped);
    assert!(view.viewport_instructions().is_empty());
    assert!(view.history().is_empty());
    assert!(!view.has_previous());
    assert_eq!(
        events.borrow().last(),
        Some(&ViewEvent::SelectionChanged { va: 0 })
    );
}

#[test]
fn selection_model_is_reusable_standalone() {
    use disasm_nav::{SelectionModel, StepDirection};
    let mut sel = SelectionModel::new();
    sel.select_single(8);
    sel.step(StepDirection::Forward, true, |o, n| {
        (o as i64 + n).max(0) as u64
    });
    assert_eq!(sel.get(), Selection::Range { anchor: 8, lo: 8, hi: 9 });
}
