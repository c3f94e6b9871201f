/// Typed notifications emitted by the view, plus helpers to wrap them in a
/// JSON-RPC notification envelope for frontends that sit across a pipe.
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ViewEvent {
    /// The selection anchor moved; carries the absolute address.
    SelectionChanged { va: u64 },
    /// The view was re-disassembled at an address.
    NavigatedTo {
        va: u64,
        cip: u64,
        recorded_history: bool,
        table_offset: u64,
    },
    /// A history replay restored a previously stored display label.
    WindowTitleChanged { title: String },
}

/// Wrap an event in a JSON-RPC notification envelope.
pub fn event_to_notification(event: &ViewEvent) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": "ViewEvent",
        "params": event
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_tagged() {
        let event = ViewEvent::NavigatedTo {
            va: 0x1000,
            cip: 0x1004,
            recorded_history: true,
            table_offset: 0x20,
        };
        let value = event_to_notification(&event);
        assert_eq!(value["method"], "ViewEvent");
        assert_eq!(value["params"]["event"], "navigatedTo");
        assert_eq!(value["params"]["va"], 0x1000);
        assert_eq!(value["params"]["recorded_history"], true);
    }
}
