use crossbeam_channel::{Receiver, Sender, unbounded};
use serde::{Deserialize, Serialize};
use stackview_core::{AnnotationMode, EdgeId, NodeId};

/// Where a selection change started, so mirrors do not echo it back.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SelectionOrigin {
    Graph,
    List,
    TimeSeries,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Event {
    // Slice navigation
    /// Mouse wheel; the slice moves by `-sign(delta)`.
    SliceScroll {
        delta: i32,
    },
    SliceJump {
        z: i64,
    },

    // View geometry
    ViewResized {
        width: f32,
    },
    ZoomIn,
    ZoomOut,
    ZoomReset,

    // Overlay
    OverlayVisibility {
        visible: bool,
    },
    OverlayOffset {
        offset: u32,
    },

    // Selection requests
    EdgeSelect {
        id: EdgeId,
        selected: bool,
    },
    NodeSelect {
        id: NodeId,
        selected: bool,
        origin: SelectionOrigin,
    },
    /// Rows picked or dropped in the point list.
    ListSelectionChanged {
        selected: Vec<NodeId>,
        deselected: Vec<NodeId>,
    },

    // Selection notifications
    /// A node's selection actually changed inside an overlay.
    NodeSelectionChanged {
        id: NodeId,
        selected: bool,
        origin: SelectionOrigin,
    },
    /// A row of the shared time-series table changed selection.
    TimeSeriesRowChanged {
        row: usize,
        selected: bool,
    },

    // Stack lifecycle
    StackOpened {
        mode: AnnotationMode,
        node_count: usize,
        max_z: i64,
    },
    StackClosed,

    // Notifications
    ShowWarning {
        message: String,
    },
}

#[derive(Clone)]
pub struct EventBus {
    tx: Sender<Event>,
    rx: Receiver<Event>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn sender(&self) -> Sender<Event> {
        self.tx.clone()
    }

    pub fn receiver(&self) -> Receiver<Event> {
        self.rx.clone()
    }

    pub fn publish(&self, event: Event) {
        tracing::trace!(?event, "publish");
        let _ = self.tx.send(event);
    }

    /// Dispatch all pending events to a listener.
    /// Events published by the listener while handling are dispatched in the same call.
    pub fn dispatch_to<L: EventListener>(&self, listener: &mut L) {
        while let Ok(event) = self.rx.try_recv() {
            listener.handle_event(&event);
        }
    }

    /// Drain pending events without dispatching them.
    pub fn drain(&self) -> Vec<Event> {
        self.rx.try_iter().collect()
    }
}

/// Trait for components that respond to events.
/// Implement this to receive events from the EventBus.
pub trait EventListener {
    fn handle_event(&mut self, event: &Event);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_bus_publish_receive() {
        let bus = EventBus::new();
        let sender = bus.sender();
        let receiver = bus.receiver();

        let event = Event::NodeSelect {
            id: NodeId(12),
            selected: true,
            origin: SelectionOrigin::List,
        };

        sender.send(event.clone()).unwrap();

        match receiver.recv().unwrap() {
            Event::NodeSelect {
                id,
                selected,
                origin,
            } => {
                assert_eq!(id, NodeId(12));
                assert!(selected);
                assert_eq!(origin, SelectionOrigin::List);
            }
            other => panic!("Expected NodeSelect, got {other:?}"),
        }
    }

    #[derive(Default)]
    struct Recorder {
        slices: Vec<i64>,
    }

    impl EventListener for Recorder {
        fn handle_event(&mut self, event: &Event) {
            if let Event::SliceJump { z } = event {
                self.slices.push(*z);
            }
        }
    }

    #[test]
    fn test_dispatch_preserves_order() {
        let bus = EventBus::new();
        bus.publish(Event::SliceJump { z: 3 });
        bus.publish(Event::ZoomIn);
        bus.publish(Event::SliceJump { z: 1 });

        let mut recorder = Recorder::default();
        bus.dispatch_to(&mut recorder);

        assert_eq!(recorder.slices, vec![3, 1]);
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn test_event_roundtrips_through_json() {
        let event = Event::ListSelectionChanged {
            selected: vec![NodeId(1), NodeId(2)],
            deselected: vec![],
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
