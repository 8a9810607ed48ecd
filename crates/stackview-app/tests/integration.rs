use stackview_app::{Session, StackData, TimeSeriesMap, ViewerSettings, ViewerWindow};
use stackview_core::{AnnotationMode, Calibration, EdgeId, EdgeRow, NodeId, NodeRow, SlabRow};
use stackview_events::{Event, EventBus, SelectionOrigin};
use stackview_graph::{ElementRef, SceneMirror, StackOverlay};
use tempfile::tempdir;

/// A chain of junctions every 3 slices, joined by edges whose slabs step one slice at a time.
fn vessel(junctions: i64) -> StackData {
    let mut nodes = Vec::new();
    let mut slabs = Vec::new();
    let mut edges = Vec::new();
    for j in 0..junctions {
        let z = j * 3;
        let mut edge_list = Vec::new();
        if j > 0 {
            edge_list.push((j - 1).to_string());
        }
        if j + 1 < junctions {
            edge_list.push(j.to_string());
        }
        nodes.push(NodeRow::new(j, j as f64 * 10.0, 5.0, z).with_edge_list(edge_list.join(";")));
    }
    for e in 0..junctions - 1 {
        for i in 0..=3 {
            let z = e * 3 + i;
            slabs.push(SlabRow::new(i, e as f64 * 10.0 + i as f64, 5.0, z, e));
        }
        edges.push(EdgeRow::new(e, e, e + 1));
    }
    StackData {
        mode: AnnotationMode::Vascular,
        nodes,
        slabs,
        edges,
        calibration: Calibration::new(0.5, 0.5).unwrap(),
        image_width: 512.0,
        max_z: (junctions - 1) * 3,
    }
}

/// Every element's shown state must follow the window unless something pins it.
fn assert_window_consistent(overlay: &StackOverlay, mirror: &SceneMirror) {
    let model = overlay.model();
    let window = overlay.window();
    for element in model.elements() {
        let expected = model.is_pinned(element)
            || match element {
                ElementRef::Node(n) => window.contains(model[n].z),
                ElementRef::Slab(s) => model[s].connected && window.contains(model[s].z),
                ElementRef::Segment(s) => model[s]
                    .endpoints
                    .iter()
                    .any(|slab| window.contains(model[*slab].z)),
            };
        assert_eq!(model.is_visible(element), expected, "{element} at z {}", window.z());
        assert_eq!(mirror.is_shown(element), expected, "{element} mirrored");
    }
}

#[test]
fn test_event_driven_browsing() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt::try_init();

    let dir = tempdir()?;
    let path = dir.path().join("viewer.json");
    std::fs::write(&path, r#"{ "offset": 2, "marker_size": 5.0 }"#)?;
    let settings = ViewerSettings::load_from(&path)?;

    let bus = EventBus::new();
    let mut window = ViewerWindow::new(settings, 1024.0).with_notifier(bus.sender());
    window.open(vessel(8))?;
    assert_eq!(window.marker_size(), 5.0);

    let mut mirror = SceneMirror::new();
    for delta in [-1, -1, -1, 1, -1, -1] {
        bus.publish(Event::SliceScroll { delta });
        bus.dispatch_to(&mut window);
        window.flush(&mut mirror);
        assert_window_consistent(window.overlay().expect("open"), &mirror);
    }
    assert_eq!(window.current_z(), Some(4));

    for z in [15, 2, 21, 30, -5, 9] {
        bus.publish(Event::SliceJump { z });
        bus.dispatch_to(&mut window);
        window.flush(&mut mirror);
        assert_window_consistent(window.overlay().expect("open"), &mirror);
    }
    assert_eq!(window.current_z(), Some(9));

    bus.publish(Event::EdgeSelect {
        id: EdgeId(6),
        selected: true,
    });
    bus.publish(Event::ListSelectionChanged {
        selected: vec![NodeId(1)],
        deselected: vec![],
    });
    bus.dispatch_to(&mut window);
    window.flush(&mut mirror);
    let overlay = window.overlay().expect("open");
    assert_eq!(window.current_z(), Some(3));
    assert_eq!(overlay.selected_edges().collect::<Vec<_>>(), vec![EdgeId(6)]);
    assert_window_consistent(overlay, &mirror);

    bus.publish(Event::ZoomIn);
    bus.publish(Event::OverlayOffset { offset: 0 });
    bus.publish(Event::EdgeSelect {
        id: EdgeId(6),
        selected: false,
    });
    bus.dispatch_to(&mut window);
    window.flush(&mut mirror);
    let overlay = window.overlay().expect("open");
    assert!((overlay.scale().current() - 2.5).abs() < 1e-9);
    assert_window_consistent(overlay, &mirror);

    bus.publish(Event::OverlayVisibility { visible: false });
    bus.dispatch_to(&mut window);
    window.flush(&mut mirror);
    assert_eq!(mirror.shown().count(), 0);
    Ok(())
}

#[test]
fn test_list_and_graph_selection_stay_mirrored() -> anyhow::Result<()> {
    let bus = EventBus::new();
    let mut window =
        ViewerWindow::new(ViewerSettings::default(), 512.0).with_notifier(bus.sender());
    window.open(vessel(4))?;
    bus.drain();

    window.apply_list_selection(&[NodeId(2)], &[]);
    window.apply_list_selection(&[NodeId(2)], &[]);
    window.select_node(NodeId(2), false, SelectionOrigin::Graph)?;
    window.select_node(NodeId(2), false, SelectionOrigin::Graph)?;

    let changes: Vec<Event> = bus
        .drain()
        .into_iter()
        .filter(|e| matches!(e, Event::NodeSelectionChanged { .. }))
        .collect();
    assert_eq!(
        changes,
        vec![
            Event::NodeSelectionChanged {
                id: NodeId(2),
                selected: true,
                origin: SelectionOrigin::List,
            },
            Event::NodeSelectionChanged {
                id: NodeId(2),
                selected: false,
                origin: SelectionOrigin::Graph,
            },
        ]
    );
    Ok(())
}

#[test]
fn test_time_series_session() -> anyhow::Result<()> {
    let map = TimeSeriesMap::new(vec![
        vec![Some(NodeId(0)), Some(NodeId(1))],
        vec![Some(NodeId(2)), Some(NodeId(3))],
    ])?;
    let mut session = Session::new(map);

    let mut first = ViewerWindow::new(ViewerSettings::default(), 512.0);
    first.open(vessel(4))?;
    let mut second = ViewerWindow::new(ViewerSettings::default(), 512.0);
    second.open(vessel(4))?;
    let a = session.add_window(0, first)?;
    let b = session.add_window(1, second)?;

    session.select_node(a, NodeId(2), true)?;
    let other = session.window(b).and_then(ViewerWindow::overlay).expect("open");
    assert_eq!(other.selected_nodes().collect::<Vec<_>>(), vec![NodeId(3)]);
    assert_eq!(session.hub().borrow().selected_rows().collect::<Vec<_>>(), vec![1]);

    session.select_row(1, false)?;
    for id in [a, b] {
        let overlay = session.window(id).and_then(ViewerWindow::overlay).expect("open");
        assert_eq!(overlay.selected_nodes().count(), 0);
    }
    Ok(())
}
