use tourmap::EngineError;
use tourmap::engine::matcher::{self, MatchKind, SearchOptions};
use tourmap::engine::{
    DrawingSessionController, EntityCache, FormOutput, FormSession, FormStep, GeometryEventBus, PointerEvent,
    RawPointerInput, SearchFocus, SessionMode, SessionOutcome, ShapeCandidate, Snapshot, SurfaceObserver, Tool,
};
use tourmap::model::{Coordinate, PointKind, ZoneShape};
use tourmap::store::{DocumentStore, EntityStore};

fn c(latitude: f64, longitude: f64) -> Coordinate {
    Coordinate { latitude, longitude }
}

/// Drives a finished form to its output.
fn answer(mut form: FormSession, answers: &[&str]) -> FormOutput {
    for a in answers {
        if let FormStep::Complete(output) = form.submit(a).unwrap() {
            return output;
        }
    }
    panic!("form did not complete");
}

#[tokio::test]
async fn test_place_landmark_then_find_by_name() {
    let store = DocumentStore::in_memory();
    let mut cache = EntityCache::new();
    let mut ctl = DrawingSessionController::default();

    ctl.activate(Tool::Landmark, &mut ());
    let outcome = ctl
        .handle_pointer_event(PointerEvent::Click(c(19.40, -99.13)), &cache.snapshot(), &mut ())
        .unwrap();
    assert!(ctl.mode().is_idle());
    let Some(SessionOutcome::PointPlaced { kind, location }) = outcome else {
        panic!("expected a placed point");
    };
    assert_eq!(kind, PointKind::Landmark);

    let FormOutput::NewPoint { kind, point } = answer(FormSession::create_point(kind, location), &["Museo", "Arte"])
    else {
        panic!("expected a new point");
    };
    store.create_point(kind, point).await.unwrap();
    cache.refresh(&store).await.unwrap();

    let snapshot = cache.snapshot();
    let entries = snapshot.all();
    let hit = matcher::resolve("museo", &entries, false).unwrap();
    assert_eq!(hit.kind, MatchKind::Exact);
    assert_eq!(snapshot.landmarks[0].location, c(19.40, -99.13));
}

#[tokio::test]
async fn test_polygon_zone_persists_vertices_in_click_order() {
    let store = DocumentStore::in_memory();
    let mut cache = EntityCache::new();
    let mut ctl = DrawingSessionController::default();
    let clicks = [c(0.0, 0.0), c(0.0, 1.0), c(1.0, 1.0)];

    ctl.activate(Tool::Polygon, &mut ());
    for p in clicks {
        ctl.handle_pointer_event(PointerEvent::Click(p), &cache.snapshot(), &mut ())
            .unwrap();
    }
    let shape = ctl.complete_polygon(&mut ()).unwrap();
    assert!(ctl.mode().is_idle());

    let FormOutput::NewZone(zone) = answer(FormSession::create_zone(shape), &["Zona Centro", "Historic"]) else {
        panic!("expected a new zone");
    };
    store.create_zone(zone).await.unwrap();
    cache.refresh(&store).await.unwrap();

    let snapshot = cache.snapshot();
    assert_eq!(
        snapshot.zones[0].shape,
        ZoneShape::Polygon {
            vertices: clicks.to_vec()
        }
    );
}

#[tokio::test]
async fn test_review_click_resolves_nearby_landmark() {
    let store = DocumentStore::in_memory();
    let museo = store
        .create_point(
            PointKind::Landmark,
            tourmap::model::NewPoint {
                name: "Museo".to_string(),
                description: String::new(),
                location: c(19.40, -99.13),
            },
        )
        .await
        .unwrap();
    let mut cache = EntityCache::new();
    cache.refresh(&store).await.unwrap();

    let mut ctl = DrawingSessionController::default();
    ctl.activate(Tool::Review, &mut ());

    // ~555 m north: nothing there, session stays armed.
    let err = ctl
        .handle_pointer_event(PointerEvent::Click(c(19.405, -99.13)), &cache.snapshot(), &mut ())
        .unwrap_err();
    assert!(matches!(err, EngineError::NoMatchFound));
    assert_eq!(ctl.mode(), &SessionMode::AwaitingReviewTarget);

    let outcome = ctl
        .handle_pointer_event(PointerEvent::Click(c(19.4005, -99.13)), &cache.snapshot(), &mut ())
        .unwrap();
    let Some(SessionOutcome::ReviewTargetFound(target)) = outcome else {
        panic!("expected a review target");
    };
    assert_eq!(target.id, museo.id);

    let FormOutput::Review(draft) = answer(FormSession::review(&target), &["5", "Excelente"]) else {
        panic!("expected a review");
    };
    let review = store.create_review("ana", draft).await.unwrap();
    assert_eq!(store.list_reviews(&museo.id).await.unwrap(), vec![review]);
}

#[test]
fn test_partial_search_prefers_prefix() {
    let zones = ["La Zona Rosa", "Zona Centro", "Zona Norte"];
    let snapshot = Snapshot {
        zones: zones
            .iter()
            .enumerate()
            .map(|(i, name)| tourmap::model::ZoneEntity {
                id: format!("z{i}"),
                name: name.to_string(),
                description: String::new(),
                shape: ZoneShape::Rectangle(tourmap::model::Bounds {
                    north: 1.0,
                    south: 0.0,
                    east: 1.0,
                    west: 0.0,
                }),
            })
            .collect(),
        ..Default::default()
    };

    let mut focus = SearchFocus::default();
    assert!(focus.focus_by_name("zona", &snapshot, SearchOptions::TYPING, &mut ()).is_none());
    let request = focus
        .focus_by_name("zona", &snapshot, SearchOptions::SUBMIT, &mut ())
        .unwrap();
    assert_eq!(request.entity_id, "z1");
}

#[test]
fn test_bus_drops_out_of_range_input() {
    let bus = GeometryEventBus;
    let events: Vec<_> = bus
        .drain([
            RawPointerInput::Clicked { latitude: 95.0, longitude: 0.0 },
            RawPointerInput::Clicked { latitude: 10.0, longitude: 20.0 },
        ])
        .collect();
    assert_eq!(events, vec![PointerEvent::Click(c(10.0, 20.0))]);
}

#[derive(Default)]
struct Previews {
    candidates: Vec<Option<ShapeCandidate>>,
    modes: Vec<SessionMode>,
}

impl SurfaceObserver for Previews {
    fn shape_candidate_changed(&mut self, shape: Option<&ShapeCandidate>) {
        self.candidates.push(shape.cloned());
    }

    fn session_state_changed(&mut self, mode: &SessionMode) {
        self.modes.push(mode.clone());
    }
}

#[test]
fn test_rectangle_drag_draws_zone() {
    let snapshot = Snapshot::default();
    let mut ctl = DrawingSessionController::default();
    let mut previews = Previews::default();

    ctl.activate(Tool::Rectangle, &mut previews);
    for event in [
        PointerEvent::Down(c(19.45, -99.15)),
        PointerEvent::Move(c(19.43, -99.14)),
        PointerEvent::Move(c(19.42, -99.12)),
    ] {
        assert_eq!(ctl.handle_pointer_event(event, &snapshot, &mut previews).unwrap(), None);
    }
    assert!(ctl.session().unwrap().drag_origin().is_some());

    let outcome = ctl
        .handle_pointer_event(PointerEvent::Up(c(19.42, -99.12)), &snapshot, &mut previews)
        .unwrap();
    let Some(SessionOutcome::ZoneDrawn(ZoneShape::Rectangle(bounds))) = outcome else {
        panic!("expected a rectangle zone");
    };
    assert!(bounds.north > bounds.south && bounds.east > bounds.west);
    assert_eq!((bounds.north, bounds.south), (19.45, 19.42));
    assert_eq!((bounds.west, bounds.east), (-99.15, -99.12));

    // Down and both moves show a preview; finishing clears it.
    let shown: Vec<_> = previews.candidates.iter().flatten().collect();
    assert_eq!(shown.len(), 3);
    assert!(shown.iter().all(|p| matches!(p, ShapeCandidate::Rectangle(_))));
    assert_eq!(previews.candidates.last(), Some(&None));
    assert!(ctl.mode().is_idle());
    assert_eq!(previews.modes.last(), Some(&SessionMode::Idle));
}

#[test]
fn test_review_prefers_landmark_over_closer_service() {
    let point = |id: &str, kind, location| tourmap::model::PointEntity {
        id: id.to_string(),
        name: id.to_string(),
        description: String::new(),
        location,
        kind,
    };
    let snapshot = Snapshot {
        // ~67 m and ~22 m north of the click.
        landmarks: vec![point("catedral", PointKind::Landmark, c(19.4006, -99.13))],
        services: vec![point("cafe", PointKind::Service, c(19.4002, -99.13))],
        ..Default::default()
    };

    let mut ctl = DrawingSessionController::default();
    ctl.activate(Tool::Review, &mut ());
    let outcome = ctl
        .handle_pointer_event(PointerEvent::Click(c(19.40, -99.13)), &snapshot, &mut ())
        .unwrap();
    let Some(SessionOutcome::ReviewTargetFound(target)) = outcome else {
        panic!("expected a review target");
    };
    assert_eq!(target.id, "catedral");
    assert_eq!(target.kind, PointKind::Landmark);
}
