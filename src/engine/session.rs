use strum::{Display, EnumString};
use tracing::{debug, info};

use super::builders::{PointBuilder, PolygonBuilder, RectangleBuilder, ShapeCandidate};
use super::cache::Snapshot;
use super::events::PointerEvent;
use super::proximity::{self, DEFAULT_RADIUS_METERS};
use crate::error::{EngineError, EngineResult};
use crate::model::{Bounds, Coordinate, EntityId, EntityKind, PointEntity, PointKind, ZoneShape};

/// Toolbar actions. The serialized names are the action ids of the toolbar buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString)]
pub enum Tool {
    #[strum(serialize = "punto-interes")]
    Landmark,
    #[strum(serialize = "servicio")]
    Service,
    #[strum(serialize = "zona-polygon")]
    Polygon,
    #[strum(serialize = "zona-rectangle")]
    Rectangle,
    #[strum(serialize = "review")]
    Review,
    #[strum(serialize = "cancel")]
    Cancel,
}

impl Tool {
    pub fn label(self) -> &'static str {
        match self {
            Tool::Landmark => "Landmark",
            Tool::Service => "Service",
            Tool::Polygon => "Polygon zone",
            Tool::Rectangle => "Rectangle zone",
            Tool::Review => "Review",
            Tool::Cancel => "Cancel",
        }
    }

    pub fn all() -> &'static [Tool] {
        &[
            Tool::Landmark,
            Tool::Service,
            Tool::Polygon,
            Tool::Rectangle,
            Tool::Review,
        ]
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionMode {
    Idle,
    PlacingPoint(PointKind),
    DrawingPolygon,
    DrawingRectangle,
    AwaitingReviewTarget,
    MovingEntity { id: EntityId, kind: PointKind },
}

static IDLE: SessionMode = SessionMode::Idle;

impl SessionMode {
    pub fn is_idle(&self) -> bool {
        matches!(self, SessionMode::Idle)
    }

    /// Toolbar button to highlight for this mode.
    pub fn tool(&self) -> Option<Tool> {
        match self {
            SessionMode::Idle | SessionMode::MovingEntity { .. } => None,
            SessionMode::PlacingPoint(PointKind::Landmark) => Some(Tool::Landmark),
            SessionMode::PlacingPoint(PointKind::Service) => Some(Tool::Service),
            SessionMode::DrawingPolygon => Some(Tool::Polygon),
            SessionMode::DrawingRectangle => Some(Tool::Rectangle),
            SessionMode::AwaitingReviewTarget => Some(Tool::Review),
        }
    }

    pub fn instructions(&self) -> Option<&'static str> {
        match self {
            SessionMode::Idle => None,
            SessionMode::PlacingPoint(PointKind::Landmark) => {
                Some("Click on the map to place a point of interest")
            }
            SessionMode::PlacingPoint(PointKind::Service) => Some("Click on the map to place a service"),
            SessionMode::DrawingPolygon => {
                Some("Click on the map to add polygon points, then press \"Finish polygon\"")
            }
            SessionMode::DrawingRectangle => Some("Click and drag to draw a rectangle"),
            SessionMode::AwaitingReviewTarget => {
                Some("Click an existing point of interest or service to review it")
            }
            SessionMode::MovingEntity { .. } => Some("Click a new spot on the map to move the location"),
        }
    }
}

/// Persist-ready geometry.
#[derive(Clone, Debug, PartialEq)]
pub enum FinalizedShape {
    Point { kind: PointKind, location: Coordinate },
    Zone(ZoneShape),
    Relocation { id: EntityId, kind: PointKind, location: Coordinate },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FocusTarget {
    Point(Coordinate),
    Bounds(Bounds),
}

#[derive(Clone, Debug, PartialEq)]
pub struct FocusRequest {
    pub entity_id: EntityId,
    pub kind: EntityKind,
    pub target: FocusTarget,
}

/// Signals consumed by the map renderer.
pub trait SurfaceObserver {
    /// `None` removes the transient preview.
    fn shape_candidate_changed(&mut self, _shape: Option<&ShapeCandidate>) {}
    fn shape_finalized(&mut self, _shape: &FinalizedShape) {}
    fn session_state_changed(&mut self, _mode: &SessionMode) {}
    fn focus_requested(&mut self, _request: &FocusRequest) {}
}

impl SurfaceObserver for () {}

#[derive(Clone, Debug, PartialEq)]
pub enum SessionOutcome {
    PointPlaced { kind: PointKind, location: Coordinate },
    ZoneDrawn(ZoneShape),
    EntityMoved { id: EntityId, kind: PointKind, location: Coordinate },
    ReviewTargetFound(PointEntity),
}

#[derive(Clone, Debug)]
enum ActiveBuilder {
    None,
    Point(PointBuilder),
    Polygon(PolygonBuilder),
    Rectangle(RectangleBuilder),
}

/// State of one tool activation.
#[derive(Clone, Debug)]
pub struct DrawingSession {
    mode: SessionMode,
    builder: ActiveBuilder,
}

impl DrawingSession {
    fn new(mode: SessionMode) -> Self {
        let builder = match mode {
            SessionMode::PlacingPoint(_) | SessionMode::MovingEntity { .. } => {
                ActiveBuilder::Point(PointBuilder)
            }
            SessionMode::DrawingPolygon => ActiveBuilder::Polygon(PolygonBuilder::default()),
            SessionMode::DrawingRectangle => ActiveBuilder::Rectangle(RectangleBuilder::default()),
            SessionMode::Idle | SessionMode::AwaitingReviewTarget => ActiveBuilder::None,
        };
        Self { mode, builder }
    }

    pub fn mode(&self) -> &SessionMode {
        &self.mode
    }

    pub fn accumulated_vertices(&self) -> &[Coordinate] {
        match &self.builder {
            ActiveBuilder::Polygon(b) => b.vertices(),
            _ => &[],
        }
    }

    pub fn drag_origin(&self) -> Option<Coordinate> {
        match &self.builder {
            ActiveBuilder::Rectangle(b) => b.drag_origin(),
            _ => None,
        }
    }

    pub fn drag_current(&self) -> Option<Coordinate> {
        match &self.builder {
            ActiveBuilder::Rectangle(b) => b.drag_current(),
            _ => None,
        }
    }

    pub fn target_kind(&self) -> Option<PointKind> {
        match &self.mode {
            SessionMode::PlacingPoint(kind) | SessionMode::MovingEntity { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Tool-mode state machine. At most one session is open at a time.
#[derive(Clone, Debug)]
pub struct DrawingSessionController {
    session: Option<DrawingSession>,
    proximity_radius_m: f64,
    double_click_completes: bool,
}

impl Default for DrawingSessionController {
    fn default() -> Self {
        Self {
            session: None,
            proximity_radius_m: DEFAULT_RADIUS_METERS,
            double_click_completes: false,
        }
    }
}

impl DrawingSessionController {
    pub fn new(proximity_radius_m: f64, double_click_completes: bool) -> Self {
        Self {
            session: None,
            proximity_radius_m,
            double_click_completes,
        }
    }

    pub fn mode(&self) -> &SessionMode {
        self.session.as_ref().map_or(&IDLE, |s| &s.mode)
    }

    pub fn session(&self) -> Option<&DrawingSession> {
        self.session.as_ref()
    }

    pub fn proximity_radius_m(&self) -> f64 {
        self.proximity_radius_m
    }

    pub fn activate(&mut self, tool: Tool, observer: &mut impl SurfaceObserver) {
        let mode = match tool {
            Tool::Landmark => SessionMode::PlacingPoint(PointKind::Landmark),
            Tool::Service => SessionMode::PlacingPoint(PointKind::Service),
            Tool::Polygon => SessionMode::DrawingPolygon,
            Tool::Rectangle => SessionMode::DrawingRectangle,
            Tool::Review => SessionMode::AwaitingReviewTarget,
            Tool::Cancel => {
                self.cancel(observer);
                return;
            }
        };
        self.open(mode, observer);
    }

    /// Starts relocating an existing point; the next click becomes its new location.
    pub fn begin_move(&mut self, id: EntityId, kind: PointKind, observer: &mut impl SurfaceObserver) {
        self.open(SessionMode::MovingEntity { id, kind }, observer);
    }

    fn open(&mut self, mode: SessionMode, observer: &mut impl SurfaceObserver) {
        if let Some(prev) = self.session.take() {
            debug!(mode = ?prev.mode, "discarding previous session");
        }
        debug!(?mode, "session opened");
        observer.shape_candidate_changed(None);
        observer.session_state_changed(&mode);
        self.session = Some(DrawingSession::new(mode));
    }

    pub fn cancel(&mut self, observer: &mut impl SurfaceObserver) {
        if let Some(prev) = self.session.take() {
            debug!(mode = ?prev.mode, "session cancelled");
        }
        observer.shape_candidate_changed(None);
        observer.session_state_changed(&SessionMode::Idle);
    }

    fn close(&mut self, observer: &mut impl SurfaceObserver) {
        self.session = None;
        observer.shape_candidate_changed(None);
        observer.session_state_changed(&SessionMode::Idle);
    }

    fn finalize(&mut self, shape: FinalizedShape, observer: &mut impl SurfaceObserver) {
        info!(?shape, "shape finalized");
        observer.shape_finalized(&shape);
        self.close(observer);
    }

    pub fn complete_polygon(&mut self, observer: &mut impl SurfaceObserver) -> EngineResult<ZoneShape> {
        let Some(DrawingSession {
            builder: ActiveBuilder::Polygon(builder),
            ..
        }) = &mut self.session
        else {
            return Err(EngineError::NotActive {
                expected: "an active polygon drawing",
            });
        };
        let shape = builder.finish()?;
        self.finalize(FinalizedShape::Zone(shape.clone()), observer);
        Ok(shape)
    }

    pub fn handle_pointer_event(
        &mut self,
        event: PointerEvent,
        entities: &Snapshot,
        observer: &mut impl SurfaceObserver,
    ) -> EngineResult<Option<SessionOutcome>> {
        let Some(session) = &mut self.session else {
            return Ok(None);
        };

        match (&session.mode, &mut session.builder, event) {
            (SessionMode::PlacingPoint(kind), ActiveBuilder::Point(b), PointerEvent::Click(at)) => {
                let kind = *kind;
                let location = b.click(at);
                self.finalize(FinalizedShape::Point { kind, location }, observer);
                Ok(Some(SessionOutcome::PointPlaced { kind, location }))
            }
            (SessionMode::MovingEntity { id, kind }, ActiveBuilder::Point(b), PointerEvent::Click(at)) => {
                let (id, kind) = (id.clone(), *kind);
                let location = b.click(at);
                self.finalize(
                    FinalizedShape::Relocation {
                        id: id.clone(),
                        kind,
                        location,
                    },
                    observer,
                );
                Ok(Some(SessionOutcome::EntityMoved { id, kind, location }))
            }
            (SessionMode::DrawingPolygon, ActiveBuilder::Polygon(b), PointerEvent::Click(at)) => {
                if let Some(preview) = b.push(at) {
                    observer.shape_candidate_changed(Some(&preview));
                }
                Ok(None)
            }
            (SessionMode::DrawingPolygon, ActiveBuilder::Polygon(_), PointerEvent::DoubleClick(_))
                if self.double_click_completes =>
            {
                let shape = self.complete_polygon(observer)?;
                Ok(Some(SessionOutcome::ZoneDrawn(shape)))
            }
            (SessionMode::DrawingRectangle, ActiveBuilder::Rectangle(b), PointerEvent::Down(at)) => {
                let preview = b.press(at);
                observer.shape_candidate_changed(Some(&preview));
                Ok(None)
            }
            (SessionMode::DrawingRectangle, ActiveBuilder::Rectangle(b), PointerEvent::Move(at)) => {
                if let Some(preview) = b.drag(at) {
                    observer.shape_candidate_changed(Some(&preview));
                }
                Ok(None)
            }
            (SessionMode::DrawingRectangle, ActiveBuilder::Rectangle(b), PointerEvent::Up(at)) => {
                match b.release(at) {
                    None => Ok(None),
                    Some(Ok(shape)) => {
                        self.finalize(FinalizedShape::Zone(shape.clone()), observer);
                        Ok(Some(SessionOutcome::ZoneDrawn(shape)))
                    }
                    Some(Err(err)) => {
                        self.close(observer);
                        Err(err)
                    }
                }
            }
            (SessionMode::AwaitingReviewTarget, _, PointerEvent::Click(at)) => {
                match proximity::resolve(at, entities.point_entities(), self.proximity_radius_m) {
                    Some(entity) => {
                        debug!(id = %entity.id, "review target resolved");
                        let entity = entity.clone();
                        self.close(observer);
                        Ok(Some(SessionOutcome::ReviewTargetFound(entity)))
                    }
                    None => Err(EngineError::NoMatchFound),
                }
            }
            _ => Ok(None),
        }
    }
}
