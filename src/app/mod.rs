use eframe::egui;
use std::path::PathBuf;
use std::sync::Arc;

use tourmap::engine::builders::ShapeCandidate;
use tourmap::engine::{
    DrawingSessionController, EntityCache, FinalizedShape, FocusRequest, FormSession, GeometryEventBus, SearchFocus,
    SessionMode, SurfaceObserver,
};
use tourmap::model::{Bounds, Coordinate, EntityKind, EntityId, Review};
use tourmap::settings::{self, AppSettings};
use tourmap::store::DocumentStore;
use tourmap::Severity;

mod actions;
mod render;
mod search;
mod tasks;
mod update;

const TILE_SIZE: f32 = 256.0;
const MIN_ZOOM: f32 = 2.0;
const MAX_ZOOM: f32 = 19.0;

/// Equirectangular pan/zoom. World space is (longitude, -latitude) in degrees.
#[derive(Clone, Copy, Debug)]
struct View {
    pan_screen: egui::Vec2,
    zoom: f32,
}

impl Default for View {
    fn default() -> Self {
        Self {
            pan_screen: egui::Vec2::ZERO,
            zoom: 12.0,
        }
    }
}

impl View {
    /// Pixels per degree at the current zoom level.
    fn scale(&self) -> f32 {
        TILE_SIZE * 2f32.powf(self.zoom) / 360.0
    }

    fn world(c: Coordinate) -> egui::Vec2 {
        egui::vec2(c.longitude as f32, -c.latitude as f32)
    }

    fn to_screen(&self, origin: egui::Pos2, c: Coordinate) -> egui::Pos2 {
        origin + self.pan_screen + Self::world(c) * self.scale()
    }

    fn to_coordinate(&self, origin: egui::Pos2, screen: egui::Pos2) -> Coordinate {
        let world = (screen - origin - self.pan_screen) / self.scale();
        Coordinate {
            latitude: -world.y as f64,
            longitude: world.x as f64,
        }
    }

    fn zoom_about_screen_point(&mut self, origin: egui::Pos2, screen_point: egui::Pos2, zoom_delta: f32) {
        let before = self.to_coordinate(origin, screen_point);
        self.zoom = (self.zoom + zoom_delta).clamp(MIN_ZOOM, MAX_ZOOM);
        let after_screen = self.to_screen(origin, before);
        self.pan_screen += screen_point - after_screen;
    }

    fn center_on(&mut self, rect: egui::Rect, c: Coordinate) {
        self.pan_screen = rect.center() - rect.min - Self::world(c) * self.scale();
    }

    fn fit_bounds(&mut self, rect: egui::Rect, bounds: Bounds) {
        let span_lon = (bounds.east - bounds.west).max(1e-6) as f32;
        let span_lat = (bounds.north - bounds.south).max(1e-6) as f32;
        let scale = (rect.width() / span_lon).min(rect.height() / span_lat) * 0.8;
        self.zoom = (scale * 360.0 / TILE_SIZE).log2().clamp(MIN_ZOOM, MAX_ZOOM);
        self.center_on(rect, bounds.center());
    }
}

/// Renderer-side state driven by the engine's signals.
#[derive(Default)]
struct Overlay {
    preview: Option<ShapeCandidate>,
    instructions: Option<&'static str>,
    pending_focus: Option<FocusRequest>,
    /// Finalized shapes drawn as ghosts until the next cache install.
    unsaved: Vec<FinalizedShape>,
}

impl SurfaceObserver for Overlay {
    fn shape_candidate_changed(&mut self, shape: Option<&ShapeCandidate>) {
        self.preview = shape.cloned();
    }

    fn shape_finalized(&mut self, shape: &FinalizedShape) {
        self.unsaved.push(shape.clone());
    }

    fn session_state_changed(&mut self, mode: &SessionMode) {
        self.instructions = mode.instructions();
    }

    fn focus_requested(&mut self, request: &FocusRequest) {
        self.pending_focus = Some(request.clone());
    }
}

struct StatusMessage {
    text: String,
    severity: Severity,
    /// Set on first paint.
    shown_at: Option<f64>,
}

/// Open detail popup.
struct Selection {
    id: EntityId,
    kind: EntityKind,
    reviews: Option<Vec<Review>>,
}

/// Text field backing the current form prompt.
struct ActiveForm {
    session: FormSession,
    input: String,
    error: Option<String>,
}

impl ActiveForm {
    fn new(session: FormSession) -> Self {
        let input = session.default_value().to_string();
        Self {
            session,
            input,
            error: None,
        }
    }
}

pub struct MapApp {
    settings: AppSettings,
    settings_path: PathBuf,
    view: View,
    view_initialized: bool,
    bus: GeometryEventBus,
    controller: DrawingSessionController,
    cache: EntityCache,
    overlay: Overlay,
    search: search::SearchPanel,
    search_focus: SearchFocus,
    store: DocumentStore,
    tasks: tasks::TaskRunner,
    form: Option<ActiveForm>,
    selection: Option<Selection>,
    status: Option<StatusMessage>,
    loading: bool,
}

impl MapApp {
    pub fn new(cc: &eframe::CreationContext<'_>, runtime: tokio::runtime::Handle) -> Self {
        let settings_path = settings::config_path().unwrap_or_else(|| PathBuf::from(settings::DEFAULT_SETTINGS_FILE));
        let settings = settings::load_settings(&settings_path).unwrap_or_default();
        let controller =
            DrawingSessionController::new(settings.proximity_radius_m, settings.polygon_double_click_completes);
        let view = View {
            zoom: settings.initial_zoom,
            ..View::default()
        };

        let mut app = Self {
            settings_path,
            view,
            view_initialized: false,
            bus: GeometryEventBus,
            controller,
            cache: EntityCache::new(),
            overlay: Overlay::default(),
            search: search::SearchPanel::default(),
            search_focus: SearchFocus::default(),
            store: DocumentStore::detached(),
            tasks: tasks::TaskRunner::new(runtime, cc.egui_ctx.clone()),
            form: None,
            selection: None,
            status: None,
            loading: false,
            settings,
        };
        let data_file = PathBuf::from(&app.settings.data_file);
        app.open_store(data_file);
        app
    }

    fn snapshot(&self) -> Arc<tourmap::engine::Snapshot> {
        self.cache.snapshot()
    }
}
