use eframe::egui;

use tourmap::Severity;
use tourmap::engine::matcher::SearchOptions;
use tourmap::engine::{CacheEntry, FocusTarget, RawPointerInput, SessionMode, Tool};
use tourmap::model::{Coordinate, Named};

use super::render::{
    draw_background, draw_entities, draw_instructions, draw_preview, draw_unsaved, draw_vertices, hit_entity,
    severity_color, tool_button,
};
use super::search::SearchAction;
use super::MapApp;

const STATUS_SECONDS: f64 = 5.0;

impl eframe::App for MapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.apply_task_results();

        let wants_keyboard = ctx.wants_keyboard_input();
        ctx.input_mut(|i| {
            if i.consume_key(egui::Modifiers::COMMAND, egui::Key::O) {
                self.open_data_dialog();
            }
            if wants_keyboard {
                return;
            }
            if i.consume_key(egui::Modifiers::NONE, egui::Key::Escape) {
                if self.form.is_some() {
                    self.abandon_form();
                } else {
                    self.cancel_session();
                }
            }
            if i.consume_key(egui::Modifiers::NONE, egui::Key::Enter)
                && matches!(self.controller.mode(), SessionMode::DrawingPolygon)
            {
                self.finish_polygon();
            }
        });

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open data file... (⌘O)").clicked() {
                        self.open_data_dialog();
                        ui.close();
                    }
                    if ui.button("Export JSON...").clicked() {
                        self.export_dialog();
                        ui.close();
                    }
                    ui.separator();
                    if ui.button("Reload data").clicked() {
                        self.reload();
                        ui.close();
                    }
                    if ui.button("Reload settings").clicked() {
                        self.reload_settings();
                        ui.close();
                    }
                    ui.separator();
                    ui.small(format!("Data: {}", self.settings.data_file));
                    ui.small(format!("Settings: {}", self.settings_path.display()));
                });
                ui.menu_button("Options", |ui| {
                    if ui
                        .checkbox(
                            &mut self.settings.polygon_double_click_completes,
                            "Double-click finishes polygon",
                        )
                        .changed()
                    {
                        self.persist_settings();
                        self.reload_settings();
                    }
                });
                ui.separator();
                let active = self.controller.mode().tool();
                ui.add_enabled_ui(!self.store.is_detached(), |ui| {
                    for tool in Tool::all() {
                        if tool_button(ui, *tool, active) {
                            self.activate_tool(*tool);
                        }
                    }
                });
                ui.separator();
                let drawing_polygon = matches!(self.controller.mode(), SessionMode::DrawingPolygon);
                if ui
                    .add_enabled(drawing_polygon, egui::Button::new("Finish polygon"))
                    .clicked()
                {
                    self.finish_polygon();
                }
                if ui
                    .add_enabled(!self.controller.mode().is_idle(), egui::Button::new(Tool::Cancel.label()))
                    .clicked()
                {
                    self.activate_tool(Tool::Cancel);
                }
            });
        });

        let now = Self::now(ctx);
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some(status) = &mut self.status {
                    let shown_at = *status.shown_at.get_or_insert(now);
                    let color = severity_color(ui, status.severity);
                    ui.colored_label(color, &status.text);
                    if status.severity == Severity::Info && now - shown_at > STATUS_SECONDS {
                        self.status = None;
                    } else {
                        ctx.request_repaint_after(std::time::Duration::from_secs(1));
                    }
                } else if self.loading || self.tasks.busy() {
                    ui.spinner();
                    ui.label("Working...");
                } else {
                    ui.label("Ready");
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let snapshot = self.cache.snapshot();
                    ui.label(format!("Zoom: {:.1}", self.view.zoom));
                    ui.separator();
                    ui.label(format!(
                        "Landmarks: {}  Services: {}  Zones: {}",
                        snapshot.landmarks.len(),
                        snapshot.services.len(),
                        snapshot.zones.len()
                    ));
                });
            });
        });

        egui::SidePanel::left("search_panel")
            .resizable(true)
            .min_width(240.0)
            .show(ctx, |ui| {
                ui.heading("Search");
                let snapshot = self.cache.snapshot();
                match self.search.ui(ui, &snapshot, self.settings.suggestion_limit) {
                    Some(SearchAction::Typed) => self.run_search(SearchOptions::TYPING),
                    Some(SearchAction::Submitted) => self.run_search(SearchOptions::SUBMIT),
                    Some(SearchAction::Pick { kind, id }) => {
                        if let Some(entry) = snapshot.find(kind, &id) {
                            self.focus_entry(entry);
                        }
                    }
                    None => {}
                }
            });

        self.form_window(ctx);
        self.details_window(ctx);

        egui::CentralPanel::default()
            .frame(egui::Frame::new())
            .show(ctx, |ui| {
                let (rect, response) = ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
                let origin = rect.min;

                if !self.view_initialized {
                    self.view.center_on(rect, self.settings.initial_center);
                    self.view_initialized = true;
                }
                if let Some(request) = self.overlay.pending_focus.take() {
                    match request.target {
                        FocusTarget::Point(c) => self.view.center_on(rect, c),
                        FocusTarget::Bounds(b) => self.view.fit_bounds(rect, b),
                    }
                    self.select(request.kind, &request.entity_id);
                }

                let scroll_delta = ctx.input(|i| i.raw_scroll_delta.y);
                if scroll_delta.abs() > 0.0 {
                    if let Some(hover_pos) = ctx.input(|i| i.pointer.hover_pos()) {
                        if rect.contains(hover_pos) {
                            let zoom_delta = (scroll_delta * 0.01).clamp(-1.0, 1.0);
                            self.view.zoom_about_screen_point(origin, hover_pos, zoom_delta);
                        }
                    }
                }

                let mode = self.controller.mode().clone();
                let pointer_pos = ctx.input(|i| i.pointer.interact_pos());

                // Dragging pans the map unless a drawing tool owns the pointer.
                if (mode.is_idle() || matches!(mode, SessionMode::AwaitingReviewTarget)) && response.dragged() {
                    self.view.pan_screen += response.drag_delta();
                }

                let raw = match pointer_pos {
                    Some(pos) => Gestures::from_response(&response).raw_inputs(
                        self.view.to_coordinate(origin, pos),
                        self.settings.polygon_double_click_completes,
                    ),
                    None => Vec::new(),
                };

                if mode.is_idle() {
                    if response.clicked() {
                        let snapshot = self.cache.snapshot();
                        match pointer_pos.and_then(|p| hit_entity(&self.view, origin, &snapshot, p)) {
                            Some((kind, id)) => self.select(kind, &id),
                            None => self.selection = None,
                        }
                    }
                } else if !raw.is_empty() {
                    self.handle_pointer_input(raw);
                }

                let painter = ui.painter_at(rect);
                draw_background(&painter, rect, &self.view);
                let snapshot = self.cache.snapshot();
                let selected = self.selection.as_ref().map(|s| s.id.as_str());
                draw_entities(&painter, &self.view, origin, &snapshot, selected);
                draw_unsaved(&painter, &self.view, origin, &self.overlay.unsaved);
                if let Some(session) = self.controller.session() {
                    draw_vertices(&painter, &self.view, origin, session.accumulated_vertices());
                }
                if let Some(preview) = &self.overlay.preview {
                    draw_preview(&painter, &self.view, origin, preview);
                }
                if let Some(text) = self.overlay.instructions {
                    draw_instructions(&painter, rect, text);
                }
                if let Some(pos) = pointer_pos.filter(|p| rect.contains(*p)) {
                    let c = self.view.to_coordinate(origin, pos);
                    painter.text(
                        rect.left_bottom() + egui::vec2(8.0, -8.0),
                        egui::Align2::LEFT_BOTTOM,
                        format!("{:.5}, {:.5}", c.latitude, c.longitude),
                        egui::FontId::monospace(11.0),
                        ui.visuals().weak_text_color(),
                    );
                }
            });
    }
}

impl MapApp {
    fn form_window(&mut self, ctx: &egui::Context) {
        let Some(form) = &mut self.form else {
            return;
        };
        let Some(field) = form.session.current() else {
            self.form = None;
            return;
        };
        let mut submit = false;
        let mut cancel = false;
        egui::Window::new(form.session.title().into_owned())
            .id(egui::Id::new("form_window"))
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(field.prompt());
                let resp = ui.add(egui::TextEdit::singleline(&mut form.input).desired_width(280.0));
                resp.request_focus();
                if resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    submit = true;
                }
                if let Some(err) = &form.error {
                    ui.colored_label(ui.visuals().error_fg_color, err);
                }
                ui.small("Leave empty to cancel");
                ui.horizontal(|ui| {
                    submit |= ui.button("OK").clicked();
                    cancel |= ui.button("Cancel").clicked();
                });
            });
        if cancel {
            self.abandon_form();
        } else if submit {
            self.submit_form();
        }
    }

    fn details_window(&mut self, ctx: &egui::Context) {
        let Some(sel) = &self.selection else {
            return;
        };
        let snapshot = self.cache.snapshot();
        let Some(entry) = snapshot.find(sel.kind, &sel.id) else {
            return;
        };
        let is_point = matches!(entry, CacheEntry::Point(_));
        let detached = self.store.is_detached();
        let reviews = sel.reviews.clone();
        let mut open = true;
        let mut action = None;

        egui::Window::new(entry.name())
            .id(egui::Id::new("details_window"))
            .open(&mut open)
            .resizable(false)
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.label(entry.kind().label());
                if !entry.description().is_empty() {
                    ui.label(entry.description());
                }
                ui.small(entry.location_text());
                ui.separator();
                ui.horizontal(|ui| {
                    ui.add_enabled_ui(!detached, |ui| {
                        if ui.button("Edit").clicked() {
                            action = Some(DetailAction::Edit);
                        }
                        if ui.button("Delete").clicked() {
                            action = Some(DetailAction::Delete);
                        }
                        if is_point && ui.button("Move").clicked() {
                            action = Some(DetailAction::Move);
                        }
                    });
                    if is_point && ui.button("Reviews").clicked() {
                        action = Some(DetailAction::Reviews);
                    }
                });
                if let Some(reviews) = &reviews {
                    ui.separator();
                    if reviews.is_empty() {
                        ui.weak("No reviews yet");
                    }
                    for review in reviews {
                        ui.horizontal(|ui| {
                            ui.label("★".repeat(review.rating as usize));
                            ui.small(review.created_at.format("%Y-%m-%d").to_string());
                        });
                        ui.label(&review.comment);
                        ui.add_space(4.0);
                    }
                }
            });

        let id = entry.id().to_string();
        if !open {
            self.selection = None;
            return;
        }
        match action {
            Some(DetailAction::Edit) => self.edit_selected(),
            Some(DetailAction::Delete) => self.delete_selected(),
            Some(DetailAction::Move) => self.move_selected(),
            Some(DetailAction::Reviews) => self.load_reviews(id),
            None => {}
        }
    }
}

enum DetailAction {
    Edit,
    Delete,
    Move,
    Reviews,
}

/// Pointer gestures egui reported for the canvas this frame.
#[derive(Clone, Copy, Debug, Default)]
struct Gestures {
    drag_started: bool,
    dragged: bool,
    drag_stopped: bool,
    clicked: bool,
    double_clicked: bool,
}

impl Gestures {
    fn from_response(response: &egui::Response) -> Self {
        Self {
            drag_started: response.drag_started(),
            dragged: response.dragged(),
            drag_stopped: response.drag_stopped(),
            clicked: response.clicked(),
            double_clicked: response.double_clicked(),
        }
    }

    /// egui also reports the second click of a double-click as a click. That click is
    /// dropped when a double-click finishes polygons, so the last vertex is not added twice.
    fn raw_inputs(self, at: Coordinate, double_click_completes: bool) -> Vec<RawPointerInput> {
        let Coordinate { latitude, longitude } = at;
        let mut raw = Vec::new();
        if self.drag_started {
            raw.push(RawPointerInput::Pressed { latitude, longitude });
        }
        if self.dragged {
            raw.push(RawPointerInput::Moved { latitude, longitude });
        }
        if self.drag_stopped {
            raw.push(RawPointerInput::Released { latitude, longitude });
        }
        if self.clicked && !(self.double_clicked && double_click_completes) {
            raw.push(RawPointerInput::Clicked { latitude, longitude });
        }
        if self.double_clicked {
            raw.push(RawPointerInput::DoubleClicked { latitude, longitude });
        }
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tourmap::engine::{DrawingSessionController, GeometryEventBus, Snapshot};
    use tourmap::model::ZoneShape;

    const AT: Coordinate = Coordinate { latitude: 1.0, longitude: 1.0 };

    fn double_click() -> Gestures {
        Gestures {
            clicked: true,
            double_clicked: true,
            ..Gestures::default()
        }
    }

    #[test]
    fn second_click_of_double_click_is_kept_without_completion() {
        let raw = double_click().raw_inputs(AT, false);
        assert_eq!(
            raw,
            vec![
                RawPointerInput::Clicked { latitude: 1.0, longitude: 1.0 },
                RawPointerInput::DoubleClicked { latitude: 1.0, longitude: 1.0 },
            ]
        );
    }

    #[test]
    fn double_click_finish_does_not_repeat_last_vertex() {
        let snapshot = Snapshot::default();
        let bus = GeometryEventBus;
        let mut ctl = DrawingSessionController::new(100.0, true);
        ctl.activate(Tool::Polygon, &mut ());

        let single = Gestures {
            clicked: true,
            ..Gestures::default()
        };
        let frames = [
            single.raw_inputs(Coordinate { latitude: 0.0, longitude: 0.0 }, true),
            single.raw_inputs(Coordinate { latitude: 0.0, longitude: 1.0 }, true),
            single.raw_inputs(AT, true),
            double_click().raw_inputs(AT, true),
        ];
        let mut drawn = None;
        for event in frames.into_iter().flat_map(|raw| bus.drain(raw)) {
            if let Some(outcome) = ctl.handle_pointer_event(event, &snapshot, &mut ()).unwrap() {
                drawn = Some(outcome);
            }
        }

        let Some(tourmap::engine::SessionOutcome::ZoneDrawn(ZoneShape::Polygon { vertices })) = drawn else {
            panic!("expected a polygon");
        };
        assert_eq!(vertices.len(), 3);
        assert!(ctl.mode().is_idle());
    }
}
