use eframe::egui;
use std::path::PathBuf;
use tracing::{info, warn};

use tourmap::engine::cache::load_snapshot;
use tourmap::engine::matcher::SearchOptions;
use tourmap::engine::{CacheEntry, FormOutput, FormSession, FormStep, RawPointerInput, SessionOutcome, Tool};
use tourmap::model::{EntityKind, EntityPatch, Named};
use tourmap::settings;
use tourmap::store::{DocumentStore, EntityStore};
use tourmap::{EngineError, Severity, StoreError, StoreResult};

use super::tasks::TaskResult;
use super::{ActiveForm, MapApp, Selection, StatusMessage};

impl MapApp {
    pub(super) fn set_status(&mut self, text: impl Into<String>, severity: Severity) {
        self.status = Some(StatusMessage {
            text: text.into(),
            severity,
            shown_at: None,
        });
    }

    pub(super) fn report(&mut self, err: &EngineError) {
        match err.severity() {
            Severity::Error => warn!(error = %err, "operation failed"),
            _ => info!(error = %err, "operation rejected"),
        }
        self.set_status(err.to_string(), err.severity());
    }

    fn report_store(&mut self, err: StoreError) {
        self.report(&EngineError::from(err));
    }

    pub(super) fn open_store(&mut self, path: PathBuf) {
        self.loading = true;
        let task_path = path.clone();
        self.tasks.spawn(async move {
            let result = async {
                let store = DocumentStore::open(&task_path).await?;
                let snapshot = load_snapshot(&store).await?;
                Ok::<_, StoreError>((store, snapshot))
            }
            .await;
            TaskResult::StoreOpened { path, result }
        });
    }

    pub(super) fn reload(&mut self) {
        let store = self.store.clone();
        self.loading = true;
        self.tasks
            .spawn(async move { TaskResult::Reloaded(load_snapshot(&store).await) });
    }

    /// Runs `op` against the store, then reloads every collection.
    fn mutate<F, Fut>(&mut self, message: String, op: F)
    where
        F: FnOnce(DocumentStore) -> Fut + Send + 'static,
        Fut: Future<Output = StoreResult<()>> + Send + 'static,
    {
        let store = self.store.clone();
        self.tasks.spawn(async move {
            let result = match op(store.clone()).await {
                Ok(()) => load_snapshot(&store).await,
                Err(err) => Err(err),
            };
            TaskResult::Mutated { message, result }
        });
    }

    pub(super) fn apply_task_results(&mut self) {
        for result in self.tasks.drain() {
            match result {
                TaskResult::StoreOpened { path, result } => {
                    self.loading = false;
                    match result {
                        Ok((store, snapshot)) => {
                            self.store = store;
                            self.install(snapshot);
                            let data_file = path.display().to_string();
                            if self.settings.data_file != data_file {
                                self.settings.data_file = data_file;
                                self.persist_settings();
                            }
                            self.set_status(format!("Loaded {}", path.display()), Severity::Info);
                        }
                        // The previous store stays in place; a detached one keeps refusing edits.
                        Err(err) => {
                            warn!(path = %path.display(), error = %err, "data file could not be opened");
                            self.set_status(
                                format!("Could not open {}: {err}", path.display()),
                                Severity::Error,
                            );
                        }
                    }
                }
                TaskResult::Mutated { message, result } => match result {
                    Ok(snapshot) => {
                        self.install(snapshot);
                        self.set_status(message, Severity::Info);
                        if let Some(sel) = self.selection.as_ref().filter(|s| s.reviews.is_some()) {
                            let id = sel.id.clone();
                            self.load_reviews(id);
                        }
                    }
                    Err(err) => {
                        self.overlay.unsaved.clear();
                        self.report_store(err);
                    }
                },
                TaskResult::Reloaded(result) => {
                    self.loading = false;
                    match result {
                        Ok(snapshot) => self.install(snapshot),
                        Err(err) => {
                            warn!(error = %err, "reload failed; keeping previous snapshot");
                            self.report_store(err);
                        }
                    }
                }
                TaskResult::Reviews { target_id, result } => match result {
                    Ok(reviews) => {
                        if let Some(sel) = self.selection.as_mut().filter(|s| s.id == target_id) {
                            sel.reviews = Some(reviews);
                        }
                    }
                    Err(err) => self.report_store(err),
                },
                TaskResult::Exported { path, result } => match result {
                    Ok(()) => self.set_status(format!("Exported {}", path.display()), Severity::Info),
                    Err(err) => self.report_store(err),
                },
            }
        }
    }

    fn install(&mut self, snapshot: tourmap::engine::Snapshot) {
        self.cache.install(snapshot);
        self.search_focus.reset();
        self.overlay.unsaved.clear();
        let snapshot = self.cache.snapshot();
        if let Some(sel) = &self.selection {
            if snapshot.find(sel.kind, &sel.id).is_none() {
                self.selection = None;
            }
        }
    }

    /// False, with a lasting error status, while no data file is open.
    fn can_edit(&mut self) -> bool {
        if self.store.is_detached() {
            self.report_store(StoreError::Detached);
            return false;
        }
        true
    }

    pub(super) fn activate_tool(&mut self, tool: Tool) {
        if tool != Tool::Cancel && !self.can_edit() {
            return;
        }
        self.form = None;
        self.controller.activate(tool, &mut self.overlay);
        if !self.store.is_detached() {
            self.status = None;
        }
    }

    pub(super) fn cancel_session(&mut self) {
        self.controller.cancel(&mut self.overlay);
    }

    pub(super) fn finish_polygon(&mut self) {
        match self.controller.complete_polygon(&mut self.overlay) {
            Ok(shape) => self.form = Some(ActiveForm::new(FormSession::create_zone(shape))),
            Err(err) => self.report(&err),
        }
    }

    pub(super) fn handle_pointer_input(&mut self, raw: Vec<RawPointerInput>) {
        let snapshot = self.snapshot();
        for event in self.bus.drain(raw) {
            match self.controller.handle_pointer_event(event, &snapshot, &mut self.overlay) {
                Ok(Some(outcome)) => self.apply_outcome(outcome),
                Ok(None) => {}
                Err(err) => self.report(&err),
            }
        }
    }

    fn apply_outcome(&mut self, outcome: SessionOutcome) {
        match outcome {
            SessionOutcome::PointPlaced { kind, location } => {
                self.form = Some(ActiveForm::new(FormSession::create_point(kind, location)));
            }
            SessionOutcome::ZoneDrawn(shape) => {
                self.form = Some(ActiveForm::new(FormSession::create_zone(shape)));
            }
            SessionOutcome::EntityMoved { id, kind, location } => {
                self.mutate("Location updated".to_string(), move |store| async move {
                    store
                        .update_entity(kind.into(), &id, EntityPatch::location(location))
                        .await
                        .map(|_| ())
                });
            }
            SessionOutcome::ReviewTargetFound(entity) => {
                self.form = Some(ActiveForm::new(FormSession::review(&entity)));
            }
        }
    }

    pub(super) fn submit_form(&mut self) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        match form.session.submit(&form.input) {
            Ok(FormStep::Next(_)) => {
                form.input = form.session.default_value().to_string();
                form.error = None;
            }
            Ok(FormStep::Cancelled) => self.abandon_form(),
            Ok(FormStep::Complete(output)) => {
                self.form = None;
                self.persist(output);
            }
            Err(err) => form.error = Some(err.to_string()),
        }
    }

    pub(super) fn abandon_form(&mut self) {
        if let Some(mut form) = self.form.take() {
            form.session.cancel();
        }
        self.overlay.unsaved.clear();
        self.set_status("Cancelled", Severity::Info);
    }

    fn persist(&mut self, output: FormOutput) {
        match output {
            FormOutput::NewPoint { kind, point } => {
                let message = format!("{} \"{}\" saved", kind.label(), point.name);
                self.mutate(message, move |store| async move {
                    store.create_point(kind, point).await.map(|_| ())
                });
            }
            FormOutput::NewZone(zone) => {
                let message = format!("Zone \"{}\" saved", zone.name);
                self.mutate(message, move |store| async move { store.create_zone(zone).await.map(|_| ()) });
            }
            FormOutput::Patch { id, kind, patch } => {
                self.mutate(format!("{} updated", kind.label()), move |store| async move {
                    store.update_entity(kind, &id, patch).await.map(|_| ())
                });
            }
            FormOutput::Review(draft) => {
                let user_id = self.settings.user_id.clone();
                self.mutate("Review saved".to_string(), move |store| async move {
                    store.create_review(&user_id, draft).await.map(|_| ())
                });
            }
        }
    }

    pub(super) fn select(&mut self, kind: EntityKind, id: &str) {
        if self.selection.as_ref().is_some_and(|s| s.id == id) {
            return;
        }
        self.selection = Some(Selection {
            id: id.to_string(),
            kind,
            reviews: None,
        });
    }

    pub(super) fn load_reviews(&mut self, target_id: String) {
        let store = self.store.clone();
        self.tasks.spawn(async move {
            let result = store.list_reviews(&target_id).await;
            TaskResult::Reviews { target_id, result }
        });
    }

    pub(super) fn edit_selected(&mut self) {
        if !self.can_edit() {
            return;
        }
        let Some(sel) = &self.selection else {
            return;
        };
        let snapshot = self.snapshot();
        if let Some(entry) = snapshot.find(sel.kind, &sel.id) {
            self.controller.cancel(&mut self.overlay);
            self.form = Some(ActiveForm::new(FormSession::edit(entry)));
        }
    }

    pub(super) fn move_selected(&mut self) {
        if !self.can_edit() {
            return;
        }
        let Some(sel) = &self.selection else {
            return;
        };
        let snapshot = self.snapshot();
        if let Some(CacheEntry::Point(point)) = snapshot.find(sel.kind, &sel.id) {
            self.form = None;
            self.controller.begin_move(point.id.clone(), point.kind, &mut self.overlay);
        }
    }

    pub(super) fn delete_selected(&mut self) {
        if !self.can_edit() {
            return;
        }
        let Some(sel) = self.selection.take() else {
            return;
        };
        let snapshot = self.snapshot();
        let name = snapshot
            .find(sel.kind, &sel.id)
            .map(|e| e.name().to_string())
            .unwrap_or_default();
        self.mutate(format!("Deleted \"{name}\""), move |store| async move {
            store.delete_entity(sel.kind, &sel.id).await
        });
    }

    /// Search box input. Typing focuses exact names only; Enter also accepts partial matches.
    pub(super) fn run_search(&mut self, options: SearchOptions) {
        let snapshot = self.snapshot();
        let query = self.search.query.clone();
        let focused = self
            .search_focus
            .focus_by_name(&query, &snapshot, options, &mut self.overlay);
        if focused.is_none() && options.force && !query.trim().is_empty() {
            self.set_status(format!("No match for \"{}\"", query.trim()), Severity::Warning);
        }
    }

    pub(super) fn focus_entry(&mut self, entry: CacheEntry<'_>) {
        self.search_focus.focus_entry(entry, &mut self.overlay);
    }

    pub(super) fn open_data_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new().add_filter("JSON", &["json"]).pick_file() {
            self.controller.cancel(&mut self.overlay);
            self.form = None;
            self.selection = None;
            self.open_store(path);
        }
    }

    pub(super) fn export_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .set_file_name("tourmap-export.json")
            .add_filter("JSON", &["json"])
            .save_file()
        {
            let store = self.store.clone();
            self.tasks.spawn(async move {
                let result = async {
                    let json = store.export_json().await?;
                    tokio::fs::write(&path, json).await?;
                    Ok::<_, StoreError>(())
                }
                .await;
                TaskResult::Exported { path, result }
            });
        }
    }

    pub(super) fn persist_settings(&mut self) {
        if let Err(e) = settings::save_settings(&self.settings_path, &self.settings) {
            self.set_status(format!("Settings save failed: {e}"), Severity::Error);
        }
    }

    pub(super) fn reload_settings(&mut self) {
        let loaded = settings::load_settings(&self.settings_path).unwrap_or_default();
        self.controller = tourmap::engine::DrawingSessionController::new(
            loaded.proximity_radius_m,
            loaded.polygon_double_click_completes,
        );
        self.overlay.preview = None;
        self.overlay.instructions = None;
        self.settings = loaded;
        self.set_status(
            format!("Settings reloaded from {}", self.settings_path.display()),
            Severity::Info,
        );
    }

    pub(super) fn now(ctx: &egui::Context) -> f64 {
        ctx.input(|i| i.time)
    }
}
