use eframe::egui;

use tourmap::engine::matcher::{filter_entries, suggest};
use tourmap::engine::{CacheEntry, Snapshot};
use tourmap::model::{EntityId, EntityKind, Named};

pub(super) enum SearchAction {
    /// Query text changed.
    Typed,
    /// Enter with no suggestion highlighted.
    Submitted,
    Pick { kind: EntityKind, id: EntityId },
}

/// Sidebar search box with a suggestion dropdown and the filtered entity table.
#[derive(Default)]
pub(super) struct SearchPanel {
    pub query: String,
    /// Highlighted suggestion, moved with the arrow keys.
    selected: Option<usize>,
}

fn pick(entry: &CacheEntry<'_>) -> SearchAction {
    SearchAction::Pick {
        kind: entry.kind(),
        id: entry.id().to_string(),
    }
}

impl SearchPanel {
    pub fn ui(&mut self, ui: &mut egui::Ui, snapshot: &Snapshot, suggestion_limit: usize) -> Option<SearchAction> {
        let mut action = None;
        let entries = snapshot.all();

        let resp = ui.add(
            egui::TextEdit::singleline(&mut self.query)
                .desired_width(f32::INFINITY)
                .hint_text("Search by name"),
        );
        if resp.changed() {
            self.selected = None;
            action = Some(SearchAction::Typed);
        }

        let suggestions = suggest(&self.query, &entries, suggestion_limit);
        if resp.has_focus() && !suggestions.is_empty() {
            if ui.input(|i| i.key_pressed(egui::Key::ArrowDown)) {
                self.selected = Some(self.selected.map_or(0, |s| (s + 1).min(suggestions.len() - 1)));
            }
            if ui.input(|i| i.key_pressed(egui::Key::ArrowUp)) {
                self.selected = self.selected.and_then(|s| s.checked_sub(1));
            }
        }
        if resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            action = Some(match self.selected.and_then(|s| suggestions.get(s)) {
                Some(entry) => pick(entry),
                None => SearchAction::Submitted,
            });
            self.selected = None;
        }

        if !suggestions.is_empty() {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                for (idx, entry) in suggestions.iter().enumerate() {
                    let label = format!("{} · {}", entry.name(), entry.kind().label());
                    if ui.selectable_label(self.selected == Some(idx), label).clicked() {
                        action = Some(pick(entry));
                    }
                }
            });
        }

        ui.separator();
        let rows = filter_entries(&self.query, &entries);
        ui.small(format!("{} of {} entries", rows.len(), entries.len()));
        egui::ScrollArea::vertical().show(ui, |ui| {
            egui::Grid::new("entity_table").striped(true).num_columns(3).show(ui, |ui| {
                ui.strong("Name");
                ui.strong("Category");
                ui.strong("Location");
                ui.end_row();
                for entry in &rows {
                    if ui.link(entry.name()).on_hover_text(entry.description()).clicked() {
                        action = Some(pick(entry));
                    }
                    ui.label(entry.kind().label());
                    ui.small(entry.location_text());
                    ui.end_row();
                }
            });
        });
        action
    }
}
