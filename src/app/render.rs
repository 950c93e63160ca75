use eframe::egui;

use tourmap::Severity;
use tourmap::engine::builders::ShapeCandidate;
use tourmap::engine::{FinalizedShape, Snapshot, Tool};
use tourmap::model::{Bounds, Coordinate, EntityId, EntityKind, PointKind, ZoneShape};

use super::View;

const MARKER_RADIUS: f32 = 6.0;
const HIT_RADIUS: f32 = 9.0;

const LANDMARK_COLOR: egui::Color32 = egui::Color32::from_rgb(210, 50, 50);
const SERVICE_COLOR: egui::Color32 = egui::Color32::from_rgb(40, 90, 200);
const ZONE_COLOR: egui::Color32 = egui::Color32::from_rgb(40, 140, 60);
const PREVIEW_COLOR: egui::Color32 = egui::Color32::from_rgb(200, 140, 40);

pub(super) fn tool_button(ui: &mut egui::Ui, tool: Tool, active: Option<Tool>) -> bool {
    ui.selectable_label(active == Some(tool), tool.label())
        .on_hover_text(tool.to_string())
        .clicked()
}

pub(super) fn severity_color(ui: &egui::Ui, severity: Severity) -> egui::Color32 {
    match severity {
        Severity::Info => ui.visuals().text_color(),
        Severity::Warning => ui.visuals().warn_fg_color,
        Severity::Error => ui.visuals().error_fg_color,
    }
}

fn point_color(kind: PointKind) -> egui::Color32 {
    match kind {
        PointKind::Landmark => LANDMARK_COLOR,
        PointKind::Service => SERVICE_COLOR,
    }
}

/// Background plus a graticule whose spacing follows the zoom level.
pub(super) fn draw_background(painter: &egui::Painter, rect: egui::Rect, view: &View) {
    let bg = painter.ctx().style().visuals.extreme_bg_color;
    painter.rect_filled(rect, 0.0, bg);

    let origin = rect.min;
    let step = [10.0, 5.0, 1.0, 0.5, 0.1, 0.05, 0.01, 0.005, 0.001]
        .into_iter()
        .find(|deg| (*deg as f32) * view.scale() < 160.0)
        .unwrap_or(0.001);
    let top_left = view.to_coordinate(origin, rect.left_top());
    let bottom_right = view.to_coordinate(origin, rect.right_bottom());
    let stroke = egui::Stroke::new(1.0, painter.ctx().style().visuals.faint_bg_color);

    let mut lon = (top_left.longitude / step).floor() * step;
    while lon <= bottom_right.longitude {
        let x = view.to_screen(origin, Coordinate { latitude: 0.0, longitude: lon }).x;
        painter.line_segment([egui::pos2(x, rect.top()), egui::pos2(x, rect.bottom())], stroke);
        lon += step;
    }
    let mut lat = (bottom_right.latitude / step).floor() * step;
    while lat <= top_left.latitude {
        let y = view.to_screen(origin, Coordinate { latitude: lat, longitude: 0.0 }).y;
        painter.line_segment([egui::pos2(rect.left(), y), egui::pos2(rect.right(), y)], stroke);
        lat += step;
    }
}

fn bounds_rect(view: &View, origin: egui::Pos2, b: Bounds) -> egui::Rect {
    egui::Rect::from_two_pos(
        view.to_screen(origin, Coordinate { latitude: b.north, longitude: b.west }),
        view.to_screen(origin, Coordinate { latitude: b.south, longitude: b.east }),
    )
}

fn draw_zone_shape(
    painter: &egui::Painter,
    view: &View,
    origin: egui::Pos2,
    shape: &ZoneShape,
    fill: egui::Color32,
    stroke: egui::Stroke,
) {
    match shape {
        ZoneShape::Polygon { vertices } => {
            let pts: Vec<egui::Pos2> = vertices.iter().map(|v| view.to_screen(origin, *v)).collect();
            // Fill can be wrong for concave outlines; the outline is always exact.
            painter.add(egui::Shape::convex_polygon(pts.clone(), fill, egui::Stroke::NONE));
            painter.add(egui::Shape::closed_line(pts, stroke));
        }
        ZoneShape::Rectangle(b) => {
            let r = bounds_rect(view, origin, *b);
            painter.rect_filled(r, 0.0, fill);
            painter.rect_stroke(r, 0.0, stroke, egui::StrokeKind::Middle);
        }
    }
}

fn draw_marker(painter: &egui::Painter, pos: egui::Pos2, color: egui::Color32, highlighted: bool) {
    painter.circle_filled(pos, MARKER_RADIUS, color);
    let ring = if highlighted { 3.0 } else { 1.5 };
    painter.circle_stroke(pos, MARKER_RADIUS, egui::Stroke::new(ring, egui::Color32::WHITE));
}

pub(super) fn draw_entities(
    painter: &egui::Painter,
    view: &View,
    origin: egui::Pos2,
    snapshot: &Snapshot,
    selected: Option<&str>,
) {
    let text_color = painter.ctx().style().visuals.text_color();
    for zone in &snapshot.zones {
        let is_selected = selected == Some(zone.id.as_str());
        let width = if is_selected { 3.0 } else { 1.5 };
        draw_zone_shape(
            painter,
            view,
            origin,
            &zone.shape,
            ZONE_COLOR.gamma_multiply(0.25),
            egui::Stroke::new(width, ZONE_COLOR),
        );
        if let Some(center) = zone.shape.center() {
            painter.text(
                view.to_screen(origin, center),
                egui::Align2::CENTER_CENTER,
                &zone.name,
                egui::FontId::proportional(12.0),
                text_color,
            );
        }
    }
    for point in snapshot.point_entities() {
        let pos = view.to_screen(origin, point.location);
        draw_marker(painter, pos, point_color(point.kind), selected == Some(point.id.as_str()));
        painter.text(
            pos + egui::vec2(MARKER_RADIUS + 3.0, 0.0),
            egui::Align2::LEFT_CENTER,
            &point.name,
            egui::FontId::proportional(12.0),
            text_color,
        );
    }
}

pub(super) fn draw_preview(painter: &egui::Painter, view: &View, origin: egui::Pos2, preview: &ShapeCandidate) {
    let stroke = egui::Stroke::new(2.0, PREVIEW_COLOR);
    match preview {
        ShapeCandidate::Polygon(vertices) => {
            let pts: Vec<egui::Pos2> = vertices.iter().map(|v| view.to_screen(origin, *v)).collect();
            for p in &pts {
                painter.circle_filled(*p, 3.0, PREVIEW_COLOR);
            }
            painter.add(egui::Shape::closed_line(pts, stroke));
        }
        ShapeCandidate::Rectangle(b) => {
            let r = bounds_rect(view, origin, *b);
            painter.rect_filled(r, 0.0, PREVIEW_COLOR.gamma_multiply(0.2));
            painter.rect_stroke(r, 0.0, stroke, egui::StrokeKind::Middle);
        }
    }
}

/// Vertices placed so far, before the two-vertex preview exists.
pub(super) fn draw_vertices(painter: &egui::Painter, view: &View, origin: egui::Pos2, vertices: &[Coordinate]) {
    for v in vertices {
        painter.circle_filled(view.to_screen(origin, *v), 3.0, PREVIEW_COLOR);
    }
}

/// Shapes already finalized but not yet confirmed by the store.
pub(super) fn draw_unsaved(painter: &egui::Painter, view: &View, origin: egui::Pos2, shapes: &[FinalizedShape]) {
    for shape in shapes {
        match shape {
            FinalizedShape::Point { kind, location } | FinalizedShape::Relocation { kind, location, .. } => {
                let pos = view.to_screen(origin, *location);
                painter.circle_filled(pos, MARKER_RADIUS, point_color(*kind).gamma_multiply(0.5));
            }
            FinalizedShape::Zone(zone) => draw_zone_shape(
                painter,
                view,
                origin,
                zone,
                PREVIEW_COLOR.gamma_multiply(0.15),
                egui::Stroke::new(1.5, PREVIEW_COLOR.gamma_multiply(0.6)),
            ),
        }
    }
}

pub(super) fn draw_instructions(painter: &egui::Painter, rect: egui::Rect, text: &str) {
    let pos = rect.center_top() + egui::vec2(0.0, 12.0);
    let galley = painter.layout_no_wrap(
        text.to_string(),
        egui::FontId::proportional(14.0),
        egui::Color32::WHITE,
    );
    let bg = egui::Rect::from_center_size(
        pos + egui::vec2(0.0, galley.size().y * 0.5),
        galley.size() + egui::vec2(16.0, 8.0),
    );
    painter.rect_filled(bg, 6.0, egui::Color32::from_rgba_unmultiplied(20, 20, 20, 220));
    painter.galley(bg.center() - galley.size() * 0.5, galley, egui::Color32::WHITE);
}

fn point_in_polygon(p: egui::Pos2, pts: &[egui::Pos2]) -> bool {
    let mut inside = false;
    let mut j = pts.len().wrapping_sub(1);
    for i in 0..pts.len() {
        let (a, b) = (pts[i], pts[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Topmost entity under `pos`: markers first, then zones.
pub(super) fn hit_entity(
    view: &View,
    origin: egui::Pos2,
    snapshot: &Snapshot,
    pos: egui::Pos2,
) -> Option<(EntityKind, EntityId)> {
    let marker = snapshot
        .point_entities()
        .filter(|p| view.to_screen(origin, p.location).distance(pos) <= HIT_RADIUS)
        .last();
    if let Some(p) = marker {
        return Some((p.kind.into(), p.id.clone()));
    }
    snapshot
        .zones
        .iter()
        .rev()
        .find(|z| match &z.shape {
            ZoneShape::Polygon { vertices } => {
                let pts: Vec<egui::Pos2> = vertices.iter().map(|v| view.to_screen(origin, *v)).collect();
                point_in_polygon(pos, &pts)
            }
            ZoneShape::Rectangle(b) => bounds_rect(view, origin, *b).contains(pos),
        })
        .map(|z| (EntityKind::Zone, z.id.clone()))
}
