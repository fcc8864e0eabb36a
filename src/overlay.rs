use eframe::egui;

use crate::annotation::{box_label, BoundingBox};

const OUTLINE: egui::Color32 = egui::Color32::from_rgb(255, 0, 0);
const OUTLINE_WIDTH: f32 = 2.0;
const LABEL_SIZE: f32 = 14.0;
const DASH_LENGTH: f32 = 6.0;
const DASH_GAP: f32 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoxStyle {
    Committed,
    /// The rectangle of a drag still in progress.
    Live,
}

impl BoxStyle {
    fn fill(self) -> egui::Color32 {
        match self {
            BoxStyle::Committed => egui::Color32::from_rgba_unmultiplied(255, 0, 0, 25),
            BoxStyle::Live => egui::Color32::from_rgba_unmultiplied(255, 0, 0, 76),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OverlayBox {
    pub bbox: BoundingBox,
    pub label: String,
    pub style: BoxStyle,
}

/// Everything to draw over the frame, back to front. The live box takes the
/// label of the position it would be committed at.
pub fn overlay_boxes(committed: &[BoundingBox], live: Option<BoundingBox>) -> Vec<OverlayBox> {
    let mut items: Vec<OverlayBox> = committed
        .iter()
        .enumerate()
        .map(|(i, bbox)| OverlayBox {
            bbox: *bbox,
            label: box_label(i),
            style: BoxStyle::Committed,
        })
        .collect();
    if let Some(bbox) = live {
        items.push(OverlayBox {
            bbox,
            label: box_label(committed.len()),
            style: BoxStyle::Live,
        });
    }
    items
}

/// Paints `items` onto `surface`; box coordinates are relative to its
/// top-left corner.
pub fn paint(painter: &egui::Painter, surface: egui::Rect, items: &[OverlayBox]) {
    for item in items {
        let rect = egui::Rect::from_min_size(
            surface.min + egui::vec2(item.bbox.x, item.bbox.y),
            egui::vec2(item.bbox.width, item.bbox.height),
        );
        painter.rect_filled(rect, 0.0, item.style.fill());

        let stroke = egui::Stroke::new(OUTLINE_WIDTH, OUTLINE);
        match item.style {
            BoxStyle::Committed => {
                painter.rect_stroke(rect, 0.0, stroke, egui::StrokeKind::Inside);
            }
            BoxStyle::Live => {
                let outline = [
                    rect.left_top(),
                    rect.right_top(),
                    rect.right_bottom(),
                    rect.left_bottom(),
                    rect.left_top(),
                ];
                painter.extend(egui::Shape::dashed_line(&outline, stroke, DASH_LENGTH, DASH_GAP));
            }
        }

        paint_label(painter, rect.min, &item.label);
    }
}

fn paint_label(painter: &egui::Painter, at: egui::Pos2, text: &str) {
    let galley = painter.layout_no_wrap(
        text.to_owned(),
        egui::FontId::proportional(LABEL_SIZE),
        egui::Color32::BLACK,
    );
    let background = egui::Rect::from_min_size(at, galley.size());
    painter.rect_filled(
        background,
        0.0,
        egui::Color32::from_rgba_unmultiplied(255, 255, 255, 178),
    );
    painter.galley(at, galley, egui::Color32::BLACK);
}
