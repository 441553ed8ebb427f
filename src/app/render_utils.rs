use eframe::egui::{Align2, Color32, FontId, Painter, Rect, Stroke, StrokeKind, vec2};

use crate::filter::ElementState;

const SERIES_COLORS: [Color32; 6] = [
    Color32::from_rgb(64, 156, 214),
    Color32::from_rgb(92, 184, 132),
    Color32::from_rgb(236, 170, 76),
    Color32::from_rgb(214, 96, 88),
    Color32::from_rgb(150, 118, 204),
    Color32::from_rgb(96, 190, 196),
];

const TRACK_COLOR: Color32 = Color32::from_rgb(38, 44, 52);
pub(super) const SEARCH_MATCH_COLOR: Color32 = Color32::from_rgb(245, 206, 93);

pub(super) fn series_color(index: usize) -> Color32 {
    SERIES_COLORS[index % SERIES_COLORS.len()]
}

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

pub(super) fn element_color(base: Color32, state: ElementState) -> Color32 {
    if state.active {
        blend_color(base, Color32::WHITE, 0.22)
    } else {
        dim_color(base, state.opacity())
    }
}

/// Horizontal share bar: track, filled part and the percentage label.
pub(super) fn draw_share_bar(
    painter: &Painter,
    rect: Rect,
    percentage: f64,
    color: Color32,
    text: &str,
    outlined: bool,
) {
    painter.rect_filled(rect, 3.0, TRACK_COLOR);

    let fraction = (percentage / 100.0).clamp(0.0, 1.0) as f32;
    if fraction > 0.0 {
        let filled = Rect::from_min_size(rect.min, vec2(rect.width() * fraction, rect.height()));
        painter.rect_filled(filled, 3.0, color);
    }

    if outlined {
        painter.rect_stroke(
            rect,
            3.0,
            Stroke::new(1.5, SEARCH_MATCH_COLOR),
            StrokeKind::Outside,
        );
    }

    painter.text(
        rect.right_center() - vec2(6.0, 0.0),
        Align2::RIGHT_CENTER,
        text,
        FontId::proportional(12.0),
        Color32::from_gray(238),
    );
}
