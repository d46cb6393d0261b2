//! Paints projected scene frames onto an egui canvas.

use page_core::scene::{ProjectedFrame, FOG_COLOR};

pub fn rgb_alpha(rgb: u32, alpha: f32) -> egui::Color32 {
    let [_, r, g, b] = rgb.to_be_bytes();
    let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
    egui::Color32::from_rgba_unmultiplied(r, g, b, a)
}

pub fn paint_frame(painter: &egui::Painter, rect: egui::Rect, frame: &ProjectedFrame) {
    painter.rect_filled(rect, 0.0, rgb_alpha(FOG_COLOR, 1.0));

    let at = |p: [f32; 2]| egui::pos2(rect.min.x + p[0], rect.min.y + p[1]);
    for segment in &frame.segments {
        painter.line_segment(
            [at(segment.from), at(segment.to)],
            egui::Stroke::new(1.0, rgb_alpha(segment.color, segment.alpha)),
        );
    }
    for point in &frame.points {
        painter.circle_filled(at(point.at), point.radius, rgb_alpha(point.color, point.alpha));
    }
}
