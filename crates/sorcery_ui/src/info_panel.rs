//! Text half of the information panel under the game viewport.
//!
//! The panel background is an ordinary quad in the sprite batch; this module
//! only lays out and paints the three status lines through egui. Layout is
//! computed in physical pixels (base pixels times the window scale) and then
//! converted to egui points.

use egui::{Color32, FontId, LayerId, Pos2, Rect};

/// Placeholder game status shown in the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelStatus {
    pub location: String,
    pub carrying: String,
    pub energy: u8,
}

impl PanelStatus {
    pub fn lines(&self) -> [String; 3] {
        [
            format!("you are {},", self.location),
            format!("carrying {}.", self.carrying),
            format!("energy....{}%", self.energy),
        ]
    }
}

/// Typography in base pixels; scaled with the rest of the screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelStyle {
    pub font_size: f32,
    pub margin_x: f32,
    pub margin_y: f32,
    pub line_spacing: f32,
    pub text_color: [u8; 3],
}

/// Where the panel sits on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelLayout {
    /// Base-pixel y of the panel's top edge.
    pub top: f32,
    pub width: f32,
    pub height: f32,
    /// Integer window scale factor.
    pub scale: f32,
}

impl PanelLayout {
    /// Panel bounds in physical pixels as `[left, top, right, bottom]`.
    pub fn physical_bounds(&self) -> [f32; 4] {
        [
            0.0,
            self.top * self.scale,
            self.width * self.scale,
            (self.top + self.height) * self.scale,
        ]
    }

    /// Top-left corner of each line in physical pixels, given each line's
    /// rendered height in physical pixels.
    pub fn line_origins(&self, style: &PanelStyle, line_heights: &[f32]) -> Vec<(f32, f32)> {
        let x = style.margin_x * self.scale;
        let mut y = (self.top + style.margin_y) * self.scale;
        let mut origins = Vec::with_capacity(line_heights.len());
        for height in line_heights {
            origins.push((x, y));
            y += height + style.line_spacing * self.scale;
        }
        origins
    }

    pub fn font_px(&self, style: &PanelStyle) -> f32 {
        style.font_size * self.scale
    }
}

/// Paint the status lines onto the background layer of `ctx`.
pub fn paint(ctx: &egui::Context, layout: &PanelLayout, style: &PanelStyle, status: &PanelStatus) {
    let ppp = ctx.pixels_per_point();
    let [left, top, right, bottom] = layout.physical_bounds();
    let clip = Rect::from_min_max(
        Pos2::new(left / ppp, top / ppp),
        Pos2::new(right / ppp, bottom / ppp),
    );
    let painter = ctx.layer_painter(LayerId::background()).with_clip_rect(clip);

    let [r, g, b] = style.text_color;
    let color = Color32::from_rgb(r, g, b);
    let font = FontId::proportional(layout.font_px(style) / ppp);

    // Lines stack by their rendered height, so lay out the galleys first.
    let galleys: Vec<_> = status
        .lines()
        .into_iter()
        .map(|line| painter.layout_no_wrap(line, font.clone(), color))
        .collect();
    let heights: Vec<f32> = galleys.iter().map(|g| g.size().y * ppp).collect();
    for ((x, y), galley) in layout.line_origins(style, &heights).into_iter().zip(galleys) {
        painter.galley(Pos2::new(x / ppp, y / ppp), galley, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style() -> PanelStyle {
        PanelStyle {
            font_size: 10.0,
            margin_x: 5.0,
            margin_y: 5.0,
            line_spacing: 2.0,
            text_color: [255, 255, 0],
        }
    }

    fn layout() -> PanelLayout {
        PanelLayout {
            top: 144.0,
            width: 320.0,
            height: 56.0,
            scale: 3.0,
        }
    }

    #[test]
    fn status_lines_match_amstrad_wording() {
        let status = PanelStatus {
            location: "in the woods".to_string(),
            carrying: "nothing".to_string(),
            energy: 99,
        };
        assert_eq!(
            status.lines(),
            [
                "you are in the woods,".to_string(),
                "carrying nothing.".to_string(),
                "energy....99%".to_string(),
            ]
        );
    }

    #[test]
    fn physical_bounds_start_below_viewport() {
        assert_eq!(layout().physical_bounds(), [0.0, 432.0, 960.0, 600.0]);
    }

    #[test]
    fn lines_stack_with_scaled_margin_and_spacing() {
        let origins = layout().line_origins(&style(), &[30.0, 30.0, 30.0]);
        assert_eq!(origins, vec![(15.0, 447.0), (15.0, 483.0), (15.0, 519.0)]);
    }

    #[test]
    fn font_size_scales_with_window() {
        assert_eq!(layout().font_px(&style()), 30.0);
    }

    #[test]
    fn painted_lines_start_at_the_panel_margin() {
        let ctx = egui::Context::default();
        let output = ctx.run(egui::RawInput::default(), |ctx| {
            paint(
                ctx,
                &layout(),
                &style(),
                &PanelStatus {
                    location: "in the woods".to_string(),
                    carrying: "nothing".to_string(),
                    energy: 99,
                },
            );
        });

        let origins: Vec<Pos2> = output
            .shapes
            .iter()
            .filter_map(|clipped| match &clipped.shape {
                egui::Shape::Text(text) => Some(text.pos),
                _ => None,
            })
            .collect();
        assert_eq!(origins.len(), 3);
        // One point per physical pixel in a headless context.
        assert_eq!(origins[0], Pos2::new(15.0, 447.0));
        assert!(origins.iter().all(|pos| pos.x == 15.0));
        assert!(origins[1].y > origins[0].y + 6.0);
        assert!(origins[2].y > origins[1].y + 6.0);
    }
}
