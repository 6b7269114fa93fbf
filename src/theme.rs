use eframe::egui::{self, Color32, CornerRadius, FontId, Frame, Margin, Stroke, TextStyle};

#[derive(Debug, Clone)]
pub struct Theme {
    pub surface_0: Color32,
    pub surface_1: Color32,
    pub surface_2: Color32,
    pub accent: Color32,
    pub danger: Color32,
    pub text_primary: Color32,
    pub text_muted: Color32,
    pub user_bubble: Color32,
    pub assistant_bubble: Color32,
    pub spacing_8: f32,
    pub spacing_12: f32,
    pub radius_10: u8,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            surface_0: Color32::from_rgb(0x10, 0x14, 0x12),
            surface_1: Color32::from_rgb(0x17, 0x1D, 0x1A),
            surface_2: Color32::from_rgb(0x1E, 0x27, 0x22),
            accent: Color32::from_rgb(0x2E, 0xB8, 0x72),
            danger: Color32::from_rgb(0xEF, 0x44, 0x44),
            text_primary: Color32::from_rgb(0xE8, 0xEF, 0xEA),
            text_muted: Color32::from_rgb(0x8E, 0x9A, 0x92),
            user_bubble: Color32::from_rgb(0x24, 0x33, 0x2A),
            assistant_bubble: Color32::from_rgb(0x1C, 0x24, 0x20),
            spacing_8: 8.0,
            spacing_12: 12.0,
            radius_10: 10,
        }
    }
}

impl Theme {
    pub fn apply_visuals(&self, ctx: &egui::Context) {
        let mut visuals = egui::Visuals::dark();
        visuals.panel_fill = self.surface_1;
        visuals.extreme_bg_color = self.surface_0;
        visuals.override_text_color = Some(self.text_primary);
        visuals.widgets.noninteractive.bg_fill = self.surface_2;
        visuals.widgets.noninteractive.bg_stroke = Stroke::NONE;
        visuals.widgets.inactive.bg_fill = self.surface_2;
        visuals.widgets.hovered.bg_fill = self.surface_2;
        visuals.widgets.active.bg_fill = self.accent;
        visuals.selection.bg_fill = self.accent;
        visuals.hyperlink_color = self.accent;
        visuals.window_fill = self.surface_1;

        let mut style = (*ctx.style()).clone();
        style.visuals = visuals;
        style.spacing.item_spacing = egui::vec2(8.0, 8.0);
        style.spacing.button_padding = egui::vec2(12.0, 6.0);
        style.text_styles.insert(TextStyle::Heading, FontId::proportional(18.0));
        style.text_styles.insert(TextStyle::Body, FontId::proportional(14.0));
        style.text_styles.insert(TextStyle::Monospace, FontId::monospace(12.5));
        style.text_styles.insert(TextStyle::Small, FontId::proportional(12.0));
        ctx.set_style(style);
    }

    pub fn bubble_frame(&self, fill: Color32) -> Frame {
        Frame::new()
            .fill(fill)
            .inner_margin(Margin::same(self.spacing_12 as i8))
            .corner_radius(CornerRadius::same(self.radius_10))
            .stroke(Stroke::NONE)
    }
}
