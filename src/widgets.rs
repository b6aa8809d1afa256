use eframe::egui::{Color32, Sense, Vec2, Widget};

/// round dial whose hand sweeps back to the top as the alarm runs out
pub struct Dial {
    remaining: u64,
    total: u64,
    hand_color: Option<Color32>,
    radius: Option<f32>,
}

impl Dial {
    #[must_use]
    pub const fn new(remaining: u64, total: u64) -> Self {
        Self {
            remaining,
            total,
            hand_color: None,
            radius: None,
        }
    }

    #[must_use]
    pub fn radius(mut self, radius: f32) -> Self {
        self.radius = Some(radius);
        self
    }

    #[must_use]
    pub fn hand_color(mut self, color: Color32) -> Self {
        self.hand_color = Some(color);
        self
    }

    /// share of the alarm still to go, in `0.0..=1.0`
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            return 0.;
        }
        (self.remaining.min(self.total) as f32) / (self.total as f32)
    }
}

impl Widget for Dial {
    fn ui(self, ui: &mut eframe::egui::Ui) -> eframe::egui::Response {
        let fraction = self.fraction();
        let desired_radius = self
            .radius
            .unwrap_or_else(|| ui.spacing().slider_width / 4.);
        let (rect, response) =
            ui.allocate_exact_size(Vec2::splat(desired_radius * 2.), Sense::hover());
        let visuals = ui.style().noninteractive();
        ui.painter().circle_filled(
            rect.center(),
            desired_radius,
            visuals.bg_fill,
        );
        let border_stroke = visuals.fg_stroke;
        ui.painter()
            .circle_stroke(rect.center(), desired_radius, border_stroke);
        // full dial points straight up, we subtract 90 so 0 degrees is the top
        let angle = fraction.mul_add(360., -90.);
        let pointer = rect.center() + Vec2::angled(angle.to_radians()) * desired_radius;
        let mut hand_stroke = visuals.fg_stroke;
        if let Some(color) = self.hand_color {
            hand_stroke.color = color;
        }
        let pointer1 = rect.center()
            + Vec2::angled(angle.to_radians()) * border_stroke.width.mul_add(-2., desired_radius);
        ui.painter()
            .line_segment([rect.center(), pointer], hand_stroke);
        ui.painter()
            .circle_filled(pointer1, hand_stroke.width * 2., hand_stroke.color);
        response
    }
}
