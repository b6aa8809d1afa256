use eframe::egui::{self, ComboBox, Key, TextEdit};

use crate::alarm::Unit;

/// what the user is typing in before pressing "Set Alarm"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmInput {
    pub(crate) value: String,
    pub(crate) unit: Unit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditingState {
    Editing,
    Submitted,
}

impl AlarmInput {
    #[must_use]
    pub const fn new(unit: Unit) -> Self {
        Self {
            value: String::new(),
            unit,
        }
    }

    pub(crate) fn render(&mut self, ui: &mut egui::Ui) -> EditingState {
        let mut state = EditingState::Editing;
        ui.horizontal(|ui| {
            let field = ui.add(TextEdit::singleline(&mut self.value).desired_width(80.0));
            // enter in the text field is the same as clicking the button
            if field.lost_focus() && ui.input(|input| input.key_pressed(Key::Enter)) {
                state = EditingState::Submitted;
            }
            self.render_unit_selector(ui);
        });
        if ui.button("Set Alarm").clicked() {
            state = EditingState::Submitted;
        }
        state
    }

    fn render_unit_selector(&mut self, ui: &mut egui::Ui) {
        ComboBox::from_id_salt("unit")
            .selected_text(self.unit.label())
            .show_ui(ui, |ui| {
                for unit in Unit::ALL {
                    ui.selectable_value(&mut self.unit, unit, unit.label());
                }
            });
    }
}
