#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]
#![deny(clippy::use_self, rust_2018_idioms)]
#![allow(clippy::multiple_crate_versions, clippy::module_name_repetitions)]

use std::{path::PathBuf, time::Duration};

use alarm_edit::{AlarmInput, EditingState};
use config::{Config, Theme};
use controller::{AlarmController, DisplaySurface};
use eframe::egui::{
    self, Align2, Button, CentralPanel, Color32, Layout, TopBottomPanel, Window,
};
use notifier::Notifier;
use widgets::Dial;

pub mod alarm;
pub mod communication;
pub mod config;
pub mod controller;
pub mod notifier;
pub mod schedule;

/// implementation of alarm editing for egui
pub mod alarm_edit;
pub mod widgets;

pub const APP_TITLE: &str = "Countdown Alarm";

/// what the window currently shows, fed by the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Display {
    pub status: String,
    pub countdown: Option<u64>,
    /// the "Time's up!" window is open
    pub alert: bool,
}

impl Default for Display {
    fn default() -> Self {
        Self {
            status: "Enter time for the alarm:".to_string(),
            countdown: None,
            alert: false,
        }
    }
}

impl Display {
    #[must_use]
    pub fn countdown_text(&self) -> String {
        format!(
            "Countdown: {}",
            self.countdown
                .map_or_else(|| "--:--".to_string(), alarm::format_countdown)
        )
    }
}

impl DisplaySurface for Display {
    fn report_status(&mut self, status: &str) {
        status.clone_into(&mut self.status);
    }

    fn report_countdown(&mut self, remaining_seconds: u64) {
        self.countdown = Some(remaining_seconds);
    }

    fn report_completion(&mut self) {
        self.status = "Alarm complete. Set a new one:".to_string();
        self.countdown = None;
        self.alert = true;
    }
}

pub struct TimerApp {
    config: Config,
    config_path: Option<PathBuf>,
    controller: AlarmController<Notifier>,
    display: Display,
    input: AlarmInput,
}

impl TimerApp {
    #[must_use]
    pub fn new(
        config: Config,
        config_path: Option<PathBuf>,
        controller: AlarmController<Notifier>,
    ) -> Self {
        Self {
            input: AlarmInput::new(config.unit),
            config,
            config_path,
            controller,
            display: Display::default(),
        }
    }

    fn render_header(&mut self, ctx: &egui::Context) {
        TopBottomPanel::top("time_and_ctrl").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let theme_btn = ui.add(Button::new({
                    if self.config.theme == Theme::Dark {
                        "🌞"
                    } else {
                        "🌙"
                    }
                }));
                if theme_btn.clicked() {
                    self.config.theme = !self.config.theme;
                    self.save();
                }
                ui.label(format!(
                    "Time: {}",
                    chrono::Local::now().format(&self.config.time_format)
                ));
                ui.with_layout(Layout::right_to_left(eframe::emath::Align::Center), |ui| {
                    if let Some(rings_at) = self.controller.rings_at() {
                        ui.label(format!(
                            "rings at {}",
                            rings_at.format(&self.config.time_format)
                        ));
                    }
                });
            });
        });
    }

    fn render_alert(&mut self, ctx: &egui::Context) {
        Window::new("ALARM ALERT!")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label("Time's up!");
                if ui.button("OK").clicked() {
                    self.display.alert = false;
                }
            });
    }

    fn save(&self) {
        let Some(path) = self.config_path.clone() else {
            return;
        };
        if let Err(err) = self.config.save(path) {
            log::error!("{err}");
        }
    }
}

impl eframe::App for TimerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.controller.pump(&mut self.display);
        ctx.set_visuals(self.config.theme.into());
        self.render_header(ctx);
        if self.display.alert {
            self.render_alert(ctx);
        }
        CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading(&self.display.status);
                if self.input.render(ui) == EditingState::Submitted {
                    // rejected input is already on the status line
                    if let Err(err) = self.controller.set_alarm(
                        &self.input.value,
                        self.input.unit,
                        &mut self.display,
                    ) {
                        log::debug!("alarm not set: {err}");
                    }
                }
                ui.label(self.display.countdown_text());
                if let Some(remaining) = self.display.countdown {
                    ui.add(
                        Dial::new(remaining, self.controller.total_seconds())
                            .radius(32.)
                            .hand_color(Color32::from_rgb(25, 118, 210)),
                    );
                }
            });
        });
        // reports arrive from other threads, keep polling for them
        ctx.request_repaint_after(Duration::from_millis(200));
    }
}
