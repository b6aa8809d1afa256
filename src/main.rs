use std::{
    error::Error,
    io::{self, Write},
    time::Duration,
};

use clap::{Parser, Subcommand};
use countdown_alarm::{
    alarm::{format_countdown, Unit},
    config::Config,
    controller::{AlarmController, DisplaySurface},
    notifier::{Notifier, Settings},
    TimerApp, APP_TITLE,
};
use eframe::{egui::ViewportBuilder, run_native};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// sound file, or name of a sound in the sounds directory
    #[clap(long, short)]
    sound: Option<String>,
    #[clap(subcommand)]
    command: Option<Command>,
}
#[derive(Subcommand)]
enum Command {
    /// write the default config file
    Init {
        #[clap(long, short)]
        force: bool,
    },
    /// count down in the terminal instead of opening a window
    Start {
        value: String,
        #[clap(value_enum, default_value_t = Unit::Seconds)]
        unit: Unit,
    },
}

/// prints reports to stdout for `start`
#[derive(Default)]
struct Terminal {
    done: bool,
}

impl DisplaySurface for Terminal {
    fn report_status(&mut self, status: &str) {
        println!("{status}");
    }

    fn report_countdown(&mut self, remaining_seconds: u64) {
        print!("\rCountdown: {}", format_countdown(remaining_seconds));
        if let Err(err) = io::stdout().flush() {
            log::warn!("couldn't flush stdout: {err}");
        }
    }

    fn report_completion(&mut self) {
        println!("\nTime's up!");
        self.done = true;
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    // initilize the logger
    simple_file_logger::init_logger!("countdown_alarm").expect("couldn't initialize logger");

    let args = Args::parse();
    let config_path = Config::config_path();
    if let Some(Command::Init { force }) = args.command {
        if force || !Config::is_config_present() {
            let path = config_path.ok_or("couldn't find a config directory")?;
            Config::new().save(path.clone())?;
            println!("wrote {}", path.display());
        }
        return Ok(());
    }

    let mut config = Config::load_or_default(config_path.clone());
    if let Some(sound) = args.sound {
        config.sound = sound;
    }
    let notifier = Notifier::new(Settings::from(&config));
    let controller = AlarmController::new(notifier, config.sound.clone());

    if let Some(Command::Start { value, unit }) = args.command {
        return run_in_terminal(controller, &value, unit);
    }

    let native_options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_title(APP_TITLE)
            .with_inner_size([400.0, 260.0]),
        ..Default::default()
    };
    // run the gui
    run_native(
        APP_TITLE,
        native_options,
        Box::new(|_| Ok(Box::new(TimerApp::new(config, config_path, controller)))),
    )
    .map_err(std::convert::Into::into)
}

fn run_in_terminal(
    mut controller: AlarmController<Notifier>,
    value: &str,
    unit: Unit,
) -> Result<(), Box<dyn Error>> {
    let mut terminal = Terminal::default();
    controller.notifier().wait_for_sounds_on_drop();
    controller.set_alarm(value, unit, &mut terminal)?;
    while !terminal.done {
        controller.wait(&mut terminal, Duration::from_secs(1));
    }
    // dropping the controller drops the notifier, which lets the sound play out
    Ok(())
}
