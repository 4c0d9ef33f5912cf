use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::mpsc;
use std::thread;

use engine_logging::{default_log_file, engine_info, LogDestination};
use kbdebugger_core::{update, AppState, Msg};
use log::LevelFilter;

use super::config::{AppConfig, BASE_URL_ENV, CONFIG_FILE};
use super::effects::EffectRunner;
use super::persistence;
use super::ui;

/// Everything the controller loop reacts to.
pub enum AppEvent {
    Msg(Msg),
    Line(String),
    InputClosed,
}

pub fn run_app() -> anyhow::Result<()> {
    let config = AppConfig::load(Path::new(CONFIG_FILE))?
        .with_base_url_override(std::env::var(BASE_URL_ENV).ok());
    engine_logging::initialize(
        LogDestination::from(config.log_destination),
        LevelFilter::Info,
        &default_log_file(),
    );
    engine_info!("Starting kbdebugger against {}", config.base_url);

    let (event_tx, event_rx) = mpsc::channel::<AppEvent>();
    let runner = EffectRunner::new(&config, event_tx.clone())?;
    spawn_input_reader(event_tx);

    let mut controller = Controller::new(AppState::with_options(config.options()), runner);
    if let Some(context) = persistence::load_run_context(&config.session_file) {
        controller.dispatch(Msg::RestoreRunContext(context));
    }
    controller.dispatch(Msg::Started);
    println!("{}", ui::commands::HELP);
    controller.render_if_dirty()?;

    while let Ok(event) = event_rx.recv() {
        match event {
            AppEvent::Msg(msg) => controller.dispatch(msg),
            AppEvent::Line(line) => {
                if !controller.handle_line(&line) {
                    break;
                }
            }
            AppEvent::InputClosed => break,
        }
        controller.render_if_dirty()?;
    }

    engine_info!("kbdebugger exiting");
    Ok(())
}

fn spawn_input_reader(tx: mpsc::Sender<AppEvent>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(AppEvent::Line(line)).is_err() {
                return;
            }
        }
        let _ = tx.send(AppEvent::InputClosed);
    });
}

struct Controller {
    state: AppState,
    runner: EffectRunner,
}

impl Controller {
    fn new(state: AppState, runner: EffectRunner) -> Self {
        Self { state, runner }
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        self.runner.enqueue(effects);
    }

    /// Returns `false` once the user asked to quit.
    fn handle_line(&mut self, line: &str) -> bool {
        let command = match ui::commands::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => return true,
            Err(usage) => {
                println!("{usage}");
                return true;
            }
        };
        match command {
            ui::commands::Command::Quit => return false,
            ui::commands::Command::Help => {
                println!("{}", ui::commands::HELP);
                return true;
            }
            _ => {}
        }

        let view = self.state.view();
        match command.into_msg(&view) {
            Ok(msg) => {
                if view.notice.is_some() {
                    self.dispatch(Msg::NoticeDismissed);
                }
                self.dispatch(msg);
            }
            Err(problem) => println!("{problem}"),
        }
        true
    }

    fn render_if_dirty(&mut self) -> io::Result<()> {
        if !self.state.consume_dirty() {
            return Ok(());
        }
        let view = self.state.view();
        let mut out = io::stdout().lock();
        for line in ui::render::render(&view) {
            writeln!(out, "{line}")?;
        }
        writeln!(out)?;
        out.flush()
    }
}
