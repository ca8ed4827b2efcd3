//! # Tuning Lab - Interactive Tonefield GUI
//!
//! Enter tuning errors, predict where the tonefield should be struck, pick
//! coordinates on the canvas and record optimal hit points as experiment
//! samples.
//!
//! ## Architecture
//! - **Main Thread**: Iced GUI application with dark theme
//! - **OSC Thread**: optional worker forwarding predictions to the visualizer
//! - **Communication**: Crossbeam channels between the two
//! - **Updates**: a 100 ms tick drains status reports from the worker

mod ui;

use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use clap::Parser;
use crossbeam_channel::{Receiver, Sender};
use iced::{Element, Subscription, Task, Theme};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tuning_lab_core::config::{DEFAULT_CONFIG_PATH, LabConfig, OscConfig};
use tuning_lab_core::geometry::{TonefieldGeometry, TonefieldShape};
use tuning_lab_core::model::{ERROR_RANGE_CENTS, active_model};
use tuning_lab_core::osc::SimulationControl;
use tuning_lab_core::samples::{HitPointSample, SampleLog};
use tuning_lab_core::{HitModel, ModelInfo, ModelKind, Prediction, TuningErrors};
use ui::main_display::create_main_view;
use ui::tonefield::{PlottedHit, round3};

/// Force sent to the visualizer per unit of hit strength.
const FORCE_PER_STRENGTH: f64 = 5.0;

#[derive(Parser, Debug)]
#[command(author, version, about = "Interactive tonefield plotting UI")]
struct Args {
    /// Path to config TOML
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Active model: dummy, physics or ml (overrides config)
    #[arg(long)]
    model: Option<ModelKind>,

    /// OSC receiver host (overrides config)
    #[arg(long)]
    osc_host: Option<String>,

    /// OSC receiver port (overrides config)
    #[arg(long)]
    osc_port: Option<u16>,
}

pub fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();
    let mut cfg = LabConfig::load_or_default(&args.config);
    if let Some(kind) = args.model {
        cfg.model.kind = kind;
    }
    if let Some(host) = args.osc_host {
        cfg.osc.host = host;
    }
    if let Some(port) = args.osc_port {
        cfg.osc.port = port;
    }

    info!("Starting Tuning Lab GUI with the {} model", cfg.model.kind);
    let result = iced::application("Tuning Lab", LabApp::update, LabApp::view)
        .subscription(LabApp::subscription)
        .theme(LabApp::theme)
        .run_with(move || (LabApp::new(cfg), Task::none()));
    info!("Application finished with result: {result:?}");
    result
}

#[derive(Debug, Clone)]
pub enum Message {
    // Tuning error inputs
    TonicChanged(String),
    OctaveChanged(String),
    FifthChanged(String),
    Predict,
    Reset,

    // Coordinate selection
    CanvasClicked(f64, f64),
    ManualXChanged(String),
    ManualYChanged(String),
    AddManualPoint,
    ClearCoords,

    // Hit point data entry
    EnterHitPointMode,
    StrengthChanged(String),
    IntentChanged(String),
    SaveHitPoint,

    ToggleVisualizerLink,

    // Timer tick polling the OSC worker
    Tick,
}

/// Everything the view functions need to render the interface.
#[derive(Debug, Clone)]
pub struct AppDisplayData {
    pub tonic_input: String,
    pub octave_input: String,
    pub fifth_input: String,
    pub prediction: Option<Prediction>,
    pub plotted_hit: Option<PlottedHit>,
    pub model_info: ModelInfo,

    pub selected: Vec<(f64, f64)>,
    pub manual_x: String,
    pub manual_y: String,

    pub hit_entry_mode: bool,
    pub hit_marker: Option<(f64, f64)>,
    pub strength_input: String,
    pub intent_input: String,
    pub saved_samples: usize,

    pub visualizer_linked: bool,
    pub shape: TonefieldShape,
    /// Last status or error line shown under the title.
    pub status: Option<String>,
}

impl AppDisplayData {
    fn new(model_info: ModelInfo, saved_samples: usize) -> Self {
        Self {
            tonic_input: "0.0".to_string(),
            octave_input: "0.0".to_string(),
            fifth_input: "0.0".to_string(),
            prediction: None,
            plotted_hit: None,
            model_info,
            selected: Vec::new(),
            manual_x: "0.0".to_string(),
            manual_y: "0.0".to_string(),
            hit_entry_mode: false,
            hit_marker: None,
            strength_input: "0.5".to_string(),
            intent_input: String::new(),
            saved_samples,
            visualizer_linked: false,
            shape: TonefieldShape::STANDARD,
            status: None,
        }
    }
}

/// Commands for the OSC worker thread.
#[derive(Debug, Clone, Copy, PartialEq)]
enum SimCommand {
    Update { error_level: f32, force_intensity: f32 },
    Reset,
}

/// OSC worker thread management structure.
struct OscForwarder {
    command_tx: Sender<SimCommand>,
    status_rx: Receiver<String>,
    shutdown_tx: Sender<()>,
    thread_handle: Option<JoinHandle<()>>,
}

impl OscForwarder {
    /// Connects to the visualizer and spawns the forwarding thread.
    fn start(osc: &OscConfig) -> tuning_lab_core::Result<Self> {
        let control = SimulationControl::connect(&osc.host, osc.port)?;
        info!("Forwarding predictions to {}", control.client().target());

        let (command_tx, command_rx) = crossbeam_channel::unbounded::<SimCommand>();
        let (status_tx, status_rx) = crossbeam_channel::unbounded::<String>();
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(1);

        let thread_handle = thread::spawn(move || {
            loop {
                crossbeam_channel::select! {
                    recv(command_rx) -> msg => match msg {
                        Ok(command) => {
                            let report = match command {
                                SimCommand::Update { error_level, force_intensity } => {
                                    control.set_tuning_simulation(error_level, force_intensity)
                                }
                                SimCommand::Reset => control.reset_simulation(),
                            };
                            let line = report.unwrap_or_else(|err| {
                                warn!("OSC send failed: {err}");
                                format!("Visualizer update failed: {err}")
                            });
                            if status_tx.send(line).is_err() {
                                break;
                            }
                        }
                        Err(_) => break,
                    },
                    recv(shutdown_rx) -> _ => break,
                }
            }
            info!("OSC forwarder finished");
        });

        Ok(Self {
            command_tx,
            status_rx,
            shutdown_tx,
            thread_handle: Some(thread_handle),
        })
    }

    fn send(&self, command: SimCommand) {
        if self.command_tx.send(command).is_err() {
            warn!("OSC forwarder is no longer running");
        }
    }
}

impl Drop for OscForwarder {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                error!("OSC forwarder thread panicked");
            }
        }
    }
}

struct LabApp {
    model: Box<dyn HitModel>,
    geometry: TonefieldGeometry,
    osc: OscConfig,
    samples_path: PathBuf,
    forwarder: Option<OscForwarder>,
    display_data: AppDisplayData,
}

impl LabApp {
    fn new(cfg: LabConfig) -> Self {
        let model = active_model(cfg.model.kind);
        let samples_path = PathBuf::from(&cfg.samples.path);
        let saved_samples = match SampleLog::load(&samples_path) {
            Ok(log) => log.len(),
            Err(err) => {
                warn!("Could not read sample log {}: {err}", samples_path.display());
                0
            }
        };
        let display_data = AppDisplayData::new(model.info(), saved_samples);
        Self {
            model,
            geometry: *cfg.geometry.default_geometry(),
            osc: cfg.osc,
            samples_path,
            forwarder: None,
            display_data,
        }
    }

    fn update(&mut self, message: Message) {
        let data = &mut self.display_data;
        match message {
            Message::TonicChanged(value) => data.tonic_input = value,
            Message::OctaveChanged(value) => data.octave_input = value,
            Message::FifthChanged(value) => data.fifth_input = value,
            Message::Predict => self.predict(),
            Message::Reset => {
                data.tonic_input = "0.0".to_string();
                data.octave_input = "0.0".to_string();
                data.fifth_input = "0.0".to_string();
                data.prediction = None;
                data.plotted_hit = None;
                data.status = None;
                if let Some(forwarder) = &self.forwarder {
                    forwarder.send(SimCommand::Reset);
                }
            }
            Message::CanvasClicked(x, y) => {
                let point = (round3(x), round3(y));
                if data.hit_entry_mode {
                    data.hit_marker = Some(point);
                    data.status = Some(format!("Hit point set to ({:.3}, {:.3})", point.0, point.1));
                } else {
                    add_selected(&mut data.selected, point);
                }
            }
            Message::ManualXChanged(value) => data.manual_x = value,
            Message::ManualYChanged(value) => data.manual_y = value,
            Message::AddManualPoint => {
                match (
                    parse_bounded("x", &data.manual_x, 1.0),
                    parse_bounded("y", &data.manual_y, 1.0),
                ) {
                    (Ok(x), Ok(y)) => {
                        add_selected(&mut data.selected, (round3(x), round3(y)));
                        data.status = None;
                    }
                    (Err(err), _) | (_, Err(err)) => data.status = Some(err),
                }
            }
            Message::ClearCoords => data.selected.clear(),
            Message::EnterHitPointMode => {
                data.hit_entry_mode = !data.hit_entry_mode;
                if !data.hit_entry_mode {
                    data.hit_marker = None;
                }
            }
            Message::StrengthChanged(value) => data.strength_input = value,
            Message::IntentChanged(value) => data.intent_input = value,
            Message::SaveHitPoint => self.save_hit_point(),
            Message::ToggleVisualizerLink => self.toggle_visualizer(),
            Message::Tick => {
                if let Some(forwarder) = &self.forwarder {
                    while let Ok(line) = forwarder.status_rx.try_recv() {
                        self.display_data.status = Some(line);
                    }
                }
            }
        }
    }

    /// Parses the inputs, runs the active model and forwards the result to
    /// the visualizer when linked.
    fn predict(&mut self) {
        let errors = match self.current_errors() {
            Ok(errors) => errors,
            Err(err) => {
                self.display_data.status = Some(err);
                return;
            }
        };

        match tuning_lab_core::predict(self.model.as_ref(), errors) {
            Ok(prediction) => {
                let hit = prediction.hit;
                let (x, y) = self.geometry.to_normalized(&hit);
                info!("Predicted L={:.3} S={:.3} strength={:.3}", hit.l, hit.s, hit.strength);
                self.display_data.plotted_hit = Some(PlottedHit {
                    x,
                    y,
                    strength: hit.strength,
                });
                self.display_data.prediction = Some(prediction);
                self.display_data.status = None;
                if let Some(forwarder) = &self.forwarder {
                    forwarder.send(SimCommand::Update {
                        error_level: hit.strength as f32,
                        force_intensity: (hit.strength * FORCE_PER_STRENGTH) as f32,
                    });
                }
            }
            Err(err) => {
                error!("Prediction failed: {err}");
                self.display_data.prediction = None;
                self.display_data.plotted_hit = None;
                self.display_data.status = Some(format!("Prediction failed: {err}"));
            }
        }
    }

    fn current_errors(&self) -> Result<TuningErrors, String> {
        let data = &self.display_data;
        let tonic = parse_bounded("Tonic", &data.tonic_input, ERROR_RANGE_CENTS)?;
        let octave = parse_bounded("Octave", &data.octave_input, ERROR_RANGE_CENTS)?;
        let fifth = parse_bounded("Fifth", &data.fifth_input, ERROR_RANGE_CENTS)?;
        Ok(TuningErrors::new(round1(tonic), round1(octave), round1(fifth)))
    }

    fn save_hit_point(&mut self) {
        let Some(coordinate) = self.display_data.hit_marker else {
            self.display_data.status = Some("Click the tonefield to set the hit point first".to_string());
            return;
        };
        let errors = match self.current_errors() {
            Ok(errors) => errors,
            Err(err) => {
                self.display_data.status = Some(err);
                return;
            }
        };
        let strength = match parse_strength(&self.display_data.strength_input) {
            Ok(strength) => strength,
            Err(err) => {
                self.display_data.status = Some(err);
                return;
            }
        };

        let sample = HitPointSample::new(
            &errors,
            coordinate,
            strength,
            self.display_data.intent_input.trim(),
            &self.display_data.shape,
        );
        match SampleLog::append_to(&self.samples_path, sample) {
            Ok(count) => {
                info!("Saved hit point sample #{count} to {}", self.samples_path.display());
                self.display_data.saved_samples = count;
                self.display_data.status = Some(format!("Saved sample #{count}"));
                self.display_data.hit_marker = None;
                self.display_data.intent_input.clear();
            }
            Err(err) => {
                error!("Failed to save sample: {err}");
                self.display_data.status = Some(format!("Failed to save sample: {err}"));
            }
        }
    }

    fn toggle_visualizer(&mut self) {
        if self.forwarder.take().is_some() {
            info!("Visualizer link disabled");
            self.display_data.visualizer_linked = false;
            return;
        }
        match OscForwarder::start(&self.osc) {
            Ok(forwarder) => {
                self.forwarder = Some(forwarder);
                self.display_data.visualizer_linked = true;
            }
            Err(err) => {
                error!("Could not link visualizer: {err}");
                self.display_data.status = Some(format!("Could not link visualizer: {err}"));
            }
        }
    }

    fn view(&self) -> Element<'_, Message> {
        create_main_view(&self.display_data)
    }

    fn subscription(&self) -> Subscription<Message> {
        if self.forwarder.is_some() {
            iced::time::every(Duration::from_millis(100)).map(|_| Message::Tick)
        } else {
            Subscription::none()
        }
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// Appends `point` unless it is already selected.
fn add_selected(selected: &mut Vec<(f64, f64)>, point: (f64, f64)) {
    if !selected.contains(&point) {
        selected.push(point);
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn parse_bounded(name: &str, input: &str, limit: f64) -> Result<f64, String> {
    let value: f64 = input
        .trim()
        .parse()
        .map_err(|_| format!("{name} must be a number (got '{input}')"))?;
    if !value.is_finite() || value.abs() > limit {
        return Err(format!("{name} must be between {} and {limit}", -limit));
    }
    Ok(value)
}

fn parse_strength(input: &str) -> Result<f64, String> {
    let value: f64 = input
        .trim()
        .parse()
        .map_err(|_| format!("Strength must be a number (got '{input}')"))?;
    if !value.is_finite() {
        return Err("Strength must be a finite number".to_string());
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> LabApp {
        let mut cfg = LabConfig::default();
        cfg.samples.path = std::env::temp_dir()
            .join(format!("tuning_lab_gui_{}.json", std::process::id()))
            .display()
            .to_string();
        LabApp::new(cfg)
    }

    #[test]
    fn inputs_are_bounded_and_rounded() {
        assert_eq!(parse_bounded("Tonic", " 12.5 ", 50.0), Ok(12.5));
        assert!(parse_bounded("Tonic", "50.1", 50.0).is_err());
        assert!(parse_bounded("Tonic", "abc", 50.0).is_err());
        assert_eq!(round1(3.14159), 3.1);
    }

    #[test]
    fn canvas_clicks_select_unique_points() {
        let mut app = app();
        app.update(Message::CanvasClicked(0.12345, -0.5));
        app.update(Message::CanvasClicked(0.1234, -0.5001));
        app.update(Message::CanvasClicked(0.3, 0.3));
        assert_eq!(app.display_data.selected, vec![(0.123, -0.5), (0.3, 0.3)]);

        app.update(Message::ClearCoords);
        assert!(app.display_data.selected.is_empty());
    }

    #[test]
    fn hit_point_mode_sets_marker_instead_of_selecting() {
        let mut app = app();
        app.update(Message::EnterHitPointMode);
        app.update(Message::CanvasClicked(0.2, 0.4));
        assert_eq!(app.display_data.hit_marker, Some((0.2, 0.4)));
        assert!(app.display_data.selected.is_empty());
    }

    #[test]
    fn manual_points_must_lie_in_the_square() {
        let mut app = app();
        app.update(Message::ManualXChanged("1.5".to_string()));
        app.update(Message::AddManualPoint);
        assert!(app.display_data.selected.is_empty());
        assert!(app.display_data.status.is_some());

        app.update(Message::ManualXChanged("-0.25".to_string()));
        app.update(Message::ManualYChanged("0.75".to_string()));
        app.update(Message::AddManualPoint);
        assert_eq!(app.display_data.selected, vec![(-0.25, 0.75)]);
    }

    #[test]
    fn predict_plots_normalized_hit() {
        let mut app = app();
        app.update(Message::TonicChanged("20".to_string()));
        app.update(Message::OctaveChanged("10".to_string()));
        app.update(Message::FifthChanged("-30".to_string()));
        app.update(Message::Predict);

        let prediction = app.display_data.prediction.as_ref().unwrap();
        assert!((prediction.hit.l - 2.5).abs() < 1e-9);
        let plotted = app.display_data.plotted_hit.unwrap();
        assert!((plotted.x - (-3.3 / 50.0)).abs() < 1e-9);
        assert!((plotted.y - 0.05).abs() < 1e-9);
        assert!((plotted.strength - 0.6).abs() < 1e-9);

        app.update(Message::Reset);
        assert!(app.display_data.prediction.is_none());
        assert_eq!(app.display_data.tonic_input, "0.0");
    }

    #[test]
    fn invalid_input_reports_instead_of_predicting() {
        let mut app = app();
        app.update(Message::FifthChanged("75".to_string()));
        app.update(Message::Predict);
        assert!(app.display_data.prediction.is_none());
        assert!(app.display_data.status.as_deref().unwrap().contains("Fifth"));
    }

    #[test]
    fn strength_accepts_any_finite_value() {
        assert_eq!(parse_strength("0.8"), Ok(0.8));
        assert_eq!(parse_strength(" -3.5 "), Ok(-3.5));
        assert_eq!(parse_strength("12"), Ok(12.0));
        assert!(parse_strength("NaN").is_err());
        assert!(parse_strength("inf").is_err());
        assert!(parse_strength("strong").is_err());
    }
}
