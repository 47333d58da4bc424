use crate::input::{collect_input_nonblocking, map_event, UiCommand};
use crate::render::{draw_box, draw_pet_ascii, ui_overlay, Terminal, View};
use digipet::alerts::{milestone_message, AlertKey, AlertMonitor, AlertSignal, AlertSink};
use digipet::clock::SystemClock;
use digipet::config::{save_settings_atomic, Paths, Settings};
use digipet::driver::Ticker;
use digipet::model::{PetState, Stat};
use digipet::service::PetService;
use digipet::sim::{Action, CatchUpKind, CatchUpSummary, Milestone};
use digipet::storage::JsonFileStore;
use log::info;
use std::time::{Duration, Instant};

/// More than this many overdue live steps (e.g. after the machine slept)
/// are replaced by one wall-clock catch-up.
const MAX_TICK_BURST: u32 = 5;

#[derive(Clone, Debug)]
pub(crate) enum Scene {
    Main,
    Help,
    ConfirmReset,
    Recap(CatchUpSummary),
    Dead,
}

/// Alerts shown in-app: newest raise wins the banner line.
#[derive(Default)]
struct BannerSink {
    banner: Option<(AlertKey, String)>,
    milestone: Option<String>,
}

impl AlertSink for BannerSink {
    fn signal(&mut self, signal: &AlertSignal) {
        match signal {
            AlertSignal::Raise(key) => {
                info!("alert: {}", key.title());
                self.banner = Some((*key, format!("{}: {}", key.title(), key.body())));
            }
            AlertSignal::Cancel(key) => {
                if self.banner.as_ref().is_some_and(|(k, _)| k == key) {
                    self.banner = None;
                }
            }
        }
    }

    fn milestone(&mut self, milestone: &Milestone) {
        self.milestone = Some(milestone_message(milestone));
    }
}

type Service = PetService<JsonFileStore, SystemClock>;

pub(crate) struct App {
    settings: Settings,
    paths: Paths,
    service: Service,
    pet: PetState,
    scene: Scene,
    ticker: Ticker,
    monitor: AlertMonitor,
    sink: BannerSink,
    message: String,
    settings_dirty: bool,
    should_quit: bool,
}

impl App {
    fn init(service: Service, settings: Settings, paths: Paths) -> Self {
        let (pet, summary) = service.resume();
        let ticker = Ticker::new(Duration::from_millis(service.rules().tick_step_ms));
        let monitor = AlertMonitor::new(settings.alert_cooldown_ms());
        let message = welcome_message(&pet, &summary).to_string();

        let mut app = Self {
            settings,
            paths,
            service,
            pet,
            scene: Scene::Main,
            ticker,
            monitor,
            sink: BannerSink::default(),
            message,
            settings_dirty: false,
            should_quit: false,
        };

        app.absorb_milestones(&summary.report.milestones);
        app.scene = opening_scene(&app.pet, summary);
        if app.pet.is_alive() {
            app.ticker.start();
        }
        app.evaluate_alerts();
        app
    }

    fn absorb_milestones(&mut self, milestones: &[Milestone]) {
        for m in milestones {
            self.sink.milestone(m);
        }
        if let Some(msg) = self.sink.milestone.take() {
            self.message = msg;
        }
    }

    fn evaluate_alerts(&mut self) {
        let now = self.service.now_millis();
        for signal in self
            .monitor
            .evaluate(&self.pet.snapshot(), self.pet.is_alive(), now)
        {
            self.sink.signal(&signal);
        }
    }

    fn on_pet_changed(&mut self) {
        self.evaluate_alerts();
        if !self.pet.is_alive() && !matches!(self.scene, Scene::Dead) {
            info!("pet died at {:.2} days", self.pet.age());
            self.ticker.stop();
            self.scene = Scene::Dead;
        }
    }

    fn live_steps(&mut self, due: u32) {
        if due > MAX_TICK_BURST {
            let (pet, summary) = self.service.resume();
            self.pet = pet;
            self.absorb_milestones(&summary.report.milestones);
            self.on_pet_changed();
            return;
        }
        for _ in 0..due {
            let update = self.service.tick(self.ticker.step());
            self.pet = update.pet;
            self.absorb_milestones(&update.report.milestones);
            self.on_pet_changed();
            if !self.ticker.is_running() {
                break;
            }
        }
    }

    fn handle(&mut self, cmd: UiCommand) {
        match cmd {
            UiCommand::Pet(action) => {
                let (pet, outcome) = self.service.act(action);
                self.pet = pet;
                self.message = outcome.message().to_string();
                if action == Action::Reset && outcome.is_applied() {
                    self.monitor = AlertMonitor::new(self.settings.alert_cooldown_ms());
                    self.sink = BannerSink::default();
                    self.scene = Scene::Main;
                    self.ticker.start();
                }
                self.on_pet_changed();
            }
            UiCommand::AskReset => self.scene = Scene::ConfirmReset,
            UiCommand::HelpToggle => self.scene = Scene::Help,
            UiCommand::ToggleColor => {
                self.settings.enable_color = !self.settings.enable_color;
                self.settings_dirty = true;
            }
            UiCommand::Back | UiCommand::Dismiss => {
                self.scene = if self.pet.is_alive() {
                    Scene::Main
                } else {
                    Scene::Dead
                };
            }
            UiCommand::Quit => self.should_quit = true,
        }
    }

    fn run(&mut self, term: &mut Terminal) -> anyhow::Result<()> {
        let fps = self.settings.fps_cap.clamp(10, 120);
        let frame_dt = Duration::from_secs_f32(1.0 / fps as f32);
        let mut last_frame = Instant::now();

        while !self.should_quit {
            term.resize_if_needed()?;

            for ev in collect_input_nonblocking(frame_dt)? {
                if let Some(cmd) = map_event(&self.scene, &ev) {
                    self.handle(cmd);
                    if self.should_quit {
                        break;
                    }
                }
            }

            let now = Instant::now();
            let real_dt = now.saturating_duration_since(last_frame);
            last_frame = now;
            let due = self.ticker.due(real_dt);
            self.live_steps(due);

            self.render_frame(term)?;
            spin_sleep(frame_dt, Instant::now());
        }
        Ok(())
    }

    fn render_frame(&self, term: &mut Terminal) -> anyhow::Result<()> {
        let bg = crossterm::style::Color::Black;
        term.cur.clear(bg);

        let cols = term.cols as i32;
        let rows = term.rows as i32;
        // Stats take the left 36 columns; the pet sits centred in the rest.
        let left = 36.min(cols);
        let cx = left + (cols - left) / 2;
        draw_pet_ascii(&mut term.cur, &self.pet, cx, rows / 2, self.settings.enable_color);

        let banner = self.sink.banner.as_ref().map(|(_, text)| text.as_str());
        ui_overlay(
            &mut term.cur,
            &View {
                pet: &self.pet,
                scene: &self.scene,
                message: &self.message,
                banner,
                color: self.settings.enable_color,
            },
        );

        match &self.scene {
            Scene::Main => {}
            Scene::Help => draw_box(&mut term.cur, "How to play", HELP),
            Scene::ConfirmReset => draw_box(
                &mut term.cur,
                "Reset your pet?",
                "This replaces your pet with a new egg.\nIt cannot be undone.\n\ny reset | n cancel",
            ),
            Scene::Recap(summary) => {
                draw_box(&mut term.cur, "While you were away...", &recap_text(summary))
            }
            Scene::Dead => draw_box(
                &mut term.cur,
                "Your pet has passed on.",
                &format!(
                    "It lived {:.1} days and reached {} milestone(s).\n\nn new pet | q quit",
                    self.pet.age(),
                    self.pet.milestones_achieved()
                ),
            ),
        }

        term.present()
    }
}

/// A recap comes first, even when it ends in death; dismissing it then
/// lands on the death screen.
fn opening_scene(pet: &PetState, summary: CatchUpSummary) -> Scene {
    if summary.has_anything() {
        Scene::Recap(summary)
    } else if !pet.is_alive() {
        Scene::Dead
    } else {
        Scene::Main
    }
}

fn welcome_message(pet: &PetState, summary: &CatchUpSummary) -> &'static str {
    if !pet.is_alive() {
        "Your pet has passed away... Reset to start over."
    } else if summary.kind == CatchUpKind::FreshPet && summary.elapsed_minutes == 0.0 {
        "Welcome! A new pet has arrived!"
    } else if summary.elapsed_minutes > 10.0 && pet.is_sleeping() {
        "Welcome back! Your pet is still sleeping... Zzz"
    } else if summary.elapsed_minutes > 10.0 {
        "Welcome back! Your pet missed you!"
    } else {
        "Welcome back!"
    }
}

const HELP: &str = "Keep all four needs above zero; any one hitting\n\
zero is fatal.\n\n\
f Feed:  +hunger, +happiness, a little mess\n\
p Play:  +happiness, costs energy (needs 20+)\n\
c Clean: full cleanliness, +happiness\n\
s Sleep: restores energy, slows other needs\n\
r Reset: start over with a new egg\n\
o Toggle colour\n\n\
Time keeps passing while the app is closed.";

fn recap_text(s: &CatchUpSummary) -> String {
    let minutes = s.elapsed_minutes;
    let mut text = format!(
        "{}h {:02}m went by.\n\n",
        (minutes / 60.0).floor(),
        (minutes % 60.0).floor()
    );
    for stat in Stat::ALL {
        text.push_str(&format!(
            "{:<11} {:+.1}\n",
            stat.label(),
            s.report.delta.get(stat)
        ));
    }
    if !s.report.milestones.is_empty() {
        text.push_str(&format!("\nMilestones reached: {}\n", s.report.milestones.len()));
    }
    if s.report.died {
        text.push_str("\nYour pet did not make it.\n");
    }
    text.push_str("\nPress any key");
    text
}

pub(crate) fn run(service: Service, settings: Settings, paths: Paths) -> anyhow::Result<()> {
    let mut app = App::init(service, settings, paths);
    let mut term = Terminal::begin()?;
    let result = app.run(&mut term);
    term.end()?;
    if app.settings_dirty {
        save_settings_atomic(&app.paths.settings_path, &app.settings)?;
    }
    result
}

/* -----------------------------
   Frame pacing helper
------------------------------ */

fn spin_sleep(target: Duration, now: Instant) {
    let end = now + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}
