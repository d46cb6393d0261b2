//! Landing window shell: hero with the scene canvas, the signup section, and
//! the scroll policy published by the view controller.

use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use egui::{Align, Align2, FontId, RichText};
use page_core::{
    view::{ScrollAnchor, ScrollBehavior, ScrollLock, ScrollRequest},
    CaptureForm, FlowPhase, PageView, SceneRenderer, Settings, SurveyForm, Viewport,
};
use shared::domain::{PanelState, Purpose};
use tokio::sync::mpsc::Sender;

use crate::backend_bridge::commands::PageCommand;
use crate::controller::events::{err_label, PageHandles, UiError, UiEvent};
use crate::controller::orchestration::dispatch_page_command;
use crate::ui::scene_view;

pub const STORAGE_TIERS: [&str; 4] = ["512GB", "1TB", "2TB", "4TB"];
pub const BATTERY_TIERS: [&str; 3] = ["None", "Standard", "Large"];

const HERO_HEIGHT: f32 = 420.0;
const FADE_IN: Duration = Duration::from_millis(300);
const ACCENT: egui::Color32 = egui::Color32::from_rgb(0x00, 0xff, 0x9d);
const ERROR_RED: egui::Color32 = egui::Color32::from_rgb(0xe0, 0x4f, 0x5f);

/// Local clock for the signup section's fade; the view controller only says
/// when a panel is leaving and when a reveal happened.
#[derive(Debug, Default)]
pub struct FadeClock {
    reveals_seen: u64,
    leaving_since: Option<Instant>,
    revealed_at: Option<Instant>,
}

impl FadeClock {
    pub fn observe(&mut self, view: &PageView, now: Instant) {
        match (view.leaving.is_some(), self.leaving_since) {
            (true, None) => self.leaving_since = Some(now),
            (false, Some(_)) => self.leaving_since = None,
            _ => {}
        }
        if view.reveals != self.reveals_seen {
            self.reveals_seen = view.reveals;
            self.revealed_at = Some(now);
        }
    }

    pub fn opacity(&self, handoff: Duration, now: Instant) -> f32 {
        if let Some(since) = self.leaving_since {
            return 1.0 - progress(now.saturating_duration_since(since), handoff);
        }
        self.revealed_at
            .map_or(1.0, |at| progress(now.saturating_duration_since(at), FADE_IN))
    }

    pub fn animating(&self, now: Instant) -> bool {
        self.leaving_since.is_some()
            || self
                .revealed_at
                .is_some_and(|at| now.saturating_duration_since(at) < FADE_IN)
    }
}

fn progress(elapsed: Duration, total: Duration) -> f32 {
    if total.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f32() / total.as_secs_f32()).clamp(0.0, 1.0)
}

pub struct LandingApp {
    cmd_tx: Sender<PageCommand>,
    ui_rx: Receiver<UiEvent>,
    page: Option<PageHandles>,
    handoff: Duration,
    scene: SceneRenderer,
    scene_enabled: bool,
    fade: FadeClock,
    capture_email: String,
    survey_email: String,
    reveals_synced: u64,
    applied_scroll: u64,
    status: String,
    banner: Option<UiError>,
}

impl LandingApp {
    pub fn new(cmd_tx: Sender<PageCommand>, ui_rx: Receiver<UiEvent>, settings: &Settings) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            page: None,
            handoff: settings.timings().handoff,
            scene: SceneRenderer::new(),
            scene_enabled: settings.scene_enabled,
            fade: FadeClock::default(),
            capture_email: String::new(),
            survey_email: String::new(),
            reveals_synced: 0,
            applied_scroll: 0,
            status: String::new(),
            banner: None,
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Ready { handles, backend } => {
                    tracing::info!(backend, "page: ui attached to backend worker");
                    self.page = Some(handles);
                    self.status.clear();
                }
                UiEvent::Info(message) => self.status = message,
                UiEvent::Error(err) => {
                    tracing::warn!(
                        category = ?err.category(),
                        context = ?err.context(),
                        "ui: {}",
                        err.message()
                    );
                    if err.wants_banner() {
                        self.banner = Some(err);
                    } else {
                        self.status = format!("{}: {}", err_label(err.category()), err.message());
                    }
                }
            }
        }
    }

    fn send(&mut self, cmd: PageCommand) {
        dispatch_page_command(&self.cmd_tx, cmd, &mut self.status);
    }

    /// The survey field is pre-filled once per reveal; afterwards the local buffer owns it.
    fn sync_survey_email(&mut self, view: &PageView) {
        if view.reveals == self.reveals_synced {
            return;
        }
        self.reveals_synced = view.reveals;
        if view.visible == PanelState::WishlistSurvey {
            self.survey_email = view.survey_email.clone();
        }
    }

    /// Returns the scroll request not yet applied, if any.
    fn take_scroll(&mut self, view: &PageView) -> Option<ScrollRequest> {
        let request = view.scroll.filter(|req| req.seq > self.applied_scroll)?;
        self.applied_scroll = request.seq;
        Some(request)
    }

    fn show_banner(&mut self, ui: &mut egui::Ui) {
        let Some(banner) = &self.banner else {
            return;
        };
        let mut dismissed = false;
        egui::Frame::NONE
            .fill(egui::Color32::from_rgb(92, 34, 40))
            .stroke(egui::Stroke::new(1.0, ERROR_RED))
            .corner_radius(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new(err_label(banner.category()))
                            .strong()
                            .color(egui::Color32::WHITE),
                    );
                    ui.label(RichText::new(banner.message()).color(egui::Color32::WHITE));
                    dismissed = ui.small_button("Dismiss").clicked();
                });
            });
        if dismissed {
            self.banner = None;
        }
    }

    fn show_hero(&mut self, ui: &mut egui::Ui, view: &PageView) -> egui::Rect {
        let (rect, _) = ui.allocate_exact_size(
            egui::vec2(ui.available_width(), HERO_HEIGHT),
            egui::Sense::hover(),
        );
        let painter = ui.painter_at(rect);

        if self.scene_enabled && ui.is_rect_visible(rect) {
            let viewport = Viewport::new(rect.width(), rect.height());
            self.scene.start(Some(viewport));
            self.scene.resize(viewport);
            if let Some(frame) = self.scene.frame() {
                scene_view::paint_frame(&painter, rect, &frame);
            }
        } else {
            self.scene.stop();
            painter.rect_filled(rect, 0.0, scene_view::rgb_alpha(page_core::scene::FOG_COLOR, 1.0));
        }

        painter.text(
            rect.center() - egui::vec2(0.0, 18.0),
            Align2::CENTER_CENTER,
            "SECURE CORE",
            FontId::proportional(44.0),
            egui::Color32::WHITE,
        );
        painter.text(
            rect.center() + egui::vec2(0.0, 26.0),
            Align2::CENTER_CENTER,
            "A storage node that lives in your home, not in someone else's cloud.",
            FontId::proportional(16.0),
            egui::Color32::from_gray(190),
        );

        ui.add_space(16.0);
        ui.vertical_centered(|ui| {
            let cta = egui::Button::new(RichText::new("Join the waitlist").strong().size(16.0))
                .fill(ACCENT.gamma_multiply(0.25))
                .stroke(egui::Stroke::new(1.0, ACCENT));
            if ui
                .add_enabled(view.is_settled_on(PanelState::Content), cta)
                .clicked()
            {
                self.send(PageCommand::OpenSignup);
            }
        });
        ui.add_space(48.0);

        rect
    }

    fn show_signup_section(
        &mut self,
        ui: &mut egui::Ui,
        view: &PageView,
        capture: &CaptureForm,
        survey: &SurveyForm,
        now: Instant,
    ) -> egui::Rect {
        let anchor = ui
            .label(RichText::new("EARLY ACCESS").small().strong().color(ACCENT))
            .rect;
        ui.add_space(8.0);

        let opacity = self.fade.opacity(self.handoff, now);
        let interactive = !view.is_transitioning();
        ui.scope(|ui| {
            ui.set_opacity(opacity);
            ui.add_enabled_ui(interactive, |ui| match view.visible {
                PanelState::Content => self.show_content_panel(ui),
                PanelState::WaitlistCapture => self.show_capture_panel(ui, capture),
                PanelState::WishlistSurvey => self.show_survey_panel(ui, survey),
                PanelState::Success => self.show_success_panel(ui, view),
            });
        });
        ui.add_space(320.0);

        anchor
    }

    fn show_content_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Reserve a unit from the first batch");
        ui.label("We are building a small run. Leave an email and tell us what you would use it for.");
        ui.add_space(8.0);
        if ui.button("Reserve my spot").clicked() {
            self.send(PageCommand::OpenSignup);
        }
    }

    fn show_capture_panel(&mut self, ui: &mut egui::Ui, capture: &CaptureForm) {
        ui.heading("Join the waitlist");
        ui.label("Be first in line when units ship.");
        ui.add_space(8.0);

        let stroke = if capture.errored {
            egui::Stroke::new(1.5, ERROR_RED)
        } else {
            egui::Stroke::NONE
        };
        let busy = capture.phase == FlowPhase::Submitting;
        let mut submit = false;
        ui.horizontal(|ui| {
            let response = egui::Frame::NONE
                .stroke(stroke)
                .corner_radius(4.0)
                .show(ui, |ui| {
                    ui.add(
                        egui::TextEdit::singleline(&mut self.capture_email)
                            .hint_text("you@example.com")
                            .desired_width(280.0),
                    )
                })
                .inner;
            if response.changed() {
                let value = self.capture_email.clone();
                self.send(PageCommand::CaptureEmailInput(value));
            }
            let entered = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            let clicked = ui.add_enabled(!busy, egui::Button::new("Join")).clicked();
            submit = (entered || clicked) && !busy;
        });
        if capture.errored {
            ui.colored_label(ERROR_RED, "Enter a valid email address");
        }
        if submit {
            self.send(PageCommand::SubmitWaitlist);
        }

        ui.add_space(12.0);
        if ui.link("Back").clicked() {
            self.send(PageCommand::BackToContent);
        }
    }

    fn show_survey_panel(&mut self, ui: &mut egui::Ui, survey: &SurveyForm) {
        let mut commands = Vec::new();

        ui.heading("Shape the first batch");
        ui.label("A few quick questions so we build the right thing.");
        ui.add_space(8.0);

        ui.horizontal(|ui| {
            ui.label("Email");
            if ui
                .add(egui::TextEdit::singleline(&mut self.survey_email).desired_width(280.0))
                .changed()
            {
                commands.push(PageCommand::SurveyEmailInput(self.survey_email.clone()));
            }
        });

        ui.add_space(8.0);
        ui.label(RichText::new("Storage").strong());
        ui.horizontal(|ui| {
            for tier in STORAGE_TIERS {
                if ui.radio(survey.storage.as_deref() == Some(tier), tier).clicked() {
                    commands.push(PageCommand::SelectStorage(Some(tier.to_string())));
                }
            }
        });

        ui.label(RichText::new("Battery backup").strong());
        ui.horizontal(|ui| {
            for tier in BATTERY_TIERS {
                if ui.radio(survey.battery.as_deref() == Some(tier), tier).clicked() {
                    commands.push(PageCommand::SelectBattery(Some(tier.to_string())));
                }
            }
        });

        ui.label(RichText::new("What would you use it for?").strong());
        for purpose in Purpose::ALL {
            let mut checked = survey.purposes.contains(&purpose);
            if ui.checkbox(&mut checked, purpose.label()).changed() {
                commands.push(PageCommand::SetPurpose { purpose, checked });
            }
        }

        ui.add_space(8.0);
        let ready = survey.submit_enabled && survey.phase == FlowPhase::Idle;
        if ui
            .add_enabled(ready, egui::Button::new("Send wishlist"))
            .clicked()
        {
            commands.push(PageCommand::SubmitWishlist);
        }
        if !survey.submit_enabled {
            ui.small(RichText::new("Pick at least one use to continue.").weak());
        }

        ui.add_space(12.0);
        if ui.link("Back").clicked() {
            commands.push(PageCommand::BackToContent);
        }

        for cmd in commands {
            self.send(cmd);
        }
    }

    fn show_success_panel(&mut self, ui: &mut egui::Ui, view: &PageView) {
        ui.heading(RichText::new("You're on the list").color(ACCENT));
        ui.label(format!("We'll write to {} when units ship.", view.success_email));
        ui.add_space(12.0);
        if ui.button("Back to the page").clicked() {
            self.send(PageCommand::BackToContent);
        }
    }

    fn show_starting_screen(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_banner(ui);
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("Starting...").weak());
            });
        });
    }
}

impl eframe::App for LandingApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        let snapshot = self.page.as_ref().map(|handles| {
            (
                handles.view.borrow().clone(),
                handles.capture.borrow().clone(),
                handles.survey.borrow().clone(),
            )
        });
        let Some((view, capture, survey)) = snapshot else {
            self.show_starting_screen(ctx);
            ctx.request_repaint_after(Duration::from_millis(100));
            return;
        };

        let now = Instant::now();
        self.fade.observe(&view, now);
        self.sync_survey_email(&view);
        let scroll = self.take_scroll(&view);

        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_banner(ui);

            let mut area = egui::ScrollArea::vertical()
                .id_salt("landing_page")
                .auto_shrink([false, false])
                .enable_scrolling(view.scroll_lock == ScrollLock::Unlocked);
            if let Some(ScrollRequest {
                anchor: ScrollAnchor::PageTop,
                behavior: ScrollBehavior::Instant,
                ..
            }) = scroll
            {
                area = area.vertical_scroll_offset(0.0);
            }

            area.show(ui, |ui| {
                let hero = self.show_hero(ui, &view);
                let signup = self.show_signup_section(ui, &view, &capture, &survey, now);
                match scroll.map(|req| (req.anchor, req.behavior)) {
                    Some((ScrollAnchor::PageTop, ScrollBehavior::Smooth)) => {
                        ui.scroll_to_rect(hero, Some(Align::TOP));
                    }
                    Some((ScrollAnchor::SignupSection, _)) => {
                        ui.scroll_to_rect(signup, Some(Align::TOP));
                    }
                    _ => {}
                }
                if !self.status.is_empty() {
                    ui.small(RichText::new(&self.status).weak());
                }
            });
        });

        if self.scene.is_running() || self.fade.animating(now) || view.is_transitioning() {
            ctx.request_repaint_after(Duration::from_millis(16));
        } else {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}
