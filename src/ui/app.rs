use anyhow::{Context, Result};
use chrono::Utc;
use eframe::egui;
use egui::{Color32, RichText};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::{Duration, Instant};

use crate::api::{ApiCourse, CourseClient};
use crate::config::{Config, ViewMode};
use crate::export;
use crate::notify::{Level, Notifier, Toasts};
use crate::schedule::{FetchRequest, FetchTicket, FileStore, Planner, ScheduleError, ScheduleStore, Section};
use super::views::{self, ListAction, PanelAction, SearchAction, SearchState};

pub struct PlannerApp {
    config: Config,
    planner: Planner<FileStore>,
    toasts: Toasts,

    // Search panel
    search: SearchState,

    // Alternate section currently under the pointer or focus
    hovered_section: Option<String>,

    // Clear confirmation
    show_clear_confirm: bool,

    // Async communication
    runtime: tokio::runtime::Runtime,
    result_rx: Receiver<AsyncResult>,
    result_tx: Sender<AsyncResult>,
}

enum AsyncResult {
    SearchResults {
        query_id: u64,
        result: Result<Vec<ApiCourse>, String>,
    },
    SectionsLoaded {
        ticket: FetchTicket,
        course_string: String,
        result: Result<Vec<Section>, String>,
    },
}

impl PlannerApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Result<Self> {
        let config = Config::load().unwrap_or_else(|e| {
            log::warn!("Using default config: {:#}", e);
            Config::default()
        });
        super::setup_fonts(&cc.egui_ctx);
        super::setup_theme(&cc.egui_ctx);

        let runtime = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
        let (result_tx, result_rx) = channel();

        let persistence = FileStore::open_default().unwrap_or_else(|e| {
            log::warn!("{:#}; keeping the schedule in ./course-planner-data", e);
            FileStore::new("course-planner-data")
        });
        let mut planner = Planner::new(ScheduleStore::load(persistence), config.preview_debounce());

        let mut toasts = Toasts::default();
        planner.report_loaded(&mut toasts);

        Ok(Self {
            config,
            planner,
            toasts,
            search: SearchState::default(),
            hovered_section: None,
            show_clear_confirm: false,
            runtime,
            result_rx,
            result_tx,
        })
    }

    fn check_async_results(&mut self) {
        while let Ok(result) = self.result_rx.try_recv() {
            match result {
                AsyncResult::SearchResults { query_id, result } => {
                    if query_id != self.search.latest_query {
                        log::debug!("Dropping results of superseded search {}", query_id);
                        continue;
                    }
                    self.search.searching = false;
                    match result {
                        Ok(courses) => {
                            if courses.is_empty() {
                                self.toasts.notify("No courses found", Level::Info);
                            }
                            self.search.set_results(courses);
                        }
                        Err(e) => {
                            self.search.results.clear();
                            self.toasts.notify(&format!("Search failed: {}", e), Level::Error);
                        }
                    }
                }
                AsyncResult::SectionsLoaded { ticket, course_string, result } => {
                    self.planner.sections_loaded(
                        ticket,
                        &course_string,
                        result.map_err(ScheduleError::SectionFetchFailure),
                        &mut self.toasts,
                    );
                }
            }
        }
    }

    fn search_courses(&mut self, query: String, ctx: &egui::Context) {
        self.search.latest_query += 1;
        self.search.searching = true;

        let query_id = self.search.latest_query;
        let config = self.config.clone();
        let tx = self.result_tx.clone();
        let ctx = ctx.clone();

        self.runtime.spawn(async move {
            let result = async {
                let client = CourseClient::new(&config)?;
                client.search_courses(&query).await
            }.await;

            let _ = tx.send(AsyncResult::SearchResults {
                query_id,
                result: result.map_err(|e| format!("{:#}", e)),
            });
            ctx.request_repaint();
        });
    }

    fn fetch_sections(&mut self, request: FetchRequest, ctx: &egui::Context) {
        let config = self.config.clone();
        let tx = self.result_tx.clone();
        let ctx = ctx.clone();

        self.runtime.spawn(async move {
            let FetchRequest { ticket, course_string } = request;
            let result = async {
                let client = CourseClient::new(&config)?;
                client.fetch_sections(&course_string).await
            }.await;

            let _ = tx.send(AsyncResult::SectionsLoaded {
                ticket,
                course_string,
                result: result.map_err(|e| format!("{:#}", e)),
            });
            ctx.request_repaint();
        });
    }

    fn export_schedule(&mut self) {
        let dir = export::export_dir().unwrap_or_else(|| PathBuf::from("."));
        match export::write_export(self.planner.courses(), &dir, Utc::now()) {
            Ok(_) => self.toasts.notify("Schedule exported successfully!", Level::Success),
            Err(ScheduleError::EmptyScheduleExport) => self.toasts.notify("No courses to export", Level::Warning),
            Err(e) => self.toasts.notify(&e.to_string(), Level::Error),
        }
    }

    fn open_registration(&mut self) {
        let link = export::registration_link(
            self.planner.courses(),
            &self.config.registration_url,
            &self.config.semester_code(),
        );
        match link {
            Ok(link) => {
                if let Err(e) = open::that(&link) {
                    self.toasts.notify(&format!("Failed to open registration: {}", e), Level::Error);
                }
            }
            Err(ScheduleError::EmptyScheduleExport) => self.toasts.notify("No courses to register for", Level::Warning),
            Err(e) => self.toasts.notify(&e.to_string(), Level::Error),
        }
    }

    fn copy_share_link(&mut self, ctx: &egui::Context) {
        match export::share_link(self.planner.courses(), self.config.base_url()) {
            Ok(link) => {
                ctx.output_mut(|o| o.copied_text = link);
                self.toasts.notify("Schedule link copied to clipboard!", Level::Success);
            }
            Err(ScheduleError::EmptyScheduleExport) => self.toasts.notify("No courses to share", Level::Warning),
            Err(e) => {
                log::error!("{}", e);
                self.toasts.notify("Failed to copy link", Level::Error);
            }
        }
    }

    fn set_view_mode(&mut self, mode: ViewMode) {
        if self.config.view_mode == mode {
            return;
        }
        self.config.view_mode = mode;
        if let Err(e) = self.config.save() {
            log::warn!("Failed to save config: {:#}", e);
        }
    }

    /// Hover and focus changes drive the preview; leaving is debounced by the workflow
    fn track_hover(&mut self, hovered: Option<String>) {
        if hovered == self.hovered_section {
            return;
        }
        match &hovered {
            Some(index) => self.planner.hover_section(index),
            None => self.planner.leave_section(Instant::now()),
        }
        self.hovered_section = hovered;
    }

    fn render_header(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let stats = self.planner.stats();
        let conflicts = self.planner.conflict_count();
        let empty = stats.total_courses == 0;

        ui.horizontal(|ui| {
            ui.label(
                RichText::new(format!("{} Course Planner", egui_phosphor::regular::CALENDAR_CHECK))
                    .size(20.0)
                    .color(super::theme::ACCENT),
            );
            ui.add_space(12.0);
            ui.label(format!(
                "{} courses · {} campuses · {} credits",
                stats.total_courses, stats.campus_count, stats.total_credits
            ));
            if conflicts > 0 {
                let text = if conflicts == 1 {
                    "1 conflict".to_string()
                } else {
                    format!("{} conflicts", conflicts)
                };
                ui.label(
                    RichText::new(format!("{} {}", egui_phosphor::regular::WARNING, text))
                        .color(Color32::from_rgb(0xff, 0x50, 0x50)),
                );
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui
                    .add_enabled(!empty, egui::Button::new(format!("{} Clear", egui_phosphor::regular::TRASH)))
                    .clicked()
                {
                    self.show_clear_confirm = true;
                }
                if ui
                    .button(egui_phosphor::regular::LINK)
                    .on_hover_text("Copy shareable link")
                    .clicked()
                {
                    self.copy_share_link(ctx);
                }
                if ui
                    .button(egui_phosphor::regular::ARROW_SQUARE_OUT)
                    .on_hover_text("Register for these sections")
                    .clicked()
                {
                    self.open_registration();
                }
                if ui
                    .button(egui_phosphor::regular::DOWNLOAD_SIMPLE)
                    .on_hover_text("Export schedule")
                    .clicked()
                {
                    self.export_schedule();
                }

                ui.separator();
                let mut mode = self.config.view_mode;
                ui.selectable_value(&mut mode, ViewMode::List, egui_phosphor::regular::LIST);
                ui.selectable_value(&mut mode, ViewMode::Calendar, egui_phosphor::regular::CALENDAR);
                self.set_view_mode(mode);
            });
        });
    }

    fn render_schedule(&mut self, ui: &mut egui::Ui) {
        match self.config.view_mode {
            ViewMode::Calendar => {
                self.planner.set_row_height(views::measure_row_height(ui));
                let ghosts = self.planner.ghost_blocks();
                let clicked = views::render_calendar(
                    ui,
                    self.planner.grid(),
                    &ghosts,
                    self.planner.courses(),
                    self.planner.workflow().position(),
                );
                if let Some(block) = clicked {
                    self.planner.open_block(&block);
                }
            }
            ViewMode::List => {
                let action = views::render_list(ui, self.planner.courses(), self.planner.workflow().position());
                match action {
                    Some(ListAction::Open(position)) => self.planner.open_details(position),
                    Some(ListAction::Remove(position)) => {
                        self.planner.remove_course(position, &mut self.toasts);
                    }
                    None => {}
                }
            }
        }
    }

    fn render_details(&mut self, ui: &mut egui::Ui) {
        let output = views::render_detail_panel(
            ui,
            self.planner.courses(),
            self.planner.grid(),
            self.planner.workflow(),
        );
        self.track_hover(output.hovered);

        match output.action {
            Some(PanelAction::SwitchSection) => self.planner.begin_switch(),
            Some(PanelAction::Back) => self.planner.back_to_details(),
            Some(PanelAction::Close) => self.planner.close_panel(),
            Some(PanelAction::Remove(position)) => {
                self.planner.remove_course(position, &mut self.toasts);
            }
            Some(PanelAction::Select(index)) => {
                self.planner.select_section(&index, &mut self.toasts);
            }
            None => {}
        }
    }

    fn render_clear_confirm(&mut self, ctx: &egui::Context) {
        let (content_bg, frame_color) = super::theme::dialog_colors();
        let dialog_frame = egui::Frame::none()
            .fill(content_bg)
            .stroke(egui::Stroke::new(2.0, frame_color))
            .rounding(egui::Rounding::same(8.0))
            .inner_margin(egui::Margin::same(20.0));

        let count = self.planner.courses().len();
        let mut confirmed = false;
        let mut cancelled = false;

        egui::Window::new("Clear schedule")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .frame(dialog_frame)
            .show(ctx, |ui| {
                ui.label(format!("Remove all {} courses from your planner?", count));
                ui.add_space(12.0);
                ui.horizontal(|ui| {
                    let clear = egui::Button::new(RichText::new("Clear").color(Color32::WHITE))
                        .fill(super::theme::ACCENT);
                    if ui.add(clear).clicked() {
                        confirmed = true;
                    }
                    if ui.button("Cancel").clicked() {
                        cancelled = true;
                    }
                });
            });

        if confirmed {
            self.planner.clear(&mut self.toasts);
        }
        if confirmed || cancelled {
            self.show_clear_confirm = false;
        }
    }

    fn render_toasts(&self, ctx: &egui::Context) {
        if self.toasts.is_empty() {
            return;
        }
        egui::Area::new(egui::Id::new("toasts"))
            .anchor(egui::Align2::RIGHT_BOTTOM, [-16.0, -16.0])
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                for toast in self.toasts.iter() {
                    let (bg, icon) = super::theme::toast_style(toast.level);
                    egui::Frame::none()
                        .fill(bg)
                        .rounding(6.0)
                        .inner_margin(egui::Margin::symmetric(14.0, 10.0))
                        .show(ui, |ui| {
                            ui.horizontal(|ui| {
                                ui.label(
                                    RichText::new(icon)
                                        .family(super::theme::phosphor_fill_family())
                                        .color(Color32::WHITE),
                                );
                                ui.label(RichText::new(&toast.message).color(Color32::WHITE));
                            });
                        });
                    ui.add_space(6.0);
                }
            });
    }
}

impl eframe::App for PlannerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Handle pinch-to-zoom (trackpad pinch or Ctrl+scroll)
        let zoom_delta = ctx.input(|i| i.zoom_delta());
        if zoom_delta != 1.0 {
            self.config.font_scale = (self.config.font_scale * zoom_delta).clamp(0.75, 2.5);
            if (zoom_delta - 1.0).abs() > 0.01 {
                if let Err(e) = self.config.save() {
                    log::warn!("Failed to save config: {:#}", e);
                }
            }
        }
        ctx.set_pixels_per_point(self.config.font_scale);

        self.check_async_results();

        let now = Instant::now();
        if self.planner.poll(now) {
            ctx.request_repaint();
        }

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            if self.show_clear_confirm {
                self.show_clear_confirm = false;
            } else {
                self.planner.close_panel();
            }
        }

        egui::TopBottomPanel::top("header")
            .exact_height(48.0)
            .show(ctx, |ui| self.render_header(ui, ctx));

        egui::SidePanel::left("search")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                if let Some(action) = views::render_search_panel(ui, &mut self.search, self.planner.courses()) {
                    match action {
                        SearchAction::Search(query) => self.search_courses(query, ctx),
                        SearchAction::Add(course) => {
                            self.planner.add_course(course, &mut self.toasts);
                        }
                    }
                }
            });

        if self.planner.workflow().is_open() {
            egui::SidePanel::right("details")
                .resizable(true)
                .default_width(340.0)
                .show(ctx, |ui| self.render_details(ui));
        } else {
            self.hovered_section = None;
        }

        egui::CentralPanel::default().show(ctx, |ui| self.render_schedule(ui));

        if self.show_clear_confirm {
            self.render_clear_confirm(ctx);
        }

        // Fetches queued by the workflow during this frame
        while let Some(request) = self.planner.take_fetch_request() {
            self.fetch_sections(request, ctx);
        }

        self.toasts.prune(Instant::now());
        self.render_toasts(ctx);
        if !self.toasts.is_empty() {
            ctx.request_repaint_after(Duration::from_millis(250));
        }
        if let Some(wait) = self.planner.next_wakeup(Instant::now()) {
            ctx.request_repaint_after(wait);
        }
    }
}
