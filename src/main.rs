#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod api;
mod config;
mod export;
mod notify;
mod schedule;
mod ui;

use eframe::egui;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([1400.0, 900.0])
        .with_min_inner_size([1000.0, 640.0])
        .with_title("Course Planner");

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        "Course Planner",
        options,
        Box::new(|cc| Ok(Box::new(ui::PlannerApp::new(cc)?))),
    )
}
