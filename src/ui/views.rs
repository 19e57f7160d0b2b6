use egui::{pos2, vec2, Align2, Color32, CursorIcon, FontId, RichText, Sense, Stroke, Ui};

use crate::api::ApiCourse;
use crate::schedule::conflicts::{ConflictReport, MeetingRef};
use crate::schedule::time::{DAY_COUNT, DAY_NAMES};
use crate::schedule::workflow::DetailWorkflow;
use crate::schedule::{Alternatives, BlockKind, CalendarBlock, GridModel, PanelState, ScheduledCourse, Section};
use super::theme::{campus_color, card_colors, ghost_colors, status_color, ACCENT};

const HOUR_LABEL_WIDTH: f32 = 64.0;
const HEADER_HEIGHT: f32 = 28.0;
const ROW_PADDING: f32 = 15.0;
const MIN_DAY_WIDTH: f32 = 90.0;

fn row_label_font() -> FontId {
    FontId::proportional(12.0)
}

/// Height of an hour row as it will be drawn: one line of label text plus padding
pub fn measure_row_height(ui: &Ui) -> Option<f32> {
    let height = ui.fonts(|f| f.row_height(&row_label_font())) + ROW_PADDING * 2.0;
    (height.is_finite() && height > 0.0).then_some(height)
}

fn empty_state(ui: &mut Ui) {
    ui.add_space(40.0);
    ui.vertical_centered(|ui| {
        ui.label(RichText::new(egui_phosphor::regular::CALENDAR).size(40.0).color(Color32::GRAY));
        ui.label(RichText::new("No courses scheduled yet").size(16.0));
        ui.label(RichText::new("Search for a course and add one of its sections").color(Color32::GRAY));
    });
}

/// Draws the weekly grid. Returns the block that was clicked, if any.
pub fn render_calendar(
    ui: &mut Ui,
    grid: &GridModel,
    ghosts: &[CalendarBlock],
    courses: &[ScheduledCourse],
    selected: Option<usize>,
) -> Option<CalendarBlock> {
    let mut clicked = None;
    let (_, _, secondary) = card_colors();
    let grid_line_color = Color32::from_rgb(0x30, 0x30, 0x38);
    let hour_line_color = Color32::from_rgb(0x44, 0x44, 0x4e);

    let available_width = ui.available_width();
    let day_width = ((available_width - HOUR_LABEL_WIDTH) / DAY_COUNT as f32).max(MIN_DAY_WIDTH);
    let grid_width = HOUR_LABEL_WIDTH + day_width * DAY_COUNT as f32;

    // Fixed day headers (outside ScrollArea)
    let (header_rect, _) = ui.allocate_exact_size(vec2(grid_width, HEADER_HEIGHT), Sense::hover());
    for (i, name) in DAY_NAMES.iter().enumerate() {
        let x = header_rect.min.x + HOUR_LABEL_WIDTH + i as f32 * day_width;
        ui.painter().text(
            pos2(x + day_width / 2.0, header_rect.center().y),
            Align2::CENTER_CENTER,
            *name,
            FontId::proportional(14.0),
            secondary,
        );
    }

    egui::ScrollArea::both().id_salt("calendar_grid").show(ui, |ui| {
        let grid_height = grid.grid_height();
        let (grid_rect, _) = ui.allocate_exact_size(vec2(grid_width, grid_height), Sense::hover());
        let painter = ui.painter().clone();
        let columns_left = grid_rect.min.x + HOUR_LABEL_WIDTH;

        // Hour rows: label at the top of the row, line along its top edge
        for (i, row) in grid.rows.iter().enumerate() {
            let y = grid_rect.min.y + i as f32 * grid.row_height;
            painter.text(
                pos2(columns_left - 8.0, y + ROW_PADDING),
                Align2::RIGHT_CENTER,
                &row.label,
                row_label_font(),
                Color32::from_rgb(0x80, 0x80, 0x8a),
            );
            painter.line_segment(
                [pos2(columns_left, y), pos2(grid_rect.max.x, y)],
                Stroke::new(1.0, if i == 0 || row.hour == 12 { hour_line_color } else { grid_line_color }),
            );
        }

        for day in 0..=DAY_COUNT {
            let x = columns_left + day as f32 * day_width;
            painter.line_segment(
                [pos2(x, grid_rect.min.y), pos2(x, grid_rect.max.y)],
                Stroke::new(1.0, grid_line_color),
            );
        }

        // Each day column is an overlay spanning the whole grid; blocks sit at their minute offset
        for day in 0..DAY_COUNT {
            let col_x = columns_left + day as f32 * day_width;

            for block in grid.blocks_for_day(day) {
                let rect = block_rect(grid_rect.min.y, col_x, day_width, block);
                let id = ui.id().with(("course_block", block.at.entry, block.at.meeting));
                let response = ui.interact(rect, id, Sense::click());

                let campus = courses
                    .get(block.at.entry)
                    .map(ScheduledCourse::primary_campus)
                    .unwrap_or("Unknown");
                let emphasized = selected == Some(block.at.entry) || response.hovered() || response.has_focus();
                paint_block(&painter, rect, block, campus_color(campus), emphasized);

                if response.clicked() {
                    clicked = Some(block.clone());
                }
                response
                    .on_hover_cursor(CursorIcon::PointingHand)
                    .on_hover_text(format!("{}\n{}\n{}", block.title, block.time_label, block.location));
            }

            for ghost in ghosts.iter().filter(|g| g.day == day) {
                let rect = block_rect(grid_rect.min.y, col_x, day_width, ghost);
                paint_ghost(&painter, rect, ghost);
            }
        }
    });

    if courses.is_empty() {
        empty_state(ui);
    }

    clicked
}

fn block_rect(grid_top: f32, col_x: f32, day_width: f32, block: &CalendarBlock) -> egui::Rect {
    egui::Rect::from_min_size(
        pos2(col_x + 2.0, grid_top + block.top),
        vec2(day_width - 4.0, block.height),
    )
}

fn paint_block(painter: &egui::Painter, rect: egui::Rect, block: &CalendarBlock, accent: Color32, emphasized: bool) {
    let (bg, text, secondary) = card_colors();
    let corner_radius = 4.0;
    let stroke_width = if emphasized { 2.0 } else { 1.0 };

    painter.rect(rect, corner_radius, bg, Stroke::new(stroke_width, accent));

    // Left accent stripe
    let accent_width = 3.0;
    painter.rect(
        egui::Rect::from_min_size(rect.min, vec2(accent_width, rect.height())),
        egui::Rounding {
            nw: corner_radius,
            sw: corner_radius,
            ne: 0.0,
            se: 0.0,
        },
        accent,
        Stroke::NONE,
    );

    let clipped = painter.with_clip_rect(rect.shrink(1.0));
    let left = rect.min.x + accent_width + 4.0;
    let line_height = 14.0;
    let lines = [
        (block.course_label.as_str(), text),
        (block.time_label.as_str(), secondary),
        (block.location.as_str(), secondary),
    ];
    for (i, (line, color)) in lines.iter().enumerate() {
        let y = rect.min.y + 3.0 + i as f32 * line_height;
        if y + line_height > rect.max.y + 2.0 && i > 0 {
            break;
        }
        clipped.text(pos2(left, y), Align2::LEFT_TOP, *line, FontId::proportional(11.5), *color);
    }
}

fn paint_ghost(painter: &egui::Painter, rect: egui::Rect, ghost: &CalendarBlock) {
    let conflicting = matches!(ghost.kind, BlockKind::Ghost { conflicting: true });
    let (fill, stroke) = ghost_colors(conflicting);
    painter.rect(rect, 4.0, fill, Stroke::new(2.0, stroke));

    let clipped = painter.with_clip_rect(rect.shrink(1.0));
    let label = if conflicting {
        format!("{} {}", egui_phosphor::regular::WARNING, ghost.time_label)
    } else {
        ghost.time_label.clone()
    };
    clipped.text(
        pos2(rect.min.x + 6.0, rect.min.y + 3.0),
        Align2::LEFT_TOP,
        label,
        FontId::proportional(11.5),
        stroke,
    );
}

fn meeting_lines(ui: &mut Ui, section: &Section) {
    let (_, _, secondary) = card_colors();
    if section.meeting_times.is_empty() {
        ui.label(RichText::new("No scheduled meetings").color(secondary));
    }
    for meeting in &section.meeting_times {
        let mut parts = vec![
            if meeting.day.is_empty() { "TBA".to_string() } else { meeting.day.clone() },
            meeting.time_range(),
        ];
        let location = meeting.location();
        if !location.is_empty() {
            parts.push(location);
        }
        if !meeting.campus.is_empty() {
            parts.push(meeting.campus.clone());
        }
        if let Some(mode) = &meeting.mode {
            parts.push(mode.clone());
        }
        ui.label(RichText::new(parts.join(" · ")).color(secondary));
    }
}

fn status_label(ui: &mut Ui, section: &Section) {
    ui.label(RichText::new(&section.status).color(status_color(section.is_open())));
}

pub enum ListAction {
    Open(usize),
    Remove(usize),
}

pub fn render_list(ui: &mut Ui, courses: &[ScheduledCourse], selected: Option<usize>) -> Option<ListAction> {
    if courses.is_empty() {
        empty_state(ui);
        return None;
    }

    let mut action = None;
    let (bg, _, secondary) = card_colors();

    egui::ScrollArea::vertical().id_salt("course_list").show(ui, |ui| {
        for (position, course) in courses.iter().enumerate() {
            let stroke_color = if selected == Some(position) {
                ACCENT
            } else {
                campus_color(course.primary_campus())
            };
            egui::Frame::none()
                .fill(bg)
                .stroke(Stroke::new(1.0, stroke_color))
                .rounding(6.0)
                .inner_margin(12.0)
                .show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(&course.course_string).strong());
                        ui.label(&course.title);
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui
                                .button(egui_phosphor::regular::TRASH)
                                .on_hover_text("Remove from planner")
                                .clicked()
                            {
                                action = Some(ListAction::Remove(position));
                            }
                            if ui.button("Details").clicked() {
                                action = Some(ListAction::Open(position));
                            }
                        });
                    });

                    let section = &course.selected_section;
                    ui.horizontal(|ui| {
                        ui.label(format!("Section {} · Index {}", section.number, section.index));
                        status_label(ui, section);
                        ui.label(
                            RichText::new(format!(
                                "{} credits · {}",
                                course.credits_label(),
                                course.primary_campus()
                            ))
                            .color(secondary),
                        );
                    });
                    ui.label(RichText::new(section.instructors_label()).color(secondary));
                    meeting_lines(ui, section);
                });
            ui.add_space(6.0);
        }
    });

    action
}

pub enum PanelAction {
    SwitchSection,
    Back,
    Close,
    Remove(usize),
    Select(String),
}

#[derive(Default)]
pub struct PanelOutput {
    pub action: Option<PanelAction>,
    /// Alternate section under the pointer or keyboard focus
    pub hovered: Option<String>,
}

pub fn render_detail_panel(
    ui: &mut Ui,
    courses: &[ScheduledCourse],
    grid: &GridModel,
    workflow: &DetailWorkflow,
) -> PanelOutput {
    let mut output = PanelOutput::default();
    let (_, _, secondary) = card_colors();

    let Some(course) = workflow.position().and_then(|p| courses.get(p)) else {
        return output;
    };

    ui.horizontal(|ui| {
        ui.heading(&course.course_string);
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button(egui_phosphor::regular::X).on_hover_text("Close").clicked() {
                output.action = Some(PanelAction::Close);
            }
        });
    });
    ui.label(RichText::new(&course.title).strong());
    ui.separator();

    match workflow.state() {
        PanelState::Closed => {}
        PanelState::Details { position, .. } => {
            let section = &course.selected_section;
            egui::Grid::new("course_details").num_columns(2).spacing([12.0, 6.0]).show(ui, |ui| {
                if let Some(subject) = &course.subject_description {
                    ui.label(RichText::new("Subject").color(secondary));
                    ui.label(format!("{} ({})", subject, course.subject));
                    ui.end_row();
                }
                if let Some(school) = &course.school {
                    ui.label(RichText::new("School").color(secondary));
                    ui.label(school);
                    ui.end_row();
                }
                ui.label(RichText::new("Credits").color(secondary));
                ui.label(course.credits_label());
                ui.end_row();
                ui.label(RichText::new("Section").color(secondary));
                ui.label(format!("{} (index {})", section.number, section.index));
                ui.end_row();
                ui.label(RichText::new("Status").color(secondary));
                status_label(ui, section);
                ui.end_row();
                ui.label(RichText::new("Instructors").color(secondary));
                ui.label(section.instructors_label());
                ui.end_row();
            });

            ui.add_space(6.0);
            ui.label(RichText::new("Meetings").strong());
            meeting_lines(ui, section);
            // Conflicting meetings are left off the grid, so say which ones
            let clashes: Vec<&ConflictReport> = grid
                .conflicts
                .iter()
                .filter(|c| {
                    (0..section.meeting_times.len()).any(|meeting| {
                        c.involves(MeetingRef {
                            entry: *position,
                            meeting,
                        })
                    })
                })
                .collect();
            if !clashes.is_empty() {
                ui.add_space(4.0);
                ui.label(
                    RichText::new(format!("{} Not shown on the calendar", egui_phosphor::regular::WARNING))
                        .color(status_color(false)),
                );
                for clash in clashes {
                    ui.label(RichText::new(clash.message()).color(secondary));
                }
            }
            for (at, reason) in grid.dropped.iter().filter(|(at, _)| at.entry == *position) {
                let day = section
                    .meeting_times
                    .get(at.meeting)
                    .map(|m| m.day.as_str())
                    .unwrap_or("Meeting");
                ui.label(RichText::new(format!("{}: {}", day, reason)).color(secondary));
            }
            if let Some(comments) = &section.comments {
                ui.add_space(4.0);
                ui.label(RichText::new(comments).italics().color(secondary));
            }

            ui.add_space(10.0);
            ui.horizontal(|ui| {
                let switch = format!("{} Switch section", egui_phosphor::regular::ARROWS_LEFT_RIGHT);
                if ui.button(switch).clicked() {
                    output.action = Some(PanelAction::SwitchSection);
                }
                let remove = format!("{} Remove", egui_phosphor::regular::TRASH);
                if ui.button(remove).clicked() {
                    output.action = Some(PanelAction::Remove(*position));
                }
            });
        }
        PanelState::Sections { alternatives, .. } => {
            if ui.button(format!("{} Back to details", egui_phosphor::regular::ARROW_LEFT)).clicked() {
                output.action = Some(PanelAction::Back);
            }
            ui.add_space(6.0);

            match alternatives {
                Alternatives::Loading => {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("Loading sections...");
                    });
                }
                Alternatives::Ready(sections) if !sections.is_empty() => {
                    let previewing = workflow.preview_section().map(|s| s.index.as_str());
                    egui::ScrollArea::vertical().id_salt("alternate_sections").show(ui, |ui| {
                        for section in sections {
                            let is_current = section.index == course.selected_section.index;
                            let row = section_row(ui, section, is_current, previewing == Some(section.index.as_str()));
                            if row.hovered {
                                output.hovered = Some(section.index.clone());
                            }
                            if row.selected {
                                output.action = Some(PanelAction::Select(section.index.clone()));
                            }
                        }
                    });
                }
                Alternatives::Ready(_) | Alternatives::Failed => {
                    ui.label(RichText::new("No alternative sections available").color(secondary));
                }
            }
        }
    }

    output
}

struct SectionRow {
    hovered: bool,
    selected: bool,
}

fn section_row(ui: &mut Ui, section: &Section, is_current: bool, previewing: bool) -> SectionRow {
    let (bg, _, secondary) = card_colors();
    let stroke = if previewing { ACCENT } else { Color32::from_rgb(0x30, 0x30, 0x38) };
    let mut row = SectionRow {
        hovered: false,
        selected: false,
    };

    let frame = egui::Frame::none()
        .fill(bg)
        .stroke(Stroke::new(1.0, stroke))
        .rounding(6.0)
        .inner_margin(10.0)
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.horizontal(|ui| {
                ui.label(RichText::new(format!("Section {}", section.number)).strong());
                ui.label(RichText::new(format!("#{}", section.index)).color(secondary));
                status_label(ui, section);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let button = ui.add_enabled(!is_current, egui::Button::new(if is_current { "Current" } else { "Select" }));
                    if button.hovered() || button.has_focus() {
                        row.hovered = true;
                    }
                    if button.clicked() {
                        row.selected = true;
                    }
                });
            });
            ui.label(RichText::new(section.instructors_label()).color(secondary));
            meeting_lines(ui, section);
        });

    if frame.response.hovered() {
        row.hovered = true;
    }
    ui.add_space(4.0);
    row
}

/// Course search results, each course with its sections already mapped
#[derive(Default)]
pub struct SearchState {
    pub query: String,
    pub searching: bool,
    /// Id of the newest query; older responses are dropped
    pub latest_query: u64,
    pub results: Vec<(ApiCourse, Vec<Section>)>,
}

impl SearchState {
    pub fn set_results(&mut self, courses: Vec<ApiCourse>) {
        self.results = courses
            .into_iter()
            .map(|course| {
                let sections = course.internal_sections();
                (course, sections)
            })
            .collect();
    }
}

pub enum SearchAction {
    Search(String),
    Add(ScheduledCourse),
}

pub fn render_search_panel(ui: &mut Ui, state: &mut SearchState, scheduled: &[ScheduledCourse]) -> Option<SearchAction> {
    let mut action = None;
    let (_, _, secondary) = card_colors();

    ui.label(RichText::new("Find courses").strong());
    ui.horizontal(|ui| {
        let input = ui.add(
            egui::TextEdit::singleline(&mut state.query)
                .hint_text("Course code or title")
                .desired_width(ui.available_width() - 48.0),
        );
        let submitted = input.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        let clicked = ui
            .add_enabled(!state.searching, egui::Button::new(egui_phosphor::regular::MAGNIFYING_GLASS))
            .clicked();
        if (submitted || clicked) && !state.query.trim().is_empty() {
            action = Some(SearchAction::Search(state.query.trim().to_string()));
        }
    });

    if state.searching {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label("Searching...");
        });
    }

    egui::ScrollArea::vertical().id_salt("search_results").show(ui, |ui| {
        for (course, sections) in &state.results {
            let header = format!("{}  {}", course.course_string, course.title);
            egui::CollapsingHeader::new(header)
                .id_salt(&course.course_string)
                .show(ui, |ui| {
                    if sections.is_empty() {
                        ui.label(RichText::new("No sections offered").color(secondary));
                    }
                    for section in sections {
                        let added = scheduled
                            .iter()
                            .any(|c| c.course_string == course.course_string && c.selected_section.index == section.index);
                        ui.horizontal(|ui| {
                            ui.label(format!("{} · #{}", section.number, section.index));
                            status_label(ui, section);
                            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                                let label = if added { "Added" } else { "Add" };
                                if ui.add_enabled(!added, egui::Button::new(label)).clicked() {
                                    action = Some(SearchAction::Add(course.to_scheduled(section.clone())));
                                }
                            });
                        });
                        ui.label(RichText::new(section.instructors_label()).color(secondary));
                        meeting_lines(ui, section);
                        ui.separator();
                    }
                });
        }
    });

    action
}
