//! TUI views and rendering
//!
//! Rendering reads the app state and the workflow; it never modifies either.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Gauge, List, ListItem, Paragraph, Row, Table, Wrap};
use tracing::trace;

use super::state::{AppState, InteractionMode};
use crate::domain::{UsageReport, format_cost, format_tokens};
use crate::notify::{Notification, NotificationLevel};
use crate::workflow::{ExecutionStep, Phase, PlanningStep, StepStatus, Workflow};

mod colors {
    use ratatui::style::Color;

    pub const ACCENT: Color = Color::Rgb(34, 197, 94); // Green
    pub const ACTIVE: Color = Color::Rgb(0, 255, 127); // Spring green
    pub const PENDING: Color = Color::Rgb(113, 113, 122); // Zinc
    pub const WARNING: Color = Color::Rgb(255, 215, 0); // Gold
    pub const FAILED: Color = Color::Rgb(220, 20, 60); // Crimson
    pub const HEADER: Color = Color::Rgb(0, 255, 255); // Cyan
    pub const KEYBIND: Color = Color::Rgb(0, 255, 255); // Cyan
    pub const DIM: Color = Color::DarkGray;
}

const PHASES: [Phase; 4] = [Phase::Idle, Phase::Planning, Phase::Editing, Phase::Done];

/// Main render function
pub fn render(state: &AppState, workflow: &Workflow, notifications: &[Notification], frame: &mut Frame) {
    trace!(phase = %workflow.phase(), "render: called");
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Phase content
            Constraint::Length(5), // Notifications
            Constraint::Length(3), // Footer
        ])
        .split(frame.area());

    render_header(state, workflow, frame, chunks[0]);

    match workflow.display_phase() {
        Phase::Idle => render_idle(workflow, frame, chunks[1]),
        Phase::Planning => render_planning(workflow, frame, chunks[1]),
        Phase::Editing => render_editing(workflow, frame, chunks[1]),
        Phase::Done => render_done(workflow, frame, chunks[1]),
    }

    render_notifications(notifications, frame, chunks[2]);
    render_footer(state, workflow, frame, chunks[3]);

    if state.interaction_mode == InteractionMode::Help {
        let area = frame.area();
        render_help_overlay(frame, area);
    }
}

/// Phase indicator plus activity spinner
fn render_header(state: &AppState, workflow: &Workflow, frame: &mut Frame, area: Rect) {
    let live = workflow.phase();
    let shown = workflow.display_phase();

    let mut spans = vec![
        Span::raw(" "),
        Span::styled("●", Style::default().fg(colors::ACCENT)),
        Span::styled(" Studio", Style::default().fg(colors::HEADER).add_modifier(Modifier::BOLD)),
        Span::raw(" │ "),
    ];
    for (i, phase) in PHASES.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" ▸ ", Style::default().fg(colors::DIM)));
        }
        let mut style = if *phase == live {
            Style::default().fg(colors::ACTIVE).add_modifier(Modifier::BOLD)
        } else if *phase < live {
            Style::default().fg(Color::Gray)
        } else {
            Style::default().fg(colors::PENDING)
        };
        if *phase == shown && shown != live {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        spans.push(Span::styled(phase_title(*phase), style));
    }

    if workflow.is_processing() {
        spans.push(Span::raw("   "));
        spans.push(Span::styled(
            format!("{} {}...", state.spinner_frame(), state.spinner_word),
            Style::default().fg(colors::WARNING),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, area);
}

fn render_idle(workflow: &Workflow, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let images: Vec<ListItem> = workflow
        .images()
        .iter()
        .enumerate()
        .map(|(i, image)| ListItem::new(format!(" {:>2}. {}", i, image.file_name())))
        .collect();
    if images.is_empty() {
        render_empty_message(frame, chunks[0], " Images ", "No images yet. Press [a] to add one.");
    } else {
        let title = format!(" Images ({}) ", images.len());
        frame.render_widget(
            List::new(images).block(Block::default().borders(Borders::ALL).title(title)),
            chunks[0],
        );
    }

    let prompt = if workflow.prompt().trim().is_empty() {
        Line::from(Span::styled(
            "Describe how you want your edits. Press [p] to write a prompt.",
            Style::default().fg(colors::DIM),
        ))
    } else {
        Line::from(workflow.prompt())
    };
    frame.render_widget(
        Paragraph::new(vec![prompt, Line::from(""), key_line("s", "Start the agent")])
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title(" Prompt ")),
        chunks[1],
    );
}

fn render_planning(workflow: &Workflow, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let progress = workflow.planning_progress();
    let current = PlanningStep::ALL.iter().position(|s| *s == progress.step).unwrap_or(0);
    let done = progress.step == PlanningStep::Complete;
    let steps: Vec<(&str, StepMark)> = PlanningStep::ALL
        .iter()
        .enumerate()
        .map(|(i, step)| (step.label(), step_mark(i, current, done)))
        .collect();
    render_step_row(&steps, " Planning ", frame, chunks[0]);

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Music download "))
        .gauge_style(Style::default().fg(colors::ACCENT))
        .percent(u16::from(progress.download_progress.min(100)))
        .label(progress.message.as_str());
    frame.render_widget(gauge, chunks[1]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[2]);
    render_plan_actions(workflow, None, frame, body[0]);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(7)])
        .split(body[1]);
    render_music(workflow, frame, side[0]);
    render_usage(workflow.usage(), frame, side[1]);
}

fn render_editing(workflow: &Workflow, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let progress = workflow.execution_progress();
    let current = progress.step.position().saturating_sub(1);
    let started = progress.step != ExecutionStep::Idle;
    let done = progress.step == ExecutionStep::Complete;
    let steps: Vec<(&str, StepMark)> = ExecutionStep::SHOWN
        .iter()
        .enumerate()
        .map(|(i, step)| {
            let mark = if started { step_mark(i, current, done) } else { StepMark::Pending };
            (step.label(), mark)
        })
        .collect();
    render_step_row(&steps, " Device execution ", frame, chunks[0]);

    let percent = progress
        .progress
        .map(u16::from)
        .unwrap_or_else(|| (progress.step.position() * 100 / ExecutionStep::SHOWN.len()) as u16);
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Progress "))
        .gauge_style(Style::default().fg(colors::ACCENT))
        .percent(percent.min(100))
        .label(progress.message.as_str());
    frame.render_widget(gauge, chunks[1]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[2]);
    let editing = &workflow.state().editing;
    render_plan_actions(workflow, Some((editing.current_step, editing.total_steps)), frame, body[0]);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(body[1]);
    render_image_grid(workflow, frame, side[0]);
    render_agent_log(workflow.execution_logs(), frame, side[1]);
}

/// One cell per uploaded image, marked by the status of the steps editing it
fn render_image_grid(workflow: &Workflow, frame: &mut Frame, area: Rect) {
    let editing = &workflow.state().editing;
    let mut spans = vec![Span::raw(" ")];
    for i in 0..workflow.images().len() {
        let (icon, style) = match editing.image_status(i) {
            Some(StepStatus::Running) => ("●", Style::default().fg(colors::ACTIVE).add_modifier(Modifier::BOLD)),
            Some(StepStatus::Done) => ("✓", Style::default().fg(colors::ACCENT)),
            Some(StepStatus::Error) => ("✗", Style::default().fg(colors::FAILED)),
            Some(StepStatus::Pending) => ("○", Style::default().fg(colors::PENDING)),
            None => ("·", Style::default().fg(colors::DIM)),
        };
        spans.push(Span::styled(format!("[{} {}] ", i, icon), style));
    }
    let title = match editing.active_image() {
        Some(i) => format!(" Images (editing {}) ", i),
        None => " Images ".to_string(),
    };
    frame.render_widget(
        Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL).title(title)),
        area,
    );
}

fn render_done(workflow: &Workflow, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let done = &workflow.state().done;
    let mut lines = Vec::new();
    match &done.summary {
        Some(summary) => {
            lines.push(Line::from(Span::styled(
                "Your video has been edited on the device!",
                Style::default().fg(colors::ACCENT).add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(""));
            lines.push(field_line("Duration", format!("{:.1}s", summary.total_duration)));
            lines.push(field_line("Effects", summary.effects_count.to_string()));
            lines.push(field_line("Transitions", summary.transitions_count.to_string()));
            lines.push(field_line("Track", summary.track_used.clone()));
        }
        None => lines.push(Line::from(Span::styled("No summary", Style::default().fg(colors::DIM)))),
    }
    if let Some(report) = &done.report {
        lines.push(Line::from(""));
        let outcome = if report.success { "success" } else { "failed" };
        lines.push(field_line("Outcome", outcome.to_string()));
        lines.push(field_line("Images", report.num_images.to_string()));
        lines.push(field_line("Plan steps", report.plan_steps.to_string()));
        lines.push(field_line("Audio added", if report.audio_added { "yes" } else { "no" }.to_string()));
    }
    if let Some(url) = &done.video_url {
        lines.push(field_line("Video", url.clone()));
    }
    lines.push(Line::from(""));
    lines.push(key_line("r", "Start over"));

    frame.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Summary ")),
        chunks[0],
    );
    render_usage(workflow.usage(), frame, chunks[1]);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepMark {
    Done,
    Active,
    Pending,
}

fn step_mark(index: usize, current: usize, all_done: bool) -> StepMark {
    if all_done || index < current {
        StepMark::Done
    } else if index == current {
        StepMark::Active
    } else {
        StepMark::Pending
    }
}

fn render_step_row(steps: &[(&str, StepMark)], title: &str, frame: &mut Frame, area: Rect) {
    let mut spans = vec![Span::raw(" ")];
    for (i, (label, mark)) in steps.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" ─ ", Style::default().fg(colors::DIM)));
        }
        let (icon, style) = match mark {
            StepMark::Done => ("✓", Style::default().fg(colors::ACCENT)),
            StepMark::Active => ("●", Style::default().fg(colors::ACTIVE).add_modifier(Modifier::BOLD)),
            StepMark::Pending => ("○", Style::default().fg(colors::PENDING)),
        };
        spans.push(Span::styled(format!("{} {}", icon, label), style));
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL).title(title.to_string())),
        area,
    );
}

/// Visual plan actions; `position` highlights execution progress
fn render_plan_actions(workflow: &Workflow, position: Option<(usize, usize)>, frame: &mut Frame, area: Rect) {
    let Some(plan) = &workflow.state().planning.visual_plan else {
        render_empty_message(frame, area, " Visual plan ", "Waiting for the visual plan...");
        return;
    };

    let mut items: Vec<ListItem> = plan
        .plan
        .iter()
        .enumerate()
        .map(|(i, action)| {
            let style = match position {
                Some((current, _)) if i < current => Style::default().fg(colors::ACCENT),
                _ => Style::default(),
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!(" {:>2}. ", i + 1), Style::default().fg(colors::DIM)),
                Span::styled(format!("{:<16}", action.tool.to_string()), style.add_modifier(Modifier::BOLD)),
                Span::styled(action.describe(), style),
            ]))
        })
        .collect();
    if !plan.thought_process.is_empty() {
        items.push(ListItem::new(""));
        items.push(ListItem::new(Span::styled(
            format!(" {}", plan.thought_process),
            Style::default().fg(colors::DIM).add_modifier(Modifier::ITALIC),
        )));
    }

    let title = match position {
        Some((current, total)) => format!(" Visual plan {}/{} ", current, total),
        None => format!(" Visual plan ({} actions) ", plan.len()),
    };
    frame.render_widget(List::new(items).block(Block::default().borders(Borders::ALL).title(title)), area);
}

fn render_music(workflow: &Workflow, frame: &mut Frame, area: Rect) {
    let planning = &workflow.state().planning;
    let mut lines = Vec::new();

    if let Some(selection) = &planning.selected_music {
        lines.push(Line::from(vec![
            Span::styled("♪ ", Style::default().fg(colors::ACCENT)),
            Span::styled(
                selection.track_stem().to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]));
        let full_length = workflow
            .track_durations()
            .and_then(|d| d.get(&selection.selected_track_filename).copied().flatten());
        let segment = match full_length {
            Some(len) => format!(
                "{:.1}s - {:.1}s of {:.1}s",
                selection.start_time_seconds, selection.end_time_seconds, len
            ),
            None => format!(
                "{:.1}s - {:.1}s",
                selection.start_time_seconds, selection.end_time_seconds
            ),
        };
        lines.push(field_line("Segment", segment));
        lines.push(Line::from(""));
    }

    match &planning.music_candidates {
        Some(candidates) => {
            for track in &candidates.tracks {
                lines.push(Line::from(vec![
                    Span::raw(" • "),
                    Span::raw(track.track_name.clone()),
                    Span::styled(format!(" - {}", track.artist_name), Style::default().fg(colors::DIM)),
                ]));
            }
        }
        None if planning.selected_music.is_none() => {
            lines.push(Line::from(Span::styled(
                "Waiting for music candidates...",
                Style::default().fg(colors::DIM),
            )));
        }
        None => {}
    }

    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title(" Music ")),
        area,
    );
}

fn render_usage(usage: Option<&UsageReport>, frame: &mut Frame, area: Rect) {
    let Some(usage) = usage else {
        render_empty_message(frame, area, " Token usage ", "Reported when planning completes");
        return;
    };

    let header = Row::new(vec!["Step", "Input", "Output", "Thinking", "Total"])
        .style(Style::default().fg(colors::HEADER).add_modifier(Modifier::BOLD));
    let mut rows: Vec<Row> = usage
        .usage_breakdown
        .steps()
        .iter()
        .filter_map(|(label, step)| step.map(|s| (label, s)))
        .map(|(label, step)| {
            Row::new(vec![
                label.to_string(),
                format_tokens(step.prompt_tokens),
                format_tokens(step.candidates_tokens),
                format_tokens(step.thinking_tokens),
                format_tokens(step.total_tokens),
            ])
        })
        .collect();
    rows.push(
        Row::new(vec![
            "Cost".to_string(),
            format_cost(usage.pricing.input_cost_usd),
            format_cost(usage.pricing.output_cost_usd),
            String::new(),
            format_cost(usage.pricing.total_cost_usd),
        ])
        .style(Style::default().add_modifier(Modifier::BOLD)),
    );

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(9),
            Constraint::Length(9),
            Constraint::Length(9),
            Constraint::Min(8),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(" Token usage "));
    frame.render_widget(table, area);
}

fn render_agent_log(logs: &[String], frame: &mut Frame, area: Rect) {
    if logs.is_empty() {
        render_empty_message(frame, area, " Agent log ", "No agent activity yet");
        return;
    }
    let visible = area.height.saturating_sub(2) as usize;
    let skip = logs.len().saturating_sub(visible);
    let items: Vec<ListItem> = logs
        .iter()
        .skip(skip)
        .map(|line| ListItem::new(format!(" {}", line)))
        .collect();
    let title = format!(" Agent log ({}) ", logs.len());
    frame.render_widget(List::new(items).block(Block::default().borders(Borders::ALL).title(title)), area);
}

fn render_notifications(notifications: &[Notification], frame: &mut Frame, area: Rect) {
    let lines: Vec<Line> = notifications
        .iter()
        .map(|n| {
            let (icon, color) = match n.level {
                NotificationLevel::Success => ("✓", colors::ACCENT),
                NotificationLevel::Info => ("i", colors::HEADER),
                NotificationLevel::Warning => ("!", colors::WARNING),
                NotificationLevel::Error => ("✗", colors::FAILED),
            };
            Line::from(vec![
                Span::styled(format!(" {} ", icon), Style::default().fg(color)),
                Span::styled(n.title.clone(), Style::default().fg(color).add_modifier(Modifier::BOLD)),
                Span::raw(n.description.as_deref().map(|d| format!("  {}", d)).unwrap_or_default()),
            ])
        })
        .collect();
    frame.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Notifications ")),
        area,
    );
}

fn render_footer(state: &AppState, workflow: &Workflow, frame: &mut Frame, area: Rect) {
    let content = match &state.interaction_mode {
        InteractionMode::ImageInput(text) => input_line("Image path: ", text, "(Enter to add, Esc to cancel)"),
        InteractionMode::PromptInput(text) => input_line("Prompt: ", text, "(Enter to save, Esc to cancel)"),
        _ => match &state.error_message {
            Some(error) => Line::from(Span::styled(format!(" Error: {}", error), Style::default().fg(colors::FAILED))),
            None => {
                let mut keybinds = match workflow.phase() {
                    Phase::Idle => vec![("[a]", "Add image"), ("[x]", "Remove last"), ("[p]", "Prompt"), ("[s]", "Start")],
                    _ => vec![("[r]", "Reset")],
                };
                if workflow.can_navigate() {
                    keybinds.extend([("[1/2/3]", "View phase"), ("[0]", "Live")]);
                }
                keybinds.extend([("[?]", "Help"), ("[q]", "Quit")]);

                let mut spans = vec![Span::raw(" ")];
                for (key, action) in keybinds {
                    spans.push(Span::styled(
                        key,
                        Style::default().fg(colors::KEYBIND).add_modifier(Modifier::BOLD),
                    ));
                    spans.push(Span::raw(format!(" {} ", action)));
                }
                Line::from(spans)
            }
        },
    };

    frame.render_widget(Paragraph::new(content).block(Block::default().borders(Borders::ALL)), area);
}

fn input_line<'a>(label: &'a str, text: &'a str, hint: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::styled(label, Style::default().fg(colors::KEYBIND).add_modifier(Modifier::BOLD)),
        Span::raw(text),
        Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        Span::styled(format!("  {}", hint), Style::default().fg(colors::DIM)),
    ])
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(50, 60, area);
    frame.render_widget(Clear, popup_area);

    let help_text = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default()
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
                .fg(colors::HEADER),
        )),
        Line::from(""),
        key_line("a", "Add an image by path"),
        key_line("x", "Remove the last image"),
        key_line("p", "Edit the prompt"),
        key_line("s", "Start the agent"),
        key_line("r", "Reset to idle"),
        key_line("1 / 2 / 3", "View planning / editing / done"),
        key_line("0, Esc", "Follow the live phase"),
        key_line("?", "Toggle help"),
        key_line("q", "Quit"),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Help (? to close) ")
                .style(Style::default().bg(Color::Black)),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(help, popup_area);
}

fn key_line<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(format!("{:<12}", key), Style::default().fg(colors::KEYBIND)),
        Span::raw(desc),
    ])
}

fn field_line(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!(" {:<12}", label), Style::default().fg(colors::DIM)),
        Span::raw(value),
    ])
}

fn render_empty_message(frame: &mut Frame, area: Rect, title: &str, message: &str) {
    let paragraph = Paragraph::new(Line::from(Span::styled(
        format!(" {}", message),
        Style::default().fg(colors::DIM),
    )))
    .block(Block::default().borders(Borders::ALL).title(title.to_string()));
    frame.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn phase_title(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "Idle",
        Phase::Planning => "Planning",
        Phase::Editing => "Editing",
        Phase::Done => "Done",
    }
}
