use chrono::Local;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use rand::Rng;
use time_humanize::{Accuracy, HumanTime, Tense};

use lockbuster::{
    app::App,
    record_store::RecordStore,
    session::{Mode, Phase, SessionOutcome},
    util::format_secs,
};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

/// Whole-screen view of the game in its current phase
pub struct GameView<'a, S: RecordStore, R: Rng> {
    pub app: &'a App<S, R>,
}

impl<S: RecordStore, R: Rng> Widget for GameView<'_, S, R> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let app = self.app;
        match app.session.phase() {
            Phase::Welcome => render_welcome(app, area, buf),
            Phase::AwaitingGesture | Phase::Animating => render_active(app, area, buf),
            Phase::Finished => {
                if let Some(outcome) = app.session.outcome() {
                    render_finished(outcome, area, buf);
                }
            }
        }
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn italic() -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}

fn centered_rows(area: Rect, rows: u16) -> Vec<Rect> {
    let pad = area.height.saturating_sub(rows) / 2;
    let mut constraints = vec![Constraint::Length(pad)];
    constraints.extend((0..rows).map(|_| Constraint::Length(1)));
    constraints.push(Constraint::Min(0));

    Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints(constraints)
        .split(area)
        .iter()
        .skip(1)
        .take(rows as usize)
        .copied()
        .collect()
}

fn render_lines(lines: Vec<Line<'static>>, area: Rect, buf: &mut Buffer) {
    let rows = centered_rows(area, lines.len() as u16);
    for (line, row) in lines.into_iter().zip(rows) {
        Paragraph::new(line)
            .alignment(Alignment::Center)
            .render(row, buf);
    }
}

fn render_welcome<S: RecordStore, R: Rng>(app: &App<S, R>, area: Rect, buf: &mut Buffer) {
    let mut lines = vec![
        Line::from(Span::styled(
            "Welcome to Lockbuster!",
            bold().fg(Color::Cyan),
        )),
        Line::default(),
        Line::from(Span::styled("(1) Speedrun Mode", bold())),
        Line::from(Span::styled("(2) Countdown Mode", bold())),
        Line::from(Span::styled(
            "(3) Chess Clock",
            bold().add_modifier(Modifier::DIM),
        )),
        Line::default(),
    ];
    if let Some(notice) = &app.notice {
        lines.push(Line::from(Span::styled(
            notice.clone(),
            Style::default().fg(Color::Yellow),
        )));
    } else {
        lines.push(Line::default());
    }
    lines.push(Line::from(Span::styled("(esc)ape", italic())));

    render_lines(lines, area, buf);
}

fn render_active<S: RecordStore, R: Rng>(app: &App<S, R>, area: Rect, buf: &mut Buffer) {
    let session = &app.session;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(2), // gesture name + key hint
            Constraint::Min(5),    // lock
            Constraint::Length(1), // score
            Constraint::Length(1), // timer
            Constraint::Length(1), // legend
        ])
        .split(area);

    let (title, hint, frame, border) = match (session.prompt(), session.animation()) {
        (Some(prompt), _) => (
            prompt.gesture.name(),
            format!("press {}", app.keymap.chord_for(prompt.gesture)),
            prompt.image.frame_name(1),
            Color::White,
        ),
        (None, Some(animation)) => (
            // keeps the layout steady while the clip plays
            String::from(" "),
            String::new(),
            animation
                .image
                .frame_name(animation.frame_at(app.now, session.config().clip_secs)),
            Color::Green,
        ),
        (None, None) => (String::new(), String::new(), String::new(), Color::White),
    };

    Paragraph::new(vec![
        Line::from(Span::styled(title, bold().fg(Color::Magenta))),
        Line::from(Span::styled(hint, italic().add_modifier(Modifier::DIM))),
    ])
    .alignment(Alignment::Center)
    .render(chunks[0], buf);

    Paragraph::new(Span::styled(frame, bold()))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border)),
        )
        .render(chunks[1], buf);

    Paragraph::new(Span::styled(format!("Score: {}", session.score()), bold()))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    let timer = match session.remaining() {
        Some(remaining) => format!("{:.2} seconds remaining", remaining),
        None => session
            .outcome()
            .and_then(|outcome| outcome.final_elapsed)
            .or_else(|| session.elapsed(app.now))
            .map(|elapsed| format!("{:.1}s", elapsed))
            .unwrap_or_default(),
    };
    Paragraph::new(Span::styled(timer, bold().add_modifier(Modifier::DIM)))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

    Paragraph::new(Span::styled("(backspace) menu / (esc)ape", italic())).render(chunks[4], buf);
}

fn set_ago(outcome: &SessionOutcome) -> Option<String> {
    let set_at = outcome.previous_best_set_at?;
    let age = (Local::now() - set_at).to_std().ok()?;
    Some(format!(
        "(set {})",
        HumanTime::from(age).to_text_en(Accuracy::Rough, Tense::Past)
    ))
}

pub fn finished_lines(outcome: &SessionOutcome) -> Vec<String> {
    let mut lines = vec![String::from("Finished!"), String::new()];

    match outcome.mode {
        Mode::Speedrun => {
            let time = outcome.final_elapsed.unwrap_or_default();
            lines.push(format!("Time: {}", format_secs(time)));
            if outcome.new_best {
                lines.push(String::from("New best time!"));
                if let Some(improved) = outcome.improvement() {
                    lines.push(format!("(Improved by {:.3}s)", improved));
                }
            } else {
                lines.push(format!("Best time: {:.3}s", outcome.previous_best));
            }
        }
        Mode::Countdown | Mode::ChessClock => {
            lines.push(format!("Score: {}", outcome.score));
            if outcome.new_best {
                lines.push(String::from("New highscore!"));
                if let Some(improved) = outcome.improvement() {
                    lines.push(format!("Improved by {}", improved as i64));
                }
            } else {
                lines.push(format!("Highscore: {}", outcome.previous_best as i64));
            }
        }
    }

    if outcome.previous_best > 0.0 {
        if let Some(ago) = set_ago(outcome) {
            lines.push(ago);
        }
    }
    if let Some(err) = &outcome.persist_error {
        lines.push(format!("could not save record: {err}"));
    }
    lines
}

fn render_finished(outcome: &SessionOutcome, area: Rect, buf: &mut Buffer) {
    let mut lines: Vec<Line> = finished_lines(outcome)
        .into_iter()
        .enumerate()
        .map(|(idx, text)| {
            let style = match idx {
                0 => bold().fg(Color::Green),
                2 => bold(),
                _ => Style::default(),
            };
            Line::from(Span::styled(text, style))
        })
        .collect();
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "(r)etry / (b)ack / (esc)ape",
        italic(),
    )));

    render_lines(lines, area, buf);
}
