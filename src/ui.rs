use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::effects::ImpactKind;
use crate::engine::Phase;
use crate::util::{format_secs, mask_name};
use crate::App;

const MEDALS: [&str; 3] = ["🥇", "🥈", "🥉"];

fn kind_color(kind: ImpactKind) -> Color {
    match kind {
        ImpactKind::Correct => Color::Green,
        ImpactKind::WrongShape => Color::Red,
        ImpactKind::Duplicate => Color::Yellow,
        ImpactKind::NotAWord => Color::Magenta,
    }
}

fn kind_mark(kind: ImpactKind) -> &'static str {
    match kind {
        ImpactKind::Correct => "✓",
        ImpactKind::WrongShape => "✗",
        ImpactKind::Duplicate => "↩",
        ImpactKind::NotAWord => "?",
    }
}

fn timer_color(secs: f64) -> Color {
    if secs <= 2.0 {
        Color::Red
    } else if secs <= 3.0 {
        Color::Yellow
    } else {
        Color::Green
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(2)
            .vertical_margin(1)
            .constraints([
                Constraint::Length(1), // timer + score
                Constraint::Length(1), // countdown bar
                Constraint::Length(3), // target consonants
                Constraint::Length(1), // floating impact labels
                Constraint::Length(1), // status line
                Constraint::Length(3), // input
                Constraint::Length(4), // dictionary entry
                Constraint::Min(0),    // history | ranking
                Constraint::Length(1), // key help
            ])
            .split(area);

        self.render_header(chunks[0], buf);
        self.render_countdown(chunks[1], buf);
        self.render_targets(chunks[2], buf);
        self.render_impacts(chunks[3], buf);
        self.render_feedback(chunks[4], buf);
        self.render_input(chunks[5], buf);
        self.render_entry(chunks[6], buf);
        self.render_boards(chunks[7], buf);
        self.render_help(chunks[8], buf);
    }
}

impl App {
    fn render_header(&self, area: Rect, buf: &mut Buffer) {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let dim = Style::default().add_modifier(Modifier::DIM);

        let secs = match self.engine.phase() {
            Phase::Idle => self.engine.config().round_secs,
            _ => self.engine.time_remaining(),
        };

        let line = Line::from(vec![
            Span::styled("TIME ", dim),
            Span::styled(format_secs(secs), bold.fg(timer_color(secs))),
            Span::raw("    "),
            Span::styled("SCORE ", dim),
            Span::styled(self.engine.score().to_string(), bold.fg(Color::Cyan)),
        ]);
        Paragraph::new(line).render(area, buf);
    }

    fn render_countdown(&self, area: Rect, buf: &mut Buffer) {
        let total = self.engine.config().round_secs;
        let ratio = match self.engine.phase() {
            Phase::Idle => 1.0,
            _ if total > 0.0 => (self.engine.time_remaining() / total).clamp(0.0, 1.0),
            _ => 0.0,
        };
        Gauge::default()
            .gauge_style(Style::default().fg(timer_color(self.engine.time_remaining())))
            .label("")
            .ratio(ratio)
            .render(area, buf);
    }

    fn render_targets(&self, area: Rect, buf: &mut Buffer) {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let (text, style) = match self.engine.phase() {
            Phase::Idle => (
                vec!["?"; self.engine.config().consonant_count].join("  "),
                Style::default().add_modifier(Modifier::DIM),
            ),
            Phase::Break => (
                "✨ 다음 초성 준비 중...".to_string(),
                Style::default().add_modifier(Modifier::DIM),
            ),
            Phase::GameOver => (
                format!("GAME OVER · {}점", self.final_score.unwrap_or(0)),
                bold.fg(Color::Red),
            ),
            _ => (
                self.engine
                    .targets()
                    .iter()
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>()
                    .join("  "),
                bold.fg(Color::Cyan),
            ),
        };

        Paragraph::new(Span::styled(text, style))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL))
            .render(area, buf);
    }

    fn render_impacts(&self, area: Rect, buf: &mut Buffer) {
        let mut impacts: Vec<_> = self.effects.impacts().iter().collect();
        impacts.sort_by_key(|i| i.x_pct);

        let mut spans: Vec<Span> = Vec::new();
        let mut col: u16 = 0;
        for impact in impacts {
            let target = area.width.saturating_mul(impact.x_pct) / 100;
            if target > col {
                spans.push(Span::raw(" ".repeat((target - col) as usize)));
                col = target;
            }
            spans.push(Span::styled(
                impact.text.clone(),
                Style::default()
                    .fg(kind_color(impact.kind))
                    .add_modifier(Modifier::BOLD),
            ));
            col += impact.text.width() as u16;
        }
        Paragraph::new(Line::from(spans)).render(area, buf);
    }

    fn render_feedback(&self, area: Rect, buf: &mut Buffer) {
        if let Some((message, kind)) = self.effects.feedback() {
            Paragraph::new(Span::styled(
                message,
                Style::default().fg(kind_color(kind)),
            ))
            .alignment(Alignment::Center)
            .render(area, buf);
        }
    }

    fn render_input(&self, area: Rect, buf: &mut Buffer) {
        let dim = Style::default().add_modifier(Modifier::DIM);
        let targets: String = self.engine.targets().iter().collect();

        let content = match self.engine.phase() {
            Phase::Idle => Line::from(Span::styled("게임을 시작하세요 (Enter)", dim)),
            Phase::Break => Line::from(Span::styled("잠시 대기...", dim)),
            Phase::GameOver => Line::from(Span::styled("게임 종료", dim)),
            Phase::Playing { pending: Some(_) } | Phase::Checking { pending: Some(_) } => {
                Line::from(Span::styled("단어 검증 중...", dim))
            }
            _ if self.input.is_empty() => {
                Line::from(Span::styled(format!("({targets}) 단어 입력"), dim))
            }
            _ => Line::from(vec![
                Span::raw(self.input.clone()),
                Span::styled("▌", Style::default().add_modifier(Modifier::SLOW_BLINK)),
            ]),
        };

        let border_style = match self.engine.phase() {
            Phase::Playing { .. } => Style::default().fg(Color::Cyan),
            _ => dim,
        };
        Paragraph::new(content)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border_style),
            )
            .render(area, buf);
    }

    fn render_entry(&self, area: Rect, buf: &mut Buffer) {
        let Some(entry) = &self.last_entry else {
            return;
        };
        if self.engine.phase().is_terminal() {
            return;
        }

        let mut title = entry.word.clone();
        if !entry.pos.is_empty() {
            title.push_str(&format!(" ({})", entry.pos));
        }
        let lines = vec![
            Line::from(Span::styled(
                title,
                Style::default().add_modifier(Modifier::BOLD).fg(Color::Green),
            )),
            Line::from(Span::styled(
                entry.definition.clone(),
                Style::default().add_modifier(Modifier::DIM),
            )),
        ];
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("표준국어대사전"),
            )
            .render(area, buf);
    }

    fn render_boards(&self, area: Rect, buf: &mut Buffer) {
        let halves = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);

        self.render_history(halves[0], buf);
        self.render_ranking(halves[1], buf);
    }

    fn render_history(&self, area: Rect, buf: &mut Buffer) {
        let visible = area.height.saturating_sub(2) as usize;
        let lines: Vec<Line> = self
            .history
            .iter()
            .take(visible)
            .map(|item| {
                let color = kind_color(item.kind);
                let mut spans = vec![
                    Span::styled(format!("{} ", kind_mark(item.kind)), Style::default().fg(color)),
                    Span::styled(
                        item.word.clone(),
                        Style::default().fg(color).add_modifier(Modifier::BOLD),
                    ),
                ];
                if let Some(entry) = &item.entry {
                    spans.push(Span::styled(
                        format!("  {}", entry.definition),
                        Style::default().add_modifier(Modifier::DIM),
                    ));
                }
                Line::from(spans)
            })
            .collect();

        Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("WORD HISTORY ({})", self.history.len())),
            )
            .render(area, buf);
    }

    fn render_ranking(&self, area: Rect, buf: &mut Buffer) {
        let visible = area.height.saturating_sub(2) as usize;
        let lines: Vec<Line> = if self.ranking.is_empty() {
            vec![Line::from(Span::styled(
                "아직 기록이 없어요",
                Style::default().add_modifier(Modifier::DIM),
            ))]
        } else {
            self.ranking
                .iter()
                .take(visible)
                .enumerate()
                .map(|(i, entry)| {
                    let badge = MEDALS
                        .get(i)
                        .map(|m| (*m).to_string())
                        .unwrap_or_else(|| format!("{}.", i + 1));
                    Line::from(vec![
                        Span::raw(format!("{badge} ")),
                        Span::raw(mask_name(&entry.name)),
                        Span::styled(
                            format!("  {}점", entry.score),
                            Style::default()
                                .fg(Color::Cyan)
                                .add_modifier(Modifier::BOLD),
                        ),
                    ])
                })
                .collect()
        };

        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("🏆 TOP 10"))
            .render(area, buf);
    }

    fn render_help(&self, area: Rect, buf: &mut Buffer) {
        let help = match self.engine.phase() {
            Phase::Idle => "(enter) 시작  (esc) 종료",
            Phase::GameOver => "(enter/r) 다시 시작  (esc) 종료",
            _ => "(enter) 제출  (esc) 게임 종료",
        };
        Paragraph::new(Span::styled(
            help,
            Style::default()
                .add_modifier(Modifier::DIM)
                .add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(area, buf);
    }
}
