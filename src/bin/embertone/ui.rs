//! Minimal transport display: BPM, loop/speed state, and active voice
//! count, redrawn at ~60fps with keyboard control — a trimmed-down cousin
//! of the donor's `ui::transport` widget, without the waveform/timeline
//! panes this demo has no audio-visualization ring buffer to feed.

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event as TermEvent, KeyCode, KeyEventKind};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::{DefaultTerminal, Frame};

use embertone::runtime::Workstation;

#[derive(Clone, Copy)]
pub struct Transport {
    pub bpm: u8,
    pub speed_percent: u8,
    pub looping: bool,
    pub playing: bool,
}

pub struct UiApp {
    transport: Transport,
    should_quit: bool,
}

impl UiApp {
    pub fn new(transport: Transport) -> Self {
        Self { transport, should_quit: false }
    }

    pub fn run(&mut self, terminal: &mut DefaultTerminal, workstation: &Workstation) -> EyreResult<()> {
        while !self.should_quit {
            terminal.draw(|frame| self.render(frame))?;

            if event::poll(std::time::Duration::from_millis(16))? {
                if let TermEvent::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, workstation);
                    }
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode, workstation: &Workstation) {
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char(' ') => {
                if self.transport.playing {
                    workstation.pause();
                } else {
                    workstation.resume();
                }
                self.transport.playing = !self.transport.playing;
            }
            KeyCode::Char('l') => {
                self.transport.looping = !self.transport.looping;
                workstation.set_loop(self.transport.looping);
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.transport.speed_percent = (self.transport.speed_percent + 10).min(200);
                workstation.set_speed(self.transport.speed_percent);
            }
            KeyCode::Char('-') => {
                self.transport.speed_percent = self.transport.speed_percent.saturating_sub(10).max(1);
                workstation.set_speed(self.transport.speed_percent);
            }
            _ => {}
        }
    }

    fn render(&self, frame: &mut Frame) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(1)])
            .split(frame.area());

        let play_symbol = if self.transport.playing { "▶" } else { "⏸" };
        let line = Line::from(vec![
            Span::styled(format!(" BPM: {}  ", self.transport.bpm), Style::default().fg(Color::Cyan)),
            Span::styled(
                format!("{play_symbol} {}  ", if self.transport.playing { "Playing" } else { "Paused" }),
                Style::default().fg(if self.transport.playing { Color::Green } else { Color::Yellow }),
            ),
            Span::styled(
                format!("Speed: {}%  ", self.transport.speed_percent),
                Style::default().fg(Color::White),
            ),
            Span::styled(
                format!("Loop: {}", if self.transport.looping { "on" } else { "off" }),
                Style::default().fg(Color::White),
            ),
        ]);
        let transport = Paragraph::new(line).block(Block::default().title(" embertone ").borders(Borders::ALL));
        frame.render_widget(transport, layout[0]);

        let help = Paragraph::new("space: play/pause   l: loop   +/-: speed   q: quit")
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(help, layout[1]);
    }
}
