use std::io;

use anyhow::Result;
use crossterm::cursor;
use crossterm::event::DisableBracketedPaste;
use crossterm::event::DisableMouseCapture;
use crossterm::event::EnableBracketedPaste;
use crossterm::event::EnableMouseCapture;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use ratatui::backend::CrosstermBackend;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Scrollbar;
use ratatui::widgets::ScrollbarOrientation;
use ratatui::Terminal;
use tokio::sync::mpsc;

use crate::domain::models::Action;
use crate::domain::models::Event;
use crate::domain::models::Loading;
use crate::domain::models::RecordingState;
use crate::domain::models::TextArea;
use crate::domain::services::actions::help_text;
use crate::domain::services::events::EventsService;
use crate::domain::services::render_panel;
use crate::domain::services::AppState;
use crate::domain::services::FeedbackPanel;

fn status_line(app_state: &AppState) -> Line<'static> {
    let session = &app_state.session;
    if let Some(status) = &session.status {
        let mut style = Style::default().fg(Color::Yellow);
        if session.last_error.as_ref() == Some(&status.text) {
            style = Style::default().fg(Color::Red);
        }
        return Line::from(Span::styled(status.text.to_string(), style));
    }

    if session.playing {
        return Line::from("▶ Playing response (CTRL+P to stop)");
    }
    if session.can_play() {
        return Line::from(Span::styled(
            "Audio available (CTRL+P to play)",
            Style::default().fg(Color::DarkGray),
        ));
    }

    return Line::from("");
}

fn render<B: Backend>(frame: &mut Frame<B>, app_state: &mut AppState, textarea: &tui_textarea::TextArea) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Max(4),
        ])
        .split(frame.size());

    if layout[0].width != app_state.last_known_width
        || layout[0].height != app_state.last_known_height
    {
        app_state.set_rect(layout[0]);
    }

    app_state
        .bubble_list
        .render(frame, layout[0], app_state.scroll.position);
    frame.render_stateful_widget(
        Scrollbar::new(ScrollbarOrientation::VerticalRight),
        layout[0].inner(&Margin {
            vertical: 1,
            horizontal: 0,
        }),
        &mut app_state.scroll.scrollbar_state,
    );

    frame.render_widget(
        Paragraph::new(status_line(app_state)).alignment(Alignment::Center),
        layout[1],
    );

    match app_state.session.recording {
        RecordingState::Recording => {
            Loading::new("Recording… (CTRL+T to stop)").render(frame, layout[2]);
        }
        RecordingState::Transcribing => {
            Loading::new("Processing audio…").render(frame, layout[2]);
        }
        RecordingState::Idle => {
            if app_state.is_busy() {
                Loading::default().render(frame, layout[2]);
            } else {
                frame.render_widget(textarea.widget(), layout[2]);
            }
        }
    }

    let area = frame.size();
    if app_state.help_visible {
        let lines = help_text()
            .split('\n')
            .map(|line| return Line::from(line.to_string()))
            .collect::<Vec<Line>>();
        render_panel(frame, area, "Help (Esc to close)", lines);
    } else if app_state.session.feedback_visible {
        if let Some(feedback) = &app_state.session.feedback {
            FeedbackPanel::new(feedback).render(frame, area);
        }
    }
}

async fn start_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app_state: &mut AppState,
    tx: mpsc::UnboundedSender<Action>,
    rx: mpsc::UnboundedReceiver<Event>,
) -> Result<()> {
    let mut textarea = TextArea::default();
    let mut events = EventsService::new(rx);

    loop {
        terminal.draw(|frame| render(frame, app_state, &textarea))?;

        match events.next().await? {
            Event::SessionUpdated(session) => {
                app_state.handle_session_update(*session);
            }
            Event::TranscriptReady(text) => {
                textarea = TextArea::with_text(&text);
            }
            Event::UITick() => {
                tx.send(Action::Tick())?;
            }
            Event::UIScrollDown() => {
                app_state.scroll.down();
            }
            Event::UIScrollUp() => {
                app_state.scroll.up();
            }
            Event::UIScrollPageDown() => {
                app_state.scroll.down_page();
            }
            Event::UIScrollPageUp() => {
                app_state.scroll.up_page();
            }
            Event::KeyboardCTRLC() => {
                break;
            }
            Event::KeyboardEsc() => {
                app_state.dismiss_panel(&tx)?;
            }
            Event::KeyboardCTRLR() => {
                app_state.resubmit(&tx)?;
            }
            Event::KeyboardCTRLN() => {
                app_state.new_chat(&tx)?;
            }
            Event::KeyboardCTRLF() => {
                app_state.request_feedback(&tx)?;
            }
            Event::KeyboardCTRLT() => {
                app_state.toggle_recording(&textarea.lines().join("\n"), &tx)?;
            }
            Event::KeyboardCTRLP() => {
                app_state.toggle_playback(&tx)?;
            }
            Event::KeyboardEnter() => {
                if app_state.is_busy() || app_state.panel_visible() {
                    continue;
                }

                let input_str = textarea.lines().join("\n");
                if input_str.trim().is_empty() {
                    continue;
                }

                let (should_break, should_continue) =
                    app_state.handle_slash_commands(&input_str, &tx)?;
                if should_break {
                    break;
                }
                textarea = TextArea::default();
                if should_continue {
                    continue;
                }

                app_state.send_message(&input_str, &tx)?;
            }
            Event::KeyboardPaste(text) => {
                if !app_state.is_busy() {
                    textarea.insert_str(text);
                }
            }
            Event::KeyboardSpecialChar(special_char) => {
                if !app_state.is_busy() {
                    textarea.insert_char(special_char);
                }
            }
            Event::KeyboardCharInput(input) => {
                if !app_state.is_busy() {
                    textarea.input(input);
                }
            }
        }
    }

    return Ok(());
}

pub fn destruct_terminal_for_panic() {
    if disable_raw_mode().is_err() {
        return;
    }
    let _ = crossterm::execute!(
        io::stdout(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste,
        cursor::Show
    );
}

pub async fn start(
    tx: mpsc::UnboundedSender<Action>,
    rx: mpsc::UnboundedReceiver<Event>,
) -> Result<()> {
    let stdout = io::stdout();
    let mut stdout = stdout.lock();

    enable_raw_mode()?;
    crossterm::execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;
    let term_backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(term_backend)?;
    let mut app_state = AppState::default();

    start_loop(&mut terminal, &mut app_state, tx, rx).await?;

    disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    return Ok(());
}
