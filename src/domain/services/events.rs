#[cfg(test)]
#[path = "events_test.rs"]
mod tests;

use std::io;

use anyhow::Result;
use crossterm::event::Event as CrosstermEvent;
use crossterm::event::EventStream;
use crossterm::event::MouseEventKind;
use futures::stream::LocalBoxStream;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time;
use tui_textarea::Input;
use tui_textarea::Key;

use crate::domain::models::Event;

/// Characters bound to F1 through F9, in order.
pub const SPECIAL_CHARS: [char; 9] = ['¿', '¡', 'ü', 'ñ', 'é', 'á', 'í', 'ó', 'ú'];

fn special_char(key: u8) -> Option<char> {
    if key == 0 {
        return None;
    }

    return SPECIAL_CHARS.get(usize::from(key) - 1).copied();
}

const TICK_PERIOD: time::Duration = time::Duration::from_millis(500);

pub struct EventsService {
    crossterm_events: LocalBoxStream<'static, io::Result<CrosstermEvent>>,
    events: mpsc::UnboundedReceiver<Event>,
    tick: time::Interval,
}

impl EventsService {
    pub fn new(events: mpsc::UnboundedReceiver<Event>) -> EventsService {
        return EventsService::with_stream(EventStream::new().boxed_local(), events, TICK_PERIOD);
    }

    /// Ticks keep a fixed period no matter how many other events arrive.
    pub fn with_stream(
        crossterm_events: LocalBoxStream<'static, io::Result<CrosstermEvent>>,
        events: mpsc::UnboundedReceiver<Event>,
        tick_period: time::Duration,
    ) -> EventsService {
        let mut tick = time::interval_at(time::Instant::now() + tick_period, tick_period);
        tick.set_missed_tick_behavior(time::MissedTickBehavior::Skip);

        return EventsService {
            crossterm_events,
            events,
            tick,
        };
    }

    pub fn handle_crossterm(event: CrosstermEvent) -> Option<Event> {
        match event {
            CrosstermEvent::Paste(text) => {
                return Some(Event::KeyboardPaste(text));
            }
            CrosstermEvent::Mouse(mouseevent) => {
                match mouseevent.kind {
                    MouseEventKind::ScrollUp => {
                        return Some(Event::UIScrollUp());
                    }
                    MouseEventKind::ScrollDown => {
                        return Some(Event::UIScrollDown());
                    }
                    _ => {
                        return None;
                    }
                }
            }
            CrosstermEvent::Key(keyevent) => {
                match keyevent.into() {
                    Input { key: Key::Down, .. } => {
                        return Some(Event::UIScrollDown());
                    }
                    Input { key: Key::Up, .. } => {
                        return Some(Event::UIScrollUp());
                    }
                    Input {
                        key: Key::MouseScrollDown,
                        ..
                    } => {
                        return Some(Event::UIScrollDown());
                    }
                    Input {
                        key: Key::MouseScrollUp,
                        ..
                    } => {
                        return Some(Event::UIScrollUp());
                    }
                    Input {
                        key: Key::PageDown, ..
                    } => {
                        return Some(Event::UIScrollPageDown());
                    }
                    Input {
                        key: Key::PageUp, ..
                    } => {
                        return Some(Event::UIScrollPageUp());
                    }
                    Input {
                        key: Key::Char('d'),
                        ctrl: true,
                        ..
                    } => {
                        return Some(Event::UIScrollPageDown());
                    }
                    Input {
                        key: Key::Char('u'),
                        ctrl: true,
                        ..
                    } => {
                        return Some(Event::UIScrollPageUp());
                    }
                    Input {
                        key: Key::Char('c'),
                        ctrl: true,
                        ..
                    } => {
                        return Some(Event::KeyboardCTRLC());
                    }
                    Input {
                        key: Key::Char('r'),
                        ctrl: true,
                        ..
                    } => {
                        return Some(Event::KeyboardCTRLR());
                    }
                    Input {
                        key: Key::Char('f'),
                        ctrl: true,
                        ..
                    } => {
                        return Some(Event::KeyboardCTRLF());
                    }
                    Input {
                        key: Key::Char('n'),
                        ctrl: true,
                        ..
                    } => {
                        return Some(Event::KeyboardCTRLN());
                    }
                    Input {
                        key: Key::Char('p'),
                        ctrl: true,
                        ..
                    } => {
                        return Some(Event::KeyboardCTRLP());
                    }
                    Input {
                        key: Key::Char('t'),
                        ctrl: true,
                        ..
                    } => {
                        return Some(Event::KeyboardCTRLT());
                    }
                    Input { key: Key::Esc, .. } => {
                        return Some(Event::KeyboardEsc());
                    }
                    Input {
                        key: Key::F(key), ..
                    } => {
                        return special_char(key).map(Event::KeyboardSpecialChar);
                    }
                    Input {
                        key: Key::Enter, ..
                    } => {
                        return Some(Event::KeyboardEnter());
                    }
                    input => {
                        return Some(Event::KeyboardCharInput(input));
                    }
                }
            }
            _ => return None,
        }
    }

    pub async fn next(&mut self) -> Result<Event> {
        loop {
            let evt = tokio::select! {
                event = self.events.recv() => event,
                event = self.crossterm_events.next() => match event {
                    Some(Ok(input)) => EventsService::handle_crossterm(input),
                    Some(Err(_)) => None,
                    None => None
                },
                _ = self.tick.tick() => Some(Event::UITick())
            };

            if let Some(event) = evt {
                return Ok(event);
            }
        }
    }
}
