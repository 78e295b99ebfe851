//! Terminal event polling
//!
//! Crossterm is polled on a dedicated thread; events reach the async runner
//! through a tokio channel.

use std::time::Duration;

use crossterm::event::{self, KeyEvent, KeyEventKind};
use eyre::Result;
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Terminal events
#[derive(Debug)]
pub enum Event {
    Key(KeyEvent),
    Resize(u16, u16),
    /// Periodic refresh
    Tick,
}

impl Event {
    /// Map a crossterm event; only key presses and resizes matter here
    fn from_terminal(evt: event::Event) -> Option<Self> {
        match evt {
            event::Event::Key(key) if key.kind == KeyEventKind::Press => Some(Self::Key(key)),
            event::Event::Resize(w, h) => Some(Self::Resize(w, h)),
            _ => None,
        }
    }
}

pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    /// Start polling with the given tick rate
    pub fn new(tick_rate: Duration) -> Self {
        debug!(?tick_rate, "EventHandler::new: called");
        let (tx, rx) = mpsc::unbounded_channel();

        std::thread::spawn(move || {
            debug!("EventHandler: polling thread started");
            loop {
                let event = if event::poll(tick_rate).unwrap_or(false) {
                    match event::read().ok().and_then(Event::from_terminal) {
                        Some(event) => event,
                        None => continue,
                    }
                } else {
                    Event::Tick
                };

                if tx.send(event).is_err() {
                    debug!("EventHandler: channel closed, exiting loop");
                    break;
                }
            }
        });

        Self { rx }
    }

    pub async fn next(&mut self) -> Result<Event> {
        let event = self.rx.recv().await.ok_or_else(|| eyre::eyre!("Event channel closed"))?;
        trace!(?event, "EventHandler::next: received event");
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEventState, KeyModifiers};

    fn key_event(kind: KeyEventKind) -> event::Event {
        event::Event::Key(KeyEvent {
            code: KeyCode::Char('s'),
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        })
    }

    #[test]
    fn test_only_key_presses_pass() {
        assert!(matches!(
            Event::from_terminal(key_event(KeyEventKind::Press)),
            Some(Event::Key(_))
        ));
        assert!(Event::from_terminal(key_event(KeyEventKind::Release)).is_none());
        assert!(matches!(
            Event::from_terminal(event::Event::Resize(80, 24)),
            Some(Event::Resize(80, 24))
        ));
        assert!(Event::from_terminal(event::Event::FocusGained).is_none());
    }
}
