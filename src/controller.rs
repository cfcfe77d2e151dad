use std::time::Duration;
use tracing::trace;

use crate::model::{Model, TVConfig};
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent};
use tabview::ViewError;

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Quit,
    Exit,
    Help,
    NextPage,
    PreviousPage,
    FirstPage,
    LastPage,
    LargerPageSize,
    SmallerPageSize,
    MoveLeft,
    MoveRight,
    ToggleSort,
    Filter,
    JumpToPage,
    ClearFilter,
    CopyPage,
    RawKey(KeyEvent),
}

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &TVConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, ViewError> {
        if event::poll(Duration::from_millis(self.event_poll_time))?
            && let Event::Key(key) = event::read()?
            && key.kind == event::KeyEventKind::Press
        {
            // While a filter input is open every key goes to the input line.
            if model.raw_keyevents() {
                return Ok(Some(Message::RawKey(key)));
            }
            return Ok(self.handle_key(key));
        }
        Ok(None)
    }

    fn handle_key(&self, key: KeyEvent) -> Option<Message> {
        let message = match key.code {
            KeyCode::Char('q') => Some(Message::Quit),
            KeyCode::Esc => Some(Message::Exit),
            KeyCode::Char('?') => Some(Message::Help),
            KeyCode::Char('n') | KeyCode::PageDown => Some(Message::NextPage),
            KeyCode::Char('p') | KeyCode::PageUp => Some(Message::PreviousPage),
            KeyCode::Char('g') | KeyCode::Home => Some(Message::FirstPage),
            KeyCode::Char('G') | KeyCode::End => Some(Message::LastPage),
            KeyCode::Char('+') => Some(Message::LargerPageSize),
            KeyCode::Char('-') => Some(Message::SmallerPageSize),
            KeyCode::Char('h') | KeyCode::Left => Some(Message::MoveLeft),
            KeyCode::Char('l') | KeyCode::Right => Some(Message::MoveRight),
            KeyCode::Char('s') => Some(Message::ToggleSort),
            KeyCode::Char('/') | KeyCode::Char('f') => Some(Message::Filter),
            KeyCode::Char(':') => Some(Message::JumpToPage),
            KeyCode::Char('x') => Some(Message::ClearFilter),
            KeyCode::Char('y') => Some(Message::CopyPage),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyModifiers;

    #[test]
    fn maps_navigation_keys() {
        let controller = Controller {
            event_poll_time: 0,
        };
        let key = |code| KeyEvent::new(code, KeyModifiers::NONE);
        assert_eq!(controller.handle_key(key(KeyCode::Char('n'))), Some(Message::NextPage));
        assert_eq!(controller.handle_key(key(KeyCode::PageUp)), Some(Message::PreviousPage));
        assert_eq!(controller.handle_key(key(KeyCode::Char('s'))), Some(Message::ToggleSort));
        assert_eq!(controller.handle_key(key(KeyCode::Char('/'))), Some(Message::Filter));
        assert_eq!(controller.handle_key(key(KeyCode::Char(':'))), Some(Message::JumpToPage));
        assert_eq!(controller.handle_key(key(KeyCode::Char('z'))), None);
    }
}
