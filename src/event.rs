use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};

pub fn poll_event(timeout: Duration) -> color_eyre::Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Next key press within `timeout`. A resize returns early with `None` so
/// the caller redraws at the new size.
pub fn next_key_event(timeout: Duration) -> color_eyre::Result<Option<KeyEvent>> {
    loop {
        match poll_event(timeout)? {
            Some(Event::Key(key)) if key.kind != KeyEventKind::Release => return Ok(Some(key)),
            Some(Event::Resize(..)) => return Ok(None),
            Some(_) => continue,
            None => return Ok(None),
        }
    }
}
