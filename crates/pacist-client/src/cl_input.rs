// cl_input.rs -- player input: keyboard polling and scripted command files
//
// A commands file reuses the entity-script token syntax, so PASSO and POS
// directives (with their arguments) are skipped; every other token sends
// its first character, uppercased, as a PLAY command. The script loops.

use std::path::Path;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};

use pacist_common::parser::tokenize;
use pacist_common::{GameError, GameResult};

pub struct Script {
    tokens: Vec<String>,
    cursor: usize,
}

impl Script {
    pub fn load(path: &Path) -> GameResult<Script> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| GameError::Load(format!("{}: {e}", path.display())))?;
        Ok(Script {
            tokens: tokenize(&text).map(str::to_owned).collect(),
            cursor: 0,
        })
    }

    /// Next command key, rewinding at the end of the script. None when the
    /// script contains no command tokens at all.
    pub fn next_key(&mut self) -> Option<u8> {
        let mut seen = 0;
        while seen < self.tokens.len() {
            if self.cursor >= self.tokens.len() {
                self.cursor = 0;
            }
            let tok = &self.tokens[self.cursor];
            self.cursor += 1;
            seen += 1;

            match tok.as_str() {
                "PASSO" => {
                    self.cursor += 1;
                    seen += 1;
                }
                "POS" => {
                    self.cursor += 2;
                    seen += 2;
                }
                _ => return Some(tok.as_bytes()[0].to_ascii_uppercase()),
            }
        }
        None
    }
}

/// Poll the keyboard for up to `timeout`; printable keys come back
/// uppercased. Terminal trouble reads as "no key".
pub fn poll_key(timeout: Duration) -> Option<u8> {
    if !event::poll(timeout).unwrap_or(false) {
        return None;
    }
    match event::read() {
        Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => match key.code {
            KeyCode::Char(c) if c.is_ascii() => Some((c as u8).to_ascii_uppercase()),
            KeyCode::Esc => Some(b'Q'),
            _ => None,
        },
        _ => None,
    }
}
