// cl_scrn.rs -- terminal rendering of received snapshots
//
// The screen degrades to a no-op when the terminal cannot be set up (for
// instance when output is piped), so scripted runs work headless.

use std::io::{self, Write};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::style::Print;
use crossterm::terminal::{
    self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{execute, queue};

use pacist_common::protocol::BoardFrame;

pub struct Screen {
    active: bool,
}

impl Screen {
    pub fn init() -> Screen {
        if terminal::enable_raw_mode().is_err() {
            return Screen::inactive();
        }
        if execute!(io::stdout(), EnterAlternateScreen, Hide).is_err() {
            let _ = terminal::disable_raw_mode();
            return Screen::inactive();
        }
        Screen { active: true }
    }

    pub fn inactive() -> Screen {
        Screen { active: false }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn draw(&mut self, frame: &BoardFrame) {
        if self.active {
            let _ = self.try_draw(frame);
        }
    }

    fn try_draw(&mut self, frame: &BoardFrame) -> io::Result<()> {
        let mut out = io::stdout();
        queue!(out, MoveTo(0, 0), Clear(ClearType::All))?;

        let width = frame.width as usize;
        for (row, cells) in frame.data.chunks(width).enumerate() {
            queue!(
                out,
                MoveTo(0, row as u16),
                Print(String::from_utf8_lossy(cells))
            )?;
        }

        let status_row = frame.height as u16;
        queue!(
            out,
            MoveTo(0, status_row),
            Print(format!("Points: {}   Tempo: {} ms", frame.points, frame.tempo))
        )?;

        if frame.game_over != 0 {
            queue!(out, MoveTo(0, status_row + 1), Print("GAME OVER"))?;
        } else if frame.victory != 0 {
            queue!(out, MoveTo(0, status_row + 1), Print("LEVEL COMPLETE"))?;
        }

        out.flush()
    }

    pub fn cleanup(&mut self) {
        if self.active {
            let _ = execute!(io::stdout(), Show, LeaveAlternateScreen);
            let _ = terminal::disable_raw_mode();
            self.active = false;
        }
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        self.cleanup();
    }
}
