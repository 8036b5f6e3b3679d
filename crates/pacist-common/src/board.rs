// board.rs -- the per-session game world
//
// A board is owned by one session and never shared between sessions. All
// mutable fields are protected by the session's world lock; the board type
// itself carries no synchronization.

use bitflags::bitflags;

/// Maximum number of ghosts a level may declare; extra MON entries are
/// ignored by the loader.
pub const MAX_GHOSTS: usize = 8;

/// Cap on an entity's expanded move script.
pub const MAX_MOVES: usize = 256;

/// Points awarded for eating one dot.
pub const DOT_POINTS: i32 = 10;

bitflags! {
    /// Static terrain plus the mutable dot flag for one cell.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CellFlags: u8 {
        const WALL = 1 << 0;
        const DOT = 1 << 1;
        const PORTAL = 1 << 2;
    }
}

/// One tick's worth of entity movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Up,
    Left,
    Down,
    Right,
    /// Hold position for this tick.
    Wait,
    /// Toggle a ghost's charged state (script-only).
    Charge,
}

impl Command {
    /// Map an uppercase key byte to a command. Unknown bytes map to `None`
    /// and are ignored by the actors.
    pub fn from_key(key: u8) -> Option<Command> {
        match key.to_ascii_uppercase() {
            b'W' => Some(Command::Up),
            b'A' => Some(Command::Left),
            b'S' => Some(Command::Down),
            b'D' => Some(Command::Right),
            b'T' => Some(Command::Wait),
            b'C' => Some(Command::Charge),
            _ => None,
        }
    }

    /// Unit step in grid coordinates; y grows downward.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Command::Up => (0, -1),
            Command::Left => (-1, 0),
            Command::Down => (0, 1),
            Command::Right => (1, 0),
            Command::Wait | Command::Charge => (0, 0),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Pacman {
    pub x: i32,
    pub y: i32,
    pub alive: bool,
    pub points: i32,
    /// Expanded scripted moves, one entry per tick; empty means the pacman
    /// is driven by client input.
    pub moves: Vec<Command>,
    pub cursor: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Ghost {
    pub x: i32,
    pub y: i32,
    pub charged: bool,
    pub moves: Vec<Command>,
    pub cursor: usize,
}

#[derive(Debug, Clone)]
pub struct Board {
    pub width: i32,
    pub height: i32,
    /// Row-major, `width * height` cells.
    pub cells: Vec<CellFlags>,
    pub pacman: Pacman,
    /// A ghost's id is its index here.
    pub ghosts: Vec<Ghost>,
    /// Tick period in milliseconds; 0 selects the 100 ms fallback.
    pub tempo: i32,
    /// Single-slot mailbox for the latest uncommitted player command.
    pub pending_input: Option<u8>,
    pub running: bool,
    pub exit_requested: bool,
}

impl Board {
    /// An all-floor board with a manual pacman at (1,1). Levels loaded from
    /// disk go through the parser instead.
    pub fn new(width: i32, height: i32) -> Board {
        Board {
            width,
            height,
            cells: vec![CellFlags::empty(); (width * height) as usize],
            pacman: Pacman {
                x: 1,
                y: 1,
                alive: true,
                ..Pacman::default()
            },
            ghosts: Vec::new(),
            tempo: 0,
            pending_input: None,
            running: true,
            exit_requested: false,
        }
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    pub fn cell(&self, x: i32, y: i32) -> CellFlags {
        self.cells[(y * self.width + x) as usize]
    }

    pub fn cell_mut(&mut self, x: i32, y: i32) -> &mut CellFlags {
        let idx = (y * self.width + x) as usize;
        &mut self.cells[idx]
    }

    /// Effective tick period for the actors.
    pub fn tick_ms(&self) -> u64 {
        if self.tempo > 0 {
            self.tempo as u64
        } else {
            100
        }
    }

    /// Render the world into per-cell glyphs with precedence
    /// pacman > ghost > dot > portal > terrain.
    pub fn render(&self) -> Vec<u8> {
        let mut data = vec![b' '; (self.width * self.height) as usize];

        for y in 0..self.height {
            for x in 0..self.width {
                let flags = self.cell(x, y);
                let glyph = if flags.contains(CellFlags::WALL) {
                    b'#'
                } else if flags.contains(CellFlags::DOT) {
                    b'.'
                } else if flags.contains(CellFlags::PORTAL) {
                    b'@'
                } else {
                    b' '
                };
                data[(y * self.width + x) as usize] = glyph;
            }
        }

        for ghost in &self.ghosts {
            if self.in_bounds(ghost.x, ghost.y) {
                let glyph = if ghost.charged { b'G' } else { b'M' };
                data[(ghost.y * self.width + ghost.x) as usize] = glyph;
            }
        }

        let pac = &self.pacman;
        if pac.alive && self.in_bounds(pac.x, pac.y) {
            data[(pac.y * self.width + pac.x) as usize] = b'C';
        }

        data
    }
}
