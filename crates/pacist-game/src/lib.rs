// lib.rs -- gameplay rules applied to a board one tick at a time

pub mod g_move;

pub use g_move::{advance_ghost, advance_pacman, MoveResult};
