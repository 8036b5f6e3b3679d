// g_move.rs -- entity movement rules
//
// Both entry points apply exactly one tick's worth of movement and must be
// called with the world lock held exclusively.

use pacist_common::board::{Board, CellFlags, Command, DOT_POINTS};

/// Outcome of advancing one entity by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveResult {
    Moved,
    /// The target cell was a wall or outside the grid; no movement.
    Blocked,
    /// Pacman entered a portal cell; the level is over.
    ReachedPortal,
    /// The move put pacman and a ghost on the same cell.
    Died,
}

/// Advance pacman by one tick. Eats dots, enters portals, dies on ghosts.
pub fn advance_pacman(board: &mut Board, cmd: Command) -> MoveResult {
    if !board.pacman.alive {
        return MoveResult::Blocked;
    }

    let (dx, dy) = cmd.delta();
    if dx == 0 && dy == 0 {
        return MoveResult::Moved;
    }

    let nx = board.pacman.x + dx;
    let ny = board.pacman.y + dy;
    if !board.in_bounds(nx, ny) || board.cell(nx, ny).contains(CellFlags::WALL) {
        return MoveResult::Blocked;
    }

    if board.ghosts.iter().any(|g| g.x == nx && g.y == ny) {
        board.pacman.alive = false;
        return MoveResult::Died;
    }

    board.pacman.x = nx;
    board.pacman.y = ny;

    let cell = board.cell_mut(nx, ny);
    if cell.contains(CellFlags::DOT) {
        cell.remove(CellFlags::DOT);
        board.pacman.points += DOT_POINTS;
    }

    if board.cell(nx, ny).contains(CellFlags::PORTAL) {
        return MoveResult::ReachedPortal;
    }

    MoveResult::Moved
}

/// Advance one ghost by one tick. Charged ghosts pass through walls; any
/// ghost entering pacman's cell kills it.
pub fn advance_ghost(board: &mut Board, ghost_id: usize, cmd: Command) -> MoveResult {
    if ghost_id >= board.ghosts.len() {
        return MoveResult::Blocked;
    }

    if cmd == Command::Charge {
        let ghost = &mut board.ghosts[ghost_id];
        ghost.charged = !ghost.charged;
        return MoveResult::Moved;
    }

    let (dx, dy) = cmd.delta();
    if dx == 0 && dy == 0 {
        return MoveResult::Moved;
    }

    let (nx, ny, charged) = {
        let ghost = &board.ghosts[ghost_id];
        (ghost.x + dx, ghost.y + dy, ghost.charged)
    };
    if !board.in_bounds(nx, ny) {
        return MoveResult::Blocked;
    }
    if !charged && board.cell(nx, ny).contains(CellFlags::WALL) {
        return MoveResult::Blocked;
    }

    let ghost = &mut board.ghosts[ghost_id];
    ghost.x = nx;
    ghost.y = ny;

    if board.pacman.alive && board.pacman.x == nx && board.pacman.y == ny {
        board.pacman.alive = false;
        return MoveResult::Died;
    }

    MoveResult::Moved
}
