// parser.rs -- level files and entity move scripts
//
// Level files are line-oriented: directive lines (DIM, TEMPO, PAC, MON)
// followed by the ASCII grid. Grid lines are taken raw so that interior
// floor cells (spaces) survive. Entity scripts are token streams.

use std::fs;
use std::path::{Path, PathBuf};

use crate::board::{Board, CellFlags, Command, Ghost, Pacman, MAX_GHOSTS, MAX_MOVES};
use crate::error::{GameError, GameResult};
use crate::protocol::MAX_BOARD_AREA;

/// Split a text into whitespace-separated tokens, with `#` starting a
/// comment that runs to end of line.
pub fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(|line| line.split('#').next().unwrap_or(""))
        .flat_map(|line| line.split_whitespace())
}

/// Parsed entity script: optional start cell plus the expanded move list.
#[derive(Debug, Clone, Default)]
pub struct EntityScript {
    /// (x, y); POS lines give row then column.
    pub pos: Option<(i32, i32)>,
    pub moves: Vec<Command>,
}

fn parse_int(tok: Option<&str>, what: &str) -> GameResult<i32> {
    tok.and_then(|t| t.parse::<i32>().ok())
        .ok_or_else(|| GameError::Load(format!("bad or missing {what}")))
}

/// Parse an entity script from text. Repeat counts (`T3`, `T 3`) are
/// unrolled into single-tick entries; unknown command characters are
/// dropped; the expanded list is capped at `MAX_MOVES`.
pub fn parse_entity_script(text: &str) -> GameResult<EntityScript> {
    let mut script = EntityScript::default();
    let mut toks = tokenize(text);

    while let Some(tok) = toks.next() {
        match tok {
            "PASSO" => {
                // per-entity step period; parsed for format compatibility,
                // the engine ticks every entity at the board tempo
                parse_int(toks.next(), "PASSO value")?;
            }
            "POS" => {
                let row = parse_int(toks.next(), "POS row")?;
                let col = parse_int(toks.next(), "POS column")?;
                script.pos = Some((col, row));
            }
            _ => {
                let key = tok.as_bytes()[0];
                let mut turns = 1;
                if key.to_ascii_uppercase() == b'T' {
                    if tok.len() > 1 {
                        turns = tok[1..]
                            .parse::<i32>()
                            .map_err(|_| GameError::Load(format!("bad repeat count {tok:?}")))?;
                    } else {
                        turns = parse_int(toks.next(), "repeat count")?;
                    }
                }
                if let Some(cmd) = Command::from_key(key) {
                    for _ in 0..turns {
                        if script.moves.len() >= MAX_MOVES {
                            log::warn!("entity script truncated at {MAX_MOVES} moves");
                            break;
                        }
                        script.moves.push(cmd);
                    }
                }
            }
        }
    }

    Ok(script)
}

fn load_entity_script(path: &Path) -> GameResult<EntityScript> {
    let text = fs::read_to_string(path)
        .map_err(|e| GameError::Load(format!("{}: {e}", path.display())))?;
    parse_entity_script(&text)
}

fn is_ghost_file(tok: &str) -> bool {
    tok.ends_with(".m")
}

/// Parse a level from text. `base_dir` anchors PAC/MON script paths.
pub fn load_level_from_str(text: &str, base_dir: &Path) -> GameResult<Board> {
    let lines: Vec<&str> = text.lines().collect();

    let mut width = 0i32;
    let mut height = 0i32;
    let mut tempo = 0i32;
    let mut pac_script: Option<EntityScript> = None;
    let mut ghost_scripts: Vec<EntityScript> = Vec::new();
    let mut grid_start = None;

    let mut i = 0;
    while i < lines.len() {
        let stripped = lines[i].split('#').next().unwrap_or("").trim_end();
        let mut toks = stripped.split_whitespace();
        let Some(first) = toks.next() else {
            i += 1;
            continue;
        };

        match first {
            "DIM" => {
                height = parse_int(toks.next(), "DIM height")?;
                width = parse_int(toks.next(), "DIM width")?;
                if width <= 0 || height <= 0 {
                    return Err(GameError::Load(format!("bad dimensions {height}x{width}")));
                }
                match width.checked_mul(height) {
                    Some(area) if area <= MAX_BOARD_AREA => {}
                    _ => {
                        return Err(GameError::Load(format!("board {height}x{width} too large")))
                    }
                }
            }
            "TEMPO" => {
                tempo = parse_int(toks.next(), "TEMPO value")?;
                if tempo < 0 {
                    return Err(GameError::Load(format!("negative tempo {tempo}")));
                }
            }
            "PAC" => {
                let file = toks
                    .next()
                    .ok_or_else(|| GameError::Load("PAC without file".to_owned()))?;
                pac_script = Some(load_entity_script(&base_dir.join(file))?);
            }
            "MON" => {
                for file in toks {
                    if ghost_scripts.len() < MAX_GHOSTS {
                        ghost_scripts.push(load_entity_script(&base_dir.join(file))?);
                    }
                }
            }
            tok if is_ghost_file(tok) => {
                // ghost file list continued on its own line
                if ghost_scripts.len() < MAX_GHOSTS {
                    ghost_scripts.push(load_entity_script(&base_dir.join(tok))?);
                }
                for file in toks {
                    if is_ghost_file(file) && ghost_scripts.len() < MAX_GHOSTS {
                        ghost_scripts.push(load_entity_script(&base_dir.join(file))?);
                    }
                }
            }
            _ => {
                grid_start = Some(i);
                break;
            }
        }
        i += 1;
    }

    if width == 0 {
        return Err(GameError::Load("missing DIM directive".to_owned()));
    }
    let Some(grid_start) = grid_start else {
        return Err(GameError::Load("missing grid".to_owned()));
    };

    let mut cells = vec![CellFlags::empty(); (width * height) as usize];
    for row in 0..height {
        let line = lines
            .get(grid_start + row as usize)
            .ok_or_else(|| GameError::Load(format!("grid truncated at row {row}")))?;
        for (col, ch) in line.chars().take(width as usize).enumerate() {
            let flags = match ch {
                'X' => CellFlags::WALL,
                'o' => CellFlags::DOT,
                '@' => CellFlags::PORTAL,
                _ => CellFlags::empty(),
            };
            cells[(row * width) as usize + col] = flags;
        }
    }

    let pacman = match pac_script {
        Some(script) => {
            let (x, y) = script.pos.unwrap_or((1, 1));
            Pacman {
                x,
                y,
                alive: true,
                points: 0,
                moves: script.moves,
                cursor: 0,
            }
        }
        None => Pacman {
            x: 1,
            y: 1,
            alive: true,
            ..Pacman::default()
        },
    };

    let ghosts = ghost_scripts
        .into_iter()
        .map(|script| {
            let (x, y) = script.pos.unwrap_or((0, 0));
            Ghost {
                x,
                y,
                charged: false,
                moves: script.moves,
                cursor: 0,
            }
        })
        .collect();

    Ok(Board {
        width,
        height,
        cells,
        pacman,
        ghosts,
        tempo,
        pending_input: None,
        running: true,
        exit_requested: false,
    })
}

/// Load one level file. `base_dir` anchors the entity script paths it names.
pub fn load_level_from_file(path: &Path, base_dir: &Path) -> GameResult<Board> {
    let text = fs::read_to_string(path)
        .map_err(|e| GameError::Load(format!("{}: {e}", path.display())))?;
    load_level_from_str(&text, base_dir)
}

/// All `*.lvl` files in a directory, ascending filename order.
pub fn load_levels_from_dir(dir: &Path) -> GameResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .map_err(|e| GameError::Load(format!("{}: {e}", dir.display())))?;

    let mut levels: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "lvl"))
        .collect();
    levels.sort();

    if levels.is_empty() {
        return Err(GameError::Load(format!("no level files in {}", dir.display())));
    }
    Ok(levels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const LEVEL: &str = "\
DIM 4 5          # height width
TEMPO 150
XXXXX
Xo @X
X   X
XXXXX
";

    #[test]
    fn test_tokenize_skips_comments() {
        let toks: Vec<&str> = tokenize("a b # c d\n  e#f\ng").collect();
        assert_eq!(toks, vec!["a", "b", "e", "g"]);
    }

    #[test]
    fn test_entity_script_expansion() {
        let script = parse_entity_script("PASSO 1\nPOS 2 3\nW T2 A C").unwrap();
        assert_eq!(script.pos, Some((3, 2)));
        assert_eq!(
            script.moves,
            vec![
                Command::Up,
                Command::Wait,
                Command::Wait,
                Command::Left,
                Command::Charge
            ]
        );
    }

    #[test]
    fn test_entity_script_detached_repeat() {
        let script = parse_entity_script("T 3 D").unwrap();
        assert_eq!(
            script.moves,
            vec![
                Command::Wait,
                Command::Wait,
                Command::Wait,
                Command::Right
            ]
        );
    }

    #[test]
    fn test_entity_script_caps_moves() {
        let script = parse_entity_script("T 9999").unwrap();
        assert_eq!(script.moves.len(), MAX_MOVES);
    }

    #[test]
    fn test_level_grid_and_defaults() {
        let board = load_level_from_str(LEVEL, Path::new("/nonexistent")).unwrap();
        assert_eq!((board.width, board.height), (5, 4));
        assert_eq!(board.tempo, 150);
        assert!(board.cell(0, 0).contains(CellFlags::WALL));
        assert!(board.cell(1, 1).contains(CellFlags::DOT));
        assert!(board.cell(3, 1).contains(CellFlags::PORTAL));
        assert!(board.cell(2, 1).is_empty());
        assert!(board.cell(2, 2).is_empty());

        // no PAC directive: manual pacman at (1,1)
        assert!(board.pacman.alive);
        assert_eq!((board.pacman.x, board.pacman.y), (1, 1));
        assert!(board.pacman.moves.is_empty());
        assert!(board.ghosts.is_empty());
    }

    #[test]
    fn test_level_zero_dimensions_fail() {
        let text = "DIM 0 0\nTEMPO 1\n";
        assert!(matches!(
            load_level_from_str(text, Path::new(".")),
            Err(GameError::Load(_))
        ));
    }

    #[test]
    fn test_level_truncated_grid_fails() {
        let text = "DIM 3 3\nXXX\nXXX\n";
        assert!(matches!(
            load_level_from_str(text, Path::new(".")),
            Err(GameError::Load(_))
        ));
    }

    #[test]
    fn test_level_grid_before_dim_fails() {
        let text = "XXX\nDIM 3 3\n";
        assert!(matches!(
            load_level_from_str(text, Path::new(".")),
            Err(GameError::Load(_))
        ));
    }

    #[test]
    fn test_level_with_entity_scripts() {
        let dir = tempfile::tempdir().unwrap();
        let mut pac = std::fs::File::create(dir.path().join("hero.p")).unwrap();
        writeln!(pac, "POS 1 1\nD D").unwrap();
        let mut ghost = std::fs::File::create(dir.path().join("blinky.m")).unwrap();
        writeln!(ghost, "POS 2 3\nA W").unwrap();

        let text = "DIM 4 5\nTEMPO 100\nPAC hero.p\nMON blinky.m\nXXXXX\nX  oX\nX  @X\nXXXXX\n";
        let board = load_level_from_str(text, dir.path()).unwrap();

        assert_eq!(board.pacman.moves, vec![Command::Right, Command::Right]);
        assert_eq!(board.ghosts.len(), 1);
        assert_eq!((board.ghosts[0].x, board.ghosts[0].y), (3, 2));
        assert_eq!(board.ghosts[0].moves, vec![Command::Left, Command::Up]);
    }

    #[test]
    fn test_missing_entity_script_fails() {
        let text = "DIM 2 2\nPAC gone.p\nXX\nXX\n";
        assert!(matches!(
            load_level_from_str(text, Path::new("/nonexistent")),
            Err(GameError::Load(_))
        ));
    }

    #[test]
    fn test_levels_from_dir_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["2.lvl", "1.lvl", "readme.txt", "3.lvl"] {
            std::fs::File::create(dir.path().join(name)).unwrap();
        }

        let levels = load_levels_from_dir(dir.path()).unwrap();
        let names: Vec<_> = levels
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_owned())
            .collect();
        assert_eq!(names, vec!["1.lvl", "2.lvl", "3.lvl"]);
    }

    #[test]
    fn test_levels_from_dir_empty_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_levels_from_dir(dir.path()),
            Err(GameError::Load(_))
        ));
    }
}
