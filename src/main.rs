use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{ExecutableCommand, QueueableCommand};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::error::Error;
use std::io::{self, Stdout, Write};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use unicode_width::UnicodeWidthStr;

use tank_maze::config::Settings;
use tank_maze::{Direction, Engine, GameEvent, Pos};

const CELL_W: usize = 2;
const WIN_PAUSE_MS: u64 = 2000;
const WIN_MESSAGE: &str = "You win!";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Command {
    Move(Direction),
    Aim(Direction),
    Fire,
    Restart,
    Quit,
}

#[derive(Clone, Copy, PartialEq)]
enum Glyph {
    Tank(Direction),
    Goal,
    Trail,
    Wall,
    Empty,
}

#[derive(Clone, Copy, PartialEq)]
struct Sprite {
    glyph: Glyph,
    color: Color,
}

struct Renderer {
    last: Vec<Sprite>,
    last_hud: String,
    needs_full: bool,
    origin_x: u16,
    origin_y: u16,
}

impl Renderer {
    fn new() -> Self {
        Self {
            last: Vec::new(),
            last_hud: String::new(),
            needs_full: true,
            origin_x: 0,
            origin_y: 1,
        }
    }
}

/// Cells on the current path and the passages joining them.
struct Trail {
    cells: HashSet<Pos>,
    links: HashSet<(Pos, Pos)>,
}

impl Trail {
    fn new(history: &[Pos]) -> Self {
        let cells = history.iter().copied().collect();
        let links = history.windows(2).map(|w| link(w[0], w[1])).collect();
        Self { cells, links }
    }

    fn joins(&self, a: Pos, b: Pos) -> bool {
        self.links.contains(&link(a, b))
    }
}

fn link(a: Pos, b: Pos) -> (Pos, Pos) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let settings = Settings::from_env();
    info!(
        "starting {}x{} maze (seed {:?})",
        settings.rows, settings.cols, settings.seed
    );
    let rng = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut engine = Engine::new(settings.rows, settings.cols, rng)?;

    let mut stdout = io::stdout();
    terminal::enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(Hide)?;

    let result = run(&mut stdout, &mut engine);

    stdout.execute(Show)?;
    stdout.execute(LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;
    result
}

fn run(stdout: &mut Stdout, engine: &mut Engine) -> Result<(), Box<dyn Error>> {
    let (tx, rx) = mpsc::channel();
    engine.subscribe(move |e| {
        let _ = tx.send(*e);
    });
    let mut renderer = Renderer::new();

    loop {
        render(stdout, engine, &mut renderer)?;

        let command = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => command_for(key.code),
            Event::Resize(_, _) => {
                renderer.needs_full = true;
                None
            }
            _ => None,
        };
        let Some(command) = command else {
            continue;
        };

        match command {
            Command::Quit => return Ok(()),
            Command::Move(dir) => {
                engine.move_actor(dir);
            }
            Command::Aim(dir) => {
                engine.aim_cannon(dir);
            }
            Command::Fire => {
                engine.blast_wall();
            }
            Command::Restart => {
                engine.restart()?;
                renderer.needs_full = true;
            }
        }

        let mut solved = false;
        for event in rx.try_iter() {
            debug!("{:?}", event);
            if event == GameEvent::Solved {
                solved = true;
            }
        }
        if solved {
            render(stdout, engine, &mut renderer)?;
            render_win(stdout, engine)?;
            thread::sleep(Duration::from_millis(WIN_PAUSE_MS));
            while event::poll(Duration::from_millis(0))? {
                event::read()?;
            }
            engine.restart()?;
            renderer.needs_full = true;
        }
    }
}

fn command_for(code: KeyCode) -> Option<Command> {
    let command = match code {
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'w' => Command::Move(Direction::North),
            's' => Command::Move(Direction::South),
            'a' => Command::Move(Direction::West),
            'd' => Command::Move(Direction::East),
            '8' => Command::Aim(Direction::North),
            '2' => Command::Aim(Direction::South),
            '4' => Command::Aim(Direction::West),
            '6' => Command::Aim(Direction::East),
            '5' => Command::Aim(Direction::None),
            ' ' => Command::Fire,
            'r' => Command::Restart,
            'q' => Command::Quit,
            _ => return None,
        },
        KeyCode::Up => Command::Move(Direction::North),
        KeyCode::Down => Command::Move(Direction::South),
        KeyCode::Left => Command::Move(Direction::West),
        KeyCode::Right => Command::Move(Direction::East),
        KeyCode::Esc => Command::Quit,
        _ => return None,
    };
    Some(command)
}

fn board_size(engine: &Engine) -> (usize, usize) {
    (engine.cols() * 2 + 1, engine.rows() * 2 + 1)
}

/// Terminal columns and rows taken by the board plus the HUD line, or None
/// when the board is beyond terminal coordinates.
fn needed_area(engine: &Engine) -> Option<(u16, u16)> {
    let (width, height) = board_size(engine);
    let w = width.checked_mul(CELL_W).and_then(|w| u16::try_from(w).ok())?;
    let h = height.checked_add(2).and_then(|h| u16::try_from(h).ok())?;
    Some((w, h))
}

fn fit_board(engine: &Engine, term_w: u16, term_h: u16) -> Option<(u16, u16)> {
    needed_area(engine).filter(|&(w, h)| term_w >= w && term_h >= h)
}

fn term_coord(origin: u16, offset: usize) -> io::Result<u16> {
    u16::try_from(offset)
        .ok()
        .and_then(|o| origin.checked_add(o))
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "board coordinate outside the terminal"))
}

fn render(stdout: &mut Stdout, engine: &Engine, renderer: &mut Renderer) -> io::Result<()> {
    let (width, height) = board_size(engine);

    stdout.queue(MoveTo(0, 0))?;

    let (term_w, term_h) = terminal::size()?;
    let Some((needed_w, needed_h)) = fit_board(engine, term_w, term_h) else {
        stdout.queue(Clear(ClearType::All))?;
        let msg = format!(
            "Terminal too small. Need at least {}x{} (cols x rows). Current: {}x{}.",
            width.saturating_mul(CELL_W),
            height.saturating_add(2),
            term_w,
            term_h
        );
        stdout.queue(Print(msg))?;
        stdout.flush()?;
        renderer.needs_full = true;
        return Ok(());
    };

    let origin_x = (term_w - needed_w) / 2;
    let origin_y = (term_h - needed_h) / 2 + 1;
    if origin_x != renderer.origin_x || origin_y != renderer.origin_y {
        renderer.origin_x = origin_x;
        renderer.origin_y = origin_y;
        renderer.needs_full = true;
    }
    if renderer.last.len() != width * height {
        renderer.last = vec![
            Sprite {
                glyph: Glyph::Empty,
                color: Color::Reset,
            };
            width * height
        ];
        renderer.needs_full = true;
    }
    if renderer.needs_full {
        stdout.queue(Clear(ClearType::All))?;
    }

    let hud = hud_line(engine);
    if renderer.needs_full || hud != renderer.last_hud {
        stdout.queue(MoveTo(renderer.origin_x, renderer.origin_y - 1))?;
        stdout.queue(SetForegroundColor(Color::White))?;
        stdout.queue(Clear(ClearType::CurrentLine))?;
        stdout.queue(Print(&hud))?;
        stdout.queue(ResetColor)?;
        renderer.last_hud = hud;
    }

    let trail = Trail::new(engine.move_history());
    for y in 0..height {
        for x in 0..width {
            let sprite = sprite_for(engine, &trail, x, y);
            let idx = y * width + x;
            if renderer.needs_full || sprite != renderer.last[idx] {
                renderer.last[idx] = sprite;
                draw_sprite(stdout, renderer, x, y, sprite)?;
            }
        }
    }
    renderer.needs_full = false;

    stdout.flush()?;
    Ok(())
}

fn hud_line(engine: &Engine) -> String {
    let tank = engine.actor();
    let cannon = if tank.is_armed() {
        format!("aimed {}", tank.aim().name())
    } else {
        "idle".to_string()
    };
    format!(
        "Shells: {}  Cannon: {}  Path: {}  (wasd move, 8/4/6/2 aim, 5 disarm, space fire, r new maze, q quit)",
        tank.shells(),
        cannon,
        engine.move_history().len()
    )
}

/// Maps a board coordinate to what is drawn there. Odd/odd coordinates are
/// cells, even/even are wall corners, and the rest are the walls between.
fn sprite_for(engine: &Engine, trail: &Trail, x: usize, y: usize) -> Sprite {
    let wall = Sprite {
        glyph: Glyph::Wall,
        color: Color::Blue,
    };
    let empty = Sprite {
        glyph: Glyph::Empty,
        color: Color::Reset,
    };
    let trail_mark = Sprite {
        glyph: Glyph::Trail,
        color: Color::Green,
    };

    match (y % 2 == 1, x % 2 == 1) {
        (true, true) => {
            let pos = Pos::new(y / 2, x / 2);
            let tank = engine.actor();
            if pos == tank.pos() {
                let facing = if tank.is_armed() {
                    tank.aim()
                } else {
                    tank.last_direction()
                };
                let color = if tank.is_armed() {
                    Color::Red
                } else {
                    Color::Yellow
                };
                return Sprite {
                    glyph: Glyph::Tank(facing),
                    color,
                };
            }
            if pos == engine.goal() {
                return Sprite {
                    glyph: Glyph::Goal,
                    color: Color::Magenta,
                };
            }
            if trail.cells.contains(&pos) {
                trail_mark
            } else {
                empty
            }
        }
        (true, false) => {
            // Between (row, x/2 - 1) and (row, x/2).
            let row = y / 2;
            let (pos, dir) = if x == 0 {
                (Pos::new(row, 0), Direction::West)
            } else {
                (Pos::new(row, x / 2 - 1), Direction::East)
            };
            wall_sprite(engine, trail, pos, dir, wall, empty, trail_mark)
        }
        (false, true) => {
            let col = x / 2;
            let (pos, dir) = if y == 0 {
                (Pos::new(0, col), Direction::North)
            } else {
                (Pos::new(y / 2 - 1, col), Direction::South)
            };
            wall_sprite(engine, trail, pos, dir, wall, empty, trail_mark)
        }
        (false, false) => wall,
    }
}

fn wall_sprite(
    engine: &Engine,
    trail: &Trail,
    pos: Pos,
    dir: Direction,
    wall: Sprite,
    empty: Sprite,
    trail_mark: Sprite,
) -> Sprite {
    let open = engine
        .grid()
        .cell(pos)
        .is_some_and(|cell| cell.is_open(dir));
    if !open {
        return wall;
    }
    match engine.grid().neighbor(pos, dir) {
        Some(next) if trail.joins(pos, next) => trail_mark,
        _ => empty,
    }
}

fn draw_sprite(stdout: &mut Stdout, renderer: &Renderer, x: usize, y: usize, sprite: Sprite) -> io::Result<()> {
    let text = match sprite.glyph {
        Glyph::Tank(Direction::North) => "▲",
        Glyph::Tank(Direction::South) => "▼",
        Glyph::Tank(Direction::East) => "▶",
        Glyph::Tank(Direction::West) => "◀",
        Glyph::Tank(Direction::None) => "■",
        Glyph::Goal => "◎",
        Glyph::Trail => "·",
        Glyph::Wall => "██",
        Glyph::Empty => "  ",
    };
    let x_pos = term_coord(renderer.origin_x, x * CELL_W)?;
    let y_pos = term_coord(renderer.origin_y, y)?;
    stdout.queue(MoveTo(x_pos, y_pos))?;
    stdout.queue(SetForegroundColor(sprite.color))?;
    stdout.queue(Print(text))?;
    let w = UnicodeWidthStr::width(text);
    if w < CELL_W {
        for _ in 0..(CELL_W - w) {
            stdout.queue(Print(' '))?;
        }
    }
    stdout.queue(ResetColor)?;
    Ok(())
}

fn render_win(stdout: &mut Stdout, engine: &Engine) -> io::Result<()> {
    let (_, height) = board_size(engine);
    let (term_w, term_h) = terminal::size()?;
    match fit_board(engine, term_w, term_h) {
        Some((needed_w, needed_h)) => {
            let origin_x = (term_w - needed_w) / 2;
            let origin_y = (term_h - needed_h) / 2 + 1;
            stdout.queue(MoveTo(origin_x, term_coord(origin_y, height)?))?;
        }
        None => {
            stdout.queue(MoveTo(0, term_h.saturating_sub(1)))?;
        }
    }
    stdout.queue(SetForegroundColor(Color::White))?;
    stdout.queue(Print(WIN_MESSAGE))?;
    stdout.queue(ResetColor)?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_follow_the_classic_layout() {
        assert_eq!(command_for(KeyCode::Char('W')), Some(Command::Move(Direction::North)));
        assert_eq!(command_for(KeyCode::Char('a')), Some(Command::Move(Direction::West)));
        assert_eq!(command_for(KeyCode::Char('6')), Some(Command::Aim(Direction::East)));
        assert_eq!(command_for(KeyCode::Char('2')), Some(Command::Aim(Direction::South)));
        assert_eq!(command_for(KeyCode::Char('5')), Some(Command::Aim(Direction::None)));
        assert_eq!(command_for(KeyCode::Char(' ')), Some(Command::Fire));
        assert_eq!(command_for(KeyCode::Char('R')), Some(Command::Restart));
        assert_eq!(command_for(KeyCode::Esc), Some(Command::Quit));
        assert_eq!(command_for(KeyCode::Left), Some(Command::Move(Direction::West)));
        assert_eq!(command_for(KeyCode::Char('x')), None);
    }

    #[test]
    fn board_corners_are_walls() {
        let engine = Engine::seeded(3, 4, 1).unwrap();
        let trail = Trail::new(engine.move_history());
        let (width, height) = board_size(&engine);
        assert_eq!((width, height), (9, 7));
        for (x, y) in [(0, 0), (8, 0), (0, 6), (8, 6), (2, 2)] {
            assert!(sprite_for(&engine, &trail, x, y).glyph == Glyph::Wall);
        }
    }

    #[test]
    fn tank_and_goal_are_drawn_on_their_cells() {
        let engine = Engine::seeded(4, 4, 2).unwrap();
        let trail = Trail::new(engine.move_history());
        let tank = engine.actor().pos();
        let goal = engine.goal();
        let at = |p: Pos| sprite_for(&engine, &trail, p.col * 2 + 1, p.row * 2 + 1).glyph;
        assert!(at(tank) == Glyph::Tank(Direction::None));
        assert!(at(goal) == Glyph::Goal);
    }

    #[test]
    fn board_fit_checks_the_terminal() {
        let engine = Engine::seeded(3, 4, 1).unwrap();
        assert_eq!(needed_area(&engine), Some((18, 9)));
        assert_eq!(fit_board(&engine, 80, 24), Some((18, 9)));
        assert_eq!(fit_board(&engine, 17, 24), None);
        assert_eq!(fit_board(&engine, 80, 8), None);
    }

    #[test]
    fn boards_taller_than_the_terminal_range_never_fit() {
        let engine = Engine::seeded(32768, 1, 3).unwrap();
        assert_eq!(needed_area(&engine), None);
        assert_eq!(fit_board(&engine, 80, 24), None);
        assert_eq!(fit_board(&engine, u16::MAX, u16::MAX), None);
    }

    #[test]
    fn terminal_coordinates_do_not_wrap() {
        assert_eq!(term_coord(10, 5).unwrap(), 15);
        assert!(term_coord(u16::MAX, 1).is_err());
        assert!(term_coord(0, 65536).is_err());
    }

    #[test]
    fn trail_links_are_unordered() {
        let trail = Trail::new(&[Pos::new(0, 0), Pos::new(0, 1), Pos::new(1, 1)]);
        assert!(trail.joins(Pos::new(0, 1), Pos::new(0, 0)));
        assert!(trail.joins(Pos::new(0, 1), Pos::new(1, 1)));
        assert!(!trail.joins(Pos::new(0, 0), Pos::new(1, 1)));
    }
}
