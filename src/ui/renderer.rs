/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Compose the next frame from a `Snapshot` into the `front` buffer
///   2. Compare each cell with the `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Each grid cell takes two terminal columns: the occupant glyph, then the
/// strongest clue sensed there.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::cell::CellFlags;
use crate::domain::collision::Outcome;
use crate::domain::entity::{Feature, Position};
use crate::sim::snapshot::Snapshot;
use crate::sim::world::Phase;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Differs from any real cell, so every position gets diff'd.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color) -> Self {
        Cell { ch, fg, bg: Cell::BASE_BG }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y); one char per column, clipped at the edge.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg));
        }
    }

    #[cfg(test)]
    fn row_text(&self, y: usize) -> String {
        (0..self.width).map(|x| self.get(x, y).ch).collect::<String>().trim_end().to_string()
    }
}

// ── Layout ──

const CELL_W: usize = 2;
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(8192, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;
        self.sync_size(true);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, snap: &Snapshot) -> io::Result<()> {
        if self.sync_size(false) {
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        self.front.clear();
        compose(&mut self.front, snap);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    /// Track the terminal size. Returns true when the buffers were reset.
    fn sync_size(&mut self, force: bool) -> bool {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        let (tw, th) = (tw as usize, th as usize);
        if !force && tw == self.term_w && th == self.term_h {
            return false;
        }
        self.term_w = tw;
        self.term_h = th;
        self.front.resize(tw, th);
        self.back.resize(tw, th);
        self.back.cells.fill(Cell::INVALID);
        true
    }

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }
}

// ── Composition ──

fn compose(frame: &mut FrameBuffer, snap: &Snapshot) {
    let mode = if snap.auto_mode { "AUTO" } else { "MANUAL" };
    let hud = format!(
        "CLUE GRID   items {}/{}   puzzles left {}   {}   seed {}",
        snap.collected, snap.items_total, snap.puzzles.len(), mode, snap.seed,
    );
    frame.put_str(0, HUD_ROW, &hud, Color::Yellow);
    let whereabouts = format!(
        "you {}   adversary {}   exit {}   items left {}   obstacles {}",
        snap.actor, snap.adversary, snap.exit, snap.items.len(), snap.obstacles.len(),
    );
    frame.put_str(0, HUD_ROW + 1, &whereabouts, Color::DarkGrey);

    for r in 0..snap.bounds.rows {
        for c in 0..snap.bounds.cols {
            let pos = Position::new(r as i32, c as i32);
            let flags = snap.grid.get(pos).unwrap_or_else(CellFlags::empty);
            let x = c * CELL_W;
            let y = MAP_ROW + r;
            frame.set(x, y, occupant(snap, pos, flags));
            frame.set(x + 1, y, clue_mark(flags));
        }
    }

    let below = MAP_ROW + snap.bounds.rows + 1;
    let (status_color, help) = match snap.phase {
        Phase::Playing if snap.last_outcome == Some(Outcome::Blocked) => {
            (Color::DarkYellow, "arrows/WASD move   Enter auto   r restart   q quit")
        }
        Phase::Playing => (Color::White, "arrows/WASD move   Enter auto   r restart   q quit"),
        Phase::Won => (Color::Green, "Enter or r: play again   q quit"),
        Phase::Caught => (Color::Red, "Enter or r: play again   q quit"),
    };
    frame.put_str(0, below, &snap.message, status_color);
    frame.put_str(0, below + 1, help, Color::DarkGrey);
}

/// Occupant glyph. Entities draw over static features.
fn occupant(snap: &Snapshot, pos: Position, flags: CellFlags) -> Cell {
    if flags.occupancy().is_empty() {
        return if snap.puzzles.contains(&pos) {
            Cell::new('?', Color::Magenta)
        } else {
            Cell::new('.', Color::DarkGrey)
        };
    }
    if flags.has_actor() && flags.has_adversary() {
        Cell::new('X', Color::Red)
    } else if flags.has_actor() {
        Cell::new('@', Color::Cyan)
    } else if flags.has_adversary() {
        Cell::new('&', Color::Red)
    } else if flags.has_obstacle() {
        Cell::new('#', Color::Grey)
    } else if flags.has_item() {
        Cell::new('*', Color::Yellow)
    } else if flags.is_exit() {
        Cell::new('E', Color::Green)
    } else {
        Cell::new('.', Color::DarkGrey)
    }
}

/// Strongest clue: adversary > item > exit > obstacle.
fn clue_mark(flags: CellFlags) -> Cell {
    if flags.clues().is_empty() {
        Cell::BLANK
    } else if flags.senses(Feature::Adversary) {
        Cell::new('!', Color::Red)
    } else if flags.senses(Feature::Item) {
        Cell::new('+', Color::Yellow)
    } else if flags.senses(Feature::Exit) {
        Cell::new('~', Color::Green)
    } else {
        Cell::new(':', Color::DarkGrey)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::domain::entity::{Bounds, PositionSet};
    use crate::sim::level::Layout;
    use crate::sim::snapshot::capture;
    use crate::sim::world::WorldState;

    fn snapshot() -> Snapshot {
        let layout = Layout {
            actor: Position::new(0, 0),
            adversary: Position::new(2, 3),
            exit: Position::new(3, 3),
            items: [Position::new(0, 2)].into_iter().collect(),
            obstacles: [Position::new(1, 1)].into_iter().collect(),
            puzzles: [Position::new(3, 0)].into_iter().collect(),
        };
        capture(&WorldState::new(Bounds::new(4, 4), layout, 7, ChaCha8Rng::seed_from_u64(7)))
    }

    fn framed(snap: &Snapshot) -> FrameBuffer {
        let mut frame = FrameBuffer::new(60, 12);
        compose(&mut frame, snap);
        frame
    }

    #[test]
    fn map_rows_show_occupants_and_clues() {
        let frame = framed(&snapshot());
        // (0,1) senses the item and the obstacle: item wins.
        assert_eq!(frame.row_text(MAP_ROW), "@ .+* .+");
        assert_eq!(frame.row_text(MAP_ROW + 1), ".:# .+.!");
        assert_eq!(frame.row_text(MAP_ROW + 2), ". .:.!&~");
        assert_eq!(frame.row_text(MAP_ROW + 3), "? . .~E!");
    }

    #[test]
    fn hud_and_help() {
        let frame = framed(&snapshot());
        assert!(frame.row_text(HUD_ROW).contains("items 0/1"));
        assert!(frame.row_text(HUD_ROW + 1).starts_with("you (0, 0)   adversary (2, 3)   exit (3, 3)"));
        assert!(frame.row_text(HUD_ROW).contains("MANUAL"));
        assert!(frame.row_text(HUD_ROW).contains("seed 7"));
        assert!(frame.row_text(MAP_ROW + 6).contains("Enter auto"));
    }

    #[test]
    fn finished_session_offers_restart() {
        let mut snap = snapshot();
        snap.phase = Phase::Caught;
        snap.message = "Caught by the adversary! Game over.".into();
        let frame = framed(&snap);
        assert_eq!(frame.row_text(MAP_ROW + 5), "Caught by the adversary! Game over.");
        assert!(frame.row_text(MAP_ROW + 6).starts_with("Enter or r"));
    }

    #[test]
    fn small_frame_clips() {
        let mut frame = FrameBuffer::new(3, 3);
        compose(&mut frame, &Snapshot { items: PositionSet::new(), ..snapshot() });
        assert_eq!(frame.row_text(HUD_ROW), "CLU");
    }
}
