//! Terminal painting for the animated player.

use std::io::{self, Write};

use crossterm::{
    cursor::{Hide, MoveToColumn, MoveUp, Show},
    execute, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use reelpick_core::{Catalog, ConfettiField, Prize, RoundSnapshot};

const CONFETTI_COLS: usize = 60;
const CONFETTI_ROWS: u16 = 14;
const CELL_W: f64 = 8.0;
const CELL_H: f64 = 16.0;

pub const FIELD_WIDTH: f64 = CONFETTI_COLS as f64 * CELL_W;
pub const FIELD_HEIGHT: f64 = CONFETTI_ROWS as f64 * CELL_H;

fn rgb(hex: &str) -> Color {
    let hex = hex.trim_start_matches('#');
    let channel = |i: usize| {
        hex.get(i..i + 2)
            .and_then(|c| u8::from_str_radix(c, 16).ok())
            .unwrap_or(255)
    };
    Color::Rgb {
        r: channel(0),
        g: channel(2),
        b: channel(4),
    }
}

pub fn hide_cursor(out: &mut impl Write) -> io::Result<()> {
    execute!(out, Hide)
}

pub fn show_cursor(out: &mut impl Write) -> io::Result<()> {
    execute!(out, Show)
}

fn prize_cell(out: &mut impl Write, prize: &Prize, blur: bool) -> io::Result<()> {
    let label = if blur { "  ··  " } else { prize.glyph };
    queue!(
        out,
        SetBackgroundColor(rgb(prize.color)),
        SetForegroundColor(rgb(prize.text_color)),
        Print(format!(" {label:^6} ")),
        ResetColor,
        Print(" ")
    )
}

fn clear_line(out: &mut impl Write) -> io::Result<()> {
    queue!(out, MoveToColumn(0), Clear(ClearType::CurrentLine))
}

/// One line: the prize under the payline on each reel, then the caption.
pub fn draw_reels(
    out: &mut impl Write,
    catalog: &Catalog,
    snap: &RoundSnapshot,
    item_height: u32,
) -> io::Result<()> {
    clear_line(out)?;
    queue!(out, Print(" ▶ "))?;
    for reel in &snap.reels {
        // half an item away from a slot reads as a blur
        let frac = (-reel.offset / f64::from(item_height)).fract();
        let blur = reel.is_animating && (0.25..0.75).contains(&frac);
        prize_cell(out, catalog.get(reel.centered_index), blur)?;
    }
    queue!(out, Print(format!("◀  {}", snap.caption)))?;
    out.flush()
}

pub fn draw_winner(out: &mut impl Write, prize: &Prize) -> io::Result<()> {
    clear_line(out)?;
    execute!(
        out,
        Print(" ✨ "),
        SetAttribute(Attribute::Bold),
        SetForegroundColor(rgb(prize.color)),
        Print(prize.name),
        SetAttribute(Attribute::Reset),
        ResetColor,
        Print(" ✨\n")
    )
}

pub fn draw_confetti(out: &mut impl Write, field: &ConfettiField) -> io::Result<()> {
    let rows = usize::from(CONFETTI_ROWS);
    let mut grid: Vec<Option<(&str, char)>> = vec![None; CONFETTI_COLS * rows];
    for p in field.particles() {
        if p.x < 0.0 || p.y < 0.0 {
            continue;
        }
        let (col, row) = ((p.x / CELL_W) as usize, (p.y / CELL_H) as usize);
        if col >= CONFETTI_COLS || row >= rows {
            continue;
        }
        let ch = if p.opacity() < 0.3 {
            '.'
        } else if p.scalar > 1.0 {
            '◆'
        } else {
            '*'
        };
        grid[row * CONFETTI_COLS + col] = Some((p.color, ch));
    }
    for row in grid.chunks(CONFETTI_COLS) {
        clear_line(out)?;
        for cell in row {
            match cell {
                Some((color, ch)) => {
                    queue!(out, SetForegroundColor(rgb(color)), Print(ch), ResetColor)?
                }
                None => queue!(out, Print(' '))?,
            }
        }
        queue!(out, Print('\n'))?;
    }
    execute!(out, MoveUp(CONFETTI_ROWS))
}

pub fn clear_confetti(out: &mut impl Write) -> io::Result<()> {
    for _ in 0..CONFETTI_ROWS {
        clear_line(out)?;
        queue!(out, Print('\n'))?;
    }
    execute!(out, MoveUp(CONFETTI_ROWS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelpick_core::{EntropySource, MachineConfig, SpinOrchestrator};
    use std::sync::Arc;

    #[test]
    fn parses_hex_colors() {
        assert_eq!(rgb("#E60026"), Color::Rgb { r: 0xE6, g: 0x00, b: 0x26 });
        assert_eq!(rgb("1DB954"), Color::Rgb { r: 0x1D, g: 0xB9, b: 0x54 });
        assert_eq!(rgb("#zz"), Color::Rgb { r: 255, g: 255, b: 255 });
    }

    #[test]
    fn reel_line_mentions_caption() {
        let machine = SpinOrchestrator::new(
            Arc::new(Catalog::music()),
            MachineConfig::default(),
            EntropySource::from_seed(1),
        )
        .unwrap();
        let mut buf = Vec::new();
        draw_reels(&mut buf, machine.catalog(), &machine.snapshot(0), 140).unwrap();
        let line = String::from_utf8(buf).unwrap();
        assert!(line.contains("NE"));
        assert!(line.contains("点击按钮开启音乐之旅"));
    }

    #[test]
    fn confetti_frame_returns_cursor_to_its_top_row() {
        let mut field = ConfettiField::new(FIELD_WIDTH, FIELD_HEIGHT);
        field.fire(&reelpick_core::celebration(), &mut EntropySource::from_seed(2));
        let mut buf = Vec::new();
        draw_confetti(&mut buf, &field).unwrap();
        let frame = String::from_utf8(buf).unwrap();
        assert_eq!(frame.matches('\n').count(), usize::from(CONFETTI_ROWS));
        assert!(frame.ends_with(&format!("\x1b[{CONFETTI_ROWS}A")));
    }

    #[test]
    fn cursor_toggles_are_paired() {
        let mut buf = Vec::new();
        hide_cursor(&mut buf).unwrap();
        show_cursor(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "\x1b[?25l\x1b[?25h");
    }
}
