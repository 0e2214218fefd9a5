//! Terminal rendering of the six seven-segment digits and the keypad
//! legend, from the 8279 display RAM.

use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use sdk85_core::device::i8279::DISPLAY_RAM_SIZE;

/// Column of each digit: address field, then the data field to its right.
const DIGIT_X: [u16; 6] = [0, 8, 16, 24, 40, 48];

const KEYPAD_LEGEND: [&str; 13] = [
    "-------------------------------------------",
    "|RESET | VECT |  C   |  D   |  E   |  F   |",
    "|      | INTR |      |      |      |      |",
    "-------------------------------------------",
    "|SINGLE|  GO  |  8   |  9   |  A   |  B   |",
    "| STEP |      |   H  |   L  |      |      |",
    "-------------------------------------------",
    "|SUBST | EXAM |  4   |  5   |  6   |  7   |",
    "| MEM  | REG  | SPH  | SPL  | PCH  | PCL  |",
    "-------------------------------------------",
    "| NEXT | EXEC |  0   |  1   |  2   |  3   |",
    "|  ,   |  .   |      |      |      |   I  |",
    "-------------------------------------------",
];

const KEY_HELP: [&str; 9] = [
    " . = Execute",
    " , = Next",
    " G = Go",
    " M = Substitute Memory",
    " X = Examine Registers",
    " S = Single Step",
    " R = Reset",
    " I = Vectored Interrupt",
    " Q = Quit",
];

/// Redraw the whole screen from the display RAM.
pub fn draw(out: &mut impl Write, display_ram: &[u8; DISPLAY_RAM_SIZE]) -> io::Result<()> {
    queue!(out, Clear(ClearType::All))?;

    for (digit, &x) in DIGIT_X.iter().enumerate() {
        draw_digit(out, display_ram[digit], 0, x)?;
    }

    for (row, text) in KEYPAD_LEGEND.iter().enumerate() {
        queue!(out, MoveTo(0, 10 + row as u16), Print(text))?;
    }
    for (row, text) in KEY_HELP.iter().enumerate() {
        queue!(out, MoveTo(45, 12 + row as u16), Print(text))?;
    }

    out.flush()
}

/// One seven-segment digit. Segment bits are active-low:
/// bit 0 = E, 1 = F, 2 = G, 3 = DP, 4 = A, 5 = B, 6 = C, 7 = D.
fn draw_digit(out: &mut impl Write, value: u8, y: u16, x: u16) -> io::Result<()> {
    let lit = |bit: u8| value >> bit & 1 == 0;

    if lit(4) {
        queue!(out, MoveTo(x + 1, y), Print("####"))?; // A
    }
    if lit(1) {
        for row in 1..=3 {
            queue!(out, MoveTo(x, y + row), Print("#"))?; // F
        }
    }
    if lit(5) {
        for row in 1..=3 {
            queue!(out, MoveTo(x + 5, y + row), Print("#"))?; // B
        }
    }
    if lit(2) {
        queue!(out, MoveTo(x + 1, y + 4), Print("####"))?; // G
    }
    if lit(0) {
        for row in 5..=7 {
            queue!(out, MoveTo(x, y + row), Print("#"))?; // E
        }
    }
    if lit(6) {
        for row in 5..=7 {
            queue!(out, MoveTo(x + 5, y + row), Print("#"))?; // C
        }
    }
    if lit(7) {
        queue!(out, MoveTo(x + 1, y + 8), Print("####"))?; // D
    }
    if lit(3) {
        queue!(out, MoveTo(x + 6, y + 8), Print("#"))?; // DP
    }

    Ok(())
}
