//! Host event loop.
//!
//! Each trip through the loop runs exactly one instruction, services the
//! peripherals, and then checks the outside world in a fixed order:
//! serial I/O or keypad polling at the monitor's known wait addresses,
//! then breakpoint, fault and SIGINT flags. Nothing ever interrupts the
//! CPU mid-instruction.

use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossterm::cursor;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use log::info;
use sdk85_machines::Sdk85System;

use crate::debugger::{self, DebugAction};
use crate::display;
use crate::input::{self, KeypadAction};

const KEY_POLL: Duration = Duration::from_millis(10);

/// How many instructions run between checks for asynchronous keys. Raw
/// mode swallows SIGINT, so Ctrl+C has to be picked off the event queue
/// even while the program never touches a wait address.
const ASYNC_POLL_INTERVAL: u64 = 4096;

pub struct Options {
    pub start_in_debugger: bool,
    pub inject: String,
}

/// Raw-terminal bookkeeping so the debugger can borrow the cooked
/// terminal and hand it back.
struct Ui {
    serial_mode: bool,
    active: bool,
}

impl Ui {
    fn enter(&mut self) -> io::Result<()> {
        if self.active {
            return Ok(());
        }
        terminal::enable_raw_mode()?;
        if !self.serial_mode {
            execute!(io::stdout(), EnterAlternateScreen, cursor::Hide)?;
        }
        self.active = true;
        Ok(())
    }

    fn leave(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        if !self.serial_mode {
            execute!(io::stdout(), cursor::Show, LeaveAlternateScreen)?;
        }
        terminal::disable_raw_mode()?;
        self.active = false;
        Ok(())
    }
}

impl Drop for Ui {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

pub fn run(mut system: Sdk85System, options: Options) -> io::Result<()> {
    // SIGINT only sets a flag; it is observed at the next step boundary,
    // never mid-instruction.
    let sigint = Arc::new(AtomicBool::new(false));
    {
        let flag = sigint.clone();
        let _ = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst));
    }

    let serial_mode = system.serial.is_some();
    info!(
        "running in {} mode",
        if serial_mode { "serial" } else { "display" }
    );

    // Keypad type-ahead: startup injection first, then anything typed
    // while the monitor was busy.
    let mut key_buffer: VecDeque<char> = options.inject.chars().collect();
    let mut serial_buffer: VecDeque<u8> = VecDeque::new();

    let mut debugger_break = options.start_in_debugger;
    let mut quit = false;
    let mut breakpoint: Option<u16> = None;
    let mut steps: u64 = 0;

    let mut ui = Ui {
        serial_mode,
        active: false,
    };
    ui.enter()?;

    while !quit {
        if sigint.swap(false, Ordering::SeqCst) {
            debugger_break = true;
        }
        if let Some(bp) = breakpoint
            && system.cpu.pc == bp
        {
            debugger_break = true;
        }

        if debugger_break {
            ui.leave()?;
            if let Some(fault) = system.take_fault() {
                println!("Panic! {fault}");
            }
            match debugger::repl(&mut system, &mut breakpoint) {
                DebugAction::Quit => return Ok(()),
                DebugAction::SingleStep => debugger_break = true,
                DebugAction::Continue => debugger_break = false,
            }
            ui.enter()?;
            if !serial_mode {
                redraw(&system)?;
            }
        }

        let tx_byte = system.step();
        steps += 1;

        if system.cpu.fault.is_some() {
            debugger_break = true;
            continue;
        }

        if steps % ASYNC_POLL_INTERVAL == 0 {
            drain_typed_ahead(
                serial_mode,
                &mut key_buffer,
                &mut serial_buffer,
                &mut debugger_break,
                &mut quit,
            )?;
        }

        if serial_mode {
            if let Some(byte) = tx_byte {
                write_serial_byte(byte)?;
            }
            // Only fetch a character once the receiver can take it, so a
            // keystroke is never dropped mid-frame.
            if system.awaiting_serial_input()
                && system.serial.as_ref().is_some_and(|serial| serial.rx_idle())
            {
                if let Some(byte) = serial_buffer.pop_front() {
                    system.feed_serial(byte);
                } else {
                    match read_serial_key()? {
                        SerialKey::Byte(byte) => system.feed_serial(byte),
                        SerialKey::Break => debugger_break = true,
                        SerialKey::Quit => quit = true,
                    }
                }
            }
        } else {
            if system
                .board
                .i8279
                .as_mut()
                .is_some_and(|i8279| i8279.take_dirty())
            {
                redraw(&system)?;
            }

            if system.awaiting_keypad() {
                let action = match key_buffer.pop_front() {
                    Some(c) => input::char_action(c),
                    None => poll_keypad()?,
                };
                match action {
                    Some(KeypadAction::Key(scancode)) => system.press_key(scancode),
                    Some(KeypadAction::Reset) => system.reset(),
                    Some(KeypadAction::VectorInterrupt) => system.vector_interrupt(),
                    Some(KeypadAction::Quit) => quit = true,
                    Some(KeypadAction::Break) => debugger_break = true,
                    None => system.keypad_idle(),
                }
            }
        }
    }

    Ok(())
}

fn redraw(system: &Sdk85System) -> io::Result<()> {
    if let Some(i8279) = system.board.i8279.as_ref() {
        display::draw(&mut io::stdout(), i8279.display_ram())?;
    }
    Ok(())
}

/// Pull everything off the event queue without blocking. Ctrl+C breaks
/// into the debugger at once; ordinary keys queue up the way a terminal's
/// input buffer would, to be consumed at the next wait address.
fn drain_typed_ahead(
    serial_mode: bool,
    key_buffer: &mut VecDeque<char>,
    serial_buffer: &mut VecDeque<u8>,
    debugger_break: &mut bool,
    quit: &mut bool,
) -> io::Result<()> {
    while event::poll(Duration::ZERO)? {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind == KeyEventKind::Release {
            continue;
        }
        if serial_mode {
            match translate_serial_key(&key) {
                Some(SerialKey::Break) => *debugger_break = true,
                Some(SerialKey::Quit) => *quit = true,
                Some(SerialKey::Byte(byte)) => serial_buffer.push_back(byte),
                None => {}
            }
        } else if key.modifiers.contains(KeyModifiers::CONTROL) {
            if key.code == KeyCode::Char('c') {
                *debugger_break = true;
            }
        } else if let KeyCode::Char(c) = key.code {
            key_buffer.push_back(c);
        }
    }
    Ok(())
}

/// Wait up to one poll interval for a keypad key. The timeout doubles as
/// the idle throttle while the monitor spins on its wait loop.
fn poll_keypad() -> io::Result<Option<KeypadAction>> {
    if !event::poll(KEY_POLL)? {
        return Ok(None);
    }
    match event::read()? {
        Event::Key(key) if key.kind != KeyEventKind::Release => Ok(input::translate(&key)),
        _ => Ok(None),
    }
}

enum SerialKey {
    Byte(u8),
    Break,
    Quit,
}

/// Block until the host keyboard yields something the serial channel can
/// use. The monitor is parked on its input-wait loop while this blocks.
fn read_serial_key() -> io::Result<SerialKey> {
    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind == KeyEventKind::Release {
            continue;
        }
        if let Some(serial_key) = translate_serial_key(&key) {
            return Ok(serial_key);
        }
    }
}

fn translate_serial_key(key: &KeyEvent) -> Option<SerialKey> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(SerialKey::Break),
            KeyCode::Char('d') => Some(SerialKey::Quit), // EOF
            _ => None,
        };
    }
    match key.code {
        KeyCode::Char(c) if c.is_ascii() => Some(SerialKey::Byte(c as u8)),
        KeyCode::Enter => Some(SerialKey::Byte(b'\n')),
        KeyCode::Backspace => Some(SerialKey::Byte(0x08)),
        KeyCode::Tab => Some(SerialKey::Byte(b'\t')),
        KeyCode::Esc => Some(SerialKey::Byte(0x1B)),
        _ => None,
    }
}

/// Raw mode turns off output post-processing, so expand LF by hand and
/// write unbuffered the way a teletype would.
fn write_serial_byte(byte: u8) -> io::Result<()> {
    let mut stdout = io::stdout();
    if byte == b'\n' {
        stdout.write_all(b"\r\n")?;
    } else {
        stdout.write_all(&[byte])?;
    }
    stdout.flush()
}
