//! Interactive debugger REPL, entered from the host loop on startup (-d),
//! breakpoint hit, CPU fault or SIGINT. Runs on the cooked terminal.

use std::io::{self, BufRead, Write};

use sdk85_machines::Sdk85System;

pub enum DebugAction {
    /// Resume free-running execution.
    Continue,
    /// Execute one instruction and come back.
    SingleStep,
    /// Leave the emulator.
    Quit,
}

fn help() {
    println!("Commands:");
    println!("  q              - Quit");
    println!("  h              - Help");
    println!("  c              - Continue");
    println!("  s              - Step");
    println!("  t              - Dump CPU Trace");
    println!("  d <addr> [end] - Dump Memory");
    println!("  b <addr>       - Breakpoint at address.");
}

pub fn repl(system: &mut Sdk85System, breakpoint: &mut Option<u16>) -> DebugAction {
    let stdin = io::stdin();
    println!();

    loop {
        print!("\r{:04X}> ", system.cpu.pc);
        io::stdout().flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => return DebugAction::Quit, // EOF
            Ok(_) => {}
            Err(_) => continue,
        }

        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };
        let arg1 = words.next();
        let arg2 = words.next();

        match command.chars().next().unwrap_or(' ') {
            'q' => return DebugAction::Quit,
            'h' | '?' => help(),
            'c' => return DebugAction::Continue,
            's' => return DebugAction::SingleStep,
            't' => {
                system.cpu.trace.dump(&mut io::stdout()).ok();
            }
            'd' => match (arg1.and_then(parse_hex), arg2.and_then(parse_hex)) {
                (Some(start), Some(end)) => dump_memory(system, start, end),
                (Some(start), None) => {
                    let end = (start as u32 + 0xFF).min(0xFFFF) as u16;
                    dump_memory(system, start, end);
                }
                _ => println!("Missing argument!"),
            },
            'b' => match arg1 {
                Some(arg) => match parse_hex(arg) {
                    Some(addr) => {
                        *breakpoint = Some(addr);
                        println!("Breakpoint at 0x{addr:04X} set.");
                    }
                    None => println!("Invalid argument!"),
                },
                None => match breakpoint.take() {
                    Some(addr) => println!("Breakpoint at 0x{addr:04X} removed."),
                    None => println!("Missing argument!"),
                },
            },
            _ => println!("Unknown command: '{command}' (use 'h' for help.)"),
        }
    }
}

fn parse_hex(s: &str) -> Option<u16> {
    u16::from_str_radix(s, 16).ok()
}

/// Hexdump in 16-byte rows with an ASCII column, using side-effect-free
/// reads so dumping the 8279 window does not disturb it.
fn dump_memory(system: &Sdk85System, start: u16, end: u16) {
    dump_row(system, start, end);
    let mut row = (start & 0xFFF0) as u32 + 16;
    while row <= end as u32 {
        dump_row(system, row as u16, end);
        row += 16;
    }
}

fn dump_row(system: &Sdk85System, start: u16, end: u16) {
    let base = start & 0xFFF0;
    print!("{base:04x}   ");

    for i in 0..16u16 {
        let addr = base + i;
        if addr >= start && addr <= end {
            print!("{:02x} ", system.peek(addr));
        } else {
            print!("   ");
        }
        if i % 4 == 3 {
            print!(" ");
        }
    }

    for i in 0..16u16 {
        let addr = base + i;
        if addr >= start && addr <= end {
            let value = system.peek(addr);
            if value.is_ascii_graphic() || value == b' ' {
                print!("{}", value as char);
            } else {
                print!(".");
            }
        } else {
            print!(" ");
        }
    }

    println!();
}
