//! Opcode formatting for trace dumps and the debugger.

const REG: [&str; 8] = ["B", "C", "D", "E", "H", "L", "M", "A"];
const RP: [&str; 4] = ["B", "D", "H", "SP"];
const RP_STACK: [&str; 4] = ["B", "D", "H", "PSW"];
const ALU: [&str; 8] = ["ADD", "ADC", "SUB", "SBB", "ANA", "XRA", "ORA", "CMP"];
const ALU_IMM: [&str; 8] = ["ADI", "ACI", "SUI", "SBI", "ANI", "XRI", "ORI", "CPI"];
const JMP_COND: [&str; 8] = ["JNZ", "JZ", "JNC", "JC", "JPO", "JPE", "JP", "JM"];
const CALL_COND: [&str; 8] = ["CNZ", "CZ", "CNC", "CC", "CPO", "CPE", "CP", "CM"];
const RET_COND: [&str; 8] = ["RNZ", "RZ", "RNC", "RC", "RPO", "RPE", "RP", "RM"];

/// Total instruction length in bytes, opcode included.
pub fn length(opcode: u8) -> u8 {
    match opcode {
        // rp,imm16 loads and direct-address ops
        0x01 | 0x11 | 0x21 | 0x31 | 0x22 | 0x2A | 0x32 | 0x3A => 3,
        // jumps and calls
        0xC3 | 0xCD => 3,
        0xC2 | 0xCA | 0xD2 | 0xDA | 0xE2 | 0xEA | 0xF2 | 0xFA => 3,
        0xC4 | 0xCC | 0xD4 | 0xDC | 0xE4 | 0xEC | 0xF4 | 0xFC => 3,
        // imm8 operands
        0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => 2,
        0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => 2,
        0xD3 | 0xDB => 2,
        _ => 1,
    }
}

/// Render one instruction as assembly text. `lo`/`hi` are the operand bytes
/// following the opcode (ignored for shorter instructions).
pub fn instruction(opcode: u8, lo: u8, hi: u8) -> String {
    let r = |code: u8| REG[(code & 7) as usize];
    let word = (hi as u16) << 8 | lo as u16;

    match opcode {
        0x00 => "NOP".into(),
        0x07 => "RLC".into(),
        0x0F => "RRC".into(),
        0x17 => "RAL".into(),
        0x1F => "RAR".into(),
        0x20 => "RIM".into(),
        0x27 => "DAA".into(),
        0x2F => "CMA".into(),
        0x30 => "SIM".into(),
        0x37 => "STC".into(),
        0x3F => "CMC".into(),
        0x76 => "HLT".into(),

        0x01 | 0x11 | 0x21 | 0x31 => {
            format!("LXI {},{:04X}H", RP[(opcode >> 4) as usize], word)
        }
        0x02 | 0x12 => format!("STAX {}", RP[(opcode >> 4) as usize]),
        0x0A | 0x1A => format!("LDAX {}", RP[(opcode >> 4) as usize]),
        0x03 | 0x13 | 0x23 | 0x33 => format!("INX {}", RP[(opcode >> 4) as usize]),
        0x0B | 0x1B | 0x2B | 0x3B => format!("DCX {}", RP[(opcode >> 4) as usize]),
        0x09 | 0x19 | 0x29 | 0x39 => format!("DAD {}", RP[(opcode >> 4) as usize]),

        0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => {
            format!("INR {}", r(opcode >> 3))
        }
        0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => {
            format!("DCR {}", r(opcode >> 3))
        }
        0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => {
            format!("MVI {},{:02X}H", r(opcode >> 3), lo)
        }

        0x22 => format!("SHLD {word:04X}H"),
        0x2A => format!("LHLD {word:04X}H"),
        0x32 => format!("STA {word:04X}H"),
        0x3A => format!("LDA {word:04X}H"),

        0x40..=0x7F => format!("MOV {},{}", r(opcode >> 3), r(opcode)),
        0x80..=0xBF => format!("{} {}", ALU[((opcode >> 3) & 7) as usize], r(opcode)),
        0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
            format!("{} {:02X}H", ALU_IMM[((opcode >> 3) & 7) as usize], lo)
        }

        0xC3 => format!("JMP {word:04X}H"),
        0xC2 | 0xCA | 0xD2 | 0xDA | 0xE2 | 0xEA | 0xF2 | 0xFA => {
            format!("{} {:04X}H", JMP_COND[((opcode >> 3) & 7) as usize], word)
        }
        0xCD => format!("CALL {word:04X}H"),
        0xC4 | 0xCC | 0xD4 | 0xDC | 0xE4 | 0xEC | 0xF4 | 0xFC => {
            format!("{} {:04X}H", CALL_COND[((opcode >> 3) & 7) as usize], word)
        }
        0xC9 => "RET".into(),
        0xC0 | 0xC8 | 0xD0 | 0xD8 | 0xE0 | 0xE8 | 0xF0 | 0xF8 => {
            RET_COND[((opcode >> 3) & 7) as usize].into()
        }
        0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
            format!("RST {}", (opcode >> 3) & 7)
        }

        0xC1 | 0xD1 | 0xE1 | 0xF1 => format!("POP {}", RP_STACK[((opcode >> 4) & 3) as usize]),
        0xC5 | 0xD5 | 0xE5 | 0xF5 => format!("PUSH {}", RP_STACK[((opcode >> 4) & 3) as usize]),
        0xE3 => "XTHL".into(),
        0xE9 => "PCHL".into(),
        0xEB => "XCHG".into(),
        0xF9 => "SPHL".into(),

        0xD3 => format!("OUT {lo:02X}H"),
        0xDB => format!("IN {lo:02X}H"),
        0xF3 => "DI".into(),
        0xFB => "EI".into(),

        _ => format!("DB {opcode:02X}H"),
    }
}
