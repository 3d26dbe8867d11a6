//! Instruction walker for `Code` bodies.
//!
//! Only the operand layout of each opcode is modelled: the walker steps over
//! every instruction and records the ones whose operand is a constant pool
//! index. Nothing is interpreted.

use crate::error::{FormatError, malformed};

pub const LDC: u8 = 0x12;
pub const LDC_W: u8 = 0x13;
pub const LDC2_W: u8 = 0x14;
pub const GETSTATIC: u8 = 0xb2;
pub const INVOKEINTERFACE: u8 = 0xb9;
pub const INVOKEDYNAMIC: u8 = 0xba;
pub const NEW: u8 = 0xbb;
pub const ANEWARRAY: u8 = 0xbd;
pub const CHECKCAST: u8 = 0xc0;
pub const INSTANCEOF: u8 = 0xc1;
pub const MULTIANEWARRAY: u8 = 0xc5;

const TABLESWITCH: u8 = 0xaa;
const LOOKUPSWITCH: u8 = 0xab;
const WIDE: u8 = 0xc4;
const IINC: u8 = 0x84;

/// An instruction whose operand names a constant pool entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolOperand {
    pub offset: u32,
    pub opcode: u8,
    pub index: u16,
}

/// Walks `code` and returns every constant-pool operand in program order.
pub fn pool_operands(code: &[u8]) -> Result<Vec<PoolOperand>, FormatError> {
    let mut operands = Vec::new();
    let mut pc = 0usize;

    while pc < code.len() {
        let opcode = code[pc];
        let len = instruction_len(code, pc)?;
        if pc + len > code.len() {
            return Err(malformed!(
                "instruction 0x{:02x} at pc {} runs past the end of the code",
                opcode,
                pc
            ));
        }

        let index = match opcode {
            LDC => Some(code[pc + 1] as u16),
            LDC_W | LDC2_W | GETSTATIC..=INVOKEDYNAMIC | NEW | ANEWARRAY | CHECKCAST
            | INSTANCEOF | MULTIANEWARRAY => Some(u16::from_be_bytes([code[pc + 1], code[pc + 2]])),
            _ => None,
        };
        if let Some(index) = index {
            operands.push(PoolOperand {
                offset: pc as u32,
                opcode,
                index,
            });
        }

        pc += len;
    }

    Ok(operands)
}

/// Total length in bytes of the instruction at `pc`, opcode included.
fn instruction_len(code: &[u8], pc: usize) -> Result<usize, FormatError> {
    let opcode = code[pc];
    let len = match opcode {
        0x00..=0x0f => 1,
        0x10 => 2,
        0x11 => 3,
        LDC => 2,
        LDC_W | LDC2_W => 3,
        0x15..=0x19 => 2,
        0x1a..=0x35 => 1,
        0x36..=0x3a => 2,
        0x3b..=0x83 => 1,
        IINC => 3,
        0x85..=0x98 => 1,
        0x99..=0xa8 => 3,
        0xa9 => 2,
        TABLESWITCH => {
            let base = padded_operands(pc);
            let low = read_i32(code, base + 4)?;
            let high = read_i32(code, base + 8)?;
            if high < low {
                return Err(malformed!("tableswitch at pc {} has high < low", pc));
            }
            let entries = (high as i64 - low as i64 + 1) as usize;
            base + 12 + entries * 4 - pc
        }
        LOOKUPSWITCH => {
            let base = padded_operands(pc);
            let pairs = read_i32(code, base + 4)?;
            if pairs < 0 {
                return Err(malformed!("lookupswitch at pc {} has negative npairs", pc));
            }
            base + 8 + pairs as usize * 8 - pc
        }
        0xac..=0xb1 => 1,
        GETSTATIC..=0xb8 => 3,
        INVOKEINTERFACE | INVOKEDYNAMIC => 5,
        NEW => 3,
        0xbc => 2,
        ANEWARRAY => 3,
        0xbe | 0xbf => 1,
        CHECKCAST | INSTANCEOF => 3,
        0xc2 | 0xc3 => 1,
        WIDE => match code.get(pc + 1).copied() {
            Some(IINC) => 6,
            Some(0x15..=0x19 | 0x36..=0x3a | 0xa9) => 4,
            Some(other) => {
                return Err(malformed!("invalid wide target 0x{:02x} at pc {}", other, pc));
            }
            None => return Err(malformed!("truncated wide instruction at pc {}", pc)),
        },
        MULTIANEWARRAY => 4,
        0xc6 | 0xc7 => 3,
        0xc8 | 0xc9 => 5,
        0xca | 0xfe | 0xff => 1,
        other => return Err(malformed!("unknown opcode 0x{:02x} at pc {}", other, pc)),
    };
    Ok(len)
}

/// Switch operands start on the next 4-byte boundary after the opcode.
fn padded_operands(pc: usize) -> usize {
    (pc + 4) & !3
}

fn read_i32(code: &[u8], at: usize) -> Result<i32, FormatError> {
    match code.get(at..at + 4) {
        Some(b) => Ok(i32::from_be_bytes([b[0], b[1], b[2], b[3]])),
        None => Err(malformed!("switch operands truncated at code offset {}", at)),
    }
}
