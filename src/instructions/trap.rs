//! Implementations of the six TRAP service routines the vm supports.
//!
//! Every routine goes through [`Console`] instead of touching stdin/stdout
//! directly, so tests can drive them against an in-memory sink.

use crate::console::Console;
use crate::memory::Memory;
use crate::registers::Registers;

use std::convert::TryFrom;

pub enum TrapCode {
    Getc,
    Out,
    Puts,
    In,
    Putsp,
    Halt,
}

impl TryFrom<u16> for TrapCode {
    type Error = ();

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        use TrapCode::*;

        let trap_code = match value {
            0x20 => Getc,
            0x21 => Out,
            0x22 => Puts,
            0x23 => In,
            0x24 => Putsp,
            0x25 => Halt,
            _ => return Err(()),
        };

        Ok(trap_code)
    }
}

/// Reads a single character from the keyboard, zero-extends it into R0. The
/// character is not echoed to the console.
pub fn getc(regs: &mut Registers, console: &mut dyn Console) {
    let byte = console.read_byte().expect("Error while reading stdin");
    regs.write(0, byte as u16);
}

/// Writes the character in the low byte of R0 to the console.
pub fn out(regs: &Registers, console: &mut dyn Console) {
    console.write_byte(regs.read(0) as u8);
    console.flush();
}

/// Writes the NUL-terminated string starting at the address in R0, one
/// character per memory word, stopping at the first 0x0000 word.
pub fn puts(regs: &Registers, mem: &mut Memory, console: &mut dyn Console) {
    let mut addr = regs.read(0);
    loop {
        let chr = mem.read(addr, console);
        if chr == 0x0000 {
            break;
        }
        console.write_byte(chr as u8);
        if addr == u16::MAX {
            break;
        }
        addr = addr.wrapping_add(1);
    }
    console.flush();
}

/// Writes the NUL-terminated string starting at the address in R0, two
/// packed characters per memory word (low byte first), stopping at the
/// first 0x0000 word.
pub fn putsp(regs: &Registers, mem: &mut Memory, console: &mut dyn Console) {
    let mut addr = regs.read(0);
    loop {
        let word = mem.read(addr, console);
        if word == 0x0000 {
            break;
        }
        let [chr2, chr1] = word.to_be_bytes();
        console.write_byte(chr1);
        if chr2 != 0 {
            console.write_byte(chr2);
        }
        if addr == u16::MAX {
            break;
        }
        addr = addr.wrapping_add(1);
    }
    console.flush();
}

/// Prompts for and reads a single character, echoing it back to the console.
pub fn r#in(regs: &mut Registers, console: &mut dyn Console) {
    for byte in b"Enter character: " {
        console.write_byte(*byte);
    }
    console.flush();
    let byte = console.read_byte().expect("Error while reading stdin");
    console.write_byte(byte);
    console.flush();
    regs.write(0, byte as u16);
}

/// Prints `HALT` followed by a newline and signals the run loop to stop.
pub fn halt(console: &mut dyn Console) {
    for byte in b"HALT\n" {
        console.write_byte(*byte);
    }
    console.flush();
}
