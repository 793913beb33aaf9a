//! The fetch-decode-execute loop and the machine state it operates on.

use crate::console::Console;
use crate::instructions;
use crate::memory::Memory;
use crate::opcode::Opcode;
use crate::registers::Registers;

use byteorder::{BigEndian, ReadBytesExt};
use std::convert::TryFrom;
use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The LC-3 machine: its registers, its 16-bit address space, and the
/// run/halt state of the fetch-decode-execute loop.
pub struct Vm {
    regs: Registers,
    mem: Memory,
    running: bool,
    interrupted: Arc<AtomicBool>,
}

impl Vm {
    /// Creates a new `Vm` with zeroed registers and memory.
    ///
    /// `interrupted` is checked once per fetch and is expected to be flipped
    /// from a Ctrl-C handler installed by the caller; passing a fresh,
    /// never-set flag is fine for callers that don't need that behavior.
    pub fn new(interrupted: Arc<AtomicBool>) -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::new(),
            running: false,
            interrupted,
        }
    }

    /// Loads a program image into memory.
    ///
    /// The first two bytes of `reader` give the origin address; every
    /// following 16-bit big-endian word is written starting there, until the
    /// reader is exhausted or the address space wraps.
    pub fn load_program<R: Read>(&mut self, mut reader: R) -> io::Result<()> {
        let origin = reader.read_u16::<BigEndian>()?;
        let mut address = origin;
        loop {
            match reader.read_u16::<BigEndian>() {
                Ok(instr) => self.mem.write(address, instr),
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e),
            }
            if address == u16::MAX {
                break;
            }
            address = address.wrapping_add(1);
        }
        Ok(())
    }

    /// Runs the fetch-decode-execute loop until a `HALT` trap, a Ctrl-C, or a
    /// fatal guest error (an illegal opcode, `RTI`, or `RES`) stops it.
    pub fn run(&mut self, console: &mut dyn Console) {
        self.running = true;
        self.main_loop(console);
    }

    /// Returns whether the loop was stopped by `Ctrl-C` rather than `HALT`.
    pub fn was_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    fn main_loop(&mut self, console: &mut dyn Console) {
        while self.running {
            if self.interrupted.load(Ordering::SeqCst) {
                log::debug!("interrupted at pc={:#06x}", self.regs.pc);
                self.running = false;
                break;
            }

            let instr = self.mem.read(self.regs.pc, console);
            log::trace!("pc={:#06x} instr={:#06x}", self.regs.pc, instr);
            self.regs.pc = self.regs.pc.wrapping_add(1);
            let (regs, mem) = (&mut self.regs, &mut self.mem);
            let opcode = Opcode::try_from(instr >> 12)
                .unwrap_or_else(|_| unreachable!("instr >> 12 is always a nibble"));
            match opcode {
                Opcode::Br => instructions::br(instr, regs),
                Opcode::Add => instructions::add(instr, regs),
                Opcode::Ld => instructions::ld(instr, regs, mem, console),
                Opcode::St => instructions::st(instr, regs, mem),
                Opcode::Jsr => instructions::jsr(instr, regs),
                Opcode::And => instructions::and(instr, regs),
                Opcode::Ldr => instructions::ldr(instr, regs, mem, console),
                Opcode::Str => instructions::str(instr, regs, mem),
                Opcode::Rti => panic!("Illegal opcode: 0b1000 (RTI)"),
                Opcode::Not => instructions::not(instr, regs),
                Opcode::Ldi => instructions::ldi(instr, regs, mem, console),
                Opcode::Sti => instructions::sti(instr, regs, mem, console),
                Opcode::Jmp => instructions::jmp(instr, regs),
                Opcode::Res => panic!("Illegal opcode: 0b1101 (RES)"),
                Opcode::Lea => instructions::lea(instr, regs),
                Opcode::Trap => {
                    let should_halt = instructions::trap(instr, regs, mem, console);
                    if should_halt {
                        log::debug!("halted at pc={:#06x}", self.regs.pc);
                        self.running = false;
                    }
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::TestConsole;

    fn image_bytes(origin: u16, words: &[u16]) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(2 + words.len() * 2);
        bytes.extend_from_slice(&origin.to_be_bytes());
        for word in words {
            bytes.extend_from_slice(&word.to_be_bytes());
        }
        bytes
    }

    #[test]
    fn runs_add_and_halts() {
        let mut vm = Vm::new(Arc::new(AtomicBool::new(false)));
        // AND R0, R0, #0 ; clear R0
        // ADD R0, R0, #7
        // TRAP HALT
        let image = image_bytes(
            0x3000,
            &[0b0101_000_000_1_00000, 0b0001_000_000_1_00111, 0xF025],
        );
        vm.load_program(&image[..]).unwrap();
        let mut console = TestConsole::new();
        vm.run(&mut console);
        assert_eq!(console.output_as_str(), "HALT\n");
        assert!(!vm.running);
    }

    #[test]
    fn interrupt_flag_stops_the_loop() {
        let interrupted = Arc::new(AtomicBool::new(true));
        let mut vm = Vm::new(interrupted.clone());
        // An infinite BR loop that would never halt on its own.
        let image = image_bytes(0x3000, &[0b0000_111_111111111]);
        vm.load_program(&image[..]).unwrap();
        let mut console = TestConsole::new();
        vm.run(&mut console);
        assert!(vm.was_interrupted());
    }

    #[test]
    fn scenario_outputs_a_single_character() {
        let mut vm = Vm::new(Arc::new(AtomicBool::new(false)));
        // LD R0, +2 ; TRAP OUT ; TRAP HALT ; 'A'
        let image = image_bytes(0x3000, &[0x2002, 0xF021, 0xF025, 0x0041]);
        vm.load_program(&image[..]).unwrap();
        let mut console = TestConsole::new();
        vm.run(&mut console);
        assert_eq!(console.output_as_str(), "AHALT\n");
    }

    #[test]
    fn scenario_prints_a_null_terminated_string() {
        let mut vm = Vm::new(Arc::new(AtomicBool::new(false)));
        // LEA R0, +3 (effective address is relative to the incremented PC,
        // 0x3001+3=0x3004) ; TRAP PUTS ; TRAP HALT ; unused slot ; 'H' 'I' NUL
        let image = image_bytes(0x3000, &[0xE003, 0xF022, 0xF025, 0, 0x0048, 0x0049, 0x0000]);
        vm.load_program(&image[..]).unwrap();
        let mut console = TestConsole::new();
        vm.run(&mut console);
        assert_eq!(console.output_as_str(), "HIHALT\n");
    }

    #[test]
    fn scenario_ldi_indirection() {
        let mut vm = Vm::new(Arc::new(AtomicBool::new(false)));
        // LDI R0, +5 ; TRAP HALT, then padding. The effective address is
        // relative to the *incremented* PC (0x3001, per fetch-then-execute),
        // so the pointer at 0x3001+5=0x3006 holds a pointer to 0x3100, and a
        // second image places the pointed-to value there.
        let mut image = image_bytes(0x3000, &[0xA005, 0xF025, 0, 0, 0, 0]);
        image.extend_from_slice(&0x3100u16.to_be_bytes()); // address 0x3006
        vm.load_program(&image[..]).unwrap();
        let pointer_target = image_bytes(0x3100, &[0x00AB]);
        vm.load_program(&pointer_target[..]).unwrap();

        let mut console = TestConsole::new();
        vm.run(&mut console);
        assert_eq!(console.output_as_str(), "HALT\n");
    }

    #[test]
    fn scenario_jsr_links_and_returns_then_halts() {
        let mut vm = Vm::new(Arc::new(AtomicBool::new(false)));
        // 0x3000: JSR +2 -> links R7=0x3001, jumps to 0x3003
        // 0x3001: TRAP HALT
        // 0x3002: unused
        // 0x3003: JMP R7 -> returns to 0x3001
        let image = image_bytes(0x3000, &[0x4802, 0xF025, 0x0000, 0xC1C0]);
        vm.load_program(&image[..]).unwrap();
        let mut console = TestConsole::new();
        vm.run(&mut console);
        assert_eq!(console.output_as_str(), "HALT\n");
    }
}
