pub mod error;
pub mod flags;
pub mod instructions;
pub mod trace;

use std::io::Write;

use log::debug;
use smallvec::SmallVec;

use crate::loader::Program;
use error::ExecError;
use flags::Flags;
use instructions::{Instruction, Opcode};
use trace::Tracer;

pub const MEMORY_SIZE: usize = 256;
pub const REGISTER_COUNT: usize = 8;

/// Outcome of a single fetch-decode-execute cycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Continue,
    Halt,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub steps: u64,
    pub halted_at: usize,
    pub halt_byte: u8,
}

pub struct Computer {
    program_counter: usize,
    registers: [u8; REGISTER_COUNT],
    flags: Flags,

    ram: [u8; MEMORY_SIZE],

    tracer: Option<Box<dyn Tracer>>,
}

impl Default for Computer {
    fn default() -> Self {
        Computer::new()
    }
}

impl Computer {
    pub fn new() -> Computer {
        Computer {
            program_counter: 0,
            registers: [0; REGISTER_COUNT],
            flags: Flags::default(),
            ram: [0; MEMORY_SIZE],
            tracer: None,
        }
    }

    pub fn load_program(&mut self, program: &Program) -> Result<(), ExecError> {
        self.load_bytes(program.bytes())
    }

    /// Copies `bytes` into memory starting at address 0.
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<(), ExecError> {
        if bytes.len() > MEMORY_SIZE {
            return Err(ExecError::ProgramTooLarge {
                len: bytes.len(),
                capacity: MEMORY_SIZE,
            });
        }

        self.ram[..bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    pub fn set_tracer(&mut self, tracer: Box<dyn Tracer>) {
        self.tracer = Some(tracer);
    }

    pub fn pc(&self) -> usize {
        self.program_counter
    }

    pub fn set_pc(&mut self, pc: u8) {
        self.program_counter = pc as usize;
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn registers(&self) -> &[u8; REGISTER_COUNT] {
        &self.registers
    }

    pub fn ram_read(&self, address: usize) -> Result<u8, ExecError> {
        self.ram
            .get(address)
            .copied()
            .ok_or(ExecError::AddressOutOfRange { address })
    }

    pub fn ram_write(&mut self, address: usize, value: u8) -> Result<(), ExecError> {
        let cell = self
            .ram
            .get_mut(address)
            .ok_or(ExecError::AddressOutOfRange { address })?;
        *cell = value;
        Ok(())
    }

    pub fn register(&self, index: u8) -> Result<u8, ExecError> {
        self.registers
            .get(index as usize)
            .copied()
            .ok_or(ExecError::RegisterOutOfRange {
                index,
                available: REGISTER_COUNT,
            })
    }

    pub fn set_register(&mut self, index: u8, value: u8) -> Result<(), ExecError> {
        let slot = self
            .registers
            .get_mut(index as usize)
            .ok_or(ExecError::RegisterOutOfRange {
                index,
                available: REGISTER_COUNT,
            })?;
        *slot = value;
        Ok(())
    }

    /// Decodes the instruction at `pc`, reading only the operand bytes the
    /// opcode uses.
    pub fn decode(&self, pc: usize) -> Result<Instruction, ExecError> {
        let byte = self.ram_read(pc).map_err(|_| ExecError::PcOutOfRange { pc })?;

        let Some(opcode) = Opcode::from_byte(byte) else {
            return Ok(Instruction::Halt(byte));
        };

        let operands = (1..=opcode.operand_count())
            .map(|offset| {
                self.ram_read(pc + offset)
                    .map_err(|_| ExecError::FetchOutOfRange { pc })
            })
            .collect::<Result<SmallVec<[u8; 2]>, ExecError>>()?;

        Ok(Instruction::Op { opcode, operands })
    }

    pub fn step<W: Write>(&mut self, out: &mut W) -> Result<Step, ExecError> {
        let pc = self.program_counter;
        let instruction = self.decode(pc)?;

        if let Some(mut tracer) = self.tracer.take() {
            tracer.trace(self);
            self.tracer = Some(tracer);
        }

        let (opcode, op1, op2) = match &instruction {
            Instruction::Halt(byte) => {
                debug!("halt on byte {byte:#010b} at {pc:#04x}");
                return Ok(Step::Halt);
            }
            Instruction::Op { opcode, .. } => {
                (*opcode, instruction.operand(0), instruction.operand(1))
            }
        };

        log::trace!("{pc:#04x}: {} {op1} {op2}", opcode.mnemonic());

        let next = pc + opcode.encoded_len() as usize;

        self.program_counter = match opcode {
            Opcode::Ldi => {
                self.set_register(op1, op2)?;
                next
            }
            Opcode::Prn => {
                let value = self.register(op1)?;
                writeln!(out, "{value}").map_err(|err| ExecError::Output(err.to_string()))?;
                next
            }
            Opcode::Cmp => {
                let a = self.register(op1)?;
                let b = self.register(op2)?;
                self.flags = Flags::from_ordering(a.cmp(&b));
                next
            }
            Opcode::Jmp => self.register(op1)? as usize,
            Opcode::Jeq if self.flags.equal() => self.register(op1)? as usize,
            Opcode::Jne if !self.flags.equal() => self.register(op1)? as usize,
            Opcode::Jeq | Opcode::Jne => next,
        };

        Ok(Step::Continue)
    }

    /// Runs until the first unrecognized opcode. A program that never
    /// reaches one runs forever.
    pub fn run<W: Write>(&mut self, out: &mut W) -> Result<RunSummary, ExecError> {
        let mut steps = 0;

        while self.step(out)? == Step::Continue {
            steps += 1;
        }

        let halted_at = self.program_counter;
        Ok(RunSummary {
            steps,
            halted_at,
            halt_byte: self.ram_read(halted_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LDI: u8 = 0b1000_0010;
    const PRN: u8 = 0b0100_0111;
    const CMP: u8 = 0b1010_0111;
    const JMP: u8 = 0b0101_0100;
    const JEQ: u8 = 0b0101_0101;
    const JNE: u8 = 0b0101_0110;

    fn computer_with(bytes: &[u8]) -> Computer {
        let mut computer = Computer::new();
        computer.load_bytes(bytes).unwrap();
        computer
    }

    fn run_to_string(computer: &mut Computer) -> String {
        let mut out = Vec::new();
        computer.run(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn ldi_sets_every_register_and_advances_three() {
        for register in 0..REGISTER_COUNT as u8 {
            for value in [0u8, 1, 127, 128, 255] {
                let mut computer = computer_with(&[LDI, register, value]);
                assert_eq!(computer.step(&mut Vec::new()).unwrap(), Step::Continue);
                assert_eq!(computer.register(register).unwrap(), value);
                assert_eq!(computer.pc(), 3);
            }
        }
    }

    #[test]
    fn prn_writes_decimal_and_advances_two() {
        let mut computer = computer_with(&[LDI, 2, 200, PRN, 2]);
        let mut out = Vec::new();
        computer.step(&mut out).unwrap();
        computer.step(&mut out).unwrap();

        assert_eq!(out, b"200\n");
        assert_eq!(computer.pc(), 5);
    }

    #[test]
    fn cmp_sets_exactly_one_flag() {
        for (a, b) in [(1u8, 2u8), (2, 1), (7, 7), (0, 255), (255, 0)] {
            let mut computer = computer_with(&[LDI, 0, a, LDI, 1, b, CMP, 0, 1]);
            for _ in 0..3 {
                computer.step(&mut Vec::new()).unwrap();
            }
            let flags = computer.flags();

            assert_eq!(flags.bits().count_ones(), 1);
            assert_eq!(flags.equal(), a == b);
            assert_eq!(flags.less(), a < b);
            assert_eq!(flags.greater(), a > b);
            assert_eq!(computer.pc(), 9);
        }
    }

    #[test]
    fn jmp_is_unconditional() {
        let mut computer = computer_with(&[LDI, 4, 0x40, JMP, 4]);
        computer.step(&mut Vec::new()).unwrap();
        computer.step(&mut Vec::new()).unwrap();
        assert_eq!(computer.pc(), 0x40);
    }

    #[test]
    fn jeq_follows_equal_flag() {
        let equal = [LDI, 0, 5, LDI, 1, 5, LDI, 2, 0x80, CMP, 0, 1, JEQ, 2];
        let mut computer = computer_with(&equal);
        for _ in 0..5 {
            computer.step(&mut Vec::new()).unwrap();
        }
        assert_eq!(computer.pc(), 0x80);

        let unequal = [LDI, 0, 5, LDI, 1, 6, LDI, 2, 0x80, CMP, 0, 1, JEQ, 2];
        let mut computer = computer_with(&unequal);
        for _ in 0..5 {
            computer.step(&mut Vec::new()).unwrap();
        }
        assert_eq!(computer.pc(), 14);
    }

    #[test]
    fn jne_follows_cleared_equal_flag() {
        let unequal = [LDI, 0, 5, LDI, 1, 6, LDI, 2, 0x80, CMP, 0, 1, JNE, 2];
        let mut computer = computer_with(&unequal);
        for _ in 0..5 {
            computer.step(&mut Vec::new()).unwrap();
        }
        assert_eq!(computer.pc(), 0x80);

        let equal = [LDI, 0, 5, LDI, 1, 5, LDI, 2, 0x80, CMP, 0, 1, JNE, 2];
        let mut computer = computer_with(&equal);
        for _ in 0..5 {
            computer.step(&mut Vec::new()).unwrap();
        }
        assert_eq!(computer.pc(), 14);
    }

    #[test]
    fn jne_jumps_before_any_compare() {
        let mut computer = computer_with(&[LDI, 0, 0x20, JNE, 0]);
        computer.step(&mut Vec::new()).unwrap();
        computer.step(&mut Vec::new()).unwrap();
        assert_eq!(computer.pc(), 0x20);
    }

    #[test]
    fn zeroed_memory_halts_immediately() {
        let mut computer = Computer::new();
        let summary = computer.run(&mut Vec::new()).unwrap();

        assert_eq!(summary.steps, 0);
        assert_eq!(summary.halted_at, 0);
        assert_eq!(summary.halt_byte, 0);
    }

    #[test]
    fn unknown_opcode_halts_without_error() {
        let mut computer = computer_with(&[LDI, 0, 1, 0b1111_1111]);
        let summary = computer.run(&mut Vec::new()).unwrap();

        assert_eq!(summary.steps, 1);
        assert_eq!(summary.halt_byte, 0xFF);
    }

    #[test]
    fn ldi_prn_halt_prints_eight() {
        let mut computer = computer_with(&[LDI, 0, 8, PRN, 0, 0]);
        assert_eq!(run_to_string(&mut computer), "8\n");
    }

    #[test]
    fn loop_prints_until_compare_matches() {
        // R0 counts up, R1 is the limit, R2 the loop head, R3 the exit.
        let program = [
            LDI, 0, 0, // 0
            LDI, 1, 3, // 3
            LDI, 2, 12, // 6
            LDI, 3, 24, // 9
            PRN, 0, // 12
            CMP, 0, 1, // 14
            JEQ, 3, // 17
            LDI, 0, 3, // 19
            JMP, 2, // 22
            0, // 24
        ];
        let mut computer = computer_with(&program);
        assert_eq!(run_to_string(&mut computer), "0\n3\n");
    }

    #[test]
    fn register_index_out_of_range_fails_fast() {
        let mut computer = computer_with(&[LDI, 8, 1]);
        assert_eq!(
            computer.step(&mut Vec::new()),
            Err(ExecError::RegisterOutOfRange {
                index: 8,
                available: REGISTER_COUNT
            })
        );
    }

    #[test]
    fn operands_past_end_of_memory_fail() {
        let mut computer = Computer::new();
        computer.ram_write(0xFE, LDI).unwrap();
        computer.set_pc(0xFE);

        assert_eq!(
            computer.step(&mut Vec::new()),
            Err(ExecError::FetchOutOfRange { pc: 0xFE })
        );
    }

    #[test]
    fn pc_past_end_of_memory_fails() {
        let mut computer = Computer::new();
        computer.ram_write(0xFD, PRN).unwrap();
        computer.ram_write(0xFE, 0).unwrap();
        computer.set_pc(0xFD);
        let mut out = Vec::new();

        assert_eq!(computer.step(&mut out), Ok(Step::Continue));
        assert_eq!(computer.step(&mut out), Ok(Step::Halt));

        computer.ram_write(0xFE, PRN).unwrap();
        computer.ram_write(0xFF, 0).unwrap();
        computer.set_pc(0xFE);
        assert_eq!(computer.step(&mut out), Ok(Step::Continue));
        assert_eq!(
            computer.step(&mut out),
            Err(ExecError::PcOutOfRange { pc: MEMORY_SIZE })
        );
    }

    #[test]
    fn oversized_program_is_rejected() {
        let mut computer = Computer::new();
        assert_eq!(
            computer.load_bytes(&[0; MEMORY_SIZE + 1]),
            Err(ExecError::ProgramTooLarge {
                len: MEMORY_SIZE + 1,
                capacity: MEMORY_SIZE
            })
        );
    }

    struct Recorder(std::rc::Rc<std::cell::RefCell<Vec<usize>>>);

    impl Tracer for Recorder {
        fn trace(&mut self, computer: &Computer) {
            self.0.borrow_mut().push(computer.pc());
        }
    }

    #[test]
    fn tracer_sees_each_fetch_without_changing_output() {
        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut computer = computer_with(&[LDI, 0, 8, PRN, 0, 0]);
        computer.set_tracer(Box::new(Recorder(seen.clone())));

        assert_eq!(run_to_string(&mut computer), "8\n");
        assert_eq!(*seen.borrow(), vec![0, 3, 5]);
    }
}
