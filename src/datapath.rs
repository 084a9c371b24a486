//! The datapath: two memories, two stacks, the ALU, and the multiplexers
//! that route values between them.
//!
//! Every side effect is expressed as a [`Signal`] and applied through
//! [`DataPath::apply`], a single exhaustive match replacing
//! `original_source/machine.py`'s `self.handle_signal` dict keyed on the
//! Python `type(mc)` of the signal object. Memory-mapped I/O (`INPUT` at
//! address 0, `OUTPUT` at address 1) is enforced here, inside the
//! data-memory signal handlers, exactly where `original_source/machine.py`
//! enforces it.

use std::collections::VecDeque;

use crate::alu::Alu;
use crate::fault::Fault;
use crate::memory::Memory;
use crate::opcode::Instruction;
use crate::signal::{
    AluMuxSignal, AluSignal, ControlSignal, DataMemorySignal, DataStackSignal, DmMuxSignal,
    DsMuxSignal, InstructionMemorySignal, IpMuxSignal, JumpSignal, LatchSignal,
    ReturnStackSignal, Signal,
};
use crate::stack::Stack;

pub const INPUT_ADDRESS: usize = 0;
pub const OUTPUT_ADDRESS: usize = 1;

#[derive(Debug)]
pub struct DataPath {
    pub data_stack: Stack<i64>,
    pub return_stack: Stack<i64>,
    pub data_memory: Memory<i64>,
    pub instruction_memory: Memory<Instruction>,
    pub alu: Alu,

    ip: usize,
    ir: Option<Instruction>,
    operand_flag: bool,
    halted: bool,

    input_buffer: VecDeque<i64>,
    output_buffer: Vec<i64>,

    ip_mux_out: usize,
    ds_mux_out: i64,
    dm_mux_out: i64,
}

impl Default for DataPath {
    fn default() -> DataPath {
        DataPath {
            data_stack: Stack::new(),
            return_stack: Stack::new(),
            data_memory: Memory::new(),
            instruction_memory: Memory::new(),
            alu: Alu::new(),
            ip: 0,
            ir: None,
            operand_flag: false,
            halted: false,
            input_buffer: VecDeque::new(),
            output_buffer: Vec::new(),
            ip_mux_out: 0,
            ds_mux_out: 0,
            dm_mux_out: 0,
        }
    }
}

impl DataPath {
    pub fn new() -> DataPath {
        DataPath::default()
    }

    pub fn ip(&self) -> usize {
        self.ip
    }

    pub fn ir(&self) -> Option<&Instruction> {
        self.ir.as_ref()
    }

    pub fn operand_flag(&self) -> bool {
        self.operand_flag
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn output_buffer(&self) -> &[i64] {
        &self.output_buffer
    }

    /// Feeds a byte stream to `INPUT`, appending the terminating `0` the
    /// object format expects.
    pub fn load_input(&mut self, bytes: &[u8]) {
        self.input_buffer = bytes.iter().map(|&b| i64::from(b)).collect();
        self.input_buffer.push_back(0);
    }

    pub fn apply(&mut self, signal: Signal) -> Result<(), Fault> {
        match signal {
            Signal::ReturnStack(sig) => self.apply_return_stack(sig),
            Signal::DataStack(sig) => self.apply_data_stack(sig),
            Signal::DataMemory(sig) => self.apply_data_memory(sig),
            Signal::InstructionMemory(sig) => self.apply_instruction_memory(sig),
            Signal::Latch(sig) => self.apply_latch(sig),
            Signal::Alu(sig) => self.apply_alu(sig),
            Signal::IpMux(sig) => self.apply_ip_mux(sig),
            Signal::DsMux(sig) => self.apply_ds_mux(sig),
            Signal::DmMux(sig) => self.apply_dm_mux(sig),
            Signal::AluMuxA(sig) => self.apply_alu_mux_a(sig),
            Signal::AluMuxB(sig) => self.apply_alu_mux_b(sig),
            Signal::Jump(sig) => self.apply_jump(sig),
            Signal::Control(sig) => self.apply_control(sig),
        }
    }

    fn apply_return_stack(&mut self, sig: ReturnStackSignal) -> Result<(), Fault> {
        match sig {
            ReturnStackSignal::Push => {
                self.return_stack.push(self.ip as i64);
                Ok(())
            }
            ReturnStackSignal::Pop => self
                .return_stack
                .pop()
                .map(|_| ())
                .ok_or(Fault::StackUnderflow),
        }
    }

    fn apply_data_stack(&mut self, sig: DataStackSignal) -> Result<(), Fault> {
        match sig {
            DataStackSignal::Push => {
                self.data_stack.push(self.ds_mux_out);
                Ok(())
            }
            DataStackSignal::Pop => self
                .data_stack
                .pop()
                .map(|_| ())
                .ok_or(Fault::StackUnderflow),
            DataStackSignal::Swap => self.data_stack.swap(),
        }
    }

    fn apply_data_memory(&mut self, sig: DataMemorySignal) -> Result<(), Fault> {
        match sig {
            DataMemorySignal::SetAddress => {
                self.data_memory.set_address(self.dm_mux_out as usize);
                Ok(())
            }
            DataMemorySignal::Read => {
                let address = self.data_memory.address();
                if address == OUTPUT_ADDRESS {
                    return Err(Fault::ForbiddenRead { address });
                }
                if address == INPUT_ADDRESS {
                    let byte = self.input_buffer.pop_front().ok_or(Fault::InputExhausted)?;
                    self.data_memory.stage(byte);
                    Ok(())
                } else {
                    self.data_memory.read()
                }
            }
            DataMemorySignal::Write => {
                let address = self.data_memory.address();
                if address == INPUT_ADDRESS {
                    return Err(Fault::ForbiddenWrite { address });
                }
                if address == OUTPUT_ADDRESS {
                    self.output_buffer.push(self.dm_mux_out);
                    self.data_memory.stage(self.dm_mux_out);
                    Ok(())
                } else {
                    self.data_memory.write(self.dm_mux_out)
                }
            }
        }
    }

    fn apply_instruction_memory(&mut self, sig: InstructionMemorySignal) -> Result<(), Fault> {
        match sig {
            InstructionMemorySignal::SetAddress => {
                self.instruction_memory.set_address(self.ip);
                Ok(())
            }
            InstructionMemorySignal::Read => self.instruction_memory.read(),
        }
    }

    fn apply_latch(&mut self, sig: LatchSignal) -> Result<(), Fault> {
        match sig {
            LatchSignal::Ip => {
                self.ip = self.ip_mux_out;
                Ok(())
            }
            LatchSignal::Ir => {
                self.ir = self.instruction_memory.data_register().cloned();
                Ok(())
            }
        }
    }

    fn apply_alu(&mut self, sig: AluSignal) -> Result<(), Fault> {
        match sig {
            AluSignal::Add => {
                self.alu.add();
                Ok(())
            }
            AluSignal::Sub => {
                self.alu.sub();
                Ok(())
            }
            AluSignal::Mul => {
                self.alu.mul();
                Ok(())
            }
            AluSignal::Div => self.alu.div().map(|_| ()),
            AluSignal::Mod => self.alu.modulo().map(|_| ()),
            AluSignal::Compare => {
                self.alu.compare();
                Ok(())
            }
            AluSignal::Equals => {
                self.alu.equals();
                Ok(())
            }
            AluSignal::Less => {
                self.alu.less();
                Ok(())
            }
            AluSignal::Greater => {
                self.alu.greater();
                Ok(())
            }
            AluSignal::NotA => {
                self.alu.not_a();
                Ok(())
            }
            AluSignal::NotB => {
                self.alu.not_b();
                Ok(())
            }
        }
    }

    fn apply_ip_mux(&mut self, sig: IpMuxSignal) -> Result<(), Fault> {
        self.ip_mux_out = match sig {
            IpMuxSignal::IpPlusOne => self.ip + 1,
            IpMuxSignal::DataStack => {
                self.data_stack.peek().ok_or(Fault::StackUnderflow)? as usize
            }
            IpMuxSignal::ReturnStack => {
                self.return_stack.peek().ok_or(Fault::StackUnderflow)? as usize
            }
            IpMuxSignal::Alu => self.alu.result as usize,
        };
        Ok(())
    }

    fn apply_ds_mux(&mut self, sig: DsMuxSignal) -> Result<(), Fault> {
        self.ds_mux_out = match sig {
            DsMuxSignal::DataStack => self.data_stack.peek().ok_or(Fault::StackUnderflow)?,
            DsMuxSignal::DataMemory => *self
                .data_memory
                .data_register()
                .ok_or(Fault::UninitializedRead {
                    address: self.data_memory.address(),
                })?,
            DsMuxSignal::Alu => self.alu.result,
        };
        Ok(())
    }

    fn apply_dm_mux(&mut self, sig: DmMuxSignal) -> Result<(), Fault> {
        self.dm_mux_out = match sig {
            DmMuxSignal::DataStack => self.data_stack.peek().ok_or(Fault::StackUnderflow)?,
            DmMuxSignal::Alu => self.alu.result,
        };
        Ok(())
    }

    fn apply_alu_mux_a(&mut self, sig: AluMuxSignal) -> Result<(), Fault> {
        self.alu.a = self.resolve_alu_mux(sig)?;
        Ok(())
    }

    fn apply_alu_mux_b(&mut self, sig: AluMuxSignal) -> Result<(), Fault> {
        self.alu.b = self.resolve_alu_mux(sig)?;
        Ok(())
    }

    fn resolve_alu_mux(&mut self, sig: AluMuxSignal) -> Result<i64, Fault> {
        Ok(match sig {
            AluMuxSignal::DataStack => self.data_stack.peek().ok_or(Fault::StackUnderflow)?,
            AluMuxSignal::InstructionMemory => {
                let operand = self.ir.as_ref().and_then(|ir| ir.operand);
                self.operand_flag = operand.is_some();
                operand.unwrap_or(0)
            }
            AluMuxSignal::Alu => self.alu.result,
            AluMuxSignal::Zero => 0,
            AluMuxSignal::One => 1,
        })
    }

    fn apply_jump(&mut self, sig: JumpSignal) -> Result<(), Fault> {
        let top = match sig {
            JumpSignal::Jmp => None,
            JumpSignal::Jmz | JumpSignal::Jnz => {
                Some(self.data_stack.peek().ok_or(Fault::StackUnderflow)?)
            }
        };
        let taken = match sig {
            JumpSignal::Jmp => true,
            JumpSignal::Jmz => top == Some(0),
            JumpSignal::Jnz => top != Some(0),
        };
        if taken {
            self.return_stack.push(self.ip as i64);
            self.ip = self.alu.result as usize;
        }
        Ok(())
    }

    fn apply_control(&mut self, sig: ControlSignal) -> Result<(), Fault> {
        match sig {
            ControlSignal::Halt => {
                self.halted = true;
                Ok(())
            }
            ControlSignal::Nop => Ok(()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::opcode::OpCode;

    fn push(dp: &mut DataPath, value: i64) {
        dp.alu.result = value;
        dp.apply(Signal::DsMux(DsMuxSignal::Alu)).unwrap();
        dp.apply(Signal::DataStack(DataStackSignal::Push)).unwrap();
    }

    #[test]
    fn output_write_redirects_to_buffer_not_array() {
        let mut dp = DataPath::new();
        dp.dm_mux_out = OUTPUT_ADDRESS as i64;
        dp.apply(Signal::DataMemory(DataMemorySignal::SetAddress))
            .unwrap();
        dp.dm_mux_out = 65;
        dp.apply(Signal::DataMemory(DataMemorySignal::Write))
            .unwrap();
        assert_eq!(dp.output_buffer(), &[65]);
    }

    #[test]
    fn input_read_consumes_buffer_not_array() {
        let mut dp = DataPath::new();
        dp.load_input(b"A");
        dp.dm_mux_out = INPUT_ADDRESS as i64;
        dp.apply(Signal::DataMemory(DataMemorySignal::SetAddress))
            .unwrap();
        dp.apply(Signal::DataMemory(DataMemorySignal::Read))
            .unwrap();
        assert_eq!(*dp.data_memory.data_register().unwrap(), 65);
    }

    #[test]
    fn writing_input_address_is_forbidden() {
        let mut dp = DataPath::new();
        dp.dm_mux_out = INPUT_ADDRESS as i64;
        dp.apply(Signal::DataMemory(DataMemorySignal::SetAddress))
            .unwrap();
        let err = dp
            .apply(Signal::DataMemory(DataMemorySignal::Write))
            .unwrap_err();
        assert_eq!(err, Fault::ForbiddenWrite { address: 0 });
    }

    #[test]
    fn reading_output_address_is_forbidden() {
        let mut dp = DataPath::new();
        dp.dm_mux_out = OUTPUT_ADDRESS as i64;
        dp.apply(Signal::DataMemory(DataMemorySignal::SetAddress))
            .unwrap();
        let err = dp
            .apply(Signal::DataMemory(DataMemorySignal::Read))
            .unwrap_err();
        assert_eq!(err, Fault::ForbiddenRead { address: 1 });
    }

    #[test]
    fn jmz_pushes_return_address_only_when_taken() {
        let mut dp = DataPath::new();
        dp.ip = 5;
        push(&mut dp, 1);
        dp.alu.result = 99;
        dp.apply(Signal::Jump(JumpSignal::Jmz)).unwrap();
        assert!(dp.return_stack.is_empty());
        assert_eq!(dp.ip, 5);

        push(&mut dp, 0);
        dp.alu.result = 99;
        dp.apply(Signal::Jump(JumpSignal::Jmz)).unwrap();
        assert_eq!(dp.return_stack.peek().unwrap(), 5);
        assert_eq!(dp.ip, 99);
    }

    #[test]
    fn instruction_memory_roundtrips_an_instruction() {
        let mut dp = DataPath::new();
        dp.instruction_memory.allocate(1);
        dp.instruction_memory.set_address(0);
        dp.instruction_memory
            .write(Instruction {
                idx: 0,
                opcode: OpCode::Hlt,
                operand: None,
            })
            .unwrap();
        dp.apply(Signal::InstructionMemory(InstructionMemorySignal::SetAddress))
            .unwrap();
        dp.apply(Signal::InstructionMemory(InstructionMemorySignal::Read))
            .unwrap();
        dp.apply(Signal::Latch(LatchSignal::Ir)).unwrap();
        assert_eq!(dp.ir().unwrap().opcode, OpCode::Hlt);
    }
}
