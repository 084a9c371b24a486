//! The control unit: fetch/decode/execute sequencing.
//!
//! One instruction retires per call to [`ControlUnit::tick`]: the shared
//! fetch microprogram runs first, then one of two microcode tables is
//! selected by `(opcode, operand_flag)`, mirroring
//! `original_source/machine.py`'s `no_operand_mcode`/`one_operand_mcode`
//! dicts keyed the same way. `run` drives `tick` until the datapath raises
//! its halt flag, logging the same start/stop milestones as the original's
//! top-level `simulate` function.

use crate::datapath::DataPath;
use crate::fault::Fault;
use crate::opcode::OpCode;
use crate::signal::{
    AluMuxSignal, AluSignal, ControlSignal, DataMemorySignal, DataStackSignal, DmMuxSignal,
    DsMuxSignal, InstructionMemorySignal, IpMuxSignal, JumpSignal, LatchSignal,
    ReturnStackSignal, Signal,
};

const FETCH: [Signal; 8] = [
    Signal::InstructionMemory(InstructionMemorySignal::SetAddress),
    Signal::InstructionMemory(InstructionMemorySignal::Read),
    Signal::Latch(LatchSignal::Ir),
    Signal::AluMuxA(AluMuxSignal::InstructionMemory),
    Signal::AluMuxB(AluMuxSignal::Zero),
    Signal::Alu(AluSignal::Add),
    Signal::IpMux(IpMuxSignal::IpPlusOne),
    Signal::Latch(LatchSignal::Ip),
];

/// Selects the microprogram for one opcode. `has_operand` only distinguishes
/// `read`/`save`, whose no-operand and operand forms differ in whether the
/// address comes from the data stack or from the already-resolved operand.
fn microprogram(opcode: OpCode, has_operand: bool) -> &'static [Signal] {
    use AluMuxSignal::{Alu as AluMuxAlu, DataStack as AluMuxDs, One, Zero};
    use AluSignal::*;
    use DataMemorySignal::{Read as DmRead, SetAddress as DmSetAddress, Write as DmWrite};
    use DataStackSignal::{Pop, Push, Swap};
    use DmMuxSignal::{Alu as DmMuxAlu, DataStack as DmMuxDs};
    use DsMuxSignal::{Alu as DsMuxAlu, DataMemory as DsMuxDm, DataStack as DsMuxDs};
    use Signal::{AluMuxA, AluMuxB, Control, DataMemory, DataStack, DsMux, DmMux, Jump};

    match opcode {
        OpCode::Add => &[
            AluMuxB(AluMuxDs),
            DataStack(Pop),
            AluMuxA(AluMuxDs),
            DataStack(Pop),
            Signal::Alu(Add),
            DsMux(DsMuxAlu),
            DataStack(Push),
        ],
        OpCode::Sub => &[
            AluMuxB(AluMuxDs),
            DataStack(Pop),
            AluMuxA(AluMuxDs),
            DataStack(Pop),
            Signal::Alu(Sub),
            DsMux(DsMuxAlu),
            DataStack(Push),
        ],
        OpCode::Mul => &[
            AluMuxB(AluMuxDs),
            DataStack(Pop),
            AluMuxA(AluMuxDs),
            DataStack(Pop),
            Signal::Alu(Mul),
            DsMux(DsMuxAlu),
            DataStack(Push),
        ],
        OpCode::Div => &[
            AluMuxB(AluMuxDs),
            DataStack(Pop),
            AluMuxA(AluMuxDs),
            DataStack(Pop),
            Signal::Alu(Div),
            DsMux(DsMuxAlu),
            DataStack(Push),
        ],
        OpCode::Mod => &[
            AluMuxB(AluMuxDs),
            DataStack(Pop),
            AluMuxA(AluMuxDs),
            DataStack(Pop),
            Signal::Alu(Mod),
            DsMux(DsMuxAlu),
            DataStack(Push),
        ],
        OpCode::Inc => &[
            AluMuxA(AluMuxDs),
            DataStack(Pop),
            AluMuxB(One),
            Signal::Alu(Add),
            DsMux(DsMuxAlu),
            DataStack(Push),
        ],
        OpCode::Dec => &[
            AluMuxA(AluMuxDs),
            DataStack(Pop),
            AluMuxB(One),
            Signal::Alu(Sub),
            DsMux(DsMuxAlu),
            DataStack(Push),
        ],
        OpCode::Not => &[
            AluMuxA(AluMuxDs),
            DataStack(Pop),
            AluMuxB(Zero),
            Signal::Alu(NotA),
            DsMux(DsMuxAlu),
            DataStack(Push),
        ],
        OpCode::Eql => &[
            AluMuxB(AluMuxDs),
            DataStack(Pop),
            AluMuxA(AluMuxDs),
            DataStack(Pop),
            Signal::Alu(Equals),
            DsMux(DsMuxAlu),
            DataStack(Push),
        ],
        OpCode::Less => &[
            AluMuxB(AluMuxDs),
            DataStack(Pop),
            AluMuxA(AluMuxDs),
            DataStack(Pop),
            Signal::Alu(AluSignal::Less),
            DsMux(DsMuxAlu),
            DataStack(Push),
        ],
        OpCode::Lrg => &[
            AluMuxB(AluMuxDs),
            DataStack(Pop),
            AluMuxA(AluMuxDs),
            DataStack(Pop),
            Signal::Alu(Greater),
            DsMux(DsMuxAlu),
            DataStack(Push),
        ],
        OpCode::Comp => &[
            AluMuxB(AluMuxDs),
            DataStack(Pop),
            AluMuxA(AluMuxDs),
            DataStack(Pop),
            Signal::Alu(Compare),
            DsMux(DsMuxAlu),
            DataStack(Push),
        ],
        OpCode::Dup => &[DsMux(DsMuxDs), DataStack(Push)],
        OpCode::Swap => &[DataStack(Swap)],
        OpCode::Pop => &[DataStack(Pop)],
        OpCode::Push => &[DsMux(DsMuxAlu), DataStack(Push)],
        OpCode::Read if has_operand => &[
            DmMux(DmMuxAlu),
            DataMemory(DmSetAddress),
            DataMemory(DmRead),
            DsMux(DsMuxDm),
            DataStack(Push),
        ],
        OpCode::Read => &[
            DmMux(DmMuxDs),
            DataStack(Pop),
            DataMemory(DmSetAddress),
            DataMemory(DmRead),
            DsMux(DsMuxDm),
            DataStack(Push),
        ],
        OpCode::Save if has_operand => &[
            DmMux(DmMuxAlu),
            DataMemory(DmSetAddress),
            DmMux(DmMuxDs),
            DataStack(Pop),
            DataMemory(DmWrite),
        ],
        OpCode::Save => &[
            DmMux(DmMuxDs),
            DataStack(Pop),
            DataMemory(DmSetAddress),
            DmMux(DmMuxDs),
            DataStack(Pop),
            DataMemory(DmWrite),
        ],
        OpCode::Jmp => &[Jump(JumpSignal::Jmp)],
        OpCode::Jmz => &[Jump(JumpSignal::Jmz), DataStack(Pop)],
        OpCode::Jnz => &[Jump(JumpSignal::Jnz), DataStack(Pop)],
        OpCode::Ret => &[
            Signal::IpMux(IpMuxSignal::ReturnStack),
            Signal::Latch(LatchSignal::Ip),
            Signal::ReturnStack(ReturnStackSignal::Pop),
        ],
        OpCode::Hlt => &[Control(ControlSignal::Halt)],
        OpCode::Nop => &[Control(ControlSignal::Nop)],
    }
}

pub struct ControlUnit {
    pub datapath: DataPath,
    cycle_counter: u64,
    instruction_counter: u64,
}

impl ControlUnit {
    pub fn new(datapath: DataPath) -> ControlUnit {
        ControlUnit {
            datapath,
            cycle_counter: 0,
            instruction_counter: 0,
        }
    }

    pub fn cycle_counter(&self) -> u64 {
        self.cycle_counter
    }

    pub fn instruction_counter(&self) -> u64 {
        self.instruction_counter
    }

    /// Runs fetch/execute cycles until the datapath halts or faults.
    pub fn run(&mut self) -> Result<(), Fault> {
        log::info!("simulation started");
        while !self.datapath.is_halted() {
            self.tick()?;
        }
        log::info!(
            "simulation halted: {} ticks, {} instructions retired, {} output bytes",
            self.cycle_counter,
            self.instruction_counter,
            self.datapath.output_buffer().len()
        );
        Ok(())
    }

    fn tick(&mut self) -> Result<(), Fault> {
        self.run_microprogram(&FETCH)?;

        let instruction = self
            .datapath
            .ir()
            .expect("fetch always latches an instruction before execute runs");
        let opcode = instruction.opcode;
        let has_operand = self.datapath.operand_flag();
        log::debug!(
            "ip={} opcode={} operand_flag={}",
            self.datapath.ip(),
            opcode,
            has_operand
        );

        let steps = microprogram(opcode, has_operand);
        self.run_microprogram(steps)?;
        self.instruction_counter += 1;
        Ok(())
    }

    fn run_microprogram(&mut self, signals: &[Signal]) -> Result<(), Fault> {
        for &signal in signals {
            log::trace!("signal {:?}", signal);
            self.datapath.apply(signal)?;
            self.cycle_counter += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::opcode::Instruction;

    fn load(datapath: &mut DataPath, instructions: &[(usize, OpCode, Option<i64>)]) {
        datapath.instruction_memory.allocate(instructions.len());
        for &(idx, opcode, operand) in instructions {
            datapath.instruction_memory.set_address(idx);
            datapath
                .instruction_memory
                .write(Instruction { idx, opcode, operand })
                .unwrap();
        }
    }

    #[test]
    fn add_two_literals_and_halt() {
        let mut datapath = DataPath::new();
        load(
            &mut datapath,
            &[
                (0, OpCode::Push, Some(2)),
                (1, OpCode::Push, Some(3)),
                (2, OpCode::Add, None),
                (3, OpCode::Hlt, None),
            ],
        );
        let mut cu = ControlUnit::new(datapath);
        cu.run().unwrap();
        assert_eq!(cu.datapath.data_stack.peek(), Some(5));
    }

    #[test]
    fn jmp_pushes_return_address_enabling_ret() {
        let mut datapath = DataPath::new();
        // main: jmp proc; hlt
        // proc: push 7; ret
        load(
            &mut datapath,
            &[
                (0, OpCode::Jmp, Some(2)),
                (1, OpCode::Hlt, None),
                (2, OpCode::Push, Some(7)),
                (3, OpCode::Ret, None),
            ],
        );
        let mut cu = ControlUnit::new(datapath);
        cu.run().unwrap();
        assert_eq!(cu.datapath.data_stack.peek(), Some(7));
        assert!(cu.datapath.is_halted());
    }

    #[test]
    fn output_write_appends_to_buffer() {
        let mut datapath = DataPath::new();
        datapath.data_memory.allocate(2);
        load(
            &mut datapath,
            &[
                (0, OpCode::Push, Some(1)),
                (1, OpCode::Push, Some(65)),
                (2, OpCode::Save, None),
                (3, OpCode::Hlt, None),
            ],
        );
        let mut cu = ControlUnit::new(datapath);
        cu.run().unwrap();
        assert_eq!(cu.datapath.output_buffer(), &[65]);
    }
}
