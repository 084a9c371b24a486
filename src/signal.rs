//! Control signals: the primitive, one-tick state changes a microprogram is
//! built from.
//!
//! `original_source/machine.py` dispatches each microcode step through
//! `self.handle_signal`, a dict keyed on the Python `type(mc)` of the signal
//! object. This repository replaces that with a single tagged [`Signal`]
//! enum dispatched by one exhaustive `match` in [`crate::datapath::DataPath::apply`].

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ReturnStackSignal {
    Push,
    Pop,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DataStackSignal {
    Push,
    Pop,
    Swap,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DataMemorySignal {
    Read,
    Write,
    SetAddress,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InstructionMemorySignal {
    Read,
    SetAddress,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LatchSignal {
    Ip,
    Ir,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AluSignal {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Compare,
    Equals,
    Less,
    Greater,
    NotA,
    NotB,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum IpMuxSignal {
    IpPlusOne,
    DataStack,
    ReturnStack,
    Alu,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DsMuxSignal {
    DataStack,
    DataMemory,
    Alu,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DmMuxSignal {
    DataStack,
    Alu,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AluMuxSignal {
    DataStack,
    InstructionMemory,
    Alu,
    Zero,
    One,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum JumpSignal {
    Jmp,
    Jmz,
    Jnz,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ControlSignal {
    Halt,
    Nop,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Signal {
    ReturnStack(ReturnStackSignal),
    DataStack(DataStackSignal),
    DataMemory(DataMemorySignal),
    InstructionMemory(InstructionMemorySignal),
    Latch(LatchSignal),
    Alu(AluSignal),
    IpMux(IpMuxSignal),
    DsMux(DsMuxSignal),
    DmMux(DmMuxSignal),
    AluMuxA(AluMuxSignal),
    AluMuxB(AluMuxSignal),
    Jump(JumpSignal),
    Control(ControlSignal),
}
