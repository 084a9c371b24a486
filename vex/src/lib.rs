//! Wires an object file plus an input file onto a fresh [`vcpu::DataPath`]
//! and drives it to completion.
//!
//! This is the "board support package" around the [vcpu] core: it owns
//! file I/O and the mapping from an object file's flat `(idx, opcode,
//! operand)` tuples to loaded [`vcpu::Instruction`]s, but none of the
//! simulation logic itself, which stays in [vcpu].

pub mod error;

use std::fs;
use std::path::Path;

use vcpu::opcode::{Instruction, OpCode};
use vcpu::{ControlUnit, DataPath, Fault};
use vexfile::ObjectFile;

pub use error::{Error, Result};

/// Loads `object` onto a fresh [`DataPath`]: zero-initializes every memory
/// entry, then writes every instruction at its address.
pub fn load(object: &ObjectFile) -> Result<DataPath> {
    let mut datapath = DataPath::new();

    let memory_size = object
        .memory
        .iter()
        .map(|entry| entry.idx + entry.size)
        .max()
        .unwrap_or(0);
    datapath.data_memory.allocate(memory_size);
    for entry in &object.memory {
        for addr in entry.idx..entry.idx + entry.size {
            datapath.data_memory.set_address(addr);
            datapath.data_memory.write(0)?;
        }
    }

    let instruction_count = object
        .instructions
        .iter()
        .map(|entry| entry.idx + 1)
        .max()
        .unwrap_or(0);
    datapath.instruction_memory.allocate(instruction_count);
    for entry in &object.instructions {
        let opcode: OpCode = entry
            .opcode
            .parse()
            .map_err(|_| Fault::UnknownOpcode(entry.opcode.clone()))?;
        datapath.instruction_memory.set_address(entry.idx);
        datapath.instruction_memory.write(Instruction {
            idx: entry.idx,
            opcode,
            operand: entry.operand,
        })?;
    }

    Ok(datapath)
}

/// Loads an object file from `object_path`, feeds `input_path`'s bytes as
/// codepoints into `INPUT`, runs to completion, and returns the output
/// buffer with `0` bytes suppressed, ready to write out.
pub fn run_file(object_path: &Path, input_path: &Path) -> Result<Vec<u8>> {
    log::info!("loading object file {}", object_path.display());
    let object = vexfile::read_file(object_path)?;
    log::info!(
        "parsed {} memory entr(ies), {} instruction(s)",
        object.memory.len(),
        object.instructions.len()
    );

    let mut datapath = load(&object)?;
    let input = fs::read(input_path)?;
    datapath.load_input(&input);

    let mut cu = ControlUnit::new(datapath);
    cu.run().map_err(Error::Fault)?;

    Ok(cu
        .datapath
        .output_buffer()
        .iter()
        .filter(|&&b| b != 0)
        .map(|&b| b as u8)
        .collect())
}

pub fn run(object_path: &Path, input_path: &Path, output_path: &Path) -> Result<()> {
    let output = run_file(object_path, input_path)?;
    fs::write(output_path, &output)?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use vexfile::{InstructionEntry, MemoryEntry};

    fn object_that_echoes_one_byte() -> ObjectFile {
        ObjectFile {
            memory: vec![MemoryEntry { idx: 0, size: 1 }, MemoryEntry { idx: 1, size: 1 }],
            instructions: vec![
                InstructionEntry { idx: 0, opcode: "read".to_string(), operand: Some(0) },
                InstructionEntry { idx: 1, opcode: "save".to_string(), operand: Some(1) },
                InstructionEntry { idx: 2, opcode: "hlt".to_string(), operand: None },
            ],
        }
    }

    #[test]
    fn load_zero_initializes_memory_and_places_instructions() {
        let object = object_that_echoes_one_byte();
        let mut datapath = load(&object).unwrap();
        datapath.data_memory.set_address(1);
        datapath.data_memory.read().unwrap();
        assert_eq!(*datapath.data_memory.data_register().unwrap(), 0);
    }

    #[test]
    fn unknown_opcode_is_rejected() {
        let mut object = object_that_echoes_one_byte();
        object.instructions[0].opcode = "bogus".to_string();
        let err = load(&object).unwrap_err();
        assert!(matches!(err, Error::Fault(Fault::UnknownOpcode(_))));
    }
}
