//! Resolves a [`crate::parser::Program`] into an object file: every
//! variable and label gets an address, and every operand symbol is
//! resolved against labels first, then variables, then parsed as a
//! literal — mirroring `original_source/translator.py`'s `asm_to_machine`.

use std::collections::HashMap;

use vexfile::{InstructionEntry, MemoryEntry, ObjectFile};

use crate::error::{Error, Result};
use crate::parser::{Line, Operand, Program};

/// Reserved data-memory addresses, fixed regardless of user variables.
const INPUT_ADDR: usize = 0;
const OUTPUT_ADDR: usize = 1;
const OUT_TEMP_ADDR: usize = 2;
const I_ADDR: usize = 3;
const END_ADDR: usize = 4;

pub fn assemble(program: &Program) -> Result<ObjectFile> {
    let mut variables: HashMap<String, usize> = HashMap::new();
    variables.insert("INPUT".to_string(), INPUT_ADDR);
    variables.insert("OUTPUT".to_string(), OUTPUT_ADDR);
    variables.insert("out_temp".to_string(), OUT_TEMP_ADDR);
    variables.insert("i".to_string(), I_ADDR);
    variables.insert("end".to_string(), END_ADDR);

    let mut memory = vec![
        MemoryEntry { idx: INPUT_ADDR, size: 1 },
        MemoryEntry { idx: OUTPUT_ADDR, size: 1 },
        MemoryEntry { idx: OUT_TEMP_ADDR, size: 1 },
        MemoryEntry { idx: I_ADDR, size: 1 },
        MemoryEntry { idx: END_ADDR, size: 1 },
    ];

    let mut next_addr = END_ADDR + 1;
    for (name, size) in &program.variables {
        variables.insert(name.clone(), next_addr);
        memory.push(MemoryEntry { idx: next_addr, size: *size });
        next_addr += size;
    }

    // Lay out instructions: top-level code first, then each labelled
    // fragment in definition order. A fragment's label resolves to the
    // address of its first instruction; the label itself occupies no
    // address.
    let mut labels: HashMap<String, usize> = HashMap::new();
    let mut ordered: Vec<&Line> = Vec::new();

    for line in &program.code {
        ordered.push(line);
    }
    for (name, lines) in &program.fragments {
        labels.insert(name.clone(), ordered.len());
        for line in lines {
            ordered.push(line);
        }
    }

    let mut instructions = Vec::with_capacity(ordered.len());
    for (idx, line) in ordered.into_iter().enumerate() {
        let operand = match &line.operand {
            None => None,
            Some(Operand::Number(n)) => Some(*n),
            Some(Operand::Symbol(name)) => Some(resolve_symbol(name, &labels, &variables)?),
        };
        instructions.push(InstructionEntry {
            idx,
            opcode: line.opcode.to_string(),
            operand,
        });
    }

    Ok(ObjectFile { memory, instructions })
}

/// Resolves an operand name: labels take precedence over variables, and a
/// name that is neither is a bug in the translator (every symbolic operand
/// is synthesized by `parser::parse` from a known label or variable).
fn resolve_symbol(
    name: &str,
    labels: &HashMap<String, usize>,
    variables: &HashMap<String, usize>,
) -> Result<i64> {
    if let Some(addr) = labels.get(name) {
        return Ok(*addr as i64);
    }
    if let Some(addr) = variables.get(name) {
        return Ok(*addr as i64);
    }
    Err(Error::UndefinedTerm {
        index: 0,
        term: name.to_string(),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lexer::lex;
    use crate::parser::parse;

    fn assemble_source(src: &str) -> ObjectFile {
        assemble(&parse(&lex(src)).unwrap()).unwrap()
    }

    #[test]
    fn reserved_addresses_are_fixed() {
        let object = assemble_source("3 4 +");
        let addr = |idx: usize| object.memory.iter().find(|e| e.idx == idx).unwrap();
        assert_eq!(addr(INPUT_ADDR).size, 1);
        assert_eq!(addr(OUTPUT_ADDR).size, 1);
        assert_eq!(addr(OUT_TEMP_ADDR).size, 1);
        assert_eq!(addr(I_ADDR).size, 1);
        assert_eq!(addr(END_ADDR).size, 1);
    }

    #[test]
    fn user_variables_start_after_reserved_cells() {
        let object = assemble_source("variable x variable y x @ .");
        let x = object.memory.iter().find(|e| e.idx == 5).unwrap();
        let y = object.memory.iter().find(|e| e.idx == 6).unwrap();
        assert_eq!(x.size, 1);
        assert_eq!(y.size, 1);
    }

    #[test]
    fn sized_variable_reserves_contiguous_block() {
        let object = assemble_source("variable buf 3 cells allot buf @ .");
        let buf = object.memory.iter().find(|e| e.idx == 5).unwrap();
        assert_eq!(buf.size, 4);
    }

    #[test]
    fn procedure_call_resolves_to_fragment_address() {
        let object = assemble_source(": one 1 ; one .");
        // Top-level code is 6 lines (idx 0..6); the two runtime-helper
        // fragments occupy idx 6..29 (19 + 4 lines); "one" starts at idx 29.
        let jmp = &object.instructions[0];
        assert_eq!(jmp.opcode, "jmp");
        assert_eq!(jmp.operand, Some(29));
        assert_eq!(object.instructions[29].opcode, "push");
        assert_eq!(object.instructions[29].operand, Some(1));
    }

    #[test]
    fn ends_with_halt() {
        let object = assemble_source("1 2 +");
        assert_eq!(object.instructions.last().unwrap().opcode, "hlt");
    }
}
