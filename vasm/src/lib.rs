//! Translator for the stack-machine assembly language run by [vcpu].
//!
//! A source program is a flat, whitespace-delimited stream of words (no
//! line structure, no comments). [`assemble`] lexes it, lowers it to
//! top-level code plus labelled fragments, resolves every variable and
//! label to an address, and returns the resulting [`vexfile::ObjectFile`]
//! ready to be run by [vex](../vex/index.html).
//!
//! ## Source Language
//!
//! Numbers push themselves. Words fall into four groups:
//!
//! - Arithmetic/stack words: `+ - * / mod = < > dup drop swap not`
//! - I/O words: `key` (read a codepoint from input), `emit` (write a
//!   codepoint to output), `cr` (write a carriage return), `.` and `?`
//!   (print the number on top of the stack)
//! - Variables: `variable NAME`, optionally sized with `N cells allot`;
//!   `NAME` pushes its address, `NAME cells` reads its value directly,
//!   `!` stores, `@` loads
//! - Control: `: NAME ... ;` defines a procedure (called by name),
//!   `if ... else ... then` branches on a nonzero top-of-stack,
//!   `begin ... until` and `0 N do ... loop` with `leave` to break out
//!   early, and `." text "` prints a literal string
//!
//! Functions, conditions and loops cannot nest, loops cannot appear
//! inside conditions, and strings and variable declarations cannot
//! appear inside any of them — see [`error::Error`] for the exact rules.

mod assembler;
pub mod error;
mod lexer;
mod parser;

pub use error::{Error, Result};

pub fn assemble(source: &str) -> Result<vexfile::ObjectFile> {
    let tokens = lexer::lex(source);
    let program = parser::parse(&tokens)?;
    assembler::assemble(&program)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn counted_loop_prints_digits() {
        let object = assemble("10 0 do i . loop").unwrap();
        assert!(object.instructions.iter().any(|i| i.opcode == "hlt"));
        assert!(object.instructions.iter().any(|i| i.opcode == "jnz"));
    }

    #[test]
    fn reports_undefined_term_with_index() {
        let err = assemble("1 2 bogus").unwrap_err();
        match err {
            Error::UndefinedTerm { index, term } => {
                assert_eq!(index, 2);
                assert_eq!(term, "bogus");
            }
            other => panic!("expected UndefinedTerm, got {:?}", other),
        }
    }
}
