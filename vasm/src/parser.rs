//! Lowers a token stream into top-level code plus labelled fragments.
//!
//! A direct, structured translation of `original_source/translator.py`'s
//! `terms_to_assembly`: the same four mutually exclusive boolean contexts
//! (`in_function`, `in_condition`, `in_loop`, `in_print`) route emitted
//! [`Line`]s either to the top-level code list or to whichever fragment
//! currently owns the scope, and the same nesting assertions become
//! [`Error`] variants instead of Python `assert`s.

use crate::error::{Error, Result};
use crate::lexer::Token;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operand {
    Number(i64),
    Symbol(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line {
    pub opcode: &'static str,
    pub operand: Option<Operand>,
}

impl Line {
    fn bare(opcode: &'static str) -> Line {
        Line { opcode, operand: None }
    }

    fn num(opcode: &'static str, n: i64) -> Line {
        Line {
            opcode,
            operand: Some(Operand::Number(n)),
        }
    }

    fn sym(opcode: &'static str, name: impl Into<String>) -> Line {
        Line {
            opcode,
            operand: Some(Operand::Symbol(name.into())),
        }
    }
}

/// Names the runtime reserves for its own use; user identifiers may not
/// collide with any of them. `original_source/translator.py` only checks
/// `i`/`end`/`out_temp`/`system_number_print` by name; this extends the same
/// check to every other runtime-reserved identifier for consistency.
const RESERVED_NAMES: &[&str] = &[
    "i",
    "end",
    "out_temp",
    "system_number_print",
    "system_number_prepare",
    "INPUT",
    "OUTPUT",
];

fn check_reserved(index: usize, name: &str) -> Result<()> {
    if RESERVED_NAMES.contains(&name) {
        Err(Error::ReservedName {
            index,
            name: name.to_string(),
        })
    } else {
        Ok(())
    }
}

/// Parses an optionally-negative run of ASCII digits, matching
/// `original_source/translator.py`'s `terms[i].isnumeric() or
/// (terms[i][0] == "-" and terms[i][1:].isnumeric())` — unlike Rust's
/// built-in integer parsing, a leading `+` is not accepted.
fn parse_decimal(term: &str) -> Option<i64> {
    let digits = term.strip_prefix('-').unwrap_or(term);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        term.parse::<i64>().ok()
    } else {
        None
    }
}

/// One VM opcode or more per recognised word. Mirrors
/// `original_source/translator.py`'s `terms_to_instructions` table.
fn primitive(term: &str) -> Option<Vec<Line>> {
    Some(match term {
        "=" => vec![Line::bare("eql")],
        "<" => vec![Line::bare("less")],
        ">" => vec![Line::bare("lrg")],
        "dup" => vec![Line::bare("dup")],
        "drop" => vec![Line::bare("pop")],
        "swap" => vec![Line::bare("swap")],
        "+" => vec![Line::bare("add")],
        "-" => vec![Line::bare("sub")],
        "*" => vec![Line::bare("mul")],
        "/" => vec![Line::bare("div")],
        "mod" => vec![Line::bare("mod")],
        "not" => vec![Line::bare("not")],
        "key" => vec![Line::sym("read", "INPUT")],
        "!" => vec![Line::bare("save")],
        "@" => vec![Line::bare("read")],
        "?" => vec![
            Line::bare("read"),
            Line::sym("save", "out_temp"),
            Line::num("push", 0),
            Line::sym("jmp", "system_number_prepare"),
            Line::sym("jmp", "system_number_print"),
            Line::num("push", 32),
            Line::sym("save", "OUTPUT"),
        ],
        "." => vec![
            Line::sym("save", "out_temp"),
            Line::num("push", 0),
            Line::sym("jmp", "system_number_prepare"),
            Line::sym("jmp", "system_number_print"),
            Line::num("push", 32),
            Line::sym("save", "OUTPUT"),
        ],
        "emit" => vec![Line::sym("save", "OUTPUT")],
        "cr" => vec![Line::num("push", 13), Line::sym("save", "OUTPUT")],
        _ => return None,
    })
}

fn system_number_prepare() -> Vec<Line> {
    vec![
        Line::sym("read", "out_temp"),
        Line::bare("dup"),
        Line::num("push", 10),
        Line::sym("read", "out_temp"),
        Line::num("push", 10),
        Line::bare("div"),
        Line::bare("mul"),
        Line::bare("sub"),
        Line::num("push", 48),
        Line::bare("add"),
        Line::bare("swap"),
        Line::num("push", 10),
        Line::bare("div"),
        Line::bare("dup"),
        Line::sym("save", "out_temp"),
        Line::num("push", 0),
        Line::bare("eql"),
        Line::sym("jmz", "system_number_prepare"),
        Line::bare("ret"),
    ]
}

fn system_number_print() -> Vec<Line> {
    vec![
        Line::bare("dup"),
        Line::sym("save", "OUTPUT"),
        Line::sym("jnz", "system_number_print"),
        Line::bare("ret"),
    ]
}

pub struct Program {
    pub variables: Vec<(String, usize)>,
    pub code: Vec<Line>,
    pub fragments: Vec<(String, Vec<Line>)>,
}

struct Lowering {
    variables: Vec<(String, usize)>,
    code: Vec<Line>,
    fragments: Vec<(String, Vec<Line>)>,
    procedures: Vec<String>,
    conditions: Vec<String>,
    loops: Vec<String>,
    in_function: bool,
    in_condition: bool,
    in_loop: bool,
}

impl Lowering {
    fn fragment_mut(&mut self, name: &str) -> &mut Vec<Line> {
        &mut self
            .fragments
            .iter_mut()
            .find(|(n, _)| n == name)
            .unwrap_or_else(|| panic!("fragment \"{}\" must exist before it is appended to", name))
            .1
    }

    fn new_fragment(&mut self, name: &str) {
        self.fragments.push((name.to_string(), Vec::new()));
    }

    /// Appends to whichever fragment currently owns the scope, or to the
    /// top-level code list outside any scope.
    fn emit(&mut self, lines: Vec<Line>) {
        if self.in_condition {
            let label = self.conditions.last().unwrap().clone();
            self.fragment_mut(&label).extend(lines);
        } else if self.in_loop {
            let label = self.loops.last().unwrap().clone();
            self.fragment_mut(&label).extend(lines);
        } else if self.in_function {
            let label = self.procedures.last().unwrap().clone();
            self.fragment_mut(&label).extend(lines);
        } else {
            self.code.extend(lines);
        }
    }

    /// Used for `if`/`else`, which may themselves run inside a loop or
    /// function but never inside another condition (checked by the caller,
    /// and `in_condition` is already `true` by the time this runs).
    fn emit_without_condition(&mut self, lines: Vec<Line>) {
        if self.in_loop {
            let label = self.loops.last().unwrap().clone();
            self.fragment_mut(&label).extend(lines);
        } else if self.in_function {
            let label = self.procedures.last().unwrap().clone();
            self.fragment_mut(&label).extend(lines);
        } else {
            self.code.extend(lines);
        }
    }

    /// Used for `begin`/`do`, which may run inside a function but never
    /// inside a loop or condition (checked by the caller).
    fn emit_in_function_or_top(&mut self, lines: Vec<Line>) {
        if self.in_function {
            let label = self.procedures.last().unwrap().clone();
            self.fragment_mut(&label).extend(lines);
        } else {
            self.code.extend(lines);
        }
    }
}

pub fn parse(tokens: &[Token]) -> Result<Program> {
    let mut lowering = Lowering {
        variables: Vec::new(),
        code: Vec::new(),
        fragments: vec![
            ("system_number_prepare".to_string(), system_number_prepare()),
            ("system_number_print".to_string(), system_number_print()),
        ],
        procedures: Vec::new(),
        conditions: Vec::new(),
        loops: Vec::new(),
        in_function: false,
        in_condition: false,
        in_loop: false,
    };

    let mut i = 0usize;

    while i < tokens.len() {
        let term = tokens[i].text.as_str();
        let index = tokens[i].index;

        if term == "variable" {
            if lowering.in_function || lowering.in_condition || lowering.in_loop {
                return Err(Error::VariableInsideControl { index });
            }
            let name = tokens
                .get(i + 1)
                .map(|t| t.text.as_str())
                .ok_or(Error::UndefinedTerm {
                    index,
                    term: term.to_string(),
                })?;
            check_reserved(index, name)?;

            let is_sized = i + 4 < tokens.len()
                && tokens[i + 3].text == "cells"
                && tokens[i + 4].text == "allot";
            if is_sized {
                let n: usize = tokens[i + 2]
                    .text
                    .parse()
                    .map_err(|_| Error::UndefinedTerm {
                        index,
                        term: tokens[i + 2].text.clone(),
                    })?;
                lowering.variables.push((name.to_string(), 1 + n));
                i += 5;
            } else {
                lowering.variables.push((name.to_string(), 1));
                i += 2;
            }
        } else if term == ":" {
            if lowering.in_function {
                return Err(Error::NestedFunction { index });
            }
            if lowering.in_condition || lowering.in_loop {
                return Err(Error::UndefinedTerm {
                    index,
                    term: term.to_string(),
                });
            }
            let name = tokens
                .get(i + 1)
                .map(|t| t.text.as_str())
                .ok_or(Error::UndefinedTerm {
                    index,
                    term: term.to_string(),
                })?;
            check_reserved(index, name)?;
            lowering.in_function = true;
            lowering.procedures.push(name.to_string());
            lowering.new_fragment(name);
            i += 2;
        } else if term == ";" {
            if !lowering.in_function {
                return Err(Error::UnexpectedFunctionEnd { index });
            }
            lowering.in_function = false;
            let name = lowering.procedures.last().unwrap().clone();
            lowering.fragment_mut(&name).push(Line::bare("ret"));
            i += 1;
        } else if term == "if" {
            if lowering.in_condition {
                return Err(Error::NestedCondition { index });
            }
            lowering.in_condition = true;
            let label = format!("CONDITION_LABEL_IF_{:x}", lowering.conditions.len());
            lowering.conditions.push(label.clone());
            lowering.new_fragment(&label);
            lowering.emit_without_condition(vec![Line::sym("jnz", label)]);
            i += 1;
        } else if term == "else" {
            if !lowering.in_condition {
                return Err(Error::UnexpectedElse { index });
            }
            let prior = lowering.conditions.last().unwrap().clone();
            let label = format!("CONDITION_LABEL_ELSE_{}", prior.chars().last().unwrap());
            lowering.conditions.push(label.clone());
            lowering.fragment_mut(&prior).push(Line::bare("ret"));
            lowering.new_fragment(&label);
            lowering.emit_without_condition(vec![Line::sym("jmp", label)]);
            i += 1;
        } else if term == "then" {
            if !lowering.in_condition {
                return Err(Error::UnexpectedThen { index });
            }
            lowering.in_condition = false;
            let label = lowering.conditions.last().unwrap().clone();
            lowering.fragment_mut(&label).push(Line::bare("ret"));
            i += 1;
        } else if term == "begin" {
            if lowering.in_loop {
                return Err(Error::NestedLoop { index });
            }
            if lowering.in_condition {
                return Err(Error::LoopInsideCondition { index });
            }
            lowering.in_loop = true;
            let label = format!("LOOP_LABEL_BEGIN_{}", lowering.loops.len());
            lowering.loops.push(label.clone());
            lowering.new_fragment(&label);
            lowering.emit_in_function_or_top(vec![Line::sym("jmp", label)]);
            i += 1;
        } else if term == "until" {
            if !lowering.in_loop {
                return Err(Error::UnexpectedLoopEnd { index });
            }
            lowering.in_loop = false;
            let label = lowering.loops.last().unwrap().clone();
            lowering
                .fragment_mut(&label)
                .extend(vec![Line::sym("jmz", label.clone()), Line::bare("ret")]);
            i += 1;
        } else if term == "do" {
            if lowering.in_loop {
                return Err(Error::NestedLoop { index });
            }
            if lowering.in_condition {
                return Err(Error::LoopInsideCondition { index });
            }
            lowering.in_loop = true;
            let label = format!("LOOP_LABEL_DO_{}", lowering.loops.len());
            lowering.loops.push(label.clone());
            lowering.new_fragment(&label);
            lowering.emit_in_function_or_top(vec![
                Line::sym("save", "i"),
                Line::sym("save", "end"),
                Line::sym("jmp", label),
            ]);
            i += 1;
        } else if term == "loop" {
            if !lowering.in_loop {
                return Err(Error::UnexpectedLoopEnd { index });
            }
            lowering.in_loop = false;
            let label = lowering.loops.last().unwrap().clone();
            lowering.fragment_mut(&label).extend(vec![
                Line::sym("push", "i"),
                Line::bare("read"),
                Line::bare("inc"),
                Line::bare("dup"),
                Line::sym("save", "i"),
                Line::sym("push", "end"),
                Line::bare("read"),
                Line::bare("less"),
                Line::sym("jnz", label.clone()),
                Line::bare("ret"),
            ]);
            i += 1;
        } else if term == "leave" {
            if !lowering.in_loop {
                return Err(Error::UnexpectedLeave { index });
            }
            let lines = vec![
                Line::sym("push", "end"),
                Line::bare("read"),
                Line::sym("push", "i"),
                Line::bare("save"),
            ];
            if lowering.in_condition {
                let label = lowering.conditions.last().unwrap().clone();
                lowering.fragment_mut(&label).extend(lines);
            } else {
                let label = lowering.loops.last().unwrap().clone();
                lowering.fragment_mut(&label).extend(lines);
            }
            i += 1;
        } else if term == ".\"" {
            if lowering.in_loop || lowering.in_condition {
                return Err(Error::StringInsideControl { index });
            }
            i = lower_string(&mut lowering, tokens, i + 1)?;
        } else if let Some(lines) = primitive(term) {
            lowering.emit(lines);
            i += 1;
        } else if lowering.procedures.iter().any(|p| p == term) {
            lowering.emit(vec![Line::sym("jmp", term)]);
            i += 1;
        } else if term == "i" {
            lowering.emit(vec![Line::sym("read", "i")]);
            i += 1;
        } else if i + 1 < tokens.len() && tokens[i + 1].text == "cells" {
            lowering.emit(vec![Line::sym("read", term)]);
            i += 2;
        } else if lowering.variables.iter().any(|(name, _)| name == term) {
            lowering.emit(vec![Line::sym("push", term)]);
            i += 1;
        } else if let Some(n) = parse_decimal(term) {
            lowering.emit(vec![Line::num("push", n)]);
            i += 1;
        } else {
            return Err(Error::UndefinedTerm {
                index,
                term: term.to_string(),
            });
        }
    }

    if lowering.in_function {
        return Err(Error::UnterminatedFunction { index: tokens.len() });
    }
    if lowering.in_condition {
        return Err(Error::UnterminatedCondition { index: tokens.len() });
    }
    if lowering.in_loop {
        return Err(Error::UnterminatedLoop { index: tokens.len() });
    }

    lowering.code.push(Line::bare("hlt"));

    Ok(Program {
        variables: lowering.variables,
        code: lowering.code,
        fragments: lowering.fragments,
    })
}

/// Lowers a `." ... "` string literal starting at `start` (the token after
/// the opening `."`). Each token is scanned character by character; a token
/// that does not contain the closing quote contributes a reconstituted
/// space after its characters (the word separator the whitespace tokenizer
/// ate), matching `original_source/translator.py`'s `for...else` loop.
/// Exactly one trailing space closes the literal: emitted when the closing
/// token itself printed characters, or when no separator space was already
/// emitted by a preceding token — so a bare `"` token right after a
/// separator-emitting word (`." hi "`) doesn't double up, but a closing
/// quote fused to its content (`." hello"`) still gets its trailing space.
/// Returns the index of the first token after the closing quote.
fn lower_string(lowering: &mut Lowering, tokens: &[Token], start: usize) -> Result<usize> {
    let mut i = start;
    let mut last_was_separator = false;
    loop {
        let token = tokens.get(i).ok_or(Error::UnterminatedString { index: start })?;
        let mut closed = false;
        let mut emitted_char = false;
        let mut lines = Vec::new();
        for ch in token.text.chars() {
            if ch == '"' {
                closed = true;
                break;
            }
            lines.push(Line::num("push", ch as i64));
            lines.push(Line::sym("save", "OUTPUT"));
            emitted_char = true;
        }
        if closed {
            if emitted_char || !last_was_separator {
                lines.push(Line::num("push", 32));
                lines.push(Line::sym("save", "OUTPUT"));
            }
            lowering.emit(lines);
            return Ok(i + 1);
        }
        lines.push(Line::num("push", 32));
        lines.push(Line::sym("save", "OUTPUT"));
        lowering.emit(lines);
        last_was_separator = true;
        i += 1;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lexer::lex;

    fn parse_source(src: &str) -> Program {
        parse(&lex(src)).unwrap()
    }

    #[test]
    fn arithmetic_word_lowers_to_single_opcode() {
        let program = parse_source("3 4 +");
        assert_eq!(
            program.code,
            vec![
                Line::num("push", 3),
                Line::num("push", 4),
                Line::bare("add"),
                Line::bare("hlt"),
            ]
        );
    }

    #[test]
    fn loop_index_word_lowers_to_read_i() {
        let program = parse_source(": main 10 0 do i . loop ; main");
        let (name, lines) = &program.fragments[3];
        assert_eq!(name, "LOOP_LABEL_DO_0");
        assert!(lines.contains(&Line::sym("read", "i")));
    }

    #[test]
    fn until_branches_back_while_top_of_stack_is_zero() {
        let program = parse_source("begin key dup emit 0 = until");
        let (name, lines) = &program.fragments[2];
        assert_eq!(name, "LOOP_LABEL_BEGIN_0");
        assert_eq!(lines.last(), Some(&Line::bare("ret")));
        assert_eq!(lines[lines.len() - 2], Line::sym("jmz", "LOOP_LABEL_BEGIN_0"));
    }

    #[test]
    fn variable_with_cells_allot_reserves_extra_cell() {
        let program = parse_source("variable buf 4 cells allot");
        assert_eq!(program.variables, vec![("buf".to_string(), 5)]);
    }

    #[test]
    fn reserved_name_is_rejected() {
        let err = parse(&lex("variable i")).unwrap_err();
        assert!(matches!(err, Error::ReservedName { .. }));
    }

    #[test]
    fn undefined_term_is_rejected() {
        let err = parse(&lex("bogus")).unwrap_err();
        assert!(matches!(err, Error::UndefinedTerm { .. }));
    }

    #[test]
    fn plus_prefixed_literal_is_rejected_like_the_original() {
        let err = parse(&lex("+5")).unwrap_err();
        assert!(matches!(err, Error::UndefinedTerm { .. }));
    }

    #[test]
    fn nested_loop_is_rejected() {
        let err = parse(&lex("begin begin until until")).unwrap_err();
        assert_eq!(err, Error::NestedLoop { index: 1 });
    }

    #[test]
    fn procedure_definition_emits_labelled_fragment_ending_in_ret() {
        let program = parse_source(": sq dup * ;");
        let (name, lines) = &program.fragments[2];
        assert_eq!(name, "sq");
        assert_eq!(
            lines,
            &vec![Line::bare("dup"), Line::bare("mul"), Line::bare("ret")]
        );
    }

    #[test]
    fn if_inside_loop_keeps_loop_body_on_reentry() {
        // A conditional inside a loop body appends its own fragment; the
        // lines emitted by "loop" afterwards must still land in the loop's
        // fragment, not the condition's.
        let program = parse_source("begin dup if 1 then swap until");
        let (name, lines) = &program.fragments[2];
        assert_eq!(name, "LOOP_LABEL_BEGIN_0");
        assert!(lines.last() == Some(&Line::bare("ret")));
        assert!(lines.contains(&Line::bare("swap")));
    }

    #[test]
    fn print_literal_lowers_chars_then_trailing_space() {
        let program = parse_source(r#"." hi ""#);
        assert_eq!(
            program.code,
            vec![
                Line::num("push", 'h' as i64),
                Line::sym("save", "OUTPUT"),
                Line::num("push", 'i' as i64),
                Line::sym("save", "OUTPUT"),
                Line::num("push", 32),
                Line::sym("save", "OUTPUT"),
                Line::bare("hlt"),
            ]
        );
    }

    #[test]
    fn print_literal_with_quote_fused_to_last_word_still_gets_trailing_space() {
        let program = parse_source(r#"." hello""#);
        assert_eq!(
            program.code,
            vec![
                Line::num("push", 'h' as i64),
                Line::sym("save", "OUTPUT"),
                Line::num("push", 'e' as i64),
                Line::sym("save", "OUTPUT"),
                Line::num("push", 'l' as i64),
                Line::sym("save", "OUTPUT"),
                Line::num("push", 'l' as i64),
                Line::sym("save", "OUTPUT"),
                Line::num("push", 'o' as i64),
                Line::sym("save", "OUTPUT"),
                Line::num("push", 32),
                Line::sym("save", "OUTPUT"),
                Line::bare("hlt"),
            ]
        );
    }
}
