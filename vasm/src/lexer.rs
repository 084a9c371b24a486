//! Splits source text into a flat, whitespace-delimited token stream.
//!
//! There is no comment syntax and no line structure beyond whitespace —
//! `original_source/translator.py`'s `translate` reads every line and
//! extends one flat `term_lst` with `line.strip().split()`. Each token
//! keeps its position in that flat stream as its `index`, which is what
//! [`crate::error::Error`] variants name.

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub index: usize,
}

pub fn lex(source: &str) -> Vec<Token> {
    source
        .split_whitespace()
        .enumerate()
        .map(|(index, text)| Token {
            text: text.to_string(),
            index,
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn splits_across_lines_ignoring_layout() {
        let tokens = lex("variable x\n  1 cells allot\nx @ .");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["variable", "x", "1", "cells", "allot", "x", "@", "."]
        );
    }

    #[test]
    fn assigns_sequential_indices() {
        let tokens = lex("a b c");
        assert_eq!(
            tokens.iter().map(|t| t.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }
}
