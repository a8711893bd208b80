// src/parser.rs - NC program text -> command nodes
//
// The interpreter core consumes parsed nodes; this parser is the small
// collaborator that produces them from program text so the crate is usable
// end to end. One statement per line; ';' comments run to end of line,
// parenthesized comments are stripped, and a leading '/' (block delete) is
// ignored.

use thiserror::Error;

use crate::node::{CommandNode, ParamSet};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: duplicate parameter '{letter}'")]
    DuplicateParameter { line: u32, letter: char },
    #[error("line {line}: unexpected token starting at '{token}'")]
    StrayToken { line: u32, token: String },
}

/// Parse a whole program for one canal. Line numbers are 1-based physical
/// lines; blank and comment-only lines produce no node but still count.
pub fn parse_program(text: &str, canal: usize) -> Result<Vec<CommandNode>, ParseError> {
    let mut nodes = Vec::new();
    for (index, raw) in text.split('\n').enumerate() {
        let line = index as u32 + 1;
        if let Some(node) = parse_statement(raw, line, canal)? {
            nodes.push(node);
        }
    }
    Ok(nodes)
}

fn parse_statement(raw: &str, line: u32, canal: usize) -> Result<Option<CommandNode>, ParseError> {
    // ';' starts a comment that runs to the end of the line.
    let raw = raw.split(';').next().unwrap_or(raw);
    let stripped = strip_comments(raw);
    let text = stripped.trim();
    let text = text.strip_prefix('/').unwrap_or(text).trim_start();
    if text.is_empty() {
        return Ok(None);
    }

    let mut codes = Vec::new();
    let mut params = ParamSet::default();
    let mut chars = text.char_indices().peekable();
    while let Some(&(at, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if !c.is_ascii_alphabetic() {
            return Err(ParseError::StrayToken {
                line,
                token: text[at..].chars().take(8).collect(),
            });
        }
        chars.next();
        let letter = c.to_ascii_uppercase();
        let start = at + c.len_utf8();
        let mut end = start;
        while let Some(&(pos, d)) = chars.peek() {
            if d.is_ascii_digit() || d == '.' || d == '+' || d == '-' {
                chars.next();
                end = pos + d.len_utf8();
            } else {
                break;
            }
        }
        let token = &text[start..end];
        match letter {
            'G' | 'M' => codes.push(format!("{letter}{token}")),
            // Sequence numbers carry no semantics for interpretation.
            'N' => {}
            _ => {
                if params.contains(letter) {
                    return Err(ParseError::DuplicateParameter { line, letter });
                }
                params.insert(letter, token);
            }
        }
    }

    Ok(Some(CommandNode::new(codes, params, line, canal)))
}

fn strip_comments(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut depth = 0usize;
    for c in raw.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_codes_and_parameters() {
        let nodes = parse_program("G90 G01 X10.5 Y-2 F600", 0).unwrap();
        assert_eq!(nodes.len(), 1);
        let node = &nodes[0];
        assert_eq!(node.codes, vec!["G90", "G01"]);
        assert_eq!(node.params.raw('X'), Some("10.5"));
        assert_eq!(node.params.raw('Y'), Some("-2"));
        assert_eq!(node.params.raw('F'), Some("600"));
        assert_eq!(node.line, 1);
    }

    #[test]
    fn semicolon_starts_a_comment_to_end_of_line() {
        // The commented text is dropped outright, never tokenized, and the
        // line numbering stays physical.
        let nodes = parse_program("G1 X5 ; approach the part\n; feed note F9?\nG1 X7", 0).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].codes, vec!["G1"]);
        assert_eq!(nodes[0].params.raw('X'), Some("5"));
        assert!(!nodes[0].params.contains('A'));
        assert_eq!(nodes[0].line, 1);
        assert_eq!(nodes[1].line, 3);
        assert!(!nodes[1].params.contains('F'));
    }

    #[test]
    fn comments_and_blanks_are_dropped() {
        let nodes = parse_program("(setup) G0 X1\n\n/ G1 X2 (skip me not)", 0).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].codes, vec!["G0"]);
        assert_eq!(nodes[1].codes, vec!["G1"]);
        assert_eq!(nodes[1].line, 3);
    }

    #[test]
    fn duplicate_parameter_is_rejected() {
        let err = parse_program("G1 X5 X7", 0).unwrap_err();
        assert_eq!(err, ParseError::DuplicateParameter { line: 1, letter: 'X' });
    }

    #[test]
    fn stray_tokens_are_rejected() {
        let err = parse_program("G1 ?X5", 0).unwrap_err();
        assert!(matches!(err, ParseError::StrayToken { line: 1, .. }));
    }

    #[test]
    fn m_codes_are_collected_as_codes() {
        let nodes = parse_program("M30", 0).unwrap();
        assert_eq!(nodes[0].codes, vec!["M30"]);
        assert!(nodes[0].params.is_empty());
    }
}
