//! Compilation of multi-line query blocks.
//!
//! Each non-blank line is compiled on its own; the block's predicate is
//! the disjunction of the line predicates, in line order.

use roster_core::{parse_query, Predicate};

use crate::error::ExecError;

/// One successfully compiled line of a block.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledLine {
    /// 1-based line number within the block.
    pub line: usize,
    pub text: String,
    pub predicate: Predicate,
}

/// Compile every non-blank line of `text`.
///
/// Stops at the first failing line and discards the lines compiled so far.
pub fn compile_lines(text: &str) -> Result<Vec<CompiledLine>, ExecError> {
    let mut compiled = Vec::new();
    for (idx, raw) in text.split('\n').enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        // Error positions count from the start of the raw line.
        let indent = raw.len() - raw.trim_start().len();
        let predicate = parse_query(line).map_err(|error| ExecError::Line {
            line: idx + 1,
            error: error.shifted(indent),
        })?;
        tracing::debug!(
            line = idx + 1,
            depth = predicate.depth(),
            predicate = %predicate,
            "compiled query line"
        );
        compiled.push(CompiledLine {
            line: idx + 1,
            text: line.to_owned(),
            predicate,
        });
    }
    Ok(compiled)
}

/// Compile `text` into a single predicate, or `None` if every line is blank.
pub fn compile_block(text: &str) -> Result<Option<Predicate>, ExecError> {
    let lines = compile_lines(text)?;
    Ok(Predicate::any(lines.into_iter().map(|l| l.predicate)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_core::QueryError;

    #[test]
    fn blank_lines_are_skipped() {
        let lines = compile_lines("\n  role:student \n\n\ttagged:foo\n").unwrap();
        let numbers: Vec<usize> = lines.iter().map(|l| l.line).collect();
        assert_eq!(numbers, vec![2, 4]);
        assert_eq!(lines[0].text, "role:student");
    }

    #[test]
    fn error_positions_count_from_the_raw_line() {
        let err = compile_block("role:a\n  \t(tagged:foo").unwrap_err();
        match err {
            ExecError::Line { line, error } => {
                assert_eq!(line, 2);
                assert_eq!(error, QueryError::parse(14, "expected ')' at end of input"));
            }
            other => panic!("expected line error, got {other:?}"),
        }

        let err = compile_block("    role:a or ?").unwrap_err();
        assert_eq!(err.to_json_value()["position"], 14);
    }

    #[test]
    fn long_blocks_compile_into_shallow_unions() {
        let text: Vec<String> = (0..2000).map(|i| format!("email:u{i}@x.org")).collect();
        let p = compile_block(&text.join("\n")).unwrap().unwrap();
        assert_eq!(p.depth(), 12);
        assert_eq!(p.to_string().replace(['(', ')'], ""), text.join(" or "));
    }

    #[test]
    fn block_is_disjunction_in_line_order() {
        let p = compile_block("role:student\ntagged:foo\nid:3").unwrap().unwrap();
        assert_eq!(p.to_string(), "((role:student or tagged:foo) or id:3)");
    }

    #[test]
    fn single_line_block_is_that_line() {
        let p = compile_block("role:student and status:active").unwrap().unwrap();
        assert_eq!(p, parse_query("role:student and status:active").unwrap());
    }

    #[test]
    fn empty_block_compiles_to_none() {
        assert_eq!(compile_block("").unwrap(), None);
        assert_eq!(compile_block(" \n\t\n").unwrap(), None);
    }

    #[test]
    fn first_bad_line_is_reported() {
        let err = compile_block("role:student\n\n(tagged:foo\nrole:").unwrap_err();
        match err {
            ExecError::Line { line, error } => {
                assert_eq!(line, 3);
                assert_eq!(error, QueryError::parse(11, "expected ')' at end of input"));
            }
            other => panic!("expected line error, got {other:?}"),
        }
    }

    #[test]
    fn crlf_line_endings_are_trimmed() {
        let p = compile_block("id:1\r\nid:2\r\n").unwrap().unwrap();
        assert_eq!(p.to_string(), "(id:1 or id:2)");
    }
}
