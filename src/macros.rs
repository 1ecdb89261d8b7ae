//! The macro engine.
//!
//! Macro bodies are captured verbatim from the source between the header
//! colon and `enddef`. Invocation substitutes positional `%k` placeholders
//! and splices the result into the output, copying any embedded
//! `@asm { ... }` blocks literally.
use std::{collections::HashMap, io::Write};

use crate::{
    error::{CompileError, CompileResult},
    symbols::SymbolTable,
};

#[derive(Debug, Clone)]
pub struct Macro {
    pub name: String,
    /// Declared arity; recorded but not enforced at invocation.
    pub arity: usize,
    pub body: String,
}

#[derive(Debug, Clone, Default)]
pub struct MacroTable {
    macros: HashMap<String, Macro>,
    pub symbols: SymbolTable,
}

impl MacroTable {
    pub fn define(&mut self, qualified: &str, arity: usize, body: &str) {
        self.macros.insert(
            qualified.to_owned(),
            Macro {
                name: qualified.to_owned(),
                arity,
                body: body.to_owned(),
            },
        );
    }

    pub fn get(&self, qualified: &str) -> Option<&Macro> {
        self.macros.get(qualified)
    }
}

/// Substitute `%1..%N` placeholders in a macro body. The scan is a single
/// left-to-right pass: placeholder text contributed by an argument is never
/// expanded again, and a `%k` beyond the argument count stays literal.
pub fn expand_body(body: &str, args: &[String]) -> String {
    let bytes = body.as_bytes();
    let mut out = String::with_capacity(body.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let mut j = i + 1;
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            if j > i + 1 {
                if let Ok(k) = body[i + 1..j].parse::<usize>() {
                    if k >= 1 && k <= args.len() {
                        out.push_str(&args[k - 1]);
                        i = j;
                        continue;
                    }
                }
            }
        }
        // placeholders are ASCII; everything else is copied byte for byte
        out.push(bytes[i] as char);
        i += 1;
    }
    out
}

/// Copy a raw text block into the output, one line at a time.
pub fn emit_raw_block<W: Write + ?Sized>(out: &mut W, text: &str) -> CompileResult<()> {
    if text.is_empty() {
        return Ok(());
    }
    let text = text.strip_suffix('\n').unwrap_or(text);
    for line in text.split('\n') {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

/// Walk an expanded macro body, copying text as-is and splicing the interior
/// of every `@asm { ... }` block literally.
pub fn splice_into<W: Write + ?Sized>(out: &mut W, text: &str) -> CompileResult<()> {
    let mut cursor = text;
    loop {
        let Some(at) = cursor.find("@asm") else {
            emit_raw_block(out, cursor)?;
            return Ok(());
        };
        if at > 0 {
            emit_raw_block(out, &cursor[..at])?;
        }
        let rest = &cursor[at..];
        let Some(brace) = rest.find('{') else {
            return Err(CompileError::new("expected '{' after @asm"));
        };
        let block = &rest[brace + 1..];
        let mut depth = 1usize;
        let mut end = None;
        for (i, c) in block.char_indices() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        end = Some(i);
                        break;
                    }
                }
                _ => {}
            }
        }
        let Some(end) = end else {
            return Err(CompileError::new("unterminated @asm block"));
        };
        emit_raw_block(out, &block[..end])?;
        cursor = &block[end + 1..];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_placeholders_substitute_in_order() {
        let body = "mov %1, %2\nadd %1, %2";
        let expanded = expand_body(body, &args(&["rax", "rbx"]));
        assert_eq!(expanded, "mov rax, rbx\nadd rax, rbx");
    }

    #[test]
    fn test_argument_placeholders_are_not_re_expanded() {
        let expanded = expand_body("%1 %2", &args(&["%2", "x"]));
        assert_eq!(expanded, "%2 x");
    }

    #[test]
    fn test_out_of_range_placeholder_stays_literal() {
        let expanded = expand_body("mov %1, %3", &args(&["rax"]));
        assert_eq!(expanded, "mov rax, %3");
    }

    #[test]
    fn test_splice_extracts_asm_blocks() {
        let mut out = Vec::new();
        splice_into(&mut out, "@asm { shl rax, 1 }").unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("shl rax, 1"));
    }

    #[test]
    fn test_splice_keeps_nested_braces() {
        let mut out = Vec::new();
        splice_into(&mut out, "@asm { a {b} c }").unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("a {b} c"));
    }

    #[test]
    fn test_unterminated_asm_block_is_fatal() {
        let mut out = Vec::new();
        let err = splice_into(&mut out, "@asm { oops").unwrap_err();
        assert_eq!(err.message, "unterminated @asm block");
    }
}
