#![allow(dead_code)]

use std::fs;

use chasmc::error::CompileError;
use tempfile::TempDir;

/// Translate a single in-memory source file and return the emitted assembly.
pub fn translate_source(source: &str) -> String {
    let dir = tempfile::tempdir().unwrap();
    translate_tree(&dir, &[("main.chasm", source)], "main.chasm")
}

/// Lay a file tree out in a temp directory and translate the given root.
pub fn translate_tree(dir: &TempDir, files: &[(&str, &str)], root: &str) -> String {
    for (name, content) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
    let mut out = Vec::new();
    chasmc::translate_to_writer(&dir.path().join(root), &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

/// Translate a source file that is expected to fail, returning the error.
pub fn translate_source_err(source: &str) -> CompileError {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("main.chasm");
    fs::write(&path, source).unwrap();
    let mut out = Vec::new();
    chasmc::translate_to_writer(&path, &mut out).unwrap_err()
}

fn normalize(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Assert the assembly contains all expected lines in order, insensitive to
/// whitespace within a line.
pub fn assert_lines_in_order(asm: &str, expected: &[&str]) {
    let lines: Vec<String> = asm.lines().map(normalize).collect();
    let mut pos = 0;
    for want in expected {
        let want = normalize(want);
        match lines[pos..].iter().position(|line| *line == want) {
            Some(offset) => pos += offset + 1,
            None => panic!("missing line '{want}' after line {pos} in output:\n{asm}"),
        }
    }
}

/// Count how often a (whitespace-normalized) line occurs in the output.
pub fn count_lines(asm: &str, line: &str) -> usize {
    let want = normalize(line);
    asm.lines().filter(|l| normalize(l) == want).count()
}
