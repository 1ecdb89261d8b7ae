use std::{fs, path::Path};

use crate::error::{CompileError, CompileResult};

pub(crate) fn read_source(path: &Path) -> CompileResult<String> {
    fs::read_to_string(path).map_err(|_| {
        CompileError::new(format!("cannot open input file '{}'", path.display()))
    })
}
