//! # chasmc
//!
//! The chasm compiler driver: translates a source file to NASM assembly and
//! optionally shells out to the assembler and linker.
mod cli;

use cli::*;

use std::{error::Error, fs, path::Path, process::Command};

use log::{error, info};

fn main() {
    let args = Cli::init();

    simple_logger::init_with_level((&args.verbosity).into()).unwrap();

    if let Err(err) = run(&args) {
        eprintln!("chasmc error: {err}");
        std::process::exit(1);
    }
}

fn run(args: &Cli) -> Result<(), Box<dyn Error>> {
    let asm_path = args
        .output
        .clone()
        .unwrap_or_else(|| args.file.with_extension("asm"));

    chasmc::translate(&args.file, &asm_path)?;
    info!("wrote {}", asm_path.display());

    // -p is exactly --assemble --link
    let assemble = args.assemble || args.program;
    let link = args.link || args.program;

    let object_path = asm_path.with_extension("o");
    if assemble {
        assemble_object(&asm_path, &object_path)?;
    }
    if link {
        link_program(&object_path, &asm_path.with_extension(""))?;
    }
    if args.program {
        // the object file is an intermediate when building a full program
        fs::remove_file(&object_path)?;
    }

    Ok(())
}

fn assemble_object(asm_path: &Path, object_path: &Path) -> Result<(), Box<dyn Error>> {
    info!("assembling '{}'...", asm_path.display());

    let output = Command::new("nasm")
        .arg("-f")
        .arg("elf64")
        .arg(asm_path)
        .arg("-o")
        .arg(object_path)
        .output()?;

    let stderr = std::str::from_utf8(&output.stderr)?;
    if !stderr.is_empty() {
        error!("{stderr}");
    }
    if !output.status.success() {
        return Err(Box::new(chasmc::error::CompileError::new(
            "assembler failed",
        )));
    }

    Ok(())
}

fn link_program(object_path: &Path, target: &Path) -> Result<(), Box<dyn Error>> {
    info!("linking program...");

    let output = Command::new("cc")
        .arg("-o")
        .arg(target)
        .arg(object_path)
        .output()?;

    let stderr = std::str::from_utf8(&output.stderr)?;
    if !stderr.is_empty() {
        error!("{stderr}");
    }
    if !output.status.success() {
        return Err(Box::new(chasmc::error::CompileError::new("linker failed")));
    }

    Ok(())
}
