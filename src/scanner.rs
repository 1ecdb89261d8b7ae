//! Pre-scan pass: walk the root file and every transitively imported file
//! once, indexing the qualified names of functions, data-section variables,
//! and macros before any code is emitted. Import cycles short-circuit via
//! the shared scanned-path set.
use std::path::Path;

use log::debug;

use crate::{
    context::{resolve_import_path, CompileContext, Section},
    error::{CompileError, CompileResult},
    lexer::{Lexer, Token, TokenKind},
    symbols::resolve_definition,
    types::Type,
    util::read_source,
};

pub fn scan(ctx: &mut CompileContext, path: &Path) -> CompileResult<()> {
    if !ctx.scanned.insert(path) {
        return Ok(());
    }
    debug!("indexing symbols of '{}'", path.display());

    let src = read_source(path)?;
    scan_imports(ctx, path, &src)?;

    let mut walk = Walk::new(&src, path);
    let mut current_namespace: Option<String> = None;
    let mut section = Section::None;

    loop {
        let t = walk.next()?;
        match t.kind {
            TokenKind::Eof => break,
            TokenKind::Hash => {
                let dir = walk.next()?;
                if dir.kind != TokenKind::Ident {
                    continue;
                }
                match walk.text(&dir) {
                    "module" => {
                        let name = walk.expect_ident("expected module name after #module")?;
                        current_namespace = Some(walk.text(&name).to_owned());
                    }
                    "endmodule" => current_namespace = None,
                    "section" => {
                        let name = walk.expect_ident("expected section name")?;
                        section = Section::from_name(walk.text(&name)).unwrap_or(Section::None);
                    }
                    _ => {}
                }
            }
            TokenKind::Ident if matches!(walk.text(&t), "local" | "global") => {
                let mut next = walk.next()?;
                if next.kind == TokenKind::Ident && walk.text(&next) == "inline" {
                    next = walk.next()?;
                }
                if next.kind != TokenKind::Ident || walk.text(&next) != "func" {
                    return Err(walk.err_at(&next, "expected 'func' after local/global"));
                }
                let name = walk.expect_ident("expected function name")?;
                let raw = walk.text(&name);
                let qualified = resolve_definition(current_namespace.as_deref(), raw);
                ctx.funcs.insert(raw, &qualified);
            }
            TokenKind::Ident if section.is_data() && walk.text(&t) == "let" => {
                scan_global_let(ctx, &mut walk, current_namespace.as_deref())?;
            }
            TokenKind::Ident if section == Section::Macros && walk.text(&t) == "def" => {
                let name = walk.expect_ident("expected macro name")?;
                let raw = walk.text(&name).to_owned();
                let qualified = resolve_definition(current_namespace.as_deref(), &raw);
                let after = walk.next()?;
                if after.kind == TokenKind::Comma {
                    let count = walk.next()?;
                    if count.kind != TokenKind::Int {
                        return Err(walk.err_at(&count, "expected macro arity"));
                    }
                }
                ctx.macros.symbols.insert(&raw, &qualified);
            }
            _ => {}
        }
    }

    Ok(())
}

/// Depth-first over the `#import` directives of one file, before its own
/// declarations are indexed.
fn scan_imports(ctx: &mut CompileContext, path: &Path, src: &str) -> CompileResult<()> {
    let mut walk = Walk::new(src, path);
    loop {
        let t = walk.next()?;
        match t.kind {
            TokenKind::Eof => return Ok(()),
            TokenKind::Hash => {
                let dir = walk.next()?;
                if dir.kind == TokenKind::Ident && walk.text(&dir) == "import" {
                    let target = walk.next()?;
                    if !matches!(
                        target.kind,
                        TokenKind::Ident | TokenKind::Str | TokenKind::PathLit
                    ) {
                        return Err(walk.err_at(&target, "expected path after #import"));
                    }
                    let resolved = resolve_import_path(path, walk.text(&target));
                    scan(ctx, &resolved)?;
                }
            }
            _ => {}
        }
    }
}

fn scan_global_let(
    ctx: &mut CompileContext,
    walk: &mut Walk<'_>,
    current_namespace: Option<&str>,
) -> CompileResult<()> {
    let mut name = walk.next()?;
    if name.kind == TokenKind::Star {
        // pointer globals default to pointer width anyway
        name = walk.next()?;
    }
    if name.kind != TokenKind::Ident {
        return Err(walk.err_at(&name, "expected variable name after let"));
    }
    let raw = walk.text(&name).to_owned();
    let qualified = resolve_definition(current_namespace, &raw);

    let mut ty: Option<Type> = None;
    let mut reserve_count = 1;
    let after = walk.next()?;
    if after.kind == TokenKind::Colon {
        let type_token = walk.next()?;
        let type_name = walk.text(&type_token);
        ty = Type::parse(type_name);
        if ty.is_none() {
            if let Some(reserved) = Type::parse_reserve(type_name) {
                ty = Some(reserved);
                let count = walk.next()?;
                if count.kind != TokenKind::Int {
                    return Err(walk.err_at(&count, "expected reserve count"));
                }
                reserve_count = parse_int(walk.text(&count))
                    .ok_or_else(|| walk.err_at(&count, "expected reserve count"))?;
            }
        }
    }

    let ty = ty.unwrap_or(Type::U64);
    ctx.globals.insert(&raw, &qualified, ty, reserve_count);
    Ok(())
}

/// Parse an integer token, accepting the `0x` form the lexer produces.
pub(crate) fn parse_int(text: &str) -> Option<u32> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else {
        text.parse().ok()
    }
}

/// A bare token cursor over one file, with path-carrying diagnostics.
struct Walk<'a> {
    lexer: Lexer<'a>,
    src: &'a str,
    path: &'a Path,
}

impl<'a> Walk<'a> {
    fn new(src: &'a str, path: &'a Path) -> Self {
        Self {
            lexer: Lexer::new(src),
            src,
            path,
        }
    }

    fn next(&mut self) -> CompileResult<Token> {
        self.lexer.next_token().map_err(|e| e.locate(self.path))
    }

    fn expect_ident(&mut self, msg: &str) -> CompileResult<Token> {
        let t = self.next()?;
        if t.kind != TokenKind::Ident {
            return Err(self.err_at(&t, msg));
        }
        Ok(t)
    }

    fn text(&self, t: &Token) -> &'a str {
        t.text(self.src)
    }

    fn err_at(&self, t: &Token, msg: &str) -> CompileError {
        CompileError::at(msg, self.path, t.line, t.col)
    }
}
