//! Second pass: parse declarations and statements from the token stream and
//! emit NASM assembly directly, file by file. Each `#import` recursively
//! compiles the target with the shared context, inlined at the point of the
//! directive.
mod data;
mod expr;
mod func;

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use log::{debug, info};

use crate::{
    asm::{OperandSize, Reg},
    context::{resolve_import_path, CompileContext, ImportSet, Section},
    error::{CompileError, CompileResult},
    frame::FrameLayout,
    lexer::{Lexer, Token, TokenKind},
    macros,
    scanner,
    symbols::{resolve_reference, SymbolTable},
    util::read_source,
};

/// Translate a chasm source file (and its imports) into an assembly file.
pub fn translate(in_path: &Path, out_path: &Path) -> CompileResult<()> {
    let file = File::create(out_path).map_err(|_| {
        CompileError::new(format!("cannot open output file '{}'", out_path.display()))
    })?;
    let mut out = BufWriter::new(file);
    translate_to_writer(in_path, &mut out)?;
    out.flush()?;
    Ok(())
}

/// Translate into any sink. The pre-scan builds the cross-file symbol index
/// first; the emitter pass then walks the same files again producing output.
pub fn translate_to_writer(in_path: &Path, out: &mut dyn Write) -> CompileResult<()> {
    info!("translating '{}'", in_path.display());

    let mut ctx = CompileContext::default();
    scanner::scan(&mut ctx, in_path)?;

    let mut compiled = ImportSet::default();
    compile_path(in_path, out, &mut ctx, &mut compiled, true)
}

fn compile_path(
    path: &Path,
    out: &mut dyn Write,
    ctx: &mut CompileContext,
    compiled: &mut ImportSet,
    emit_header: bool,
) -> CompileResult<()> {
    if !compiled.insert(path) {
        return Ok(());
    }
    debug!("compiling '{}'", path.display());

    let src = read_source(path)?;
    FileEmitter::new(&src, path, out, ctx, compiled)?.run(emit_header)
}

pub(crate) struct QualifiedName {
    pub name: String,
    pub ns: Option<String>,
}

/// Parser state for one file: current token, namespace context, and the
/// shared tables plus output sink.
pub(crate) struct FileEmitter<'src, 'e> {
    src: &'src str,
    path: &'src Path,
    lexer: Lexer<'src>,
    cur: Token,
    current_namespace: Option<String>,
    using_namespaces: Vec<String>,
    section: Section,
    out: &'e mut dyn Write,
    ctx: &'e mut CompileContext,
    compiled: &'e mut ImportSet,
}

impl<'src, 'e> FileEmitter<'src, 'e> {
    fn new(
        src: &'src str,
        path: &'src Path,
        out: &'e mut dyn Write,
        ctx: &'e mut CompileContext,
        compiled: &'e mut ImportSet,
    ) -> CompileResult<Self> {
        let mut lexer = Lexer::new(src);
        let cur = lexer.next_token().map_err(|e| e.locate(path))?;
        Ok(Self {
            src,
            path,
            lexer,
            cur,
            current_namespace: None,
            using_namespaces: vec![],
            section: Section::None,
            out,
            ctx,
            compiled,
        })
    }

    fn run(&mut self, emit_header: bool) -> CompileResult<()> {
        if emit_header {
            writeln!(self.out, "default rel")?;
            writeln!(self.out, "section .text")?;
        }

        loop {
            match self.cur.kind {
                TokenKind::Eof => break,
                TokenKind::Newline => self.bump()?,
                TokenKind::Hash => {
                    self.bump()?;
                    self.directive()?;
                }
                TokenKind::At => {
                    let (start, end) = self.parse_inline_block()?;
                    let src = self.src;
                    macros::emit_raw_block(&mut *self.out, &src[start..end])?;
                }
                TokenKind::Ident => match self.cur_text() {
                    "local" | "global" => {
                        let is_global = self.cur_text() == "global";
                        self.bump()?;
                        let mut is_inline = false;
                        if self.at_keyword("inline") {
                            is_inline = true;
                            self.bump()?;
                        }
                        if !self.at_keyword("func") {
                            return Err(self.err("expected 'func' after local/global"));
                        }
                        self.bump()?;
                        if self.cur.kind != TokenKind::Ident {
                            return Err(self.err("expected function name"));
                        }
                        let raw = self.cur_text().to_owned();
                        self.bump()?;
                        self.parse_and_emit_func(&raw, is_global, is_inline)?;
                    }
                    "func" => {
                        return Err(
                            self.err("functions must be declared with 'local func' or 'global func'")
                        )
                    }
                    "let" => {
                        if !self.section.is_data() {
                            return Err(
                                self.err("let statements must be in data/bss/readonly sections")
                            );
                        }
                        self.parse_global_let()?;
                    }
                    "def" => {
                        if self.section != Section::Macros {
                            return Err(self.err("macro definitions must be in macros section"));
                        }
                        self.parse_macro_definition()?;
                    }
                    _ => return Err(self.err("unexpected top-level token")),
                },
                _ => return Err(self.err("unexpected top-level token")),
            }
        }

        Ok(())
    }

    fn directive(&mut self) -> CompileResult<()> {
        if self.cur.kind != TokenKind::Ident {
            return Err(self.err("expected directive after #"));
        }
        match self.cur_text() {
            "section" => {
                self.bump()?;
                if self.cur.kind != TokenKind::Ident {
                    return Err(self.err("expected section name"));
                }
                let section = Section::from_name(self.cur_text())
                    .ok_or_else(|| self.err("unknown section"))?;
                match section {
                    Section::Text => writeln!(self.out, "section .text")?,
                    Section::Data => writeln!(self.out, "section .data")?,
                    Section::Rodata => writeln!(self.out, "section .rodata")?,
                    Section::Bss => writeln!(self.out, "section .bss")?,
                    Section::Macros | Section::None => {}
                }
                self.section = section;
                self.bump()?;
            }
            "module" => {
                self.bump()?;
                if self.cur.kind != TokenKind::Ident {
                    return Err(self.err("expected module name after #module"));
                }
                self.current_namespace = Some(self.cur_text().to_owned());
                self.bump()?;
            }
            "endmodule" => {
                if self.current_namespace.is_none() {
                    return Err(self.err("#endmodule without active module"));
                }
                self.current_namespace = None;
                self.bump()?;
            }
            "import" => {
                self.bump()?;
                if !matches!(
                    self.cur.kind,
                    TokenKind::Ident | TokenKind::Str | TokenKind::PathLit
                ) {
                    return Err(self.err("expected path after #import"));
                }
                let resolved = resolve_import_path(self.path, self.cur_text());
                self.bump()?;
                compile_path(&resolved, &mut *self.out, self.ctx, self.compiled, false)?;
            }
            "uns" => {
                self.bump()?;
                if self.cur.kind != TokenKind::Ident {
                    return Err(self.err("expected namespace after #uns"));
                }
                self.using_namespaces.push(self.cur_text().to_owned());
                self.bump()?;
            }
            _ => return Err(self.err("unknown #directive")),
        }
        Ok(())
    }

    /// `$name[, arg1, arg2, ...];` expands a macro, or passes an unknown
    /// name through as a pseudo-opcode line for the downstream assembler.
    fn emit_macro_invocation(&mut self) -> CompileResult<()> {
        if self.cur.kind != TokenKind::Ident {
            return Err(self.err("expected macro name after '$'"));
        }
        let at = self.cur;
        let qn = self.parse_qualified_name()?;
        let macro_name = self.resolve_in(&self.ctx.macros.symbols, &qn, &at)?;

        let mut args: Vec<String> = vec![];
        if self.cur.kind == TokenKind::Comma {
            self.bump()?;
            if self.cur.kind != TokenKind::Semi {
                let mut start = self.cur.start;
                let mut end = self.cur.end;
                loop {
                    match self.cur.kind {
                        TokenKind::Semi => {
                            push_arg(&mut args, &self.src[start..end]);
                            break;
                        }
                        TokenKind::Comma => {
                            push_arg(&mut args, &self.src[start..end]);
                            self.bump()?;
                            start = self.cur.start;
                            end = self.cur.end;
                        }
                        TokenKind::Eof => {
                            return Err(self.err("expected ';' after macro invocation"))
                        }
                        _ => {
                            end = self.cur.end;
                            self.bump()?;
                        }
                    }
                }
            }
        }
        self.expect(TokenKind::Semi, "expected ';' after macro invocation")?;

        let expanded = self
            .ctx
            .macros
            .get(&macro_name)
            .map(|m| macros::expand_body(&m.body, &args));
        match expanded {
            Some(expanded) => macros::splice_into(&mut *self.out, &expanded)?,
            None => {
                write!(self.out, "    {macro_name}")?;
                if !args.is_empty() {
                    write!(self.out, " {}", args.join(", "))?;
                }
                writeln!(self.out)?;
            }
        }
        Ok(())
    }

    /// `@asm { ... }` blocks: returns the byte range of the brace-balanced
    /// interior.
    fn parse_inline_block(&mut self) -> CompileResult<(usize, usize)> {
        if self.cur.kind != TokenKind::At {
            return Err(self.err("expected @asm"));
        }
        self.bump()?;
        if !self.at_keyword("asm") {
            return Err(self.err("expected asm after @"));
        }
        self.bump()?;
        if self.cur.kind != TokenKind::LBrace {
            return Err(self.err("expected '{' after @asm"));
        }
        let range = self
            .lexer
            .raw_braced_block()
            .map_err(|e| e.locate(self.path))?;
        self.bump()?;
        Ok(range)
    }

    fn capture_until_enddef(&mut self) -> CompileResult<String> {
        let body_start = self.cur.start;
        loop {
            if self.cur.kind == TokenKind::Eof {
                return Err(self.err("unterminated macro definition"));
            }
            if self.at_keyword("enddef") {
                let body_end = self.cur.start;
                self.bump()?;
                return Ok(self.src[body_start..body_end].to_owned());
            }
            self.bump()?;
        }
    }

    // ------------------------------------------------------------------
    // typed loads and stores

    fn emit_load_local(
        &mut self,
        name: &str,
        at: &Token,
        frame: &FrameLayout,
    ) -> CompileResult<()> {
        let Some(local) = frame.lookup(name) else {
            return Err(self.err_at(at, "unknown identifier (local not found)"));
        };
        let size = OperandSize::from(local.ty);
        let off = local.rbp_offset;
        if local.ty.size() == 8 {
            writeln!(self.out, "    mov rax, {size} [rbp{off:+}]")?;
        } else if local.ty.is_signed() {
            writeln!(self.out, "    movsx rax, {size} [rbp{off:+}]")?;
        } else {
            writeln!(self.out, "    movzx rax, {size} [rbp{off:+}]")?;
        }
        Ok(())
    }

    fn emit_store_local(
        &mut self,
        name: &str,
        at: &Token,
        frame: &FrameLayout,
    ) -> CompileResult<()> {
        let Some(local) = frame.lookup(name) else {
            return Err(self.err_at(at, "unknown identifier (local not found)"));
        };
        let size = OperandSize::from(local.ty);
        let off = local.rbp_offset;
        let slice = Reg::Rax.sized(size);
        writeln!(self.out, "    mov {size} [rbp{off:+}], {slice}")?;
        Ok(())
    }

    fn emit_load_global(&mut self, name: &str, at: &Token) -> CompileResult<()> {
        let Some(var) = self.ctx.globals.get(name) else {
            return Err(self.err_at(at, "unknown identifier (global not found)"));
        };
        let ty = var.ty;
        let size = OperandSize::from(ty);
        if ty.size() == 8 {
            writeln!(self.out, "    mov rax, {size} [rel {name}]")?;
        } else if ty.is_signed() {
            writeln!(self.out, "    movsx rax, {size} [rel {name}]")?;
        } else {
            writeln!(self.out, "    movzx rax, {size} [rel {name}]")?;
        }
        Ok(())
    }

    fn emit_store_global(&mut self, name: &str, at: &Token) -> CompileResult<()> {
        let Some(var) = self.ctx.globals.get(name) else {
            return Err(self.err_at(at, "unknown identifier (global not found)"));
        };
        let size = OperandSize::from(var.ty);
        let slice = Reg::Rax.sized(size);
        writeln!(self.out, "    mov {size} [rel {name}], {slice}")?;
        Ok(())
    }

    /// Load a `set`/`pop` target into rax: locals shadow globals.
    fn load_target(
        &mut self,
        qn: &QualifiedName,
        at: &Token,
        frame: &FrameLayout,
    ) -> CompileResult<()> {
        if frame.lookup(&qn.name).is_some() {
            self.emit_load_local(&qn.name, at, frame)
        } else {
            let name = self.resolve_in(&self.ctx.globals.symbols, qn, at)?;
            self.emit_load_global(&name, at)
        }
    }

    /// Store rax into a `set`/`pop` target: locals shadow globals.
    fn store_target(
        &mut self,
        qn: &QualifiedName,
        at: &Token,
        frame: &FrameLayout,
    ) -> CompileResult<()> {
        if frame.lookup(&qn.name).is_some() {
            self.emit_store_local(&qn.name, at, frame)
        } else {
            let name = self.resolve_in(&self.ctx.globals.symbols, qn, at)?;
            self.emit_store_global(&name, at)
        }
    }

    // ------------------------------------------------------------------
    // token plumbing

    fn bump(&mut self) -> CompileResult<()> {
        self.cur = self.lexer.next_token().map_err(|e| e.locate(self.path))?;
        Ok(())
    }

    fn cur_text(&self) -> &'src str {
        self.cur.text(self.src)
    }

    fn at_keyword(&self, kw: &str) -> bool {
        self.cur.kind == TokenKind::Ident && self.cur_text() == kw
    }

    fn expect(&mut self, kind: TokenKind, msg: &str) -> CompileResult<()> {
        if self.cur.kind != kind {
            return Err(self.err(msg));
        }
        self.bump()
    }

    fn skip_newlines(&mut self) -> CompileResult<()> {
        while self.cur.kind == TokenKind::Newline {
            self.bump()?;
        }
        Ok(())
    }

    fn parse_qualified_name(&mut self) -> CompileResult<QualifiedName> {
        if self.cur.kind != TokenKind::Ident {
            return Err(self.err("expected identifier"));
        }
        let first = self.cur_text().to_owned();
        self.bump()?;
        if self.cur.kind == TokenKind::Scope {
            self.bump()?;
            if self.cur.kind != TokenKind::Ident {
                return Err(self.err("expected identifier after '::'"));
            }
            let second = self.cur_text().to_owned();
            self.bump()?;
            return Ok(QualifiedName {
                name: second,
                ns: Some(first),
            });
        }
        Ok(QualifiedName {
            name: first,
            ns: None,
        })
    }

    fn resolve_in(
        &self,
        table: &SymbolTable,
        qn: &QualifiedName,
        at: &Token,
    ) -> CompileResult<String> {
        resolve_reference(
            table,
            self.current_namespace.as_deref(),
            qn.ns.as_deref(),
            &self.using_namespaces,
            &qn.name,
        )
        .map_err(|msg| self.err_at(at, msg))
    }

    fn err(&self, msg: impl Into<String>) -> CompileError {
        self.err_at(&self.cur, msg)
    }

    fn err_at(&self, t: &Token, msg: impl Into<String>) -> CompileError {
        CompileError::at(msg, self.path, t.line, t.col)
    }
}

fn push_arg(args: &mut Vec<String>, raw: &str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        args.push(trimmed.to_owned());
    }
}
