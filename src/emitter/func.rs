//! Function declarations: header parsing, stack-frame setup, and the
//! statement loop of the indented body.
use crate::{
    asm::{OperandSize, ARG_REGS},
    error::CompileResult,
    frame::FrameLayout,
    lexer::TokenKind,
    macros,
    symbols::resolve_definition,
    types::Type,
};

use super::FileEmitter;

impl FileEmitter<'_, '_> {
    /// `local|global [inline] func NAME(params) >> TYPE:` followed by an
    /// indented body. The raw name has already been consumed.
    pub(super) fn parse_and_emit_func(
        &mut self,
        raw_name: &str,
        is_global: bool,
        _is_inline: bool,
    ) -> CompileResult<()> {
        let fname = resolve_definition(self.current_namespace.as_deref(), raw_name);

        self.expect(TokenKind::LParen, "expected '(' after func name")?;

        let mut params: Vec<(String, Type)> = vec![];
        if self.cur.kind != TokenKind::RParen {
            loop {
                if self.cur.kind != TokenKind::Ident {
                    return Err(self.err("expected param name"));
                }
                let name = self.cur_text().to_owned();
                self.bump()?;
                self.expect(TokenKind::Colon, "expected ':' in param")?;
                if self.cur.kind != TokenKind::Ident {
                    return Err(self.err("expected type after ':'"));
                }
                let ty = Type::parse(self.cur_text())
                    .ok_or_else(|| self.err("unknown type name"))?;
                self.bump()?;

                if params.len() >= ARG_REGS.len() {
                    return Err(self.err("too many params (supports 6)"));
                }
                params.push((name, ty));

                if self.cur.kind == TokenKind::Comma {
                    self.bump()?;
                    continue;
                }
                break;
            }
        }
        self.expect(TokenKind::RParen, "expected ')' after params")?;

        self.expect(TokenKind::RArrow, "expected '>>' return type")?;
        if self.cur.kind != TokenKind::Ident {
            return Err(self.err("expected return type name"));
        }
        self.bump()?;

        self.expect(TokenKind::Colon, "expected ':' after function header")?;
        self.skip_newlines()?;
        self.expect(TokenKind::Indent, "expected indented function body")?;

        if is_global {
            writeln!(self.out, "global {fname}")?;
        }
        writeln!(self.out, "{fname}:")?;
        writeln!(self.out, "    push rbp")?;
        writeln!(self.out, "    mov rbp, rsp")?;

        let mut frame = FrameLayout::default();
        for (name, ty) in &params {
            frame.add_local(name, *ty);
        }

        if frame.stack_used > 0 {
            writeln!(self.out, "    sub rsp, {}", frame.stack_used)?;
        }

        for (i, (name, ty)) in params.iter().enumerate() {
            let local = frame.lookup(name).expect("parameter was just added");
            let size = OperandSize::from(*ty);
            let off = local.rbp_offset;
            let slice = ARG_REGS[i].sized(size);
            writeln!(self.out, "    mov {size} [rbp{off:+}], {slice}")?;
        }

        self.emit_body(&mut frame)
    }

    fn emit_body(&mut self, frame: &mut FrameLayout) -> CompileResult<()> {
        loop {
            match self.cur.kind {
                TokenKind::Dedent => {
                    self.bump()?;
                    if self.at_keyword("end") {
                        self.bump()?;
                    }
                    return Ok(());
                }
                TokenKind::Newline => {
                    self.bump()?;
                    continue;
                }
                TokenKind::At => {
                    let (start, end) = self.parse_inline_block()?;
                    let src = self.src;
                    macros::emit_raw_block(&mut *self.out, &src[start..end])?;
                    continue;
                }
                TokenKind::Dollar => {
                    self.bump()?;
                    self.emit_macro_invocation()?;
                    continue;
                }
                TokenKind::Ident => {}
                _ => return Err(self.err("unsupported statement")),
            }

            match self.cur_text() {
                "let" => self.stmt_let(frame)?,
                "ret" | "return" => return self.stmt_ret(frame),
                "set" => self.stmt_set(frame)?,
                "push" => self.stmt_push(frame)?,
                "pop" => self.stmt_pop(frame)?,
                "void" => self.stmt_void()?,
                "call" => self.stmt_call(frame)?,
                "end" => {
                    self.bump()?;
                    return Ok(());
                }
                _ => return Err(self.err("unsupported statement")),
            }
        }
    }

    /// `let [*]NAME [: TYPE] [= expr];` allocates a local and stores rax
    /// (or zero) into it with the type-appropriate width.
    fn stmt_let(&mut self, frame: &mut FrameLayout) -> CompileResult<()> {
        self.bump()?;
        if self.cur.kind == TokenKind::Star {
            // pointer locals default to pointer width
            self.bump()?;
        }
        if self.cur.kind != TokenKind::Ident {
            return Err(self.err("expected local name after let"));
        }
        let at = self.cur;
        let name = self.cur_text().to_owned();
        self.bump()?;

        let mut ty: Option<Type> = None;
        if self.cur.kind == TokenKind::Colon {
            self.bump()?;
            if self.cur.kind != TokenKind::Ident {
                return Err(self.err("expected type name"));
            }
            ty = Some(Type::parse(self.cur_text()).ok_or_else(|| self.err("unknown type name"))?);
            self.bump()?;
        }
        let ty = ty.unwrap_or(Type::U64);

        if self.cur.kind == TokenKind::Eq {
            self.bump()?;
            self.emit_expr(frame)?;
        } else {
            writeln!(self.out, "    xor rax, rax")?;
        }
        self.expect(TokenKind::Semi, "expected ';' after let")?;

        frame.add_local(&name, ty);
        self.emit_store_local(&name, &at, frame)
    }

    /// `ret [expr];` ends the function: remaining tokens up to the
    /// enclosing dedent are skipped.
    fn stmt_ret(&mut self, frame: &mut FrameLayout) -> CompileResult<()> {
        self.bump()?;
        if self.cur.kind != TokenKind::Semi {
            self.emit_expr(frame)?;
        } else {
            writeln!(self.out, "    xor rax, rax")?;
        }
        self.expect(TokenKind::Semi, "expected ';' after return")?;

        writeln!(self.out, "    leave")?;
        writeln!(self.out, "    ret")?;

        while !matches!(self.cur.kind, TokenKind::Dedent | TokenKind::Eof) {
            self.bump()?;
        }
        if self.cur.kind == TokenKind::Dedent {
            self.bump()?;
        }
        if self.at_keyword("end") {
            self.bump()?;
        }
        Ok(())
    }

    /// `set [*]target [: TYPE] = expr;` stores into a local or global, or
    /// through a pointer when `*` prefixes the target.
    fn stmt_set(&mut self, frame: &mut FrameLayout) -> CompileResult<()> {
        self.bump()?;
        let mut deref = false;
        if self.cur.kind == TokenKind::Star {
            deref = true;
            self.bump()?;
        }
        if self.cur.kind != TokenKind::Ident {
            return Err(self.err("expected name after set"));
        }
        let at = self.cur;
        let qn = self.parse_qualified_name()?;
        if self.cur.kind == TokenKind::Colon {
            self.bump()?;
            if self.cur.kind != TokenKind::Ident {
                return Err(self.err("expected type after ':'"));
            }
            self.bump()?;
        }
        self.expect(TokenKind::Eq, "expected '=' after set target")?;
        self.emit_expr(frame)?;
        self.expect(TokenKind::Semi, "expected ';' after set")?;

        if deref {
            writeln!(self.out, "    mov rcx, rax")?;
            self.load_target(&qn, &at, frame)?;
            writeln!(self.out, "    mov rbx, rax")?;
            writeln!(self.out, "    mov [rbx], rcx")?;
        } else {
            self.store_target(&qn, &at, frame)?;
        }
        Ok(())
    }

    /// `push e1, e2, ...;`
    fn stmt_push(&mut self, frame: &mut FrameLayout) -> CompileResult<()> {
        self.bump()?;
        loop {
            self.emit_expr(frame)?;
            writeln!(self.out, "    push rax")?;
            if self.cur.kind == TokenKind::Comma {
                self.bump()?;
                continue;
            }
            break;
        }
        self.expect(TokenKind::Semi, "expected ';' after push")
    }

    /// `pop [*]name [: TYPE], ...;`
    fn stmt_pop(&mut self, frame: &mut FrameLayout) -> CompileResult<()> {
        self.bump()?;
        loop {
            let mut deref = false;
            if self.cur.kind == TokenKind::Star {
                deref = true;
                self.bump()?;
            }
            if self.cur.kind != TokenKind::Ident {
                return Err(self.err("expected identifier after pop"));
            }
            let at = self.cur;
            let qn = self.parse_qualified_name()?;
            if self.cur.kind == TokenKind::Colon {
                self.bump()?;
                if self.cur.kind == TokenKind::Ident {
                    self.bump()?;
                }
            }
            writeln!(self.out, "    pop rax")?;
            if deref {
                writeln!(self.out, "    mov rcx, rax")?;
                self.load_target(&qn, &at, frame)?;
                writeln!(self.out, "    mov rbx, rax")?;
                writeln!(self.out, "    mov [rbx], rcx")?;
            } else {
                self.store_target(&qn, &at, frame)?;
            }
            if self.cur.kind == TokenKind::Comma {
                self.bump()?;
                continue;
            }
            break;
        }
        self.expect(TokenKind::Semi, "expected ';' after pop")
    }

    /// `void ...;` swallows tokens through the semicolon and emits nothing.
    fn stmt_void(&mut self) -> CompileResult<()> {
        self.bump()?;
        while !matches!(self.cur.kind, TokenKind::Semi | TokenKind::Eof) {
            self.bump()?;
        }
        self.expect(TokenKind::Semi, "expected ';' after void")
    }

    /// `call name(args);` calls for effect, discarding the result.
    fn stmt_call(&mut self, frame: &mut FrameLayout) -> CompileResult<()> {
        self.bump()?;
        if self.cur.kind != TokenKind::Ident {
            return Err(self.err("expected function name after call"));
        }
        let at = self.cur;
        let qn = self.parse_qualified_name()?;
        self.expect(TokenKind::LParen, "expected '(' after call name")?;
        let callee = self.resolve_in(&self.ctx.funcs, &qn, &at)?;
        self.emit_call(frame, &callee)?;
        self.expect(TokenKind::Semi, "expected ';' after call")
    }
}
