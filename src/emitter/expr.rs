//! Expression code generation.
//!
//! Every value materializes in rax. Binary chains park the left operand in
//! rbx across the right-hand side; rbx is callee-saved, so a call inside the
//! right operand leaves it intact.
use crate::{
    asm::ARG_REGS,
    error::CompileResult,
    frame::FrameLayout,
    lexer::TokenKind,
};

use super::FileEmitter;

impl FileEmitter<'_, '_> {
    /// expr := factor (('+' | '-') factor)*
    pub(super) fn emit_expr(&mut self, frame: &FrameLayout) -> CompileResult<()> {
        self.emit_factor(frame)?;
        while matches!(self.cur.kind, TokenKind::Plus | TokenKind::Minus) {
            let op = self.cur.kind;
            self.bump()?;
            writeln!(self.out, "    mov rbx, rax")?;
            self.emit_factor(frame)?;
            if op == TokenKind::Plus {
                writeln!(self.out, "    add rax, rbx")?;
            } else {
                writeln!(self.out, "    sub rbx, rax")?;
                writeln!(self.out, "    mov rax, rbx")?;
            }
        }
        Ok(())
    }

    /// factor := INT | '-' factor | '&' name | '*' name
    ///         | name ('(' args? ')')? | '(' expr ')'
    fn emit_factor(&mut self, frame: &FrameLayout) -> CompileResult<()> {
        match self.cur.kind {
            TokenKind::Minus => {
                self.bump()?;
                self.emit_factor(frame)?;
                writeln!(self.out, "    neg rax")?;
                Ok(())
            }
            TokenKind::Int => {
                let value = self.cur_text();
                writeln!(self.out, "    mov rax, {value}")?;
                self.bump()?;
                Ok(())
            }
            TokenKind::Amp => {
                self.bump()?;
                if self.cur.kind != TokenKind::Ident {
                    return Err(self.err("expected identifier after &"));
                }
                let at = self.cur;
                let qn = self.parse_qualified_name()?;
                let name = self.resolve_in(&self.ctx.globals.symbols, &qn, &at)?;
                writeln!(self.out, "    lea rax, [rel {name}]")?;
                Ok(())
            }
            TokenKind::Star => {
                self.bump()?;
                if self.cur.kind != TokenKind::Ident {
                    return Err(self.err("expected identifier after '*'"));
                }
                let at = self.cur;
                let qn = self.parse_qualified_name()?;
                self.load_target(&qn, &at, frame)?;
                writeln!(self.out, "    mov rbx, rax")?;
                writeln!(self.out, "    mov rax, [rbx]")?;
                Ok(())
            }
            TokenKind::Ident => {
                let at = self.cur;
                let qn = self.parse_qualified_name()?;

                if qn.ns.is_some() {
                    if self.cur.kind != TokenKind::LParen {
                        return Err(self.err("namespaced identifier must be a call"));
                    }
                    self.bump()?;
                    let callee = self.resolve_in(&self.ctx.funcs, &qn, &at)?;
                    return self.emit_call(frame, &callee);
                }

                if self.cur.kind == TokenKind::LParen {
                    self.bump()?;
                    let callee = self.resolve_in(&self.ctx.funcs, &qn, &at)?;
                    return self.emit_call(frame, &callee);
                }

                if frame.lookup(&qn.name).is_some() {
                    self.emit_load_local(&qn.name, &at, frame)
                } else {
                    let name = self.resolve_in(&self.ctx.globals.symbols, &qn, &at)?;
                    self.emit_load_global(&name, &at)
                }
            }
            TokenKind::LParen => {
                self.bump()?;
                self.emit_expr(frame)?;
                self.expect(TokenKind::RParen, "expected ')'")
            }
            _ => Err(self.err("expected expression atom")),
        }
    }

    /// Emit a call with the opening paren already consumed: arguments are
    /// evaluated left-to-right, each result moved into the next argument
    /// register.
    pub(super) fn emit_call(&mut self, frame: &FrameLayout, callee: &str) -> CompileResult<()> {
        let mut argc = 0;
        if self.cur.kind != TokenKind::RParen {
            loop {
                self.emit_expr(frame)?;
                if argc >= ARG_REGS.len() {
                    return Err(self.err("too many args (supports 6)"));
                }
                writeln!(self.out, "    mov {}, rax", ARG_REGS[argc])?;
                argc += 1;
                if self.cur.kind == TokenKind::Comma {
                    self.bump()?;
                    continue;
                }
                break;
            }
        }
        self.expect(TokenKind::RParen, "expected ')' after call args")?;
        writeln!(self.out, "    call {callee}")?;
        Ok(())
    }
}
