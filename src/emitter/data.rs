//! Top-level `let` in the data/bss/readonly sections and `def` in the
//! macros section.
use crate::{
    context::Section,
    error::CompileResult,
    lexer::TokenKind,
    scanner::parse_int,
    symbols::resolve_definition,
    types::Type,
};

use super::FileEmitter;

impl FileEmitter<'_, '_> {
    /// `let [*]NAME [: TYPE_OR_RESERVE [COUNT]] [= value];`
    ///
    /// In bss the emission is a reservation; elsewhere the initializer is the
    /// verbatim token run between `=` and `;`, defaulting to a single zero.
    pub(super) fn parse_global_let(&mut self) -> CompileResult<()> {
        self.bump()?;
        if self.cur.kind == TokenKind::Star {
            // pointer globals default to pointer width
            self.bump()?;
        }
        if self.cur.kind != TokenKind::Ident {
            return Err(self.err("expected variable name after let"));
        }
        let raw = self.cur_text().to_owned();
        self.bump()?;

        let mut ty: Option<Type> = None;
        let mut reserve_count = 1;
        if self.cur.kind == TokenKind::Colon {
            self.bump()?;
            if self.cur.kind != TokenKind::Ident {
                return Err(self.err("expected type name after ':'"));
            }
            let type_name = self.cur_text();
            ty = Type::parse(type_name);
            if ty.is_none() {
                if let Some(reserved) = Type::parse_reserve(type_name) {
                    ty = Some(reserved);
                    self.bump()?;
                    if self.cur.kind != TokenKind::Int {
                        return Err(self.err("expected reserve count"));
                    }
                    reserve_count = parse_int(self.cur_text())
                        .ok_or_else(|| self.err("expected reserve count"))?;
                }
            }
            self.bump()?;
        }
        let ty = ty.unwrap_or(Type::U64);

        let qualified = resolve_definition(self.current_namespace.as_deref(), &raw);
        self.ctx.globals.insert(&raw, &qualified, ty, reserve_count);

        if self.section == Section::Bss {
            let count = reserve_count.max(1);
            let directive = ty.reserve_directive();
            writeln!(self.out, "{qualified}: {directive} {count}")?;
            return self.expect(TokenKind::Semi, "expected ';' after let");
        }

        let directive = ty.data_directive();
        if self.cur.kind == TokenKind::Eq {
            self.bump()?;
            let start = self.cur.start;
            let mut end = start;
            while self.cur.kind != TokenKind::Semi {
                if matches!(self.cur.kind, TokenKind::Eof | TokenKind::Newline) {
                    return Err(self.err("expected ';' after let"));
                }
                end = self.cur.end;
                self.bump()?;
            }
            let mut value = self.src[start..end].trim();
            if value.is_empty() {
                value = "0";
            }
            writeln!(self.out, "{qualified}: {directive} {value}")?;
            self.bump()?;
        } else {
            writeln!(self.out, "{qualified}: {directive} 0")?;
            self.expect(TokenKind::Semi, "expected ';' after let")?;
        }
        Ok(())
    }

    /// `def NAME [, ARITY]:` with the body captured verbatim up to `enddef`.
    pub(super) fn parse_macro_definition(&mut self) -> CompileResult<()> {
        self.bump()?;
        if self.cur.kind != TokenKind::Ident {
            return Err(self.err("expected macro name"));
        }
        let raw = self.cur_text().to_owned();
        self.bump()?;

        let mut arity = 0;
        if self.cur.kind == TokenKind::Comma {
            self.bump()?;
            if self.cur.kind != TokenKind::Int {
                return Err(self.err("expected macro arity"));
            }
            arity = parse_int(self.cur_text()).ok_or_else(|| self.err("expected macro arity"))?;
            self.bump()?;
        }

        self.expect(TokenKind::Colon, "expected ':' after macro header")?;
        let qualified = resolve_definition(self.current_namespace.as_deref(), &raw);
        let body = self.capture_until_enddef()?;
        self.ctx.macros.define(&qualified, arity as usize, &body);
        Ok(())
    }
}
