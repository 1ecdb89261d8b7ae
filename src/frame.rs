//! Stack-frame layout for one function activation.
use crate::types::Type;

#[derive(Debug, Clone)]
pub struct Local {
    pub name: String,
    pub ty: Type,
    pub rbp_offset: i32,
}

/// Locals grow the frame downward; every slot is padded so `stack_used`
/// stays a multiple of 8.
#[derive(Debug, Clone, Default)]
pub struct FrameLayout {
    locals: Vec<Local>,
    pub stack_used: i32,
}

impl FrameLayout {
    pub fn add_local(&mut self, name: &str, ty: Type) {
        self.stack_used += ty.size() as i32;
        if self.stack_used % 8 != 0 {
            self.stack_used += 8 - self.stack_used % 8;
        }
        self.locals.push(Local {
            name: name.to_owned(),
            ty,
            rbp_offset: -self.stack_used,
        });
    }

    /// First local with a matching name, in allocation order.
    pub fn lookup(&self, name: &str) -> Option<&Local> {
        self.locals.iter().find(|local| local.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_grow_downward() {
        let mut frame = FrameLayout::default();
        frame.add_local("a", Type::U64);
        frame.add_local("b", Type::U64);
        assert_eq!(frame.lookup("a").unwrap().rbp_offset, -8);
        assert_eq!(frame.lookup("b").unwrap().rbp_offset, -16);
        assert_eq!(frame.stack_used, 16);
    }

    #[test]
    fn test_narrow_locals_keep_alignment() {
        let mut frame = FrameLayout::default();
        frame.add_local("flag", Type::U8);
        frame.add_local("count", Type::U16);
        frame.add_local("wide", Type::I64);
        assert_eq!(frame.lookup("flag").unwrap().rbp_offset, -8);
        assert_eq!(frame.lookup("count").unwrap().rbp_offset, -16);
        assert_eq!(frame.lookup("wide").unwrap().rbp_offset, -24);
        assert_eq!(frame.stack_used % 8, 0);
    }

    #[test]
    fn test_lookup_returns_first_match() {
        let mut frame = FrameLayout::default();
        frame.add_local("x", Type::U8);
        frame.add_local("x", Type::U64);
        assert_eq!(frame.lookup("x").unwrap().ty, Type::U8);
    }

    #[test]
    fn test_missing_local() {
        let frame = FrameLayout::default();
        assert!(frame.lookup("nope").is_none());
    }
}
