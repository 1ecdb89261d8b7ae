//! The surface type system of chasm: fixed-width integers plus `null`.
use std::collections::HashMap;
use std::fmt::Display;

use once_cell::sync::Lazy;

static TYPE_NAMES: Lazy<HashMap<&'static str, Type>> = Lazy::new(|| {
    let mut m = HashMap::new();

    m.insert("u8", Type::U8);
    m.insert("u16", Type::U16);
    m.insert("u32", Type::U32);
    m.insert("u64", Type::U64);
    m.insert("i8", Type::I8);
    m.insert("i16", Type::I16);
    m.insert("i32", Type::I32);
    m.insert("i64", Type::I64);
    m.insert("null", Type::Null);
    m.insert("Null", Type::Null);

    m
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    Null,
}

impl Type {
    pub fn parse(name: &str) -> Option<Type> {
        TYPE_NAMES.get(name).copied()
    }

    /// Map a `res*` reservation directive to the element type it reserves.
    pub fn parse_reserve(name: &str) -> Option<Type> {
        match name {
            "resb" => Some(Type::U8),
            "resw" => Some(Type::U16),
            "resd" => Some(Type::U32),
            "resq" => Some(Type::U64),
            _ => None,
        }
    }

    /// Width in bytes. `null` is pointer-width for layout purposes.
    pub fn size(&self) -> usize {
        match self {
            Type::U8 | Type::I8 => 1,
            Type::U16 | Type::I16 => 2,
            Type::U32 | Type::I32 => 4,
            Type::U64 | Type::I64 | Type::Null => 8,
        }
    }

    /// Whether narrow loads sign-extend into the accumulator.
    pub fn is_signed(&self) -> bool {
        matches!(self, Type::I8 | Type::I16 | Type::I32 | Type::I64)
    }

    /// The NASM definition directive for initialised data of this type.
    pub fn data_directive(&self) -> &'static str {
        match self.size() {
            1 => "db",
            2 => "dw",
            4 => "dd",
            _ => "dq",
        }
    }

    /// The NASM reservation directive for BSS data of this type.
    pub fn reserve_directive(&self) -> &'static str {
        match self.size() {
            1 => "resb",
            2 => "resw",
            4 => "resd",
            _ => "resq",
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Type::U8 => "u8",
            Type::U16 => "u16",
            Type::U32 => "u32",
            Type::U64 => "u64",
            Type::I8 => "i8",
            Type::I16 => "i16",
            Type::I32 => "i32",
            Type::I64 => "i64",
            Type::Null => "null",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_names() {
        assert_eq!(Type::parse("u16"), Some(Type::U16));
        assert_eq!(Type::parse("i64"), Some(Type::I64));
        assert_eq!(Type::parse("Null"), Some(Type::Null));
        assert_eq!(Type::parse("f32"), None);
    }

    #[test]
    fn test_reserve_directives() {
        assert_eq!(Type::parse_reserve("resw"), Some(Type::U16));
        assert_eq!(Type::parse_reserve("resx"), None);
        assert_eq!(Type::U8.reserve_directive(), "resb");
        assert_eq!(Type::I64.reserve_directive(), "resq");
    }

    #[test]
    fn test_null_is_pointer_width() {
        assert_eq!(Type::Null.size(), 8);
        assert_eq!(Type::Null.data_directive(), "dq");
    }
}
