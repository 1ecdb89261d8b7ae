mod operandsize;
mod reg;

pub use self::operandsize::OperandSize;
pub use self::reg::*;
