use std::fmt::Display;

use super::OperandSize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg {
    Rax,
    Rbx,
    Rcx,
    Rdx,
    Rsi,
    Rdi,
    R8,
    R9,
}

/// Integer argument registers in calling-convention order.
pub const ARG_REGS: [Reg; 6] = [Reg::Rdi, Reg::Rsi, Reg::Rdx, Reg::Rcx, Reg::R8, Reg::R9];

impl Reg {
    /// The register slice matching an operand width.
    pub fn sized(&self, size: OperandSize) -> &'static str {
        use OperandSize::*;

        match self {
            Reg::Rax => match size {
                Byte => "al",
                Word => "ax",
                Dword => "eax",
                Qword => "rax",
            },
            Reg::Rbx => match size {
                Byte => "bl",
                Word => "bx",
                Dword => "ebx",
                Qword => "rbx",
            },
            Reg::Rcx => match size {
                Byte => "cl",
                Word => "cx",
                Dword => "ecx",
                Qword => "rcx",
            },
            Reg::Rdx => match size {
                Byte => "dl",
                Word => "dx",
                Dword => "edx",
                Qword => "rdx",
            },
            Reg::Rsi => match size {
                Byte => "sil",
                Word => "si",
                Dword => "esi",
                Qword => "rsi",
            },
            Reg::Rdi => match size {
                Byte => "dil",
                Word => "di",
                Dword => "edi",
                Qword => "rdi",
            },
            Reg::R8 => match size {
                Byte => "r8b",
                Word => "r8w",
                Dword => "r8d",
                Qword => "r8",
            },
            Reg::R9 => match size {
                Byte => "r9b",
                Word => "r9w",
                Dword => "r9d",
                Qword => "r9",
            },
        }
    }
}

impl Display for Reg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.sized(OperandSize::Qword))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_register_slices() {
        assert_eq!(ARG_REGS[0].sized(OperandSize::Byte), "dil");
        assert_eq!(ARG_REGS[1].sized(OperandSize::Word), "si");
        assert_eq!(ARG_REGS[4].sized(OperandSize::Dword), "r8d");
        assert_eq!(ARG_REGS[5].sized(OperandSize::Qword), "r9");
    }
}
