mod common;

use common::{assert_lines_in_order, count_lines, translate_source, translate_source_err};

const SHL_SRC: &str = "\
#section macros
def shl1:
    @asm { shl rax, 1 }
enddef
#section program
global func main() >> u64:
    $shl1;
    ret 0;
";

#[test]
fn macro_splices_inline_asm() {
    let asm = translate_source(SHL_SRC);
    assert_lines_in_order(&asm, &["main:", "shl rax, 1", "leave", "ret"]);
}

#[test]
fn macro_section_content_is_not_emitted() {
    let asm = translate_source(SHL_SRC);
    assert!(!asm.contains("def "));
    assert!(!asm.contains("enddef"));
    assert_eq!(count_lines(&asm, "shl rax, 1"), 1);
}

#[test]
fn positional_arguments_substitute() {
    let asm = translate_source(
        "#section macros\ndef addi, 2:\n    @asm { add %1, %2 }\nenddef\n#section program\nglobal func main() >> u64:\n    $addi, rax, 5;\n    ret 0;\n",
    );
    assert_lines_in_order(&asm, &["main:", "add rax, 5", "leave", "ret"]);
}

#[test]
fn macro_reuse_expands_each_invocation() {
    let asm = translate_source(
        "#section macros\ndef nopper:\n    @asm { nop }\nenddef\n#section program\nglobal func main() >> u64:\n    $nopper;\n    $nopper;\n    ret 0;\n",
    );
    assert_eq!(count_lines(&asm, "nop"), 2);
}

#[test]
fn unknown_macro_passes_through_as_pseudo_opcode() {
    let asm = translate_source(
        "#section program\nglobal func main() >> u64:\n    $bswap64, rax;\n    ret 0;\n",
    );
    assert_lines_in_order(&asm, &["main:", "bswap64 rax", "leave", "ret"]);
}

#[test]
fn unknown_macro_without_args() {
    let asm = translate_source(
        "#section program\nglobal func main() >> u64:\n    $cpuid_probe;\n    ret 0;\n",
    );
    assert_lines_in_order(&asm, &["main:", "cpuid_probe", "leave", "ret"]);
}

#[test]
fn namespaced_macro_resolves() {
    let asm = translate_source(
        "#module BITS\n#section macros\ndef shl1:\n    @asm { shl rax, 1 }\nenddef\n#endmodule\n#section program\nglobal func main() >> u64:\n    $BITS::shl1;\n    ret 0;\n",
    );
    assert_lines_in_order(&asm, &["main:", "shl rax, 1"]);
}

#[test]
fn unterminated_macro_definition_is_fatal() {
    let err = translate_source_err("#section macros\ndef broken:\n    @asm { nop }\n");
    assert!(err.message.contains("unterminated macro definition"));
}

#[test]
fn macro_definition_outside_macros_section_is_fatal() {
    let err = translate_source_err("#section program\ndef oops:\nenddef\n");
    assert!(err.message.contains("macro definitions must be in macros section"));
}
