mod common;

use common::{assert_lines_in_order, translate_source};

const SRC: &str = "\
#section bss
let buf: resb 64;
let words: resq 8;
let single: u64;
#section program
global func main() >> u64:
    ret 0;
";

#[test]
fn bss_reservations() {
    let asm = translate_source(SRC);
    assert_lines_in_order(
        &asm,
        &[
            "section .bss",
            "buf: resb 64",
            "words: resq 8",
            "single: resq 1",
            "section .text",
        ],
    );
}

#[test]
fn bss_globals_are_addressable() {
    let asm = translate_source(
        "#section bss\nlet buf: resb 64;\n#section program\nglobal func main() >> u64:\n    ret &buf;\n",
    );
    assert_lines_in_order(&asm, &["buf: resb 64", "lea rax, [rel buf]"]);
}
