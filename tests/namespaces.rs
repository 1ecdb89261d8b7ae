mod common;

use common::{assert_lines_in_order, translate_source, translate_source_err};

#[test]
fn module_definitions_are_mangled() {
    let asm = translate_source(
        "#section program\n#module M1\nglobal func f() >> u64:\n    ret 1;\n#endmodule\n",
    );
    assert_lines_in_order(&asm, &["global M1__f", "M1__f:"]);
}

#[test]
fn using_namespace_resolves_bare_call() {
    let asm = translate_source(
        "#section program\n#module M1\nglobal func f() >> u64:\n    ret 1;\n#endmodule\n#uns M1\nglobal func main() >> u64:\n    call f();\n    ret 0;\n",
    );
    assert_lines_in_order(&asm, &["main:", "call M1__f"]);
}

#[test]
fn single_candidate_resolves_without_using() {
    let asm = translate_source(
        "#section program\n#module M1\nglobal func f() >> u64:\n    ret 1;\n#endmodule\nglobal func main() >> u64:\n    call f();\n    ret 0;\n",
    );
    assert_lines_in_order(&asm, &["call M1__f"]);
}

#[test]
fn explicit_qualifier_always_wins() {
    let asm = translate_source(
        "#section program\n#module M1\nglobal func f() >> u64:\n    ret 1;\n#endmodule\n#module M2\nglobal func f() >> u64:\n    ret 2;\n#endmodule\nglobal func main() >> u64:\n    call M2::f();\n    ret 0;\n",
    );
    assert_lines_in_order(&asm, &["call M2__f"]);
}

#[test]
fn competing_candidates_make_bare_reference_fatal() {
    let err = translate_source_err(
        "#section program\n#module M1\nglobal func f() >> u64:\n    ret 1;\n#endmodule\n#module M2\nglobal func f() >> u64:\n    ret 2;\n#endmodule\n#uns M1\n#uns M2\nglobal func main() >> u64:\n    call f();\n    ret 0;\n",
    );
    assert!(err.message.contains("ambiguous"));
}

#[test]
fn module_interior_references_resolve_locally() {
    let asm = translate_source(
        "#section program\n#module M1\nglobal func f() >> u64:\n    ret 1;\nglobal func g() >> u64:\n    call f();\n    ret 0;\n#endmodule\n",
    );
    assert_lines_in_order(&asm, &["M1__g:", "call M1__f"]);
}

#[test]
fn unknown_bare_function_links_externally() {
    let asm = translate_source(
        "#section program\nglobal func main() >> u64:\n    call write_all();\n    ret 0;\n",
    );
    assert_lines_in_order(&asm, &["call write_all"]);
}

#[test]
fn module_globals_are_mangled() {
    let asm = translate_source(
        "#module IO\n#section data\nlet cursor: u64 = 0;\n#section program\nglobal func bump() >> u64:\n    set cursor = 1;\n    ret cursor;\n#endmodule\n",
    );
    assert_lines_in_order(
        &asm,
        &[
            "IO__cursor: dq 0",
            "IO__bump:",
            "mov qword [rel IO__cursor], rax",
            "mov rax, qword [rel IO__cursor]",
        ],
    );
}

#[test]
fn endmodule_without_module_is_fatal() {
    let err = translate_source_err("#endmodule\n");
    assert!(err.message.contains("#endmodule without active module"));
}
