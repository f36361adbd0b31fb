//! End-to-end pipeline tests: ToyC source through the analyzer into
//! RISC-V assembly text.

use pretty_assertions::assert_eq;
use toyc_codegen::{generate_assembly, CodegenError};
use toyc_frontend::{Frontend, SemanticAnalyzer};

/// Compile a valid program to assembly, panicking on any failure
fn compile(source: &str) -> String {
    let mut unit = Frontend::parse_source(source).expect("parse failed");
    let mut analyzer = SemanticAnalyzer::new();
    assert!(
        analyzer.analyze(&mut unit),
        "semantic errors: {:?}",
        analyzer.errors()
    );
    generate_assembly(&unit, analyzer.function_table()).expect("codegen failed")
}

/// Run semantic analysis and return the error messages
fn analyze_errors(source: &str) -> Vec<String> {
    let mut unit = Frontend::parse_source(source).expect("parse failed");
    let mut analyzer = SemanticAnalyzer::new();
    analyzer.analyze(&mut unit);
    analyzer
        .errors()
        .iter()
        .map(|d| d.message().to_string())
        .collect()
}

/// The assembly chunk for one function (label line through blank line)
fn function_chunk<'a>(asm: &'a str, name: &str) -> &'a str {
    let label = format!("{}:\n", name);
    let start = asm.find(&label).expect("function label not found");
    let rest = &asm[start..];
    match rest.find("\n\n") {
        Some(end) => &rest[..end],
        None => rest,
    }
}

#[test]
fn test_empty_main() {
    let asm = compile("int main() { return 0; }");

    let expected = concat!(
        "    .text\n",
        "    .globl main\n",
        "    # ToyC Compiler Generated Code\n",
        "main:\n",
        "    # Function: main\n",
        "    addi sp, sp, -8\n",
        "    sw ra, 4(sp)\n",
        "    sw fp, 0(sp)\n",
        "    addi fp, sp, 8\n",
        "    addi t0, zero, 0\n",
        "    mv a0, t0\n",
        "    lw ra, 4(sp)\n",
        "    lw fp, 0(sp)\n",
        "    addi sp, sp, 8\n",
        "    jr ra\n",
        "\n",
    );
    assert_eq!(asm, expected);
}

#[test]
fn test_duplicate_function_error() {
    let errors =
        analyze_errors("int f() { return 0; } int f() { return 1; } int main() { return 0; }");
    assert_eq!(errors, vec!["Function 'f' is already declared".to_string()]);
}

#[test]
fn test_missing_main_error() {
    let errors = analyze_errors("int foo() { return 0; }");
    assert_eq!(
        errors,
        vec!["Missing main function with signature: int main()".to_string()]
    );
}

#[test]
fn test_break_outside_loop_error() {
    let errors = analyze_errors("int main() { break; return 0; }");
    assert_eq!(errors, vec!["break statement not within a loop".to_string()]);
}

#[test]
fn test_nested_scope_shadowing_reads_outer_slot() {
    let asm = compile("int main() { int x = 1; { int x = 2; } return x; }");

    // outer x lives at fp-12, the shadowing inner x at fp-16
    assert!(asm.contains("sw t0, -12(fp)"));
    assert!(asm.contains("sw t0, -16(fp)"));

    // the return reads the outer slot back
    let load = asm.find("lw t0, -12(fp)").expect("missing outer load");
    let ret = asm.find("mv a0, t0").expect("missing return move");
    assert!(load < ret);
}

#[test]
fn test_logical_or_short_circuits_around_the_call() {
    let asm = compile("int crash() { return 1; } int main() { return 1 || crash(); }");
    let main_chunk = function_chunk(&asm, "main");

    // the call is still emitted
    let call = main_chunk.find("call crash").expect("missing call");

    // but the left operand is tested first and branches over it
    let branch = main_chunk
        .find("bnez t0, or_true")
        .expect("missing short-circuit branch");
    assert!(branch < call);

    assert!(main_chunk.contains("or_true0:"));
    assert!(main_chunk.contains("or_end1:"));
}

#[test]
fn test_logical_and_short_circuits_around_the_call() {
    let asm = compile("int touch() { return 1; } int main() { return 0 && touch(); }");
    let main_chunk = function_chunk(&asm, "main");

    let call = main_chunk.find("call touch").expect("missing call");
    let branch = main_chunk
        .find("beqz t0, and_false")
        .expect("missing short-circuit branch");
    assert!(branch < call);
}

#[test]
fn test_generation_is_deterministic() {
    let source = "int add(int a, int b) { return a + b; }
                  int main() { int s = 0; while (s < 10) { s = add(s, 1); } return s; }";
    assert_eq!(compile(source), compile(source));
}

#[test]
fn test_labels_are_unique_across_the_unit() {
    let source = "int f(int n) {
                      if (n > 0) { return 1; } else { return 0; }
                  }
                  int main() {
                      int i = 0;
                      while (i < 3) {
                          if (i == 1 && f(i)) { i = i + 2; } else { i = i + 1; }
                      }
                      while (i > 0) { i = i - 1; }
                      return f(i) || f(i + 1);
                  }";
    let asm = compile(source);

    let mut labels: Vec<&str> = asm
        .lines()
        .filter(|line| line.ends_with(':') && !line.starts_with(' '))
        .collect();
    let total = labels.len();
    labels.sort_unstable();
    labels.dedup();
    assert_eq!(labels.len(), total, "duplicate label emitted");
}

#[test]
fn test_every_return_path_restores_the_frame() {
    let source = "int f(int n) {
                      if (n > 0) { return n; }
                      return 0;
                  }
                  void g() { return; }
                  int main() { g(); return f(2); }";
    let asm = compile(source);

    let lines: Vec<&str> = asm.lines().map(str::trim).collect();
    for (i, line) in lines.iter().enumerate() {
        if *line == "jr ra" {
            assert!(i >= 3, "epilogue too short before line {}", i);
            assert!(
                lines[i - 1].starts_with("addi sp, sp, "),
                "jr ra not preceded by stack restore: {:?}",
                &lines[i.saturating_sub(3)..=i]
            );
            assert!(lines[i - 2].starts_with("lw fp, "));
            assert!(lines[i - 3].starts_with("lw ra, "));
        }
    }
}

#[test]
fn test_frame_sizes_are_aligned() {
    let source = "int one() { int a = 1; return a; }
                  int three(int p) { int a = 1; int b = 2; int c = 3; return p; }
                  int main() { return one() + three(5); }";
    let asm = compile(source);

    let mut seen = 0;
    for line in asm.lines().map(str::trim) {
        if let Some(size) = line.strip_prefix("addi sp, sp, -") {
            let size: i32 = size.parse().expect("bad frame size");
            // per-call temp saves also adjust sp by 4; skip those
            if size == 4 {
                continue;
            }
            assert!(size >= 8, "frame too small: {}", size);
            assert_eq!(size % 8, 0, "frame not 8-byte aligned: {}", size);
            seen += 1;
        }
    }
    assert_eq!(seen, 3, "expected one prologue per function");
}

#[test]
fn test_parameters_are_spilled_and_read_back() {
    let asm = compile("int add(int a, int b) { return a + b; } int main() { return add(1, 2); }");
    let add_chunk = function_chunk(&asm, "add");

    // prologue spills the argument registers into frame slots
    assert!(add_chunk.contains("sw a0, -12(fp)"));
    assert!(add_chunk.contains("sw a1, -16(fp)"));

    // the body reads them back as plain locals
    assert!(add_chunk.contains("lw t0, -12(fp)"));
    assert!(add_chunk.contains("lw t1, -16(fp)"));
    assert!(add_chunk.contains("add t2, t0, t1"));
}

#[test]
fn test_call_saves_and_restores_temps() {
    let asm = compile("int f() { return 1; } int main() { return f(); }");
    let main_chunk = function_chunk(&asm, "main");

    // seven pushes before the call, seven pops after, in reverse order
    assert_eq!(main_chunk.matches("sw t6, 0(sp)").count(), 1);
    assert_eq!(main_chunk.matches("lw t6, 0(sp)").count(), 1);
    assert_eq!(main_chunk.matches("addi sp, sp, -4").count(), 7);
    assert_eq!(main_chunk.matches("addi sp, sp, 4").count(), 7);

    let save = main_chunk.find("sw t0, 0(sp)").expect("missing temp save");
    let call = main_chunk.find("call f").expect("missing call");
    let restore = main_chunk.find("lw t6, 0(sp)").expect("missing temp restore");
    assert!(save < call && call < restore);

    // the result lands in a fresh temp
    assert!(main_chunk.contains("mv t0, a0"));
}

#[test]
fn test_arguments_are_moved_into_a_registers() {
    let asm = compile("int add(int a, int b) { return a + b; } int main() { return add(1, 2); }");
    let main_chunk = function_chunk(&asm, "main");

    assert!(main_chunk.contains("mv a0, t0"));
    assert!(main_chunk.contains("mv a1, t0"));
}

#[test]
fn test_void_call_produces_no_result_move() {
    let asm = compile("void ping() { } int main() { ping(); return 0; }");
    let main_chunk = function_chunk(&asm, "main");

    assert!(main_chunk.contains("call ping"));
    assert!(!main_chunk.contains("mv t0, a0"));
}

#[test]
fn test_void_function_gets_trailing_epilogue() {
    let asm = compile("void ping() { } int main() { ping(); return 0; }");
    let ping_chunk = function_chunk(&asm, "ping");

    assert!(ping_chunk.contains("jr ra"));
    assert!(ping_chunk.contains("addi sp, sp, 8"));
}

#[test]
fn test_while_loop_structure() {
    let asm = compile("int main() { int i = 0; while (i < 10) { i = i + 1; } return i; }");

    assert!(asm.contains("while_loop0:"));
    assert!(asm.contains("beqz t2, while_end1"));
    assert!(asm.contains("j while_loop0"));
    assert!(asm.contains("while_end1:"));

    let loop_label = asm.find("while_loop0:").expect("missing loop label");
    let end_label = asm.find("while_end1:").expect("missing end label");
    assert!(loop_label < end_label);
}

#[test]
fn test_break_and_continue_jump_to_loop_labels() {
    let asm = compile(
        "int main() {
             int i = 0;
             while (1) {
                 i = i + 1;
                 if (i == 3) { continue; }
                 if (i > 5) { break; }
             }
             return i;
         }",
    );

    assert!(asm.contains("j while_loop0"));
    assert!(asm.contains("j while_end1"));
}

#[test]
fn test_if_without_else_branches_to_end() {
    let asm = compile("int main() { if (1) { return 1; } return 0; }");

    assert!(asm.contains("beqz t0, if_end1"));
    assert!(asm.contains("if_end1:"));
    assert!(!asm.contains("if_else0:"));
}

#[test]
fn test_if_else_structure() {
    let asm = compile("int main() { if (0) { return 1; } else { return 2; } }");

    let branch = asm.find("beqz t0, if_else0").expect("missing else branch");
    let jump = asm.find("j if_end1").expect("missing end jump");
    let else_label = asm.find("if_else0:").expect("missing else label");
    let end_label = asm.find("if_end1:").expect("missing end label");

    assert!(branch < jump && jump < else_label && else_label < end_label);
}

#[test]
fn test_comparison_lowering() {
    let asm = compile("int main() { int a = 1; int b = 2; return a <= b; }");

    // a <= b is slt with swapped operands then xori
    assert!(asm.contains("slt t2, t1, t0"));
    assert!(asm.contains("xori t2, t2, 1"));
}

#[test]
fn test_equality_lowering() {
    let asm = compile("int main() { int a = 1; return a == 1; }");
    assert!(asm.contains("sub t2, t0, t1"));
    assert!(asm.contains("seqz t2, t2"));
}

#[test]
fn test_unary_lowering() {
    let asm = compile("int main() { int a = 1; return -a + !a; }");
    assert!(asm.contains("sub t1, zero, t0"));
    assert!(asm.contains("seqz t2, t0"));
}

#[test]
fn test_large_immediate_through_pipeline() {
    let asm = compile("int main() { return 100000; }");
    assert!(asm.contains("lui t0, 24"));
    assert!(asm.contains("addi t0, t0, 1696"));
}

#[test]
fn test_expression_statement_releases_temps() {
    // both statements start expression evaluation from t0
    let asm = compile("int f() { return 1; } int main() { f(); f(); return 0; }");
    let main_chunk = function_chunk(&asm, "main");
    assert_eq!(main_chunk.matches("mv t0, a0").count(), 2);
}

#[test]
fn test_functions_emitted_in_source_order() {
    let asm = compile(
        "int first() { return 1; } int second() { return 2; } int main() { return 0; }",
    );

    let first = asm.find("first:").expect("missing first");
    let second = asm.find("second:").expect("missing second");
    let main_pos = asm.find("main:").expect("missing main");
    assert!(first < second && second < main_pos);
}

/// Run the full pipeline on a valid program and return the codegen result
fn generate(source: &str) -> Result<String, CodegenError> {
    let mut unit = Frontend::parse_source(source).expect("parse failed");
    let mut analyzer = SemanticAnalyzer::new();
    assert!(
        analyzer.analyze(&mut unit),
        "semantic errors: {:?}",
        analyzer.errors()
    );
    generate_assembly(&unit, analyzer.function_table())
}

#[test]
fn test_eight_arguments_are_supported() {
    compile(
        "int f(int a, int b, int c, int d, int e, int g, int h, int i) {
             return a;
         }
         int main() { return f(1, 2, 3, 4, 5, 6, 7, 8); }",
    );
}

#[test]
fn test_more_than_eight_arguments_is_a_codegen_error() {
    // the caller comes first so the call site is lowered before the
    // over-arity definition is reached
    let source = "int main() { return f(1, 2, 3, 4, 5, 6, 7, 8, 9); }
                  int f(int a, int b, int c, int d, int e, int g, int h, int i, int j) {
                      return a;
                  }";
    match generate(source) {
        Err(CodegenError::TooManyArguments { name, count }) => {
            assert_eq!(name, "f");
            assert_eq!(count, 9);
        }
        other => panic!("expected TooManyArguments, got {:?}", other),
    }
}

#[test]
fn test_more_than_eight_parameters_is_a_codegen_error() {
    // the callee comes first so its definition is rejected before any call
    let source = "int f(int a, int b, int c, int d, int e, int g, int h, int i, int j) {
                      return a;
                  }
                  int main() { return f(1, 2, 3, 4, 5, 6, 7, 8, 9); }";
    match generate(source) {
        Err(CodegenError::TooManyParameters { name, count }) => {
            assert_eq!(name, "f");
            assert_eq!(count, 9);
        }
        other => panic!("expected TooManyParameters, got {:?}", other),
    }
}

#[test]
fn test_factorial_program_compiles() {
    let asm = compile(
        "int factorial(int n) {
             int result = 1;
             while (n > 1) {
                 result = result * n;
                 n = n - 1;
             }
             return result;
         }
         int main() {
             return factorial(10);
         }",
    );

    assert!(asm.contains("factorial:"));
    assert!(asm.contains("mul"));
    assert!(asm.contains("call factorial"));
}
