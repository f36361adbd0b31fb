//! ToyC Compiler - Code Generation Backend
//!
//! This crate handles the final phase of compilation: generating RISC-V 32
//! assembly from the validated AST. It includes:
//!
//! - The register manager (temp/saved free lists)
//! - Frame layout and calling-convention handling
//! - Expression and control-flow lowering

pub mod registers;
pub mod riscv;

pub use registers::{RegisterManager, SAVED_REGS, TEMP_REGS};
pub use riscv::{CodegenError, RiscvCodeGenerator};

use toyc_common::FunctionTable;
use toyc_frontend::ast::CompilationUnit;

/// Main entry point for code generation
pub fn generate_assembly(
    unit: &CompilationUnit,
    functions: FunctionTable,
) -> Result<String, CodegenError> {
    let mut generator = RiscvCodeGenerator::new();
    generator.generate(unit, functions)
}
