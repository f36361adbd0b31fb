//! RISC-V 32 code generation
//!
//! Walks a validated AST and emits RV32 assembly text. Each expression
//! helper returns the register holding its result; the register manager
//! hands out temps and the label generator keeps branch targets unique
//! across the whole compilation unit.
//!
//! Frame layout: `fp` points at the top of the frame, `ra` and the caller's
//! `fp` are saved at `fp-4` and `fp-8`, and parameter/local slots descend
//! from `fp-12` in declaration order. All locals of a function share the
//! frame; nothing shrinks when an inner block exits.

use crate::registers::{RegisterManager, TEMP_REGS};
use log::debug;
use thiserror::Error;
use toyc_common::{CompilerError, FunctionTable, LabelGenerator, ScopeStack, ValueType};
use toyc_frontend::ast::{
    BinaryOp, Block, CompilationUnit, Expr, FunctionDefinition, Stmt, UnaryOp,
};

/// Arguments passed in registers `a0..a7`
const MAX_REG_ARGS: usize = 8;

/// Internal failures of the code generator
///
/// The generator assumes a validated AST; these errors cover resource
/// limits and programming bugs, not user mistakes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodegenError {
    #[error("temporary register pool exhausted; expression too deep")]
    OutOfRegisters,

    #[error("call to '{name}' passes {count} arguments, at most 8 are supported")]
    TooManyArguments { name: String, count: usize },

    #[error("function '{name}' declares {count} parameters, at most 8 are supported")]
    TooManyParameters { name: String, count: usize },

    #[error("unresolved symbol '{name}' reached code generation")]
    UnresolvedSymbol { name: String },
}

impl From<CodegenError> for CompilerError {
    fn from(err: CodegenError) -> Self {
        CompilerError::codegen_error(err.to_string())
    }
}

/// RISC-V 32 code generator
pub struct RiscvCodeGenerator {
    output: String,
    labels: LabelGenerator,
    registers: RegisterManager,
    functions: FunctionTable,
    symbols: ScopeStack,
    current_frame_size: i32,
    next_slot_offset: i32,
    break_labels: Vec<String>,
    continue_labels: Vec<String>,
}

impl RiscvCodeGenerator {
    pub fn new() -> Self {
        Self {
            output: String::new(),
            labels: LabelGenerator::new(),
            registers: RegisterManager::new(),
            functions: FunctionTable::new(),
            symbols: ScopeStack::new(),
            current_frame_size: 0,
            next_slot_offset: 0,
            break_labels: Vec::new(),
            continue_labels: Vec::new(),
        }
    }

    /// Generate assembly for a whole compilation unit
    ///
    /// `functions` is the signature table built by the semantic analyzer.
    pub fn generate(
        &mut self,
        unit: &CompilationUnit,
        functions: FunctionTable,
    ) -> Result<String, CodegenError> {
        self.functions = functions;
        self.output.clear();

        self.emit(".text");
        self.emit(".globl main");
        self.emit_comment("ToyC Compiler Generated Code");

        for func in &unit.functions {
            self.gen_function(func)?;
        }

        Ok(std::mem::take(&mut self.output))
    }

    fn emit(&mut self, instruction: &str) {
        self.output.push_str("    ");
        self.output.push_str(instruction);
        self.output.push('\n');
    }

    fn emit_label(&mut self, label: &str) {
        self.output.push_str(label);
        self.output.push_str(":\n");
    }

    fn emit_comment(&mut self, comment: &str) {
        self.output.push_str("    # ");
        self.output.push_str(comment);
        self.output.push('\n');
    }

    fn allocate_temp(&mut self) -> Result<&'static str, CodegenError> {
        self.registers
            .allocate_temp()
            .ok_or(CodegenError::OutOfRegisters)
    }

    fn frame_offset_of(&self, name: &str) -> Result<i32, CodegenError> {
        self.symbols
            .lookup(name)
            .map(|symbol| symbol.frame_offset)
            .ok_or_else(|| CodegenError::UnresolvedSymbol {
                name: name.to_string(),
            })
    }

    /// Claim the next 4-byte frame slot
    fn take_slot(&mut self) -> i32 {
        let offset = self.next_slot_offset;
        self.next_slot_offset -= 4;
        offset
    }

    /// Load a 32-bit immediate into `reg`
    ///
    /// Small values fit a single `addi`; everything else splits into
    /// `lui` + `addi` with the low part sign-corrected into [-2048, 2047].
    fn load_immediate(&mut self, value: i32, reg: &str) {
        if (-2048..=2047).contains(&value) {
            self.emit(&format!("addi {}, zero, {}", reg, value));
        } else {
            let upper = value.wrapping_add(0x800) >> 12;
            let mut lower = value & 0xfff;
            if lower >= 2048 {
                lower -= 4096;
            }
            self.emit(&format!("lui {}, {}", reg, upper));
            if lower != 0 {
                self.emit(&format!("addi {}, {}, {}", reg, reg, lower));
            }
        }
    }

    fn gen_function(&mut self, func: &FunctionDefinition) -> Result<(), CodegenError> {
        debug!("generating code for function '{}'", func.name);

        if func.parameters.len() > MAX_REG_ARGS {
            return Err(CodegenError::TooManyParameters {
                name: func.name.clone(),
                count: func.parameters.len(),
            });
        }

        self.registers.reset();
        self.symbols = ScopeStack::new();
        self.break_labels.clear();
        self.continue_labels.clear();

        let slot_count = func.parameters.len() + count_locals(&func.body);
        self.current_frame_size = align_frame(8 + 4 * slot_count as i32);
        // slots start below the saved ra/fp pair at the frame top
        self.next_slot_offset = -12;

        self.emit_label(&func.name);
        self.emit_comment(&format!("Function: {}", func.name));
        self.emit(&format!("addi sp, sp, -{}", self.current_frame_size));
        self.emit(&format!("sw ra, {}(sp)", self.current_frame_size - 4));
        self.emit(&format!("sw fp, {}(sp)", self.current_frame_size - 8));
        self.emit(&format!("addi fp, sp, {}", self.current_frame_size));

        // spill incoming arguments so parameters are plain frame slots
        for (i, param) in func.parameters.iter().enumerate() {
            let offset = self.take_slot();
            self.symbols.declare_at(&param.name, param.ty, offset, true);
            self.emit(&format!("sw a{}, {}(fp)", i, offset));
        }

        self.gen_block(&func.body)?;

        // void functions may fall off the end without an explicit return
        if func.return_type == ValueType::Void {
            self.gen_epilogue();
        }

        self.output.push('\n');
        Ok(())
    }

    fn gen_epilogue(&mut self) {
        self.emit(&format!("lw ra, {}(sp)", self.current_frame_size - 4));
        self.emit(&format!("lw fp, {}(sp)", self.current_frame_size - 8));
        self.emit(&format!("addi sp, sp, {}", self.current_frame_size));
        self.emit("jr ra");
    }

    fn gen_block(&mut self, block: &Block) -> Result<(), CodegenError> {
        self.symbols.enter_scope();
        for stmt in &block.statements {
            self.gen_stmt(stmt)?;
        }
        self.symbols.exit_scope();
        Ok(())
    }

    fn gen_stmt(&mut self, stmt: &Stmt) -> Result<(), CodegenError> {
        match stmt {
            Stmt::VarDecl { name, init } => {
                // evaluate before declaring so the initializer cannot read
                // the slot it initializes
                let value_reg = match init {
                    Some(init) => Some(self.gen_expr(init)?),
                    None => None,
                };
                let offset = self.take_slot();
                self.symbols.declare_at(name, ValueType::Int, offset, false);
                if let Some(reg) = value_reg {
                    self.emit(&format!("sw {}, {}(fp)", reg, offset));
                    self.registers.release(reg);
                }
                Ok(())
            }

            Stmt::Assign { name, value } => {
                let reg = self.gen_expr(value)?;
                let offset = self.frame_offset_of(name)?;
                self.emit(&format!("sw {}, {}(fp)", reg, offset));
                self.registers.release(reg);
                Ok(())
            }

            Stmt::Block(block) => self.gen_block(block),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let else_label = self.labels.next("if_else");
                let end_label = self.labels.next("if_end");

                let cond_reg = self.gen_expr(condition)?;
                let target = if else_branch.is_some() {
                    &else_label
                } else {
                    &end_label
                };
                self.emit(&format!("beqz {}, {}", cond_reg, target));
                self.registers.release(cond_reg);

                self.gen_stmt(then_branch)?;

                if let Some(else_branch) = else_branch {
                    self.emit(&format!("j {}", end_label));
                    self.emit_label(&else_label);
                    self.gen_stmt(else_branch)?;
                }

                self.emit_label(&end_label);
                Ok(())
            }

            Stmt::While { condition, body } => {
                let loop_label = self.labels.next("while_loop");
                let end_label = self.labels.next("while_end");

                self.break_labels.push(end_label.clone());
                self.continue_labels.push(loop_label.clone());

                self.emit_label(&loop_label);
                let cond_reg = self.gen_expr(condition)?;
                self.emit(&format!("beqz {}, {}", cond_reg, end_label));
                self.registers.release(cond_reg);

                self.gen_stmt(body)?;

                self.emit(&format!("j {}", loop_label));
                self.emit_label(&end_label);

                self.break_labels.pop();
                self.continue_labels.pop();
                Ok(())
            }

            Stmt::Break => {
                // the analyzer rejects break outside a loop; an empty stack
                // here emits nothing
                if let Some(label) = self.break_labels.last().cloned() {
                    self.emit(&format!("j {}", label));
                }
                Ok(())
            }

            Stmt::Continue => {
                if let Some(label) = self.continue_labels.last().cloned() {
                    self.emit(&format!("j {}", label));
                }
                Ok(())
            }

            Stmt::Return(value) => {
                if let Some(value) = value {
                    let reg = self.gen_expr(value)?;
                    self.emit(&format!("mv a0, {}", reg));
                    self.registers.release(reg);
                }
                self.gen_epilogue();
                Ok(())
            }

            Stmt::Expr(expr) => {
                self.gen_expr(expr)?;
                self.registers.release_all_temp();
                Ok(())
            }
        }
    }

    /// Lower an expression; the returned register holds the result and is
    /// owned by the caller until released
    fn gen_expr(&mut self, expr: &Expr) -> Result<&'static str, CodegenError> {
        match expr {
            Expr::Number(value) => {
                let reg = self.allocate_temp()?;
                self.load_immediate(*value, reg);
                Ok(reg)
            }

            Expr::Ident(name) => {
                let offset = self.frame_offset_of(name)?;
                let reg = self.allocate_temp()?;
                self.emit(&format!("lw {}, {}(fp)", reg, offset));
                Ok(reg)
            }

            Expr::Unary { op, operand } => {
                let operand_reg = self.gen_expr(operand)?;
                let result = self.allocate_temp()?;
                match op {
                    UnaryOp::Plus => self.emit(&format!("mv {}, {}", result, operand_reg)),
                    UnaryOp::Minus => {
                        self.emit(&format!("sub {}, zero, {}", result, operand_reg))
                    }
                    UnaryOp::Not => self.emit(&format!("seqz {}, {}", result, operand_reg)),
                }
                self.registers.release(operand_reg);
                Ok(result)
            }

            Expr::Binary {
                op: BinaryOp::And,
                left,
                right,
            } => self.gen_logical_and(left, right),

            Expr::Binary {
                op: BinaryOp::Or,
                left,
                right,
            } => self.gen_logical_or(left, right),

            Expr::Binary { op, left, right } => {
                let left_reg = self.gen_expr(left)?;
                let right_reg = self.gen_expr(right)?;
                let result = self.allocate_temp()?;

                match op {
                    BinaryOp::Add => {
                        self.emit(&format!("add {}, {}, {}", result, left_reg, right_reg))
                    }
                    BinaryOp::Sub => {
                        self.emit(&format!("sub {}, {}, {}", result, left_reg, right_reg))
                    }
                    BinaryOp::Mul => {
                        self.emit(&format!("mul {}, {}, {}", result, left_reg, right_reg))
                    }
                    BinaryOp::Div => {
                        self.emit(&format!("div {}, {}, {}", result, left_reg, right_reg))
                    }
                    BinaryOp::Mod => {
                        self.emit(&format!("rem {}, {}, {}", result, left_reg, right_reg))
                    }
                    BinaryOp::Lt => {
                        self.emit(&format!("slt {}, {}, {}", result, left_reg, right_reg))
                    }
                    BinaryOp::Le => {
                        self.emit(&format!("slt {}, {}, {}", result, right_reg, left_reg));
                        self.emit(&format!("xori {}, {}, 1", result, result));
                    }
                    BinaryOp::Gt => {
                        self.emit(&format!("slt {}, {}, {}", result, right_reg, left_reg))
                    }
                    BinaryOp::Ge => {
                        self.emit(&format!("slt {}, {}, {}", result, left_reg, right_reg));
                        self.emit(&format!("xori {}, {}, 1", result, result));
                    }
                    BinaryOp::Eq => {
                        self.emit(&format!("sub {}, {}, {}", result, left_reg, right_reg));
                        self.emit(&format!("seqz {}, {}", result, result));
                    }
                    BinaryOp::Ne => {
                        self.emit(&format!("sub {}, {}, {}", result, left_reg, right_reg));
                        self.emit(&format!("snez {}, {}", result, result));
                    }
                    BinaryOp::And | BinaryOp::Or => {
                        unreachable!("logical operators use the short-circuit lowering")
                    }
                }

                self.registers.release(left_reg);
                self.registers.release(right_reg);
                Ok(result)
            }

            Expr::Call {
                name,
                arguments,
                return_type,
            } => self.gen_call(name, arguments, *return_type),
        }
    }

    /// Short-circuit `&&`: the right operand is skipped when the left is zero
    fn gen_logical_and(&mut self, left: &Expr, right: &Expr) -> Result<&'static str, CodegenError> {
        let false_label = self.labels.next("and_false");
        let end_label = self.labels.next("and_end");

        let left_reg = self.gen_expr(left)?;
        self.emit(&format!("beqz {}, {}", left_reg, false_label));
        self.registers.release(left_reg);

        let right_reg = self.gen_expr(right)?;
        self.emit(&format!("beqz {}, {}", right_reg, false_label));
        self.registers.release(right_reg);

        let result = self.allocate_temp()?;
        self.load_immediate(1, result);
        self.emit(&format!("j {}", end_label));
        self.emit_label(&false_label);
        self.load_immediate(0, result);
        self.emit_label(&end_label);
        Ok(result)
    }

    /// Short-circuit `||`: the right operand is skipped when the left is nonzero
    fn gen_logical_or(&mut self, left: &Expr, right: &Expr) -> Result<&'static str, CodegenError> {
        let true_label = self.labels.next("or_true");
        let end_label = self.labels.next("or_end");

        let left_reg = self.gen_expr(left)?;
        self.emit(&format!("bnez {}, {}", left_reg, true_label));
        self.registers.release(left_reg);

        let right_reg = self.gen_expr(right)?;
        self.emit(&format!("bnez {}, {}", right_reg, true_label));
        self.registers.release(right_reg);

        let result = self.allocate_temp()?;
        self.load_immediate(0, result);
        self.emit(&format!("j {}", end_label));
        self.emit_label(&true_label);
        self.load_immediate(1, result);
        self.emit_label(&end_label);
        Ok(result)
    }

    fn gen_call(
        &mut self,
        name: &str,
        arguments: &[Expr],
        return_type: Option<ValueType>,
    ) -> Result<&'static str, CodegenError> {
        if arguments.len() > MAX_REG_ARGS {
            return Err(CodegenError::TooManyArguments {
                name: name.to_string(),
                count: arguments.len(),
            });
        }

        // save all caller-saved registers around the call
        for reg in TEMP_REGS {
            self.emit("addi sp, sp, -4");
            self.emit(&format!("sw {}, 0(sp)", reg));
        }

        for (i, arg) in arguments.iter().enumerate() {
            let reg = self.gen_expr(arg)?;
            self.emit(&format!("mv a{}, {}", i, reg));
            self.registers.release(reg);
        }

        self.emit(&format!("call {}", name));

        for reg in TEMP_REGS.iter().rev() {
            self.emit(&format!("lw {}, 0(sp)", reg));
            self.emit("addi sp, sp, 4");
        }

        // the analyzer resolved every callee into the function table; the
        // annotation on the call node must agree with it
        let callee_return_type = self
            .functions
            .get(name)
            .map(|info| info.return_type)
            .ok_or_else(|| CodegenError::UnresolvedSymbol {
                name: name.to_string(),
            })?;
        debug_assert_eq!(return_type, Some(callee_return_type));

        let result = self.allocate_temp()?;
        if callee_return_type == ValueType::Int {
            self.emit(&format!("mv {}, a0", result));
        }
        Ok(result)
    }
}

impl Default for RiscvCodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn align_frame(bytes: i32) -> i32 {
    (bytes + 7) & !7
}

/// Count every local declaration in the function body, including those in
/// nested blocks and in if/while bodies; they all share the frame
fn count_locals(block: &Block) -> usize {
    block.statements.iter().map(count_locals_in_stmt).sum()
}

fn count_locals_in_stmt(stmt: &Stmt) -> usize {
    match stmt {
        Stmt::VarDecl { .. } => 1,
        Stmt::Block(block) => count_locals(block),
        Stmt::If {
            then_branch,
            else_branch,
            ..
        } => {
            count_locals_in_stmt(then_branch)
                + else_branch
                    .as_deref()
                    .map(count_locals_in_stmt)
                    .unwrap_or(0)
        }
        Stmt::While { body, .. } => count_locals_in_stmt(body),
        _ => 0,
    }
}
