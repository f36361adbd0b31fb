//! Abstract Syntax Tree definitions for ToyC
//!
//! The AST is a pure tree with single ownership from `CompilationUnit`
//! downward. The analyzer and the code generator traverse it with
//! exhaustive pattern matches over the statement and expression variants.

use serde::{Deserialize, Serialize};
use std::fmt;
use toyc_common::ValueType;

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // Comparison
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,

    // Logical
    And,
    Or,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op_str = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        };
        write!(f, "{}", op_str)
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op_str = match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Not => "!",
        };
        write!(f, "{}", op_str)
    }
}

/// Expression nodes
///
/// Every expression produces an `int` except a call whose callee returns
/// `void`; the call's resolved return type is filled in by the analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Integer literal
    Number(i32),

    /// Variable reference
    Ident(String),

    /// Unary operation
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// Binary operation
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Function call
    Call {
        name: String,
        arguments: Vec<Expr>,
        /// Resolved during semantic analysis
        return_type: Option<ValueType>,
    },
}

/// Statement nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// Local variable declaration with optional initializer
    VarDecl { name: String, init: Option<Expr> },

    /// Assignment to a named variable
    Assign { name: String, value: Expr },

    /// Nested block scope
    Block(Block),

    /// If statement with optional else branch
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// While loop
    While { condition: Expr, body: Box<Stmt> },

    Break,

    Continue,

    /// Return with optional value
    Return(Option<Expr>),

    /// Expression evaluated for effect, result discarded
    Expr(Expr),
}

/// An ordered sequence of statements forming one lexical scope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

/// Function parameter (always `int` in ToyC)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub ty: ValueType,
}

/// Top-level function definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub return_type: ValueType,
    pub parameters: Vec<Parameter>,
    pub body: Block,
}

/// The root of the AST: an ordered sequence of function definitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilationUnit {
    pub functions: Vec<FunctionDefinition>,
}

// The Display impls below render the indented tree dump behind the
// driver's --ast flag.

fn indent(f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    write!(f, "{}", "  ".repeat(depth))
}

fn fmt_expr(expr: &Expr, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    indent(f, depth)?;
    match expr {
        Expr::Number(value) => writeln!(f, "Number {}", value),
        Expr::Ident(name) => writeln!(f, "Ident {}", name),
        Expr::Unary { op, operand } => {
            writeln!(f, "Unary {}", op)?;
            fmt_expr(operand, f, depth + 1)
        }
        Expr::Binary { op, left, right } => {
            writeln!(f, "Binary {}", op)?;
            fmt_expr(left, f, depth + 1)?;
            fmt_expr(right, f, depth + 1)
        }
        Expr::Call { name, arguments, .. } => {
            writeln!(f, "Call {}", name)?;
            for arg in arguments {
                fmt_expr(arg, f, depth + 1)?;
            }
            Ok(())
        }
    }
}

fn fmt_stmt(stmt: &Stmt, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    match stmt {
        Stmt::VarDecl { name, init } => {
            indent(f, depth)?;
            writeln!(f, "VarDecl {}", name)?;
            if let Some(init) = init {
                fmt_expr(init, f, depth + 1)?;
            }
            Ok(())
        }
        Stmt::Assign { name, value } => {
            indent(f, depth)?;
            writeln!(f, "Assign {}", name)?;
            fmt_expr(value, f, depth + 1)
        }
        Stmt::Block(block) => fmt_block(block, f, depth),
        Stmt::If {
            condition,
            then_branch,
            else_branch,
        } => {
            indent(f, depth)?;
            writeln!(f, "If")?;
            fmt_expr(condition, f, depth + 1)?;
            fmt_stmt(then_branch, f, depth + 1)?;
            if let Some(else_branch) = else_branch {
                indent(f, depth)?;
                writeln!(f, "Else")?;
                fmt_stmt(else_branch, f, depth + 1)?;
            }
            Ok(())
        }
        Stmt::While { condition, body } => {
            indent(f, depth)?;
            writeln!(f, "While")?;
            fmt_expr(condition, f, depth + 1)?;
            fmt_stmt(body, f, depth + 1)
        }
        Stmt::Break => {
            indent(f, depth)?;
            writeln!(f, "Break")
        }
        Stmt::Continue => {
            indent(f, depth)?;
            writeln!(f, "Continue")
        }
        Stmt::Return(value) => {
            indent(f, depth)?;
            writeln!(f, "Return")?;
            if let Some(value) = value {
                fmt_expr(value, f, depth + 1)?;
            }
            Ok(())
        }
        Stmt::Expr(expr) => {
            indent(f, depth)?;
            writeln!(f, "ExprStmt")?;
            fmt_expr(expr, f, depth + 1)
        }
    }
}

fn fmt_block(block: &Block, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    indent(f, depth)?;
    writeln!(f, "Block")?;
    for stmt in &block.statements {
        fmt_stmt(stmt, f, depth + 1)?;
    }
    Ok(())
}

impl fmt::Display for CompilationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CompilationUnit")?;
        for func in &self.functions {
            indent(f, 1)?;
            write!(f, "Function {} {}(", func.return_type, func.name)?;
            for (i, param) in func.parameters.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{} {}", param.ty, param.name)?;
            }
            writeln!(f, ")")?;
            fmt_block(&func.body, f, 2)?;
        }
        Ok(())
    }
}
