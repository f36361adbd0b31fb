//! Semantic Analysis for ToyC
//!
//! Validates scope and function usage over the AST and builds the function
//! signature table the code generator consumes. Two passes: declaration
//! collection (plus the `main` signature check), then body analysis. Every
//! error is accumulated; analysis is never aborted by the first one.

use crate::ast::*;
use toyc_common::{Diagnostic, ErrorReporter, FunctionInfo, FunctionTable, ScopeStack, ValueType};

/// ToyC semantic analyzer
pub struct SemanticAnalyzer {
    scope: ScopeStack,
    functions: FunctionTable,
    reporter: ErrorReporter,
    current_function: Option<String>,
    loop_depth: u32,
    has_return: bool,
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        Self {
            scope: ScopeStack::new(),
            functions: FunctionTable::new(),
            reporter: ErrorReporter::new(),
            current_function: None,
            loop_depth: 0,
            has_return: false,
        }
    }

    /// Analyze a compilation unit; returns `true` iff no errors were found
    ///
    /// Annotates `Call` nodes with their resolved return types as a side
    /// effect, which is why the unit is taken mutably.
    pub fn analyze(&mut self, unit: &mut CompilationUnit) -> bool {
        self.reporter.clear();
        self.functions.clear();

        // Pass A: collect function declarations; on a name collision the
        // first definition wins
        for func in &unit.functions {
            if self.functions.contains_key(&func.name) {
                self.reporter
                    .error(format!("Function '{}' is already declared", func.name));
                continue;
            }
            let param_types = func.parameters.iter().map(|p| p.ty).collect();
            self.functions.insert(
                func.name.clone(),
                FunctionInfo::new(func.name.clone(), func.return_type, param_types),
            );
        }

        if !self.main_is_well_formed() {
            self.reporter
                .error("Missing main function with signature: int main()".to_string());
        }

        // Pass B: analyze function bodies
        for func in &mut unit.functions {
            self.analyze_function(func);
        }

        !self.reporter.has_errors()
    }

    /// All accumulated errors, in reporting order
    pub fn errors(&self) -> &[Diagnostic] {
        self.reporter.diagnostics()
    }

    pub fn summary(&self) -> String {
        self.reporter.summary()
    }

    /// The function signature table, passed by value to the code generator
    pub fn function_table(&self) -> FunctionTable {
        self.functions.clone()
    }

    fn main_is_well_formed(&self) -> bool {
        self.functions
            .get("main")
            .map(|main| main.return_type == ValueType::Int && main.param_types.is_empty())
            .unwrap_or(false)
    }

    fn analyze_function(&mut self, func: &mut FunctionDefinition) {
        self.current_function = Some(func.name.clone());
        self.has_return = false;

        self.scope.enter_scope();
        self.scope.reset_offset();

        for param in &func.parameters {
            if !self.scope.declare(&param.name, param.ty, true) {
                self.reporter
                    .error(format!("Parameter '{}' is already declared", param.name));
            }
        }

        self.analyze_block(&mut func.body);

        if func.return_type == ValueType::Int && !self.has_return {
            self.reporter
                .error(format!("Function '{}' must return a value", func.name));
        }

        self.scope.exit_scope();
        self.current_function = None;
    }

    fn analyze_block(&mut self, block: &mut Block) {
        self.scope.enter_scope();
        for stmt in &mut block.statements {
            self.analyze_stmt(stmt);
        }
        self.scope.exit_scope();
    }

    fn analyze_stmt(&mut self, stmt: &mut Stmt) {
        match stmt {
            Stmt::VarDecl { name, init } => {
                // The initializer is resolved before the name is declared,
                // so `int x = x;` refers to an enclosing `x` or is an error
                if let Some(init) = init {
                    self.analyze_expr(init);
                }
                if !self.scope.declare(name, ValueType::Int, false) {
                    self.reporter.error(format!(
                        "Variable '{}' is already declared in this scope",
                        name
                    ));
                }
            }

            Stmt::Assign { name, value } => {
                if self.scope.lookup(name).is_none() {
                    self.reporter
                        .error(format!("Undefined variable '{}'", name));
                    return;
                }
                self.analyze_expr(value);
            }

            Stmt::Block(block) => self.analyze_block(block),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.analyze_expr(condition);
                self.analyze_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.analyze_stmt(else_branch);
                }
            }

            Stmt::While { condition, body } => {
                self.analyze_expr(condition);
                self.loop_depth += 1;
                self.analyze_stmt(body);
                self.loop_depth -= 1;
            }

            Stmt::Break => {
                if self.loop_depth == 0 {
                    self.reporter
                        .error("break statement not within a loop".to_string());
                }
            }

            Stmt::Continue => {
                if self.loop_depth == 0 {
                    self.reporter
                        .error("continue statement not within a loop".to_string());
                }
            }

            Stmt::Return(value) => {
                self.has_return = true;

                let return_type = self
                    .current_function
                    .as_ref()
                    .and_then(|name| self.functions.get(name))
                    .map(|info| info.return_type);

                match (return_type, value.is_some()) {
                    (Some(ValueType::Void), true) => {
                        self.reporter
                            .error("void function should not return a value".to_string());
                    }
                    (Some(ValueType::Int), false) => {
                        self.reporter
                            .error("non-void function must return a value".to_string());
                    }
                    _ => {}
                }

                if let Some(value) = value {
                    self.analyze_expr(value);
                }
            }

            Stmt::Expr(expr) => self.analyze_expr(expr),
        }
    }

    fn analyze_expr(&mut self, expr: &mut Expr) {
        match expr {
            Expr::Number(_) => {}

            Expr::Ident(name) => {
                if self.scope.lookup(name).is_none() {
                    self.reporter
                        .error(format!("Undefined variable '{}'", name));
                }
            }

            Expr::Unary { operand, .. } => self.analyze_expr(operand),

            Expr::Binary { left, right, .. } => {
                self.analyze_expr(left);
                self.analyze_expr(right);
            }

            Expr::Call {
                name,
                arguments,
                return_type,
            } => {
                let info = match self.functions.get(name) {
                    Some(info) => info.clone(),
                    None => {
                        self.reporter
                            .error(format!("Undefined function '{}'", name));
                        return;
                    }
                };

                if arguments.len() != info.param_types.len() {
                    self.reporter.error(format!(
                        "Function '{}' expects {} arguments, got {}",
                        name,
                        info.param_types.len(),
                        arguments.len()
                    ));
                    return;
                }

                for arg in arguments {
                    self.analyze_expr(arg);
                }

                *return_type = Some(info.return_type);
            }
        }
    }
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
