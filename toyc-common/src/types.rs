//! Common types used throughout the compiler
//!
//! This module defines the data shared between the semantic analyzer and the
//! code generator: value types, symbols, the function table, the lexically
//! scoped symbol stack, and the branch-label generator.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The two value types of the ToyC language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Int,
    Void,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Int => write!(f, "int"),
            ValueType::Void => write!(f, "void"),
        }
    }
}

/// A named slot in a function's stack frame
///
/// For locals `frame_offset` is negative (below the frame pointer). The
/// analyzer records parameters with offset 0; the code generator re-offsets
/// them when it spills the argument registers into the frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub ty: ValueType,
    pub frame_offset: i32,
    pub is_parameter: bool,
}

/// Signature of a top-level function, indexed by name in the function table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionInfo {
    pub name: String,
    pub return_type: ValueType,
    pub param_types: Vec<ValueType>,
    pub defined: bool,
}

impl FunctionInfo {
    pub fn new(name: String, return_type: ValueType, param_types: Vec<ValueType>) -> Self {
        Self {
            name,
            return_type,
            param_types,
            defined: true,
        }
    }
}

/// Global table of function signatures, built by the analyzer and handed
/// to the code generator by value
pub type FunctionTable = HashMap<String, FunctionInfo>;

/// Stack of lexical scopes with innermost-first lookup
///
/// The bottom scope is the function's top scope. Frame offsets for locals
/// come from a per-function counter that decrements by 4 per declaration.
#[derive(Debug, Clone)]
pub struct ScopeStack {
    scopes: Vec<HashMap<String, Symbol>>,
    current_offset: i32,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
            current_offset: 0,
        }
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Pop the innermost scope; exiting the outermost is a no-op
    pub fn exit_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Declare a name in the innermost scope, assigning a frame offset from
    /// the scope stack's counter. Returns `false` if the name already exists
    /// in the innermost scope.
    pub fn declare(&mut self, name: &str, ty: ValueType, is_parameter: bool) -> bool {
        match self.scopes.last_mut() {
            Some(scope) if scope.contains_key(name) => false,
            Some(scope) => {
                let offset = if is_parameter {
                    self.current_offset
                } else {
                    self.current_offset - 4
                };
                scope.insert(
                    name.to_string(),
                    Symbol {
                        name: name.to_string(),
                        ty,
                        frame_offset: offset,
                        is_parameter,
                    },
                );
                if !is_parameter {
                    self.current_offset -= 4;
                }
                true
            }
            None => false,
        }
    }

    /// Declare a name with an offset chosen by the caller
    ///
    /// Used by the code generator, whose frame layout assigns slots itself.
    /// Same-scope duplicates have already been rejected by the analyzer, so
    /// this overwrites unconditionally.
    pub fn declare_at(&mut self, name: &str, ty: ValueType, frame_offset: i32, is_parameter: bool) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(
                name.to_string(),
                Symbol {
                    name: name.to_string(),
                    ty,
                    frame_offset,
                    is_parameter,
                },
            );
        }
    }

    /// Look a name up, searching from the innermost scope outward
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Reset the offset counter at function entry
    pub fn reset_offset(&mut self) {
        self.current_offset = 0;
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

/// Monotonic label supply for code generation
///
/// Yields labels of the form `<prefix><n>`; the counter is shared across all
/// prefixes so no label is ever emitted twice in a compilation unit.
#[derive(Debug, Clone, Default)]
pub struct LabelGenerator {
    next_id: u32,
}

impl LabelGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self, prefix: &str) -> String {
        let label = format!("{}{}", prefix, self.next_id);
        self.next_id += 1;
        label
    }
}
