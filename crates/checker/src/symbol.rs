/// Scope-aware symbol table used while checking.
///
/// Scope 0 holds script-level globals. Entering a function opens a boundary:
/// lookups inside the function walk its own scopes, then jump straight to the
/// globals and never see another function's locals.

use ferris_language::Type;
use std::collections::HashMap;

/// A single symbol entry in the table.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub ty: Type,
    pub mutable: bool,
    pub scope_depth: usize,
}

#[derive(Debug)]
pub struct SymbolTable {
    /// Stack of scopes; each scope maps name -> Symbol.
    scopes: Vec<HashMap<String, Symbol>>,
    /// Index of the first scope belonging to the current function.
    function_base: Option<usize>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()], // global scope
            function_base: None,
        }
    }

    pub fn enter_function(&mut self) {
        self.function_base = Some(self.scopes.len());
        self.scopes.push(HashMap::new());
    }

    pub fn exit_function(&mut self) {
        if let Some(base) = self.function_base.take() {
            self.scopes.truncate(base);
        }
    }

    /// Enter a nested block scope.
    pub fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Exit the current block scope. The global scope is never popped.
    pub fn exit_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Current scope depth (0 = global).
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    /// Define a symbol in the current scope, shadowing any earlier one.
    pub fn define(&mut self, name: &str, ty: Type, mutable: bool) {
        let depth = self.depth();
        let sym = Symbol { name: name.to_string(), ty, mutable, scope_depth: depth };
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), sym);
        }
    }

    /// Resolve a name from the innermost scope outwards, stopping at the
    /// function boundary and then falling back to globals.
    pub fn resolve(&self, name: &str) -> Option<&Symbol> {
        let base = self.function_base.unwrap_or(0);
        self.scopes[base..]
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .or_else(|| self.global(name))
    }

    pub fn global(&self, name: &str) -> Option<&Symbol> {
        self.scopes[0].get(name)
    }

    pub fn in_function(&self) -> bool {
        self.function_base.is_some()
    }
}
