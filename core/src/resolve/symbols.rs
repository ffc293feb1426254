//! Name resolution for the compiler.
//!
//! Scopes live in one arena owned by [`SymbolTable`]; each record links to
//! its enclosing scope by index. Resolving a name that belongs to an
//! enclosing function scope records it as a free variable of every scope in
//! between, so closures capture it transitively.

use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolScope {
    Global,
    Local,
    Free,
    Builtin,
    /// The enclosing function itself, bound by name inside its own body.
    Function,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub scope: SymbolScope,
    pub index: usize,
}

impl Symbol {
    fn new(name: &str, scope: SymbolScope, index: usize) -> Self {
        Self {
            name: name.to_string(),
            scope,
            index,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct ScopeRecord {
    store: FxHashMap<String, Symbol>,
    outer: Option<usize>,
    num_definitions: usize,
    /// Originals of captured symbols, in capture order. Position `i` is the
    /// index of the matching `Free` symbol in `store`.
    free_symbols: Vec<Symbol>,
}

#[derive(Debug, Clone)]
pub struct SymbolTable {
    scopes: Vec<ScopeRecord>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// A table holding only the global scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![ScopeRecord::default()],
        }
    }

    fn current(&self) -> usize {
        self.scopes.len() - 1
    }

    /// Number of open scopes, the global one included.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_global(&self) -> bool {
        self.scopes.len() == 1
    }

    /// Opens a scope enclosed by the current one.
    pub fn push_scope(&mut self) {
        let outer = self.current();
        self.scopes.push(ScopeRecord {
            outer: Some(outer),
            ..ScopeRecord::default()
        });
    }

    /// Closes the innermost scope and hands back the symbols it captured.
    /// The global scope is never popped.
    pub fn pop_scope(&mut self) -> Vec<Symbol> {
        if self.is_global() {
            return Vec::new();
        }
        self.scopes.pop().map(|s| s.free_symbols).unwrap_or_default()
    }

    /// Definitions made in the current scope, excluding builtins, free
    /// captures and the function's own name.
    pub fn num_definitions(&self) -> usize {
        self.scopes[self.current()].num_definitions
    }

    pub fn free_symbols(&self) -> &[Symbol] {
        &self.scopes[self.current()].free_symbols
    }

    pub fn define(&mut self, name: &str) -> Symbol {
        let cur = self.current();
        let record = &mut self.scopes[cur];
        let scope = if record.outer.is_none() {
            SymbolScope::Global
        } else {
            SymbolScope::Local
        };
        let symbol = Symbol::new(name, scope, record.num_definitions);
        record.store.insert(name.to_string(), symbol.clone());
        record.num_definitions += 1;
        symbol
    }

    pub fn define_builtin(&mut self, index: usize, name: &str) -> Symbol {
        let cur = self.current();
        let symbol = Symbol::new(name, SymbolScope::Builtin, index);
        self.scopes[cur].store.insert(name.to_string(), symbol.clone());
        symbol
    }

    pub fn define_function_name(&mut self, name: &str) -> Symbol {
        let cur = self.current();
        let symbol = Symbol::new(name, SymbolScope::Function, 0);
        self.scopes[cur].store.insert(name.to_string(), symbol.clone());
        symbol
    }

    pub fn resolve(&mut self, name: &str) -> Option<Symbol> {
        self.resolve_in(self.current(), name)
    }

    fn resolve_in(&mut self, scope: usize, name: &str) -> Option<Symbol> {
        if let Some(symbol) = self.scopes[scope].store.get(name) {
            return Some(symbol.clone());
        }
        let outer = self.scopes[scope].outer?;
        let symbol = self.resolve_in(outer, name)?;
        match symbol.scope {
            SymbolScope::Global | SymbolScope::Builtin => Some(symbol),
            _ => Some(self.define_free(scope, symbol)),
        }
    }

    fn define_free(&mut self, scope: usize, original: Symbol) -> Symbol {
        let record = &mut self.scopes[scope];
        let symbol = Symbol::new(&original.name, SymbolScope::Free, record.free_symbols.len());
        record.free_symbols.push(original);
        record.store.insert(symbol.name.clone(), symbol.clone());
        symbol
    }
}
