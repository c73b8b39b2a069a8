//! Scoped name table and type registry (`spec.md` §3, §9 "Symbol tables").

use rustc_hash::FxHashMap;
use std::rc::Rc;

use crate::checker::types::{Primitive, RecordDef, TypeSymbol};
use crate::diagnostics::{Category, Diagnostics, Span};
use crate::parser::interner::{Interner, Symbol};

#[derive(Debug, Clone, PartialEq)]
pub struct VariableSymbol {
    pub name: Symbol,
    pub ty: TypeSymbol,
    pub mutable: bool,
    pub scope_depth: usize,
}

/// Stack of maps; insertion allowed only in the top frame, lookup walks
/// outward (`spec.md` §3, §9).
#[derive(Default)]
pub struct SymbolTable {
    scopes: Vec<FxHashMap<Symbol, VariableSymbol>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self { scopes: vec![FxHashMap::default()] }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
        assert!(!self.scopes.is_empty(), "popped the top-level scope");
    }

    /// Declares `name` in the current (top) frame. Returns `false` (and emits
    /// no diagnostic itself — the caller has the span) if the name is already
    /// declared in that same frame.
    pub fn declare(&mut self, name: Symbol, ty: TypeSymbol, mutable: bool) -> bool {
        let depth = self.scopes.len();
        let top = self.scopes.last_mut().unwrap();
        if top.contains_key(&name) {
            return false;
        }
        top.insert(name, VariableSymbol { name, ty, mutable, scope_depth: depth });
        true
    }

    pub fn lookup(&self, name: Symbol) -> Option<&VariableSymbol> {
        self.scopes.iter().rev().find_map(|scope| scope.get(&name))
    }

    pub fn is_declared_in_current_scope(&self, name: Symbol) -> bool {
        self.scopes.last().map_or(false, |s| s.contains_key(&name))
    }
}

/// Globally visible user types and built-in primitives (`spec.md` §9).
#[derive(Default)]
pub struct TypeRegistry {
    records: FxHashMap<String, Rc<RecordDef>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, qualified_name: String, def: Rc<RecordDef>) -> bool {
        if self.records.contains_key(&qualified_name) {
            return false;
        }
        self.records.insert(qualified_name, def);
        true
    }

    pub fn lookup_qualified(&self, qualified_name: &str) -> Option<&Rc<RecordDef>> {
        self.records.get(qualified_name)
    }

    /// Resolves a bare name to a user type, trying successive longest-prefix
    /// module qualifications first (`spec.md` §9 "variable prefix" helper),
    /// then falling back to the unqualified name.
    pub fn resolve(&self, module_path: &[String], name: &str) -> Option<&Rc<RecordDef>> {
        for depth in (0..=module_path.len()).rev() {
            let qualified = if depth == 0 {
                name.to_string()
            } else {
                format!("{}.{}", module_path[..depth].join("."), name)
            };
            if let Some(def) = self.records.get(&qualified) {
                return Some(def);
            }
        }
        None
    }

    pub fn primitive(&self, interner: &Interner, name: &str) -> Option<TypeSymbol> {
        let _ = interner;
        match name {
            "int" => Some(TypeSymbol::Primitive(Primitive::Int)),
            "float" => Some(TypeSymbol::Primitive(Primitive::Float)),
            "bool" => Some(TypeSymbol::Primitive(Primitive::Bool)),
            "char" => Some(TypeSymbol::Primitive(Primitive::Char)),
            "string" => Some(TypeSymbol::Primitive(Primitive::String)),
            "void" => Some(TypeSymbol::Primitive(Primitive::Void)),
            _ => None,
        }
    }
}

/// Emits the duplicate-in-top-frame diagnostic the way every call site needs
/// it phrased (`spec.md` §7 "duplicate field/variant" reuses the same wording
/// for duplicate locals).
pub fn report_duplicate(diagnostics: &mut Diagnostics, category: Category, span: Span, name: &str) {
    diagnostics.error(category, span, format!("duplicate declaration of '{name}' in this scope"));
}
