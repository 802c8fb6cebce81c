//! `CheckerContext`: the state bundle threaded through checking.
//!
//! Diagnostics accumulate; the checker never aborts on a user error within
//! a function pass. Scopes form a stack of name -> binding maps; narrowing
//! temporarily overrides a binding's observed type without losing the
//! declared type.

use rustc_hash::FxHashMap;
use tracing::debug;
use tsr_common::diagnostics::{format_message, Diagnostic};
use tsr_common::Span;
use tsr_types::{ClassId, TypeId, TypeInterner};

#[derive(Clone, Debug)]
pub struct VarBinding {
    /// The annotation-or-inference type the name was declared with.
    pub declared: TypeId,
    /// The current flow-narrowed type.
    pub narrowed: TypeId,
    pub is_const: bool,
}

pub struct CheckerContext<'a> {
    pub db: &'a TypeInterner,
    pub file: String,
    diagnostics: Vec<Diagnostic>,
    scopes: Vec<FxHashMap<String, VarBinding>>,
    /// Class name -> interned class id, for annotation and `new` resolution.
    pub classes: FxHashMap<String, ClassId>,
    /// Type parameters currently in scope, innermost last.
    pub type_param_scopes: Vec<FxHashMap<String, TypeId>>,
    /// Expected return type of the enclosing function, if any.
    pub return_type: Option<TypeId>,
    /// Whether the enclosing function is async / a generator.
    pub in_async: bool,
    pub in_generator: bool,
    /// The instance type of the enclosing class body, if any.
    pub this_type: Option<TypeId>,
    /// Suppresses diagnostics during re-checks (e.g. the CFG typer pass).
    pub quiet: bool,
}

impl<'a> CheckerContext<'a> {
    pub fn new(db: &'a TypeInterner, file: String) -> Self {
        CheckerContext {
            db,
            file,
            diagnostics: Vec::new(),
            scopes: vec![FxHashMap::default()],
            classes: FxHashMap::default(),
            type_param_scopes: Vec::new(),
            return_type: None,
            in_async: false,
            in_generator: false,
            this_type: None,
            quiet: false,
        }
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    pub fn error(&mut self, span: Span, code: u32, template: &str, args: &[&str]) {
        if self.quiet {
            return;
        }
        let message = format_message(template, args);
        debug!(code, message, "diagnostic");
        self.diagnostics
            .push(Diagnostic::error(self.file.clone(), span, message, code));
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.is_error())
    }

    // ========================================================================
    // Scopes
    // ========================================================================

    pub fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    pub fn declare(&mut self, name: &str, declared: TypeId, is_const: bool) {
        self.scopes.last_mut().expect("scope stack").insert(
            name.to_string(),
            VarBinding {
                declared,
                narrowed: declared,
                is_const,
            },
        );
    }

    pub fn lookup(&self, name: &str) -> Option<&VarBinding> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Current observed (possibly narrowed) type of a name.
    pub fn lookup_type(&self, name: &str) -> Option<TypeId> {
        self.lookup(name).map(|b| b.narrowed)
    }

    /// Override the narrowed type of an existing binding, innermost first.
    pub fn set_narrowed(&mut self, name: &str, narrowed: TypeId) {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(binding) = scope.get_mut(name) {
                binding.narrowed = narrowed;
                return;
            }
        }
    }

    /// Reset a binding's narrowed type to its declared type.
    pub fn reset_narrowed(&mut self, name: &str) {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(binding) = scope.get_mut(name) {
                binding.narrowed = binding.declared;
                return;
            }
        }
    }

    /// Snapshot of all narrowed types, for branch merging.
    pub fn narrowing_snapshot(&self) -> Vec<(String, TypeId)> {
        let mut snapshot = Vec::new();
        for scope in &self.scopes {
            for (name, binding) in scope {
                snapshot.push((name.clone(), binding.narrowed));
            }
        }
        snapshot
    }

    pub fn restore_narrowing(&mut self, snapshot: &[(String, TypeId)]) {
        for (name, narrowed) in snapshot {
            self.set_narrowed(name, *narrowed);
        }
    }

    /// Merge two branch outcomes at a join point: member-wise union.
    pub fn merge_narrowing(
        &mut self,
        left: &[(String, TypeId)],
        right: &[(String, TypeId)],
    ) {
        let right_map: FxHashMap<&str, TypeId> = right
            .iter()
            .map(|(name, t)| (name.as_str(), *t))
            .collect();
        for (name, left_type) in left {
            if let Some(&right_type) = right_map.get(name.as_str()) {
                let merged = self.db.union(vec![*left_type, right_type]);
                self.set_narrowed(name, merged);
            }
        }
    }

    // ========================================================================
    // Type parameters
    // ========================================================================

    pub fn push_type_params(&mut self, params: &[String]) {
        let mut scope = FxHashMap::default();
        for name in params {
            scope.insert(name.clone(), self.db.type_var(name, None));
        }
        self.type_param_scopes.push(scope);
    }

    pub fn pop_type_params(&mut self) {
        self.type_param_scopes.pop();
    }

    pub fn lookup_type_param(&self, name: &str) -> Option<TypeId> {
        self.type_param_scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }
}
