//! The analysis walk.
//!
//! One pass over the body records declaration, reference, and suspension
//! events in program order. Loop bodies are virtually unrolled once (their
//! reference events are replayed after the body) so a variable read at the
//! top of a loop is live across a suspension later in the same body.
//!
//! A suspension's hoist set is every declared-in-scope variable referenced
//! after it. Free variables of nested arrows are treated as referenced at
//! the end of the function: they must survive every suspension, because the
//! closure may run arbitrarily late.

use rustc_hash::FxHashSet;
use tracing::trace;
use tsr_ast::expr::{ExprKind, ObjectProperty, TemplatePart};
use tsr_ast::stmt::{ClassMemberKind, FunctionDecl, Param, Stmt, StmtKind};
use tsr_ast::{Expr, Pattern, SourceFile};
use tsr_types::TypeId;

use crate::machine::{
    AsyncMachine, FrameSlot, ResultChannel, SuspensionKind, SuspensionPoint, TryRegionInfo,
    TryRegionRef, TryRole,
};

/// Order index used for "referenced arbitrarily late" events.
const LATE: u32 = u32::MAX;

#[derive(Debug)]
enum Event {
    Declare { name: String, order: u32 },
    Reference { name: String, order: u32 },
}

struct PendingSuspension {
    state_id: u32,
    kind: SuspensionKind,
    line: u32,
    order: u32,
    try_region: Option<TryRegionRef>,
}

struct Walker {
    events: Vec<Event>,
    next_order: u32,
    suspensions: Vec<PendingSuspension>,
    try_stack: Vec<(u32, TryRole)>,
    try_regions: Vec<TryRegionInfo>,
    captures_this: bool,
    nested: Vec<AsyncMachine>,
}

impl Walker {
    fn new() -> Self {
        Walker {
            events: Vec::new(),
            next_order: 0,
            suspensions: Vec::new(),
            try_stack: Vec::new(),
            try_regions: Vec::new(),
            captures_this: false,
            nested: Vec::new(),
        }
    }

    fn tick(&mut self) -> u32 {
        let order = self.next_order;
        self.next_order += 1;
        order
    }

    fn declare(&mut self, name: &str) {
        let order = self.tick();
        self.events.push(Event::Declare {
            name: name.to_string(),
            order,
        });
    }

    fn declare_pattern(&mut self, pattern: &Pattern) {
        for name in pattern.bound_names() {
            self.declare(name);
        }
    }

    fn reference(&mut self, name: &str) {
        let order = self.tick();
        self.events.push(Event::Reference {
            name: name.to_string(),
            order,
        });
    }

    fn late_reference(&mut self, name: &str) {
        self.events.push(Event::Reference {
            name: name.to_string(),
            order: LATE,
        });
    }

    fn suspend(&mut self, kind: SuspensionKind, line: u32) {
        let order = self.tick();
        let state_id = self.suspensions.len() as u32;
        let try_region = self.try_stack.last().map(|&(region_id, role)| TryRegionRef {
            region_id,
            role,
        });
        // Every enclosing region's current role contains this suspension.
        for &(region_id, role) in &self.try_stack {
            let info = &mut self.try_regions[region_id as usize];
            match role {
                TryRole::Try => info.suspends_in_try = true,
                TryRole::Catch => info.suspends_in_catch = true,
                TryRole::Finally => info.suspends_in_finally = true,
            }
        }
        self.suspensions.push(PendingSuspension {
            state_id,
            kind,
            line,
            order,
            try_region,
        });
    }

    // ========================================================================
    // Statement walk
    // ========================================================================

    fn visit_stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.visit_stmt(stmt);
        }
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Var {
                name, initializer, ..
            } => {
                if let Some(init) = initializer {
                    self.visit_expr(init);
                }
                self.declare_pattern(name);
            }
            StmtKind::Block(stmts) | StmtKind::Sequence(stmts) => self.visit_stmts(stmts),
            StmtKind::Expression(expr) | StmtKind::Throw(expr) => self.visit_expr(expr),
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.visit_expr(condition);
                self.visit_stmt(then_branch);
                if let Some(else_stmt) = else_branch {
                    self.visit_stmt(else_stmt);
                }
            }
            StmtKind::While { condition, body } => {
                self.visit_expr(condition);
                self.visit_loop_body(|walker| walker.visit_stmt(body));
            }
            StmtKind::DoWhile { body, condition } => {
                self.visit_loop_body(|walker| {
                    walker.visit_stmt(body);
                    walker.visit_expr(condition);
                });
            }
            StmtKind::For {
                initializer,
                condition,
                increment,
                body,
            } => {
                if let Some(init) = initializer {
                    self.visit_stmt(init);
                }
                if let Some(cond) = condition {
                    self.visit_expr(cond);
                }
                self.visit_loop_body(|walker| {
                    walker.visit_stmt(body);
                    if let Some(incr) = increment {
                        walker.visit_expr(incr);
                    }
                });
            }
            StmtKind::ForOf {
                binding,
                iterable,
                body,
            }
            | StmtKind::ForIn {
                binding,
                object: iterable,
                body,
            } => {
                self.visit_expr(iterable);
                self.declare_pattern(binding);
                self.visit_loop_body(|walker| walker.visit_stmt(body));
            }
            StmtKind::Switch {
                discriminant,
                cases,
            } => {
                self.visit_expr(discriminant);
                for case in cases {
                    if let Some(value) = &case.value {
                        self.visit_expr(value);
                    }
                    self.visit_stmts(&case.body);
                }
            }
            StmtKind::TryCatch {
                try_block,
                catch_clause,
                finally_block,
            } => {
                let region_id = self.try_regions.len() as u32;
                let parent = self.try_stack.last().map(|&(id, _)| id);
                self.try_regions.push(TryRegionInfo {
                    id: region_id,
                    parent,
                    ..TryRegionInfo::default()
                });

                self.try_stack.push((region_id, TryRole::Try));
                self.visit_stmts(try_block);
                self.try_stack.pop();

                if let Some(catch) = catch_clause {
                    if let Some(binding) = &catch.binding {
                        self.declare(binding);
                    }
                    self.try_stack.push((region_id, TryRole::Catch));
                    self.visit_stmts(&catch.body);
                    self.try_stack.pop();
                }
                if let Some(finally) = finally_block {
                    self.try_stack.push((region_id, TryRole::Finally));
                    self.visit_stmts(finally);
                    self.try_stack.pop();
                }
            }
            StmtKind::Return { value } => {
                if let Some(v) = value {
                    self.visit_expr(v);
                }
            }
            StmtKind::Labeled { body, .. } => self.visit_stmt(body),
            StmtKind::Function(func) => {
                // A nested function declaration is a closure like an arrow,
                // but with its own `this`.
                self.visit_closure(&func.params, func.body.as_deref().unwrap_or(&[]), false);
                self.declare(&func.name);
            }
            StmtKind::Class(class) => {
                for member in &class.members {
                    match &member.kind {
                        ClassMemberKind::Field { initializer, .. } => {
                            if let Some(init) = initializer {
                                self.visit_expr(init);
                            }
                        }
                        ClassMemberKind::Method(f)
                        | ClassMemberKind::Getter(f)
                        | ClassMemberKind::Setter(f)
                        | ClassMemberKind::Constructor(f) => {
                            self.visit_closure(&f.params, f.body.as_deref().unwrap_or(&[]), false);
                        }
                    }
                }
                self.declare(&class.name);
            }
            StmtKind::Break { .. }
            | StmtKind::Continue { .. }
            | StmtKind::Enum { .. }
            | StmtKind::Import(_)
            | StmtKind::Export(_)
            | StmtKind::ImportRequire { .. } => {}
        }
    }

    /// Walk a loop body, then replay its reference events once so values
    /// read early in the body stay live across suspensions later in it.
    fn visit_loop_body(&mut self, walk: impl FnOnce(&mut Walker)) {
        let events_before = self.events.len();
        walk(self);
        let replayed: Vec<String> = self.events[events_before..]
            .iter()
            .filter_map(|event| match event {
                Event::Reference { name, order } if *order != LATE => Some(name.clone()),
                _ => None,
            })
            .collect();
        for name in replayed {
            self.reference(&name);
        }
    }

    // ========================================================================
    // Expression walk
    // ========================================================================

    fn visit_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Literal(_) | ExprKind::Super => {}
            ExprKind::This => self.captures_this = true,
            ExprKind::Variable(name) => self.reference(name),
            ExprKind::Grouping(inner)
            | ExprKind::Spread(inner)
            | ExprKind::Unary { operand: inner, .. }
            | ExprKind::PrefixIncrement { operand: inner, .. }
            | ExprKind::PostfixIncrement { operand: inner, .. }
            | ExprKind::DynamicImport(inner) => self.visit_expr(inner),
            ExprKind::Await(operand) => {
                self.visit_expr(operand);
                self.suspend(SuspensionKind::Await, expr.line);
            }
            ExprKind::Yield { value, delegate } => {
                if let Some(v) = value {
                    self.visit_expr(v);
                }
                self.suspend(
                    SuspensionKind::Yield {
                        delegate: *delegate,
                    },
                    expr.line,
                );
            }
            ExprKind::Binary { left, right, .. }
            | ExprKind::Logical { left, right, .. }
            | ExprKind::NullishCoalescing { left, right } => {
                self.visit_expr(left);
                self.visit_expr(right);
            }
            ExprKind::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                self.visit_expr(condition);
                self.visit_expr(then_branch);
                self.visit_expr(else_branch);
            }
            ExprKind::Assign { target, value } => {
                self.visit_expr(value);
                // Assignment both writes and keeps the binding live.
                for name in target.bound_names() {
                    self.reference(name);
                }
            }
            ExprKind::CompoundAssign { name, value, .. } => {
                self.reference(name);
                self.visit_expr(value);
            }
            ExprKind::Get { object, .. } => self.visit_expr(object),
            ExprKind::Set { object, value, .. } => {
                self.visit_expr(object);
                self.visit_expr(value);
            }
            ExprKind::GetIndex { object, index, .. } => {
                self.visit_expr(object);
                self.visit_expr(index);
            }
            ExprKind::SetIndex {
                object,
                index,
                value,
            }
            | ExprKind::CompoundSetIndex {
                object,
                index,
                value,
                ..
            } => {
                self.visit_expr(object);
                self.visit_expr(index);
                self.visit_expr(value);
            }
            ExprKind::CompoundSet { object, value, .. } => {
                self.visit_expr(object);
                self.visit_expr(value);
            }
            ExprKind::Call {
                callee, arguments, ..
            }
            | ExprKind::New {
                callee, arguments, ..
            } => {
                self.visit_expr(callee);
                for argument in arguments {
                    self.visit_expr(argument);
                }
            }
            ExprKind::ArrayLiteral { elements } => {
                for element in elements {
                    self.visit_expr(element);
                }
            }
            ExprKind::ObjectLiteral { properties } => {
                for property in properties {
                    match property {
                        ObjectProperty::KeyValue { value, .. }
                        | ObjectProperty::Spread { value } => self.visit_expr(value),
                        ObjectProperty::Shorthand { name } => self.reference(name),
                    }
                }
            }
            ExprKind::TemplateLiteral { parts } => {
                for part in parts {
                    if let TemplatePart::Expr(e) = part {
                        self.visit_expr(e);
                    }
                }
            }
            ExprKind::ArrowFunction {
                params,
                body,
                is_async,
                ..
            } => self.visit_closure(params, body, *is_async),
        }
    }

    /// A closure boundary: recurse with a sub-walker, surface its free
    /// variables as late references here, and keep its machine if it is
    /// itself async or a generator.
    fn visit_closure(&mut self, params: &[Param], body: &[Stmt], is_async: bool) {
        let mut sub = Walker::new();
        for param in params {
            sub.declare_pattern(&param.pattern);
        }
        sub.visit_stmts(body);

        // Arrow `this` is lexical: the outer function must capture it.
        if sub.captures_this {
            self.captures_this = true;
        }

        let free = sub.free_variables();
        for name in &free {
            self.late_reference(name);
        }

        if is_async || !sub.suspensions.is_empty() {
            let machine = sub.into_machine(
                None,
                if is_async {
                    ResultChannel::Promise
                } else {
                    ResultChannel::Iterator
                },
                &|_| TypeId::ANY,
            );
            self.nested.push(machine);
        }
    }

    /// Names referenced but never declared in this walker.
    fn free_variables(&self) -> Vec<String> {
        let declared: FxHashSet<&str> = self
            .events
            .iter()
            .filter_map(|event| match event {
                Event::Declare { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect();
        let mut seen = FxHashSet::default();
        let mut free = Vec::new();
        for event in &self.events {
            if let Event::Reference { name, .. } = event {
                if !declared.contains(name.as_str()) && seen.insert(name.clone()) {
                    free.push(name.clone());
                }
            }
        }
        free
    }

    /// Resolve liveness and assemble the machine description.
    fn into_machine(
        self,
        function_name: Option<String>,
        result: ResultChannel,
        type_lookup: &dyn Fn(&str) -> TypeId,
    ) -> AsyncMachine {
        let mut frame: Vec<FrameSlot> = Vec::new();
        let mut suspension_points = Vec::with_capacity(self.suspensions.len());

        for pending in &self.suspensions {
            let mut live_across = Vec::new();
            for event in &self.events {
                let Event::Declare { name, order } = event else {
                    continue;
                };
                if *order >= pending.order {
                    continue;
                }
                let referenced_after = self.events.iter().any(|e| {
                    matches!(e, Event::Reference { name: ref_name, order: ref_order }
                        if ref_name == name && *ref_order > pending.order)
                });
                if referenced_after && !live_across.contains(name) {
                    live_across.push(name.clone());
                }
            }
            // Hoist set: the union of everything live across any suspension.
            for name in &live_across {
                if !frame.iter().any(|slot| &slot.name == name) {
                    frame.push(FrameSlot {
                        name: name.clone(),
                        type_id: type_lookup(name),
                    });
                }
            }
            suspension_points.push(SuspensionPoint {
                state_id: pending.state_id,
                kind: pending.kind,
                line: pending.line,
                live_across,
                try_region: pending.try_region,
            });
        }

        AsyncMachine {
            function_name,
            frame,
            suspension_points,
            try_regions: self.try_regions,
            captures_this: self.captures_this,
            result,
            nested: self.nested,
        }
    }
}

/// Analyze one function. Plain synchronous functions need no machine and
/// yield `None`.
pub fn analyze_function(
    func: &FunctionDecl,
    type_lookup: &dyn Fn(&str) -> TypeId,
) -> Option<AsyncMachine> {
    if !func.is_async && !func.is_generator {
        return None;
    }
    let body = func.body.as_deref()?;

    let mut walker = Walker::new();
    for param in &func.params {
        walker.declare_pattern(&param.pattern);
    }
    walker.visit_stmts(body);

    let result = match (func.is_async, func.is_generator) {
        (true, true) => ResultChannel::AsyncIterator,
        (true, false) => ResultChannel::Promise,
        (false, _) => ResultChannel::Iterator,
    };
    let machine = walker.into_machine(Some(func.name.clone()), result, type_lookup);
    trace!(
        function = func.name,
        states = machine.state_count(),
        frame = machine.frame.len(),
        "lowered"
    );
    Some(machine)
}

/// Analyze every async/generator function and method in a module.
pub fn lower_module(
    file: &SourceFile,
    type_lookup: &dyn Fn(&str) -> TypeId,
) -> Vec<AsyncMachine> {
    let mut machines = Vec::new();
    collect_from_stmts(&file.statements, type_lookup, &mut machines);
    machines
}

fn collect_from_stmts(
    stmts: &[Stmt],
    type_lookup: &dyn Fn(&str) -> TypeId,
    out: &mut Vec<AsyncMachine>,
) {
    for stmt in stmts {
        match &stmt.kind {
            StmtKind::Function(func) => {
                if let Some(machine) = analyze_function(func, type_lookup) {
                    out.push(machine);
                }
            }
            StmtKind::Class(class) => {
                for member in &class.members {
                    if let ClassMemberKind::Method(func)
                    | ClassMemberKind::Getter(func)
                    | ClassMemberKind::Setter(func) = &member.kind
                    {
                        if let Some(machine) = analyze_function(func, type_lookup) {
                            out.push(machine);
                        }
                    }
                }
            }
            StmtKind::Export(export) => {
                if let Some(declaration) = &export.declaration {
                    collect_from_stmts(std::slice::from_ref(declaration.as_ref()), type_lookup, out);
                }
            }
            _ => {}
        }
    }
}
