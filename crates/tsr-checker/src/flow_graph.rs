//! Control-flow graph construction.
//!
//! A basic block is a maximal linear statement sequence with one entry and
//! one exit; edges carry a kind tag and, for conditional edges, the
//! predicate expression. The block-id counter is owned by the builder
//! instance. Graphs are rebuilt per function and thrown away.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tsr_ast::expr::ExprKind;
use tsr_ast::pattern::Pattern;
use tsr_ast::stmt::{Stmt, StmtKind};
use tsr_ast::Expr;
use tsr_types::TypeId;

use crate::flow_narrowing::FlowContext;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

bitflags::bitflags! {
    /// Structural role flags on a block, set during construction.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct BlockFlags: u8 {
        const ENTRY = 1 << 0;
        const EXIT = 1 << 1;
        const LOOP_HEADER = 1 << 2;
        const JOIN = 1 << 3;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeKind {
    Unconditional,
    ConditionalTrue,
    ConditionalFalse,
    LoopBack,
    Break,
    Continue,
    Return,
    Throw,
}

#[derive(Debug)]
pub struct Edge {
    pub from: BlockId,
    pub to: BlockId,
    pub kind: EdgeKind,
    /// Present on the conditional kinds.
    pub predicate: Option<Expr>,
}

/// A statement's observable effect on the narrowing lattice.
#[derive(Clone, Debug)]
pub enum FlowEffect {
    Declare { name: String, type_id: TypeId },
    Assign { name: String, type_id: TypeId },
}

#[derive(Debug)]
pub struct BasicBlock {
    pub id: BlockId,
    pub flags: BlockFlags,
    pub effects: Vec<FlowEffect>,
    pub entry_context: FlowContext,
    pub exit_context: FlowContext,
}

#[derive(Debug)]
pub struct FlowGraph {
    pub blocks: Vec<BasicBlock>,
    pub edges: Vec<Edge>,
    pub entry: BlockId,
    pub exit: BlockId,
}

impl FlowGraph {
    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.0 as usize]
    }

    pub fn block_mut(&mut self, id: BlockId) -> &mut BasicBlock {
        &mut self.blocks[id.0 as usize]
    }

    /// Indices of edges entering each block.
    pub fn incoming(&self) -> FxHashMap<BlockId, SmallVec<[usize; 4]>> {
        let mut map: FxHashMap<BlockId, SmallVec<[usize; 4]>> = FxHashMap::default();
        for (index, edge) in self.edges.iter().enumerate() {
            map.entry(edge.to).or_default().push(index);
        }
        map
    }

    /// Indices of edges leaving each block.
    pub fn outgoing(&self) -> FxHashMap<BlockId, SmallVec<[usize; 4]>> {
        let mut map: FxHashMap<BlockId, SmallVec<[usize; 4]>> = FxHashMap::default();
        for (index, edge) in self.edges.iter().enumerate() {
            map.entry(edge.from).or_default().push(index);
        }
        map
    }
}

struct LoopTargets {
    break_to: BlockId,
    continue_to: BlockId,
}

/// Builds a `FlowGraph` from a statement list. The caller supplies a typer
/// for initializer/assignment expressions; the builder stays oblivious to
/// checking.
pub struct FlowGraphBuilder<'t> {
    blocks: Vec<BasicBlock>,
    edges: Vec<Edge>,
    /// Per-builder counter (never process-global).
    next_block: u32,
    current: BlockId,
    exit: BlockId,
    loop_stack: Vec<LoopTargets>,
    typer: &'t mut dyn FnMut(&Expr) -> TypeId,
}

impl<'t> FlowGraphBuilder<'t> {
    pub fn new(typer: &'t mut dyn FnMut(&Expr) -> TypeId) -> Self {
        let mut builder = FlowGraphBuilder {
            blocks: Vec::new(),
            edges: Vec::new(),
            next_block: 0,
            current: BlockId(0),
            exit: BlockId(0),
            loop_stack: Vec::new(),
            typer,
        };
        let entry = builder.new_block();
        let exit = builder.new_block();
        builder.blocks[entry.0 as usize].flags |= BlockFlags::ENTRY;
        builder.blocks[exit.0 as usize].flags |= BlockFlags::EXIT;
        builder.current = entry;
        builder.exit = exit;
        builder
    }

    pub fn build(mut self, body: &[Stmt]) -> FlowGraph {
        let entry = BlockId(0);
        for stmt in body {
            self.visit_stmt(stmt);
        }
        // Falling off the end reaches the exit.
        self.edge(self.current, self.exit, EdgeKind::Unconditional, None);
        FlowGraph {
            blocks: self.blocks,
            edges: self.edges,
            entry,
            exit: self.exit,
        }
    }

    fn new_block(&mut self) -> BlockId {
        let id = BlockId(self.next_block);
        self.next_block += 1;
        self.blocks.push(BasicBlock {
            id,
            flags: BlockFlags::default(),
            effects: Vec::new(),
            entry_context: FlowContext::default(),
            exit_context: FlowContext::default(),
        });
        id
    }

    fn mark(&mut self, block: BlockId, flags: BlockFlags) {
        self.blocks[block.0 as usize].flags |= flags;
    }

    fn edge(&mut self, from: BlockId, to: BlockId, kind: EdgeKind, predicate: Option<&Expr>) {
        self.edges.push(Edge {
            from,
            to,
            kind,
            predicate: predicate.cloned(),
        });
    }

    fn effect(&mut self, effect: FlowEffect) {
        self.blocks[self.current.0 as usize].effects.push(effect);
    }

    fn declare_pattern(&mut self, pattern: &Pattern, type_id: TypeId) {
        for name in pattern.bound_names() {
            let name = name.to_string();
            self.blocks[self.current.0 as usize]
                .effects
                .push(FlowEffect::Declare { name, type_id });
        }
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Var {
                name, initializer, ..
            } => {
                let type_id = match initializer {
                    Some(init) => (self.typer)(init),
                    None => TypeId::UNDEFINED,
                };
                self.declare_pattern(name, type_id);
            }
            StmtKind::Expression(expr) => self.visit_expr_effects(expr),
            StmtKind::Block(stmts) | StmtKind::Sequence(stmts) => {
                for s in stmts {
                    self.visit_stmt(s);
                }
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let cond_block = self.current;
                let then_block = self.new_block();
                let join = self.new_block();
                self.mark(join, BlockFlags::JOIN);
                self.edge(cond_block, then_block, EdgeKind::ConditionalTrue, Some(condition));

                self.current = then_block;
                self.visit_stmt(then_branch);
                self.edge(self.current, join, EdgeKind::Unconditional, None);

                match else_branch {
                    Some(else_stmt) => {
                        let else_block = self.new_block();
                        self.edge(
                            cond_block,
                            else_block,
                            EdgeKind::ConditionalFalse,
                            Some(condition),
                        );
                        self.current = else_block;
                        self.visit_stmt(else_stmt);
                        self.edge(self.current, join, EdgeKind::Unconditional, None);
                    }
                    None => {
                        self.edge(cond_block, join, EdgeKind::ConditionalFalse, Some(condition));
                    }
                }
                self.current = join;
            }
            StmtKind::While { condition, body } => {
                let header = self.new_block();
                let body_block = self.new_block();
                let after = self.new_block();
                self.mark(header, BlockFlags::LOOP_HEADER);
                self.edge(self.current, header, EdgeKind::Unconditional, None);
                self.edge(header, body_block, EdgeKind::ConditionalTrue, Some(condition));
                self.edge(header, after, EdgeKind::ConditionalFalse, Some(condition));

                self.loop_stack.push(LoopTargets {
                    break_to: after,
                    continue_to: header,
                });
                self.current = body_block;
                self.visit_stmt(body);
                self.edge(self.current, header, EdgeKind::LoopBack, None);
                self.loop_stack.pop();
                self.current = after;
            }
            StmtKind::DoWhile { body, condition } => {
                let body_block = self.new_block();
                let after = self.new_block();
                self.mark(body_block, BlockFlags::LOOP_HEADER);
                self.edge(self.current, body_block, EdgeKind::Unconditional, None);

                self.loop_stack.push(LoopTargets {
                    break_to: after,
                    continue_to: body_block,
                });
                self.current = body_block;
                self.visit_stmt(body);
                self.edge(self.current, body_block, EdgeKind::LoopBack, Some(condition));
                self.edge(self.current, after, EdgeKind::ConditionalFalse, Some(condition));
                self.loop_stack.pop();
                self.current = after;
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
                let header = self.new_block();
                let body_block = self.new_block();
                let after = self.new_block();
                self.mark(header, BlockFlags::LOOP_HEADER);
                self.edge(self.current, header, EdgeKind::Unconditional, None);
                match condition {
                    Some(cond) => {
                        self.edge(header, body_block, EdgeKind::ConditionalTrue, Some(cond));
                        self.edge(header, after, EdgeKind::ConditionalFalse, Some(cond));
                    }
                    None => {
                        self.edge(header, body_block, EdgeKind::Unconditional, None);
                    }
                }

                self.loop_stack.push(LoopTargets {
                    break_to: after,
                    continue_to: header,
                });
                self.current = body_block;
                self.visit_stmt(body);
                if let Some(incr) = increment {
                    self.visit_expr_effects(incr);
                }
                self.edge(self.current, header, EdgeKind::LoopBack, None);
                self.loop_stack.pop();
                self.current = after;
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
                let _ = (self.typer)(iterable);
                let header = self.new_block();
                let body_block = self.new_block();
                let after = self.new_block();
                self.mark(header, BlockFlags::LOOP_HEADER);
                self.edge(self.current, header, EdgeKind::Unconditional, None);
                self.edge(header, body_block, EdgeKind::Unconditional, None);
                self.edge(header, after, EdgeKind::Unconditional, None);

                self.loop_stack.push(LoopTargets {
                    break_to: after,
                    continue_to: header,
                });
                self.current = body_block;
                self.declare_pattern(binding, TypeId::ANY);
                self.visit_stmt(body);
                self.edge(self.current, header, EdgeKind::LoopBack, None);
                self.loop_stack.pop();
                self.current = after;
            }
            StmtKind::Switch { discriminant, cases } => {
                let head = self.current;
                let after = self.new_block();
                self.mark(after, BlockFlags::JOIN);
                self.loop_stack.push(LoopTargets {
                    break_to: after,
                    // A bare `continue` inside a switch belongs to the outer
                    // loop; reuse its target if one exists.
                    continue_to: self
                        .loop_stack
                        .last()
                        .map(|l| l.continue_to)
                        .unwrap_or(after),
                });

                let mut previous_case_end: Option<BlockId> = None;
                let mut has_default = false;
                for case in cases {
                    let case_block = self.new_block();
                    match &case.value {
                        Some(value) => {
                            // The edge predicate is the synthesized
                            // `discriminant === value` comparison.
                            let predicate = synth_case_predicate(discriminant, value);
                            self.edge(
                                head,
                                case_block,
                                EdgeKind::ConditionalTrue,
                                Some(&predicate),
                            );
                        }
                        None => {
                            has_default = true;
                            self.edge(head, case_block, EdgeKind::Unconditional, None);
                        }
                    }
                    // Fallthrough from the previous case body.
                    if let Some(prev) = previous_case_end {
                        self.edge(prev, case_block, EdgeKind::Unconditional, None);
                    }
                    self.current = case_block;
                    for s in &case.body {
                        self.visit_stmt(s);
                    }
                    previous_case_end = Some(self.current);
                }
                if let Some(last) = previous_case_end {
                    self.edge(last, after, EdgeKind::Unconditional, None);
                }
                if !has_default {
                    self.edge(head, after, EdgeKind::Unconditional, None);
                }
                self.loop_stack.pop();
                self.current = after;
            }
            StmtKind::TryCatch {
                try_block,
                catch_clause,
                finally_block,
            } => {
                let try_start = self.new_block();
                let join = self.new_block();
                self.mark(join, BlockFlags::JOIN);
                self.edge(self.current, try_start, EdgeKind::Unconditional, None);

                self.current = try_start;
                for s in try_block {
                    self.visit_stmt(s);
                }
                let try_end = self.current;

                let catch_end = catch_clause.as_ref().map(|catch| {
                    let catch_block = self.new_block();
                    // Any statement in the try region may throw into the catch.
                    self.edge(try_start, catch_block, EdgeKind::Throw, None);
                    self.current = catch_block;
                    if let Some(binding) = &catch.binding {
                        self.blocks[self.current.0 as usize]
                            .effects
                            .push(FlowEffect::Declare {
                                name: binding.clone(),
                                type_id: TypeId::ANY,
                            });
                    }
                    for s in &catch.body {
                        self.visit_stmt(s);
                    }
                    self.current
                });

                match finally_block {
                    Some(finally) => {
                        let finally_start = self.new_block();
                        self.edge(try_end, finally_start, EdgeKind::Unconditional, None);
                        if let Some(catch_end) = catch_end {
                            self.edge(catch_end, finally_start, EdgeKind::Unconditional, None);
                        } else {
                            // No catch: the throw path still runs the finally.
                            self.edge(try_start, finally_start, EdgeKind::Throw, None);
                        }
                        self.current = finally_start;
                        for s in finally {
                            self.visit_stmt(s);
                        }
                        self.edge(self.current, join, EdgeKind::Unconditional, None);
                    }
                    None => {
                        self.edge(try_end, join, EdgeKind::Unconditional, None);
                        if let Some(catch_end) = catch_end {
                            self.edge(catch_end, join, EdgeKind::Unconditional, None);
                        }
                    }
                }
                self.current = join;
            }
            StmtKind::Break { .. } => {
                if let Some(targets) = self.loop_stack.last() {
                    let to = targets.break_to;
                    self.edge(self.current, to, EdgeKind::Break, None);
                }
                self.current = self.new_block();
            }
            StmtKind::Continue { .. } => {
                if let Some(targets) = self.loop_stack.last() {
                    let to = targets.continue_to;
                    self.edge(self.current, to, EdgeKind::Continue, None);
                }
                self.current = self.new_block();
            }
            StmtKind::Return { value } => {
                if let Some(v) = value {
                    let _ = (self.typer)(v);
                }
                self.edge(self.current, self.exit, EdgeKind::Return, None);
                self.current = self.new_block();
            }
            StmtKind::Throw(value) => {
                let _ = (self.typer)(value);
                self.edge(self.current, self.exit, EdgeKind::Throw, None);
                self.current = self.new_block();
            }
            StmtKind::Labeled { body, .. } => self.visit_stmt(body),
            // Nested functions get their own graphs; imports and class
            // bodies carry no block-local flow effects.
            StmtKind::Function(_)
            | StmtKind::Class(_)
            | StmtKind::Enum { .. }
            | StmtKind::Import(_)
            | StmtKind::Export(_)
            | StmtKind::ImportRequire { .. } => {}
        }
    }

    /// Record assignment effects buried in an expression statement.
    fn visit_expr_effects(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Assign { target, value } => {
                let type_id = (self.typer)(value);
                if let Pattern::Identifier { name, .. } = target.as_ref() {
                    self.effect(FlowEffect::Assign {
                        name: name.clone(),
                        type_id,
                    });
                } else {
                    // Destructuring assignment: every bound name is killed.
                    for name in target.bound_names() {
                        self.effect(FlowEffect::Assign {
                            name: name.to_string(),
                            type_id: TypeId::ANY,
                        });
                    }
                }
            }
            ExprKind::CompoundAssign { name, value, .. } => {
                let type_id = (self.typer)(value);
                self.effect(FlowEffect::Assign {
                    name: name.clone(),
                    type_id,
                });
            }
            ExprKind::Grouping(inner) => self.visit_expr_effects(inner),
            _ => {
                let _ = (self.typer)(expr);
            }
        }
    }
}

/// `discriminant === caseValue`, used as a switch edge predicate.
fn synth_case_predicate(discriminant: &Expr, value: &Expr) -> Expr {
    Expr::new(
        ExprKind::Binary {
            op: tsr_ast::BinaryOp::StrictEqual,
            left: Box::new(discriminant.clone()),
            right: Box::new(value.clone()),
        },
        discriminant.span.merge(value.span),
        discriminant.line,
    )
}
