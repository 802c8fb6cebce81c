//! Worklist fixed point over block narrowing contexts.
//!
//! A `FlowContext` maps variable names to their flow-refined type at a
//! program point. `narrow()` seeds the entry block with the declared
//! environment, pushes contexts across edges (applying each conditional
//! edge's predicate), joins multiple predecessors member-wise with union,
//! and iterates until no block's exit context changes.

use rustc_hash::{FxHashMap, FxHashSet};
use tsr_ast::expr::{ExprKind, Literal};
use tsr_ast::ops::{BinaryOp, LogicalOp, UnaryOp};
use tsr_ast::Expr;
use tsr_common::limits::MAX_NARROWING_ITERATIONS;
use tsr_types::{ClassId, NarrowingContext, TypeId, TypeInterner};

use crate::flow_graph::{BlockId, EdgeKind, FlowEffect, FlowGraph};

/// The narrowing lattice at a program point.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlowContext {
    pub vars: FxHashMap<String, TypeId>,
}

impl FlowContext {
    pub fn get(&self, name: &str) -> Option<TypeId> {
        self.vars.get(name).copied()
    }

    pub fn set(&mut self, name: &str, type_id: TypeId) {
        self.vars.insert(name.to_string(), type_id);
    }

    /// Member-wise union join. Names missing on one side keep the other
    /// side's type.
    pub fn join(&self, other: &FlowContext, db: &TypeInterner) -> FlowContext {
        let mut joined = self.clone();
        for (name, &right) in &other.vars {
            match joined.vars.get(name) {
                Some(&left) if left != right => {
                    joined.vars.insert(name.clone(), db.union(vec![left, right]));
                }
                Some(_) => {}
                None => {
                    joined.vars.insert(name.clone(), right);
                }
            }
        }
        joined
    }
}

/// Everything predicate transfer needs besides the context itself.
pub struct NarrowEnv<'a> {
    pub db: &'a TypeInterner,
    /// Class names in scope, for `instanceof` narrowing.
    pub classes: &'a FxHashMap<String, ClassId>,
}

/// Run the fixed point, mutating each block's entry/exit contexts.
pub fn narrow(graph: &mut FlowGraph, env: &NarrowEnv<'_>, initial: &FlowContext) {
    let incoming = graph.incoming();
    let outgoing = graph.outgoing();

    // Per-edge contexts: what flows along each edge after its predicate.
    let mut edge_contexts: FxHashMap<usize, FlowContext> = FxHashMap::default();

    let mut worklist: Vec<BlockId> = vec![graph.entry];
    let mut queued: FxHashSet<BlockId> = FxHashSet::default();
    queued.insert(graph.entry);

    let mut iterations = 0usize;
    while let Some(block_id) = worklist.pop() {
        queued.remove(&block_id);
        iterations += 1;
        if iterations > MAX_NARROWING_ITERATIONS * graph.blocks.len().max(1) {
            // Conservative stop; contexts computed so far stand.
            break;
        }

        // Entry context: join of incoming edge contexts, or the initial
        // environment for the entry block.
        let entry_context = if block_id == graph.entry {
            initial.clone()
        } else {
            let mut joined: Option<FlowContext> = None;
            for &edge_index in incoming.get(&block_id).into_iter().flatten() {
                if let Some(edge_context) = edge_contexts.get(&edge_index) {
                    joined = Some(match joined {
                        None => edge_context.clone(),
                        Some(existing) => existing.join(edge_context, env.db),
                    });
                }
            }
            joined.unwrap_or_else(|| initial.clone())
        };

        // Transfer through the block's effects.
        let mut exit_context = entry_context.clone();
        for effect in &graph.block(block_id).effects {
            apply_effect(env.db, &mut exit_context, effect);
        }

        let block = graph.block_mut(block_id);
        let changed = block.exit_context != exit_context || block.entry_context != entry_context;
        block.entry_context = entry_context;
        block.exit_context = exit_context.clone();

        if !changed && edge_contexts_populated(&outgoing, &edge_contexts, block_id) {
            continue;
        }

        // Push along outgoing edges, applying predicates.
        for &edge_index in outgoing.get(&block_id).into_iter().flatten() {
            let edge = &graph.edges[edge_index];
            let pushed = match (edge.kind, &edge.predicate) {
                (EdgeKind::ConditionalTrue, Some(pred)) => {
                    apply_predicate(env, &exit_context, pred, true)
                }
                (EdgeKind::ConditionalFalse, Some(pred)) => {
                    apply_predicate(env, &exit_context, pred, false)
                }
                _ => exit_context.clone(),
            };
            let target = edge.to;
            let edge_changed = edge_contexts.get(&edge_index) != Some(&pushed);
            edge_contexts.insert(edge_index, pushed);
            if edge_changed && queued.insert(target) {
                worklist.push(target);
            }
        }
    }
}

fn edge_contexts_populated(
    outgoing: &FxHashMap<BlockId, smallvec::SmallVec<[usize; 4]>>,
    edge_contexts: &FxHashMap<usize, FlowContext>,
    block: BlockId,
) -> bool {
    outgoing
        .get(&block)
        .into_iter()
        .flatten()
        .all(|index| edge_contexts.contains_key(index))
}

fn apply_effect(db: &TypeInterner, context: &mut FlowContext, effect: &FlowEffect) {
    match effect {
        FlowEffect::Declare { name, type_id } => context.set(name, *type_id),
        FlowEffect::Assign { name, type_id } => {
            // Killing definition, unless the declared type absorbs.
            let narrowing = NarrowingContext::new(db);
            let declared = context.get(name).unwrap_or(TypeId::ANY);
            context.set(name, narrowing.narrow_by_assignment(declared, *type_id));
        }
    }
}

/// Apply a conditional edge's predicate to a context.
pub fn apply_predicate(
    env: &NarrowEnv<'_>,
    context: &FlowContext,
    predicate: &Expr,
    assume: bool,
) -> FlowContext {
    let mut narrowed = context.clone();
    apply_predicate_into(env, &mut narrowed, predicate, assume);
    narrowed
}

fn apply_predicate_into(
    env: &NarrowEnv<'_>,
    context: &mut FlowContext,
    predicate: &Expr,
    assume: bool,
) {
    let narrowing = NarrowingContext::new(env.db);
    match &predicate.kind {
        ExprKind::Grouping(inner) => apply_predicate_into(env, context, inner, assume),
        ExprKind::Unary {
            op: UnaryOp::Not,
            operand,
        } => apply_predicate_into(env, context, operand, !assume),
        // Truthiness of a bare variable.
        ExprKind::Variable(name) => {
            if let Some(current) = context.get(name) {
                context.set(name, narrowing.narrow_truthy(current, assume));
            }
        }
        // `a && b` is known true only when both are; `a || b` known false
        // only when both are.
        ExprKind::Logical {
            op: LogicalOp::And,
            left,
            right,
        } if assume => {
            apply_predicate_into(env, context, left, true);
            apply_predicate_into(env, context, right, true);
        }
        ExprKind::Logical {
            op: LogicalOp::Or,
            left,
            right,
        } if !assume => {
            apply_predicate_into(env, context, left, false);
            apply_predicate_into(env, context, right, false);
        }
        ExprKind::Binary { op, left, right } => {
            let (equality, negated) = match op {
                BinaryOp::StrictEqual | BinaryOp::Equal => (true, false),
                BinaryOp::StrictNotEqual | BinaryOp::NotEqual => (true, true),
                BinaryOp::Instanceof => {
                    apply_instanceof(env, context, left, right, assume);
                    return;
                }
                _ => (false, false),
            };
            if !equality {
                return;
            }
            let assume = if negated { !assume } else { assume };
            apply_equality(env, context, left, right, assume);
        }
        _ => {}
    }
}

fn apply_instanceof(
    env: &NarrowEnv<'_>,
    context: &mut FlowContext,
    left: &Expr,
    right: &Expr,
    assume: bool,
) {
    let narrowing = NarrowingContext::new(env.db);
    if let (ExprKind::Variable(name), ExprKind::Variable(class_name)) =
        (&left.kind, &right.kind)
    {
        if let (Some(current), Some(&class_id)) =
            (context.get(name), env.classes.get(class_name))
        {
            context.set(
                name,
                narrowing.narrow_by_instanceof(current, class_id, assume),
            );
        }
    }
}

fn apply_equality(
    env: &NarrowEnv<'_>,
    context: &mut FlowContext,
    left: &Expr,
    right: &Expr,
    assume: bool,
) {
    let narrowing = NarrowingContext::new(env.db);

    // Normalize: variable (or typeof variable) on the left.
    let (subject, other) = match (&left.kind, &right.kind) {
        (ExprKind::Literal(_), _) => (right, left),
        _ => (left, right),
    };

    match &subject.kind {
        // typeof x === "string"
        ExprKind::Unary {
            op: UnaryOp::Typeof,
            operand,
        } => {
            if let (ExprKind::Variable(name), ExprKind::Literal(Literal::String(type_name))) =
                (&operand.kind, &other.kind)
            {
                if let Some(current) = context.get(name) {
                    context.set(
                        name,
                        narrowing.narrow_by_typeof(current, type_name, assume),
                    );
                }
            }
        }
        ExprKind::Variable(name) => {
            let Some(current) = context.get(name) else {
                return;
            };
            match &other.kind {
                // x === null / x == null / x === undefined
                ExprKind::Literal(Literal::Null) | ExprKind::Literal(Literal::Undefined) => {
                    context.set(name, narrowing.narrow_by_nullish(current, assume));
                }
                ExprKind::Literal(Literal::String(s)) => {
                    let literal = env.db.string_literal(s);
                    context.set(name, narrowing.narrow_by_literal(current, literal, assume));
                }
                ExprKind::Literal(Literal::Number(n)) => {
                    let literal = env.db.number_literal(*n);
                    context.set(name, narrowing.narrow_by_literal(current, literal, assume));
                }
                ExprKind::Literal(Literal::Boolean(b)) => {
                    let literal = env.db.boolean_literal(*b);
                    context.set(name, narrowing.narrow_by_literal(current, literal, assume));
                }
                _ => {}
            }
        }
        _ => {}
    }
}
