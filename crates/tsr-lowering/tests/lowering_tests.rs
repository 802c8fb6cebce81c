//! State-machine analysis tests over hand-built async bodies.

use tsr_ast::expr::{Expr, ExprKind, Literal};
use tsr_ast::pattern::Pattern;
use tsr_ast::stmt::{CatchClause, FunctionDecl, Param, Stmt, StmtKind, VarKind};
use tsr_common::Span;
use tsr_lowering::{
    analyze_function, ResultChannel, SuspensionKind, TryRole, STATE_DONE, STATE_INITIAL,
};
use tsr_types::TypeId;

fn expr(kind: ExprKind) -> Expr {
    Expr::new(kind, Span::dummy(), 1)
}

fn expr_on(kind: ExprKind, line: u32) -> Expr {
    Expr::new(kind, Span::dummy(), line)
}

fn stmt(kind: StmtKind) -> Stmt {
    Stmt::new(kind, Span::dummy(), 1)
}

fn variable(name: &str) -> Expr {
    expr(ExprKind::Variable(name.into()))
}

fn await_expr(inner: Expr, line: u32) -> Expr {
    expr_on(ExprKind::Await(Box::new(inner)), line)
}

fn let_stmt(name: &str, init: Expr) -> Stmt {
    stmt(StmtKind::Var {
        kind: VarKind::Let,
        name: Pattern::Identifier {
            name: name.into(),
            default: None,
        },
        type_annotation: None,
        initializer: Some(init),
    })
}

fn expr_stmt(e: Expr) -> Stmt {
    stmt(StmtKind::Expression(e))
}

fn async_fn(name: &str, params: Vec<&str>, body: Vec<Stmt>) -> FunctionDecl {
    FunctionDecl {
        name: name.into(),
        type_params: vec![],
        params: params
            .into_iter()
            .map(|p| Param {
                pattern: Pattern::Identifier {
                    name: p.into(),
                    default: None,
                },
                type_annotation: None,
                optional: false,
                is_rest: false,
            })
            .collect(),
        return_type: None,
        body: Some(body),
        is_async: true,
        is_generator: false,
        span: Span::dummy(),
        line: 1,
    }
}

fn any_lookup(_: &str) -> TypeId {
    TypeId::ANY
}

#[test]
fn plain_functions_need_no_machine() {
    let mut func = async_fn("f", vec![], vec![]);
    func.is_async = false;
    assert!(analyze_function(&func, &any_lookup).is_none());
}

#[test]
fn suspension_points_get_sequential_state_ids() {
    // async function f() { await a; await b; await c; }
    let body = vec![
        expr_stmt(await_expr(variable("a"), 1)),
        expr_stmt(await_expr(variable("b"), 2)),
        expr_stmt(await_expr(variable("c"), 3)),
    ];
    let machine = analyze_function(&async_fn("f", vec![], body), &any_lookup).unwrap();
    assert_eq!(machine.state_count(), 3);
    let ids: Vec<u32> = machine.suspension_points.iter().map(|s| s.state_id).collect();
    assert_eq!(ids, vec![0, 1, 2]);
    assert_eq!(machine.result, ResultChannel::Promise);
    assert!(machine
        .suspension_points
        .iter()
        .all(|s| s.kind == SuspensionKind::Await));
}

#[test]
fn state_domain_is_initial_states_done() {
    let body = vec![
        expr_stmt(await_expr(variable("a"), 1)),
        expr_stmt(await_expr(variable("b"), 2)),
    ];
    let machine = analyze_function(&async_fn("f", vec![], body), &any_lookup).unwrap();
    assert_eq!(machine.state_domain(), vec![STATE_INITIAL, 0, 1, STATE_DONE]);
}

#[test]
fn variables_referenced_after_a_suspension_are_hoisted() {
    // async function f(x) { let y = x; await p; return y; }
    let body = vec![
        let_stmt("y", variable("x")),
        expr_stmt(await_expr(variable("p"), 2)),
        stmt(StmtKind::Return {
            value: Some(variable("y")),
        }),
    ];
    let machine = analyze_function(&async_fn("f", vec!["x"], body), &any_lookup).unwrap();
    assert!(machine.frame_slot("y").is_some());
    // x is never read after the await: it stays out of the frame.
    assert!(machine.frame_slot("x").is_none());
    assert_eq!(machine.suspension_points[0].live_across, vec!["y".to_string()]);
}

#[test]
fn loop_bodies_keep_their_variables_live_across_suspensions() {
    // async function f(items) { let acc = 0; while (cond) { acc = acc + await step; } }
    let add = expr(ExprKind::Binary {
        op: tsr_ast::BinaryOp::Add,
        left: Box::new(variable("acc")),
        right: Box::new(await_expr(variable("step"), 2)),
    });
    let assign_acc = expr_stmt(expr(ExprKind::Assign {
        target: Box::new(Pattern::Identifier {
            name: "acc".into(),
            default: None,
        }),
        value: Box::new(add),
    }));
    let body = vec![
        let_stmt("acc", expr(ExprKind::Literal(Literal::Number(0.0)))),
        stmt(StmtKind::While {
            condition: variable("cond"),
            body: Box::new(assign_acc),
        }),
    ];
    let machine = analyze_function(&async_fn("f", vec!["items"], body), &any_lookup).unwrap();
    // acc is read before the await in source order, but the loop-back makes
    // it live across the suspension.
    assert!(machine.frame_slot("acc").is_some());
}

#[test]
fn try_regions_record_where_suspensions_sit() {
    // async function f() { try { await a; } catch (e) { log(e); } finally { await b; } }
    let body = vec![stmt(StmtKind::TryCatch {
        try_block: vec![expr_stmt(await_expr(variable("a"), 2))],
        catch_clause: Some(CatchClause {
            binding: Some("e".into()),
            body: vec![expr_stmt(expr(ExprKind::Call {
                callee: Box::new(variable("log")),
                arguments: vec![variable("e")],
                type_args: vec![],
                optional: false,
            }))],
        }),
        finally_block: Some(vec![expr_stmt(await_expr(variable("b"), 4))]),
    })];
    let machine = analyze_function(&async_fn("f", vec![], body), &any_lookup).unwrap();

    assert_eq!(machine.try_regions.len(), 1);
    let region = &machine.try_regions[0];
    assert!(region.suspends_in_try);
    assert!(!region.suspends_in_catch);
    assert!(region.suspends_in_finally);

    let first = &machine.suspension_points[0];
    assert_eq!(first.try_region.unwrap().role, TryRole::Try);
    let second = &machine.suspension_points[1];
    assert_eq!(second.try_region.unwrap().role, TryRole::Finally);
}

#[test]
fn nested_try_marks_every_enclosing_region() {
    // try { try { await a; } finally {} } catch {}
    let inner = stmt(StmtKind::TryCatch {
        try_block: vec![expr_stmt(await_expr(variable("a"), 2))],
        catch_clause: None,
        finally_block: Some(vec![]),
    });
    let body = vec![stmt(StmtKind::TryCatch {
        try_block: vec![inner],
        catch_clause: Some(CatchClause {
            binding: None,
            body: vec![],
        }),
        finally_block: None,
    })];
    let machine = analyze_function(&async_fn("f", vec![], body), &any_lookup).unwrap();
    assert_eq!(machine.try_regions.len(), 2);
    // Outer region id 0, inner id 1; both try regions contain the await.
    assert!(machine.try_regions[0].suspends_in_try);
    assert!(machine.try_regions[1].suspends_in_try);
    assert_eq!(machine.try_regions[1].parent, Some(0));
    // The suspension's innermost region is the inner one.
    assert_eq!(
        machine.suspension_points[0].try_region.unwrap().region_id,
        1
    );
}

#[test]
fn this_reference_is_captured() {
    let body = vec![expr_stmt(await_expr(expr(ExprKind::This), 1))];
    let machine = analyze_function(&async_fn("f", vec![], body), &any_lookup).unwrap();
    assert!(machine.captures_this);
}

#[test]
fn nested_async_arrow_gets_its_own_machine_and_its_captures_hoist() {
    // async function f() {
    //   let shared = 1;
    //   await first;
    //   const g = async () => { await inner; use(shared); };
    // }
    let arrow = expr(ExprKind::ArrowFunction {
        params: vec![],
        body: vec![
            expr_stmt(await_expr(variable("inner"), 4)),
            expr_stmt(expr(ExprKind::Call {
                callee: Box::new(variable("use")),
                arguments: vec![variable("shared")],
                type_args: vec![],
                optional: false,
            })),
        ],
        is_expression_body: false,
        is_async: true,
    });
    let body = vec![
        let_stmt("shared", expr(ExprKind::Literal(Literal::Number(1.0)))),
        expr_stmt(await_expr(variable("first"), 3)),
        let_stmt("g", arrow),
    ];
    let machine = analyze_function(&async_fn("f", vec![], body), &any_lookup).unwrap();

    // The arrow's machine exists and has one state.
    assert_eq!(machine.nested.len(), 1);
    assert_eq!(machine.nested[0].state_count(), 1);
    // `shared` is captured by the arrow, so it survives f's own await even
    // though f never reads it after that point.
    assert!(machine.frame_slot("shared").is_some());
}

#[test]
fn generator_kind_selects_the_result_channel() {
    let yield_stmt = expr_stmt(expr(ExprKind::Yield {
        value: Some(Box::new(variable("v"))),
        delegate: false,
    }));

    let mut sync_gen = async_fn("g", vec![], vec![yield_stmt.clone()]);
    sync_gen.is_async = false;
    sync_gen.is_generator = true;
    let machine = analyze_function(&sync_gen, &any_lookup).unwrap();
    assert_eq!(machine.result, ResultChannel::Iterator);
    assert_eq!(
        machine.suspension_points[0].kind,
        SuspensionKind::Yield { delegate: false }
    );

    let mut async_gen = async_fn("h", vec![], vec![yield_stmt]);
    async_gen.is_generator = true;
    let machine = analyze_function(&async_gen, &any_lookup).unwrap();
    assert_eq!(machine.result, ResultChannel::AsyncIterator);
}

#[test]
fn frame_slots_are_typed_by_the_checker_lookup() {
    let body = vec![
        let_stmt("y", expr(ExprKind::Literal(Literal::String("s".into())))),
        expr_stmt(await_expr(variable("p"), 2)),
        stmt(StmtKind::Return {
            value: Some(variable("y")),
        }),
    ];
    let lookup = |name: &str| {
        if name == "y" {
            TypeId::STRING
        } else {
            TypeId::ANY
        }
    };
    let machine = analyze_function(&async_fn("f", vec![], body), &lookup).unwrap();
    assert_eq!(machine.frame_slot("y").unwrap().type_id, TypeId::STRING);
}
