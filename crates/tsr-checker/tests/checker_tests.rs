//! End-to-end checking over hand-built trees.

use tsr_ast::expr::{Expr, ExprKind, Literal};
use tsr_ast::pattern::{ArrayElement, ObjectPatternProperty, Pattern};
use tsr_ast::stmt::{FunctionDecl, Param, Stmt, StmtKind, VarKind};
use tsr_ast::type_node::TypeNode;
use tsr_ast::SourceFile;
use tsr_checker::{check_module, expr::check_expr, CheckerContext};
use tsr_common::diagnostics::codes;
use tsr_common::Span;
use tsr_types::{TypeId, TypeInterner, TypeKind};

fn expr(kind: ExprKind) -> Expr {
    Expr::new(kind, Span::dummy(), 1)
}

fn stmt(kind: StmtKind) -> Stmt {
    Stmt::new(kind, Span::dummy(), 1)
}

fn ident_pattern(name: &str) -> Pattern {
    Pattern::Identifier {
        name: name.into(),
        default: None,
    }
}

fn number(n: f64) -> Expr {
    expr(ExprKind::Literal(Literal::Number(n)))
}

fn string_lit(s: &str) -> Expr {
    expr(ExprKind::Literal(Literal::String(s.into())))
}

fn var_stmt(kind: VarKind, name: &str, annotation: Option<TypeNode>, init: Option<Expr>) -> Stmt {
    stmt(StmtKind::Var {
        kind,
        name: ident_pattern(name),
        type_annotation: annotation,
        initializer: init,
    })
}

fn param(name: &str, annotation: TypeNode) -> Param {
    Param {
        pattern: ident_pattern(name),
        type_annotation: Some(annotation),
        optional: false,
        is_rest: false,
    }
}

fn signature(name: &str, params: Vec<Param>, return_type: TypeNode) -> FunctionDecl {
    FunctionDecl {
        name: name.into(),
        type_params: vec![],
        params,
        return_type: Some(return_type),
        body: None,
        is_async: false,
        is_generator: false,
        span: Span::dummy(),
        line: 1,
    }
}

#[test]
fn unknown_identifier_is_reported() {
    let file = SourceFile::new(
        "test.ts".into(),
        vec![stmt(StmtKind::Expression(expr(ExprKind::Variable(
            "missing".into(),
        ))))],
    );
    let db = TypeInterner::new();
    let diagnostics = check_module(&db, &file);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, codes::UNKNOWN_IDENTIFIER);
    assert!(diagnostics[0].message_text.contains("missing"));
}

#[test]
fn annotated_initializer_mismatch_is_reported() {
    // let x: string = 42;
    let file = SourceFile::new(
        "test.ts".into(),
        vec![var_stmt(
            VarKind::Let,
            "x",
            Some(TypeNode::named("string")),
            Some(number(42.0)),
        )],
    );
    let db = TypeInterner::new();
    let diagnostics = check_module(&db, &file);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, codes::TYPE_NOT_ASSIGNABLE);
}

#[test]
fn let_widens_literals_and_const_keeps_them() {
    let db = TypeInterner::new();
    let mut ctx = CheckerContext::new(&db, "test.ts".into());
    tsr_checker::statements::check_stmt(
        &mut ctx,
        &var_stmt(VarKind::Let, "a", None, Some(number(1.0))),
    );
    tsr_checker::statements::check_stmt(
        &mut ctx,
        &var_stmt(VarKind::Const, "b", None, Some(number(1.0))),
    );
    assert_eq!(ctx.lookup_type("a"), Some(TypeId::NUMBER));
    assert_eq!(ctx.lookup_type("b"), Some(db.number_literal(1.0)));
}

#[test]
fn array_literal_checks_positionally_against_tuple_annotation() {
    // let pair: [string, number] = ["a", "b"];  -- second element mismatches
    let annotation = TypeNode::Tuple {
        elements: vec![TypeNode::named("string"), TypeNode::named("number")],
        rest_index: None,
    };
    let init = expr(ExprKind::ArrayLiteral {
        elements: vec![string_lit("a"), string_lit("b")],
    });
    let file = SourceFile::new(
        "test.ts".into(),
        vec![var_stmt(VarKind::Let, "pair", Some(annotation), Some(init))],
    );
    let db = TypeInterner::new();
    let diagnostics = check_module(&db, &file);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, codes::TYPE_NOT_ASSIGNABLE);

    // And the well-typed version is clean.
    let annotation = TypeNode::Tuple {
        elements: vec![TypeNode::named("string"), TypeNode::named("number")],
        rest_index: None,
    };
    let init = expr(ExprKind::ArrayLiteral {
        elements: vec![string_lit("a"), number(2.0)],
    });
    let file = SourceFile::new(
        "test.ts".into(),
        vec![var_stmt(VarKind::Let, "pair", Some(annotation), Some(init))],
    );
    assert!(check_module(&TypeInterner::new(), &file).is_empty());
}

#[test]
fn overloaded_call_picks_the_literal_return_of_the_specific_signature() {
    // f(x: string): 1; f(x: number): 2; f(x: any): 3; f("hi") -> 1
    let db = TypeInterner::new();
    let mut ctx = CheckerContext::new(&db, "test.ts".into());
    let decls = vec![
        stmt(StmtKind::Function(signature(
            "f",
            vec![param("x", TypeNode::named("string"))],
            TypeNode::NumberLiteral(1.0),
        ))),
        stmt(StmtKind::Function(signature(
            "f",
            vec![param("x", TypeNode::named("number"))],
            TypeNode::NumberLiteral(2.0),
        ))),
        stmt(StmtKind::Function(signature(
            "f",
            vec![param("x", TypeNode::named("any"))],
            TypeNode::NumberLiteral(3.0),
        ))),
    ];
    tsr_checker::declarations::hoist_declarations(&mut ctx, &decls);

    let call = expr(ExprKind::Call {
        callee: Box::new(expr(ExprKind::Variable("f".into()))),
        arguments: vec![string_lit("hi")],
        type_args: vec![],
        optional: false,
    });
    let result = check_expr(&mut ctx, &call, None);
    assert_eq!(result, db.number_literal(1.0));
    assert!(ctx.diagnostics().is_empty());

    let call = expr(ExprKind::Call {
        callee: Box::new(expr(ExprKind::Variable("f".into()))),
        arguments: vec![expr(ExprKind::Literal(Literal::Boolean(true)))],
        type_args: vec![],
        optional: false,
    });
    let result = check_expr(&mut ctx, &call, None);
    assert_eq!(result, db.number_literal(3.0));
}

#[test]
fn object_destructuring_binds_named_fields_and_rest_excludes_them() {
    // const {a, b, ...r} = x  where x: {a: number, b: number, c: number, d: number}
    let db = TypeInterner::new();
    let mut ctx = CheckerContext::new(&db, "test.ts".into());
    let source = db.object(vec![
        tsr_types::PropertyInfo::new("a", TypeId::NUMBER),
        tsr_types::PropertyInfo::new("b", TypeId::NUMBER),
        tsr_types::PropertyInfo::new("c", TypeId::NUMBER),
        tsr_types::PropertyInfo::new("d", TypeId::STRING),
    ]);
    ctx.declare("x", source, true);

    let pattern = Pattern::Object {
        properties: vec![
            ObjectPatternProperty::Named {
                key: "a".into(),
                value: ident_pattern("a"),
                default: None,
            },
            ObjectPatternProperty::Named {
                key: "b".into(),
                value: ident_pattern("b"),
                default: None,
            },
            ObjectPatternProperty::Rest { name: "r".into() },
        ],
    };
    tsr_checker::destructuring::bind_pattern(&mut ctx, &pattern, source, true);

    assert_eq!(ctx.lookup_type("a"), Some(TypeId::NUMBER));
    assert_eq!(ctx.lookup_type("b"), Some(TypeId::NUMBER));
    let rest = ctx.lookup_type("r").unwrap();
    match db.lookup(rest) {
        TypeKind::Record(fields) => {
            let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
            assert_eq!(names, vec!["c", "d"]);
        }
        other => panic!("expected record, got {other:?}"),
    }
}

#[test]
fn empty_array_destructured_with_rest_binds_an_empty_tail() {
    let db = TypeInterner::new();
    let mut ctx = CheckerContext::new(&db, "test.ts".into());
    let empty_tuple = db.tuple(vec![]);
    let pattern = Pattern::Array {
        elements: vec![ArrayElement::Pattern(Pattern::Rest { name: "rest".into() })],
    };
    tsr_checker::destructuring::bind_pattern(&mut ctx, &pattern, empty_tuple, true);
    assert_eq!(ctx.lookup_type("rest"), Some(db.tuple(vec![])));
}

#[test]
fn function_body_return_type_is_checked_against_annotation() {
    // function f(): string { return 42; }
    let func = FunctionDecl {
        name: "f".into(),
        type_params: vec![],
        params: vec![],
        return_type: Some(TypeNode::named("string")),
        body: Some(vec![stmt(StmtKind::Return {
            value: Some(number(42.0)),
        })]),
        is_async: false,
        is_generator: false,
        span: Span::dummy(),
        line: 1,
    };
    let file = SourceFile::new("test.ts".into(), vec![stmt(StmtKind::Function(func))]);
    let db = TypeInterner::new();
    let diagnostics = check_module(&db, &file);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, codes::TYPE_NOT_ASSIGNABLE);
}

#[test]
fn await_outside_async_is_reported() {
    let file = SourceFile::new(
        "test.ts".into(),
        vec![
            var_stmt(VarKind::Const, "p", None, Some(number(1.0))),
            stmt(StmtKind::Expression(expr(ExprKind::Await(Box::new(expr(
                ExprKind::Variable("p".into()),
            )))))),
        ],
    );
    let db = TypeInterner::new();
    let diagnostics = check_module(&db, &file);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, codes::AWAIT_OUTSIDE_ASYNC);
}

#[test]
fn diagnostics_accumulate_rather_than_stopping_at_the_first() {
    let file = SourceFile::new(
        "test.ts".into(),
        vec![
            stmt(StmtKind::Expression(expr(ExprKind::Variable("a".into())))),
            stmt(StmtKind::Expression(expr(ExprKind::Variable("b".into())))),
            var_stmt(
                VarKind::Let,
                "x",
                Some(TypeNode::named("number")),
                Some(string_lit("nope")),
            ),
        ],
    );
    let db = TypeInterner::new();
    let diagnostics = check_module(&db, &file);
    assert_eq!(diagnostics.len(), 3);
}
