use tsr_types::{
    resolve_call, CallArg, CallError, ClassInfo, FunctionShape, ParamInfo, TypeId, TypeInterner,
    TypeParamInfo,
};

fn sig(db: &TypeInterner, param: TypeId, ret: TypeId) -> FunctionShape {
    let _ = db;
    FunctionShape::new(vec![ParamInfo::required("x", param)], ret)
}

#[test]
fn plain_call_checks_arity_and_types() {
    let db = TypeInterner::new();
    let f = db.function(FunctionShape::new(
        vec![
            ParamInfo::required("a", TypeId::STRING),
            ParamInfo {
                name: Some("b".into()),
                type_id: TypeId::NUMBER,
                optional: true,
            },
        ],
        TypeId::BOOLEAN,
    ));

    let ok = resolve_call(&db, f, &[CallArg::positional(TypeId::STRING)], &[]);
    assert_eq!(ok, Ok(TypeId::BOOLEAN));

    let too_few = resolve_call(&db, f, &[], &[]);
    assert!(matches!(too_few, Err(CallError::ArityMismatch { min: 1, got: 0, .. })));

    let wrong_type = resolve_call(&db, f, &[CallArg::positional(TypeId::NUMBER)], &[]);
    assert!(matches!(wrong_type, Err(CallError::ArgumentMismatch { index: 0, .. })));
}

#[test]
fn rest_parameter_accepts_trailing_arguments() {
    let db = TypeInterner::new();
    let f = db.function(
        FunctionShape::new(
            vec![
                ParamInfo::required("first", TypeId::STRING),
                ParamInfo::required("rest", TypeId::NUMBER),
            ],
            TypeId::VOID,
        )
        .with_rest(),
    );
    let result = resolve_call(
        &db,
        f,
        &[
            CallArg::positional(TypeId::STRING),
            CallArg::positional(TypeId::NUMBER),
            CallArg::positional(TypeId::NUMBER),
        ],
        &[],
    );
    assert_eq!(result, Ok(TypeId::VOID));

    let bad_tail = resolve_call(
        &db,
        f,
        &[
            CallArg::positional(TypeId::STRING),
            CallArg::positional(TypeId::BOOLEAN),
        ],
        &[],
    );
    assert!(bad_tail.is_err());
}

#[test]
fn spread_argument_matches_rest_element() {
    let db = TypeInterner::new();
    let f = db.function(
        FunctionShape::new(vec![ParamInfo::required("xs", TypeId::NUMBER)], TypeId::VOID)
            .with_rest(),
    );
    assert_eq!(
        resolve_call(&db, f, &[CallArg::spread(TypeId::NUMBER)], &[]),
        Ok(TypeId::VOID)
    );
    assert!(resolve_call(&db, f, &[CallArg::spread(TypeId::STRING)], &[]).is_err());
}

#[test]
fn string_overload_beats_any_for_string_argument() {
    // f(x: string): 1; f(x: number): 2; f(x: any): 3;
    let db = TypeInterner::new();
    let one = db.number_literal(1.0);
    let two = db.number_literal(2.0);
    let three = db.number_literal(3.0);
    let f = db.overloaded(
        vec![
            sig(&db, TypeId::STRING, one),
            sig(&db, TypeId::NUMBER, two),
            sig(&db, TypeId::ANY, three),
        ],
        None,
    );

    let result = resolve_call(&db, f, &[CallArg::positional(db.string_literal("hi"))], &[]);
    assert_eq!(result, Ok(one));

    let result = resolve_call(&db, f, &[CallArg::positional(TypeId::NUMBER)], &[]);
    assert_eq!(result, Ok(two));

    let result = resolve_call(&db, f, &[CallArg::positional(TypeId::BOOLEAN)], &[]);
    assert_eq!(result, Ok(three));
}

#[test]
fn literal_overload_beats_primitive_overload() {
    let db = TypeInterner::new();
    let lit = db.string_literal("on");
    let a = db.number_literal(1.0);
    let b = db.number_literal(2.0);
    let f = db.overloaded(vec![sig(&db, TypeId::STRING, b), sig(&db, lit, a)], None);
    // Both signatures match "on"; the literal one is more specific even
    // though it is declared second.
    assert_eq!(
        resolve_call(&db, f, &[CallArg::positional(lit)], &[]),
        Ok(a)
    );
}

#[test]
fn derived_class_overload_beats_base_class_overload() {
    let db = TypeInterner::new();
    let animal = db.register_class(ClassInfo {
        name: "Animal".into(),
        superclass: None,
        type_params: vec![],
        members: vec![],
        statics: vec![],
        constructor: None,
    });
    let dog = db.register_class(ClassInfo {
        name: "Dog".into(),
        superclass: Some(animal),
        type_params: vec![],
        members: vec![],
        statics: vec![],
        constructor: None,
    });
    let base_ret = db.number_literal(1.0);
    let derived_ret = db.number_literal(2.0);
    let f = db.overloaded(
        vec![
            sig(&db, db.instance_type(animal), base_ret),
            sig(&db, db.instance_type(dog), derived_ret),
        ],
        None,
    );
    assert_eq!(
        resolve_call(&db, f, &[CallArg::positional(db.instance_type(dog))], &[]),
        Ok(derived_ret)
    );
    assert_eq!(
        resolve_call(&db, f, &[CallArg::positional(db.instance_type(animal))], &[]),
        Ok(base_ret)
    );
}

#[test]
fn no_matching_overload_reports_argument_types() {
    let db = TypeInterner::new();
    let f = db.overloaded(vec![sig(&db, TypeId::STRING, TypeId::VOID)], None);
    let result = resolve_call(&db, f, &[CallArg::positional(TypeId::BOOLEAN)], &[]);
    assert_eq!(
        result,
        Err(CallError::NoOverload {
            arg_types: vec![TypeId::BOOLEAN]
        })
    );
}

#[test]
fn generic_call_infers_from_arguments() {
    let db = TypeInterner::new();
    let t = db.type_var("T", None);
    let inner = db.function(FunctionShape::new(
        vec![ParamInfo::required("x", t)],
        db.array(t),
    ));
    let f = db.generic(
        vec![TypeParamInfo {
            name: "T".into(),
            constraint: None,
        }],
        inner,
    );
    let result = resolve_call(&db, f, &[CallArg::positional(TypeId::STRING)], &[]);
    assert_eq!(result, Ok(db.array(TypeId::STRING)));
}

#[test]
fn generic_call_honors_explicit_type_arguments() {
    let db = TypeInterner::new();
    let t = db.type_var("T", None);
    let inner = db.function(FunctionShape::new(vec![ParamInfo::required("x", t)], t));
    let f = db.generic(
        vec![TypeParamInfo {
            name: "T".into(),
            constraint: None,
        }],
        inner,
    );
    // f<string | number>(42)
    let arg_type = db.union(vec![TypeId::STRING, TypeId::NUMBER]);
    let result = resolve_call(&db, f, &[CallArg::positional(TypeId::NUMBER)], &[arg_type]);
    assert_eq!(result, Ok(arg_type));

    let wrong_count = resolve_call(
        &db,
        f,
        &[CallArg::positional(TypeId::NUMBER)],
        &[TypeId::STRING, TypeId::NUMBER],
    );
    assert!(matches!(
        wrong_count,
        Err(CallError::TypeArgumentCount { expected: 1, got: 2 })
    ));
}

#[test]
fn calling_a_non_function_is_an_error() {
    let db = TypeInterner::new();
    let result = resolve_call(&db, TypeId::STRING, &[], &[]);
    assert_eq!(result, Err(CallError::NotCallable(TypeId::STRING)));
    // any is callable and yields any.
    assert_eq!(resolve_call(&db, TypeId::ANY, &[], &[]), Ok(TypeId::ANY));
}
