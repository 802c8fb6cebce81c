use tsr_types::{
    is_compatible, ClassInfo, FunctionShape, ParamInfo, PropertyInfo, TypeId, TypeInterner,
};

fn make_animal_and_dog(db: &TypeInterner) -> (TypeId, TypeId) {
    let animal = db.register_class(ClassInfo {
        name: "Animal".into(),
        superclass: None,
        type_params: vec![],
        members: vec![PropertyInfo::new("name", TypeId::STRING)],
        statics: vec![],
        constructor: None,
    });
    let dog = db.register_class(ClassInfo {
        name: "Dog".into(),
        superclass: Some(animal),
        type_params: vec![],
        members: vec![PropertyInfo::new("breed", TypeId::STRING)],
        statics: vec![],
        constructor: None,
    });
    (db.instance_type(animal), db.instance_type(dog))
}

#[test]
fn any_is_compatible_both_ways_with_everything() {
    let db = TypeInterner::new();
    let samples = [
        TypeId::STRING,
        TypeId::NUMBER,
        TypeId::NULL,
        db.array(TypeId::BOOLEAN),
        db.union(vec![TypeId::STRING, TypeId::NUMBER]),
        db.string_literal("x"),
    ];
    for t in samples {
        assert!(is_compatible(&db, TypeId::ANY, t), "any <- {}", db.display(t));
        assert!(is_compatible(&db, t, TypeId::ANY), "{} <- any", db.display(t));
    }
}

#[test]
fn every_type_is_compatible_with_itself() {
    let db = TypeInterner::new();
    let (animal, dog) = make_animal_and_dog(&db);
    let samples = [
        TypeId::STRING,
        TypeId::UNDEFINED,
        db.number_literal(42.0),
        db.tuple(vec![TypeId::STRING, TypeId::NUMBER]),
        db.object(vec![PropertyInfo::new("a", TypeId::NUMBER)]),
        animal,
        dog,
    ];
    for t in samples {
        assert!(is_compatible(&db, t, t), "{} <- itself", db.display(t));
    }
}

#[test]
fn union_expected_admits_each_member_and_nothing_else() {
    let db = TypeInterner::new();
    let u = db.union(vec![TypeId::STRING, TypeId::NUMBER]);
    assert!(is_compatible(&db, u, TypeId::STRING));
    assert!(is_compatible(&db, u, TypeId::NUMBER));
    assert!(is_compatible(&db, u, db.string_literal("hi")));
    assert!(!is_compatible(&db, u, TypeId::BOOLEAN));
}

#[test]
fn union_actual_requires_every_member_to_fit() {
    let db = TypeInterner::new();
    let string_or_number = db.union(vec![TypeId::STRING, TypeId::NUMBER]);
    let string_or_null = db.union(vec![TypeId::STRING, TypeId::NULL]);
    // string | number into string | number | null: fine.
    let wide = db.union(vec![TypeId::STRING, TypeId::NUMBER, TypeId::NULL]);
    assert!(is_compatible(&db, wide, string_or_number));
    // string | null into string | number: null has no home.
    assert!(!is_compatible(&db, string_or_number, string_or_null));
}

#[test]
fn literal_actual_fits_its_primitive() {
    let db = TypeInterner::new();
    assert!(is_compatible(&db, TypeId::STRING, db.string_literal("a")));
    assert!(is_compatible(&db, TypeId::NUMBER, db.number_literal(1.5)));
    assert!(is_compatible(&db, TypeId::BOOLEAN, db.boolean_literal(true)));
    // Not the other way around.
    assert!(!is_compatible(&db, db.string_literal("a"), TypeId::STRING));
}

#[test]
fn instances_are_nominal_through_the_superclass_chain() {
    let db = TypeInterner::new();
    let (animal, dog) = make_animal_and_dog(&db);
    assert!(is_compatible(&db, animal, dog));
    assert!(!is_compatible(&db, dog, animal));
}

#[test]
fn fixed_tuples_match_elementwise() {
    let db = TypeInterner::new();
    let expected = db.tuple(vec![TypeId::STRING, TypeId::NUMBER]);
    assert!(is_compatible(
        &db,
        expected,
        db.tuple(vec![db.string_literal("x"), db.number_literal(1.0)])
    ));
    assert!(!is_compatible(&db, expected, db.tuple(vec![TypeId::STRING])));
    assert!(!is_compatible(
        &db,
        expected,
        db.tuple(vec![TypeId::STRING, TypeId::BOOLEAN])
    ));
}

#[test]
fn rest_tuple_admits_longer_actuals_with_matching_tail() {
    let db = TypeInterner::new();
    // [string, ...number[]]
    let expected = db.tuple_with_rest(vec![TypeId::STRING, TypeId::NUMBER], 1);
    assert!(is_compatible(&db, expected, db.tuple(vec![TypeId::STRING])));
    assert!(is_compatible(
        &db,
        expected,
        db.tuple(vec![TypeId::STRING, TypeId::NUMBER, TypeId::NUMBER])
    ));
    assert!(!is_compatible(
        &db,
        expected,
        db.tuple(vec![TypeId::STRING, TypeId::NUMBER, TypeId::BOOLEAN])
    ));
}

#[test]
fn records_use_width_subtyping() {
    let db = TypeInterner::new();
    let expected = db.object(vec![PropertyInfo::new("a", TypeId::NUMBER)]);
    let wider = db.object(vec![
        PropertyInfo::new("a", TypeId::NUMBER),
        PropertyInfo::new("b", TypeId::STRING),
    ]);
    assert!(is_compatible(&db, expected, wider));
    assert!(!is_compatible(&db, wider, expected));
}

#[test]
fn optional_fields_may_be_absent() {
    let db = TypeInterner::new();
    let expected = db.object(vec![
        PropertyInfo::new("a", TypeId::NUMBER),
        PropertyInfo {
            name: "b".into(),
            type_id: TypeId::STRING,
            optional: true,
            readonly: false,
        },
    ]);
    let actual = db.object(vec![PropertyInfo::new("a", TypeId::NUMBER)]);
    assert!(is_compatible(&db, expected, actual));
}

#[test]
fn function_compat_respects_arity() {
    let db = TypeInterner::new();
    let unary = db.function(FunctionShape::new(
        vec![ParamInfo::required("x", TypeId::NUMBER)],
        TypeId::VOID,
    ));
    let binary = db.function(FunctionShape::new(
        vec![
            ParamInfo::required("x", TypeId::NUMBER),
            ParamInfo::required("y", TypeId::NUMBER),
        ],
        TypeId::VOID,
    ));
    // A callback taking fewer parameters is fine; more required ones is not.
    assert!(is_compatible(&db, binary, unary));
    assert!(!is_compatible(&db, unary, binary));
}
