use tsr_types::{ClassInfo, NarrowingContext, TypeId, TypeInterner};

#[test]
fn typeof_string_splits_a_union() {
    let db = TypeInterner::new();
    let narrowing = NarrowingContext::new(&db);
    let u = db.union(vec![TypeId::STRING, TypeId::NUMBER]);
    assert_eq!(narrowing.narrow_by_typeof(u, "string", true), TypeId::STRING);
    assert_eq!(narrowing.narrow_by_typeof(u, "string", false), TypeId::NUMBER);
}

#[test]
fn typeof_refines_unknown_on_the_true_edge() {
    let db = TypeInterner::new();
    let narrowing = NarrowingContext::new(&db);
    assert_eq!(
        narrowing.narrow_by_typeof(TypeId::UNKNOWN, "number", true),
        TypeId::NUMBER
    );
}

#[test]
fn nullish_guard_keeps_null_and_undefined_on_true() {
    let db = TypeInterner::new();
    let narrowing = NarrowingContext::new(&db);
    let u = db.union(vec![TypeId::STRING, TypeId::NULL, TypeId::UNDEFINED]);
    assert_eq!(
        narrowing.narrow_by_nullish(u, true),
        db.union(vec![TypeId::NULL, TypeId::UNDEFINED])
    );
    assert_eq!(narrowing.narrow_by_nullish(u, false), TypeId::STRING);
}

#[test]
fn instanceof_narrows_to_matching_instances() {
    let db = TypeInterner::new();
    let narrowing = NarrowingContext::new(&db);
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
    let u = db.union(vec![db.instance_type(dog), TypeId::STRING]);
    // Dog is an Animal, so `x instanceof Animal` keeps it.
    assert_eq!(
        narrowing.narrow_by_instanceof(u, animal, true),
        db.instance_type(dog)
    );
    assert_eq!(narrowing.narrow_by_instanceof(u, animal, false), TypeId::STRING);
}

#[test]
fn truthiness_removes_falsy_members_on_true_only() {
    let db = TypeInterner::new();
    let narrowing = NarrowingContext::new(&db);
    let u = db.union(vec![
        TypeId::STRING,
        TypeId::NULL,
        TypeId::UNDEFINED,
        db.number_literal(0.0),
        db.string_literal(""),
        db.boolean_literal(false),
    ]);
    assert_eq!(narrowing.narrow_truthy(u, true), TypeId::STRING);
    // The false edge cannot conclude anything: a falsy string is a string.
    assert_eq!(narrowing.narrow_truthy(u, false), u);
}

#[test]
fn literal_guard_narrows_and_excludes() {
    let db = TypeInterner::new();
    let narrowing = NarrowingContext::new(&db);
    let a = db.string_literal("a");
    let b = db.string_literal("b");
    let u = db.union(vec![a, b]);
    assert_eq!(narrowing.narrow_by_literal(u, a, true), a);
    assert_eq!(narrowing.narrow_by_literal(u, a, false), b);
}

#[test]
fn narrowing_is_idempotent() {
    let db = TypeInterner::new();
    let narrowing = NarrowingContext::new(&db);
    let u = db.union(vec![TypeId::STRING, TypeId::NUMBER, TypeId::NULL]);
    let once = narrowing.narrow_by_typeof(u, "string", true);
    let twice = narrowing.narrow_by_typeof(once, "string", true);
    assert_eq!(once, twice);
}

#[test]
fn assignment_is_a_killing_definition_except_for_any() {
    let db = TypeInterner::new();
    let narrowing = NarrowingContext::new(&db);
    let declared = db.union(vec![TypeId::STRING, TypeId::NUMBER]);
    assert_eq!(
        narrowing.narrow_by_assignment(declared, TypeId::STRING),
        TypeId::STRING
    );
    // any absorbs assignments.
    assert_eq!(
        narrowing.narrow_by_assignment(TypeId::ANY, TypeId::STRING),
        TypeId::ANY
    );
}
