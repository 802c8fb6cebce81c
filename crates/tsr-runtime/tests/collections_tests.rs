use tsr_runtime::value::{ArrayData, MapData, ObjectData, SetData};
use tsr_runtime::Value;

#[test]
fn map_set_get_has_delete_size() {
    // new Map([['x', 1], ['y', 2]]); m.set('x', 3)
    let map = MapData::default();
    let map = std::cell::RefCell::new(map);
    map.borrow_mut().set(Value::string("x"), Value::Number(1.0));
    map.borrow_mut().set(Value::string("y"), Value::Number(2.0));
    map.borrow_mut().set(Value::string("x"), Value::Number(3.0));

    assert_eq!(map.borrow().size(), 2);
    assert!(matches!(
        map.borrow().get(&Value::string("x")),
        Some(Value::Number(n)) if *n == 3.0
    ));
    assert!(map.borrow().has(&Value::string("y")));
    assert!(map.borrow_mut().delete(&Value::string("y")));
    assert_eq!(map.borrow().size(), 1);
    assert!(!map.borrow_mut().delete(&Value::string("y")));
}

#[test]
fn distinct_objects_with_identical_contents_never_collide() {
    let a = Value::Object(ObjectData::with_properties([(
        "k".to_string(),
        Value::Number(1.0),
    )]));
    let b = Value::Object(ObjectData::with_properties([(
        "k".to_string(),
        Value::Number(1.0),
    )]));

    let mut map = MapData::default();
    map.set(a.clone(), Value::string("first"));
    map.set(b.clone(), Value::string("second"));
    assert_eq!(map.size(), 2);
    assert!(matches!(
        map.get(&a),
        Some(Value::String(s)) if &**s == "first"
    ));
    assert!(matches!(
        map.get(&b),
        Some(Value::String(s)) if &**s == "second"
    ));
}

#[test]
fn nan_is_findable_as_a_map_key() {
    let mut map = MapData::default();
    map.set(Value::Number(f64::NAN), Value::string("found"));
    assert!(map.has(&Value::Number(f64::NAN)));
    assert!(matches!(
        map.get(&Value::Number(f64::NAN)),
        Some(Value::String(s)) if &**s == "found"
    ));
}

#[test]
fn set_constructed_from_array_copies_the_elements() {
    // const a = [1,2,3]; const s = new Set(a); a.push(1); s.size === 3
    let array = ArrayData::from_values([
        Value::Number(1.0),
        Value::Number(2.0),
        Value::Number(3.0),
    ]);
    let values: Vec<Value> = array
        .borrow()
        .elements
        .iter()
        .filter_map(|e| e.clone())
        .collect();
    let set = SetData::from_values(values);

    array.borrow_mut().elements.push(Some(Value::Number(1.0)));
    assert_eq!(set.borrow().size(), 3);
    assert!(set.borrow().has(&Value::Number(1.0)));
}

#[test]
fn set_deduplicates_by_the_equality_discipline() {
    let obj = Value::Object(ObjectData::with_properties([]));
    let set = SetData::from_values([
        obj.clone(),
        obj.clone(),
        Value::Number(0.0),
        Value::Number(-0.0),
        Value::Number(f64::NAN),
        Value::Number(f64::NAN),
    ]);
    // Same object twice, +0/-0 merged, NaN merged.
    assert_eq!(set.borrow().size(), 3);
}
