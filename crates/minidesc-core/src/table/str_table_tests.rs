use std::collections::HashMap;

use proptest::prelude::*;

use crate::{Arena, Cursor, StringTable, Value};

fn table_with(arena: &mut Arena, keys: &[&str]) -> StringTable {
    let mut table = StringTable::new();
    for (i, key) in keys.iter().enumerate() {
        table.insert(arena, key.as_bytes(), Value::from_u64(i as u64)).unwrap();
    }
    table
}

#[test]
fn insert_then_lookup() {
    let mut arena = Arena::new();
    let table = table_with(&mut arena, &["alpha", "beta", "gamma"]);

    assert_eq!(table.len(), 3);
    assert_eq!(table.lookup(&arena, b"beta"), Some(Value::from_u64(1)));
    assert_eq!(table.lookup(&arena, b"delta"), None);
}

#[test]
fn empty_key_is_distinct_from_absent() {
    let mut arena = Arena::new();
    let mut table = StringTable::new();
    assert_eq!(table.lookup(&arena, b""), None);

    table.insert(&mut arena, b"", Value::from_bool(true)).unwrap();

    assert_eq!(table.lookup(&arena, b""), Some(Value::from_bool(true)));
    assert_eq!(table.lookup(&arena, b"\0"), None);
}

#[test]
fn stored_key_has_length_prefix() {
    let mut arena = Arena::new();
    let mut table = StringTable::new();

    let key = table.insert(&mut arena, b"pkg.Message", Value::from_u32(3)).unwrap();

    assert_eq!(key.len(&arena), 11);
    assert_eq!(key.bytes(&arena), b"pkg.Message");
}

#[test]
fn presized_table_does_not_grow() {
    let mut arena = Arena::new();
    let mut table = StringTable::with_capacity(7);
    let capacity = table.capacity();

    for i in 0..7u32 {
        table.insert(&mut arena, format!("k{i}").as_bytes(), Value::from_u32(i)).unwrap();
    }

    assert_eq!(capacity, 16);
    assert_eq!(table.capacity(), 16);
}

#[test]
fn capacity_one_is_legal_and_grows() {
    let mut arena = Arena::new();
    let mut table = StringTable::new();
    assert_eq!(table.capacity(), 1);

    for i in 0..100u32 {
        table.insert(&mut arena, &i.to_le_bytes(), Value::from_u32(i)).unwrap();
    }

    assert_eq!(table.len(), 100);
    assert!(table.capacity() >= 128);
    for i in 0..100u32 {
        assert_eq!(table.lookup(&arena, &i.to_le_bytes()), Some(Value::from_u32(i)));
    }
}

#[test]
fn full_at_seven_eighths() {
    let mut arena = Arena::new();
    let mut table = StringTable::with_capacity(6);
    assert_eq!(table.capacity(), 8);

    for i in 0..7u32 {
        table.insert(&mut arena, &i.to_le_bytes(), Value::from_u32(i)).unwrap();
    }
    assert_eq!(table.capacity(), 8);

    table.insert(&mut arena, b"eighth", Value::from_u32(7)).unwrap();
    assert_eq!(table.capacity(), 16);
}

#[test]
fn remove_returns_value_and_keeps_others() {
    let mut arena = Arena::new();
    let names: Vec<String> = (0..40).map(|i| format!("name{i}")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let mut table = table_with(&mut arena, &refs);

    for i in (0..40).step_by(3) {
        assert_eq!(table.remove(&arena, names[i].as_bytes()), Some(Value::from_u64(i as u64)));
    }

    assert_eq!(table.remove(&arena, b"name0"), None);
    for (i, name) in names.iter().enumerate() {
        let expected = (i % 3 != 0).then(|| Value::from_u64(i as u64));
        assert_eq!(table.lookup(&arena, name.as_bytes()), expected);
    }
}

#[test]
fn replace_existing_only() {
    let mut arena = Arena::new();
    let mut table = table_with(&mut arena, &["a"]);

    assert!(table.replace(&arena, b"a", Value::from_i32(-1)));
    assert!(!table.replace(&arena, b"b", Value::from_i32(-1)));
    assert_eq!(table.lookup(&arena, b"a"), Some(Value::from_i32(-1)));
}

#[test]
fn explicit_resize_keeps_entries() {
    let mut arena = Arena::new();
    let mut table = table_with(&mut arena, &["x", "y", "z"]);
    let used = arena.space_allocated();

    table.resize(6);

    assert_eq!(table.capacity(), 64);
    assert_eq!(arena.space_allocated(), used);
    assert_eq!(table.lookup(&arena, b"z"), Some(Value::from_u64(2)));
}

#[test]
fn cursor_walk_visits_every_entry() {
    let mut arena = Arena::new();
    let table = table_with(&mut arena, &["a", "b", "c", "d"]);

    let mut cursor = Cursor::BEGIN;
    let mut seen = Vec::new();
    while let Some((key, value)) = table.next(&mut cursor) {
        seen.push((key.bytes(&arena).to_vec(), value.as_u64()));
    }
    seen.sort();

    assert_eq!(
        seen,
        vec![
            (b"a".to_vec(), 0),
            (b"b".to_vec(), 1),
            (b"c".to_vec(), 2),
            (b"d".to_vec(), 3)
        ]
    );
}

#[test]
fn remove_during_iteration() {
    let mut arena = Arena::new();
    let mut table = StringTable::with_capacity(4);
    for i in 0..60u64 {
        let key = if i % 2 == 0 { format!("drop.{i}") } else { format!("keep.{i}") };
        table.insert(&mut arena, key.as_bytes(), Value::from_u64(i)).unwrap();
    }

    let mut cursor = Cursor::BEGIN;
    while let Some((key, _)) = table.next(&mut cursor) {
        if key.bytes(&arena).starts_with(b"drop.") {
            table.remove_at(&mut cursor);
        }
    }

    assert_eq!(table.len(), 30);
    assert!(table.iter(&arena).all(|(k, v)| k.starts_with(b"keep.") && v.as_u64() % 2 == 1));
}

#[test]
fn insert_during_iteration() {
    let mut arena = Arena::new();
    let mut table = StringTable::with_capacity(60);
    let capacity = table.capacity();
    for i in 0..20u64 {
        table.insert(&mut arena, format!("old.{i}").as_bytes(), Value::from_u64(i)).unwrap();
    }

    let mut cursor = Cursor::BEGIN;
    let mut steps = 0usize;
    let mut inserted = 0;
    while let Some((key, value)) = table.next(&mut cursor) {
        steps += 1;
        assert_eq!(table.lookup(&arena, key.bytes(&arena)), Some(value));
        if inserted < 20 {
            inserted += 1;
            let key = format!("new.{inserted}");
            table.insert(&mut arena, key.as_bytes(), Value::from_u64(100 + inserted)).unwrap();
        }
    }

    // No growth happened, so every slot was scanned at most once.
    assert_eq!(table.capacity(), capacity);
    assert!(steps <= capacity);
    assert_eq!(table.len(), 20 + inserted as usize);
}

#[test]
fn growth_during_iteration_ends_the_walk() {
    let mut arena = Arena::new();
    let mut table = StringTable::with_capacity(6);
    for i in 0..7u32 {
        table.insert(&mut arena, &i.to_le_bytes(), Value::from_u32(i)).unwrap();
    }

    let mut cursor = Cursor::BEGIN;
    assert!(table.next(&mut cursor).is_some());
    table.insert(&mut arena, b"grow", Value::from_u32(7)).unwrap();
    assert_eq!(table.capacity(), 16);

    assert_eq!(table.next(&mut cursor), None);
    assert_eq!(table.remove_at(&mut cursor), None);
    assert_eq!(table.len(), 8);

    let mut cursor = Cursor::BEGIN;
    let mut count = 0;
    while table.next(&mut cursor).is_some() {
        count += 1;
    }
    assert_eq!(count, 8);
}

#[test]
fn cursor_after_shrinking_resize() {
    let mut arena = Arena::new();
    let names: Vec<String> = (0..40).map(|i| format!("name{i}")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let mut table = table_with(&mut arena, &refs);

    let mut cursor = Cursor::BEGIN;
    let mut last = None;
    while let Some((key, _)) = table.next(&mut cursor) {
        last = Some(key.bytes(&arena).to_vec());
    }
    // The finished walk leaves the cursor on the last occupied slot.
    let last = last.unwrap();
    for name in &names {
        if name.as_bytes() != last.as_slice() {
            table.remove(&arena, name.as_bytes()).unwrap();
        }
    }

    table.resize(1);

    assert_eq!(table.remove_at(&mut cursor), None);
    assert_eq!(table.next(&mut cursor), None);
    assert_eq!(table.len(), 1);
    assert!(table.lookup(&arena, &last).is_some());
}

#[derive(Debug, Clone)]
enum Op {
    Insert(u8, u32),
    Remove(u8),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..32, any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        (0u8..32).prop_map(Op::Remove),
    ]
}

proptest! {
    #[test]
    fn behaves_like_a_map(ops in proptest::collection::vec(op(), 1..200), seed in any::<u64>()) {
        let mut arena = Arena::new();
        let mut table = StringTable::with_seed(0, seed);
        let mut model: HashMap<Vec<u8>, u32> = HashMap::new();

        for op in ops {
            match op {
                Op::Insert(k, v) => {
                    let key = vec![b'k'; k as usize];
                    if model.insert(key.clone(), v).is_some() {
                        prop_assert!(table.replace(&arena, &key, Value::from_u32(v)));
                    } else {
                        table.insert(&mut arena, &key, Value::from_u32(v)).unwrap();
                    }
                }
                Op::Remove(k) => {
                    let key = vec![b'k'; k as usize];
                    let expected = model.remove(&key).map(Value::from_u32);
                    prop_assert_eq!(table.remove(&arena, &key), expected);
                }
            }
        }

        prop_assert_eq!(table.len(), model.len());
        for (key, v) in &model {
            prop_assert_eq!(table.lookup(&arena, key), Some(Value::from_u32(*v)));
        }
    }

    #[test]
    fn cursor_survives_interleaved_mutation(
        steps in proptest::collection::vec(walk_step(), 1..300),
        seed in any::<u64>(),
    ) {
        let mut arena = Arena::new();
        let mut table = StringTable::with_seed(0, seed);
        let mut model: HashMap<Vec<u8>, u32> = HashMap::new();
        let mut cursor = Cursor::BEGIN;

        for step in steps {
            match step {
                Walk::Next => match table.next(&mut cursor) {
                    Some((key, value)) => {
                        let live = model.get(key.bytes(&arena)).copied().map(Value::from_u32);
                        prop_assert_eq!(live, Some(value));
                    }
                    None => cursor = Cursor::BEGIN,
                },
                Walk::Insert(k) => {
                    let key = vec![b'k'; k as usize];
                    if !model.contains_key(&key) {
                        model.insert(key.clone(), k as u32);
                        table.insert(&mut arena, &key, Value::from_u32(k as u32)).unwrap();
                    }
                }
                Walk::RemoveAt => {
                    if let Some((key, value)) = table.remove_at(&mut cursor) {
                        let live = model.remove(key.bytes(&arena)).map(Value::from_u32);
                        prop_assert_eq!(live, Some(value));
                    }
                }
                Walk::Resize(extra) => {
                    let lg2 = crate::utils::log2_ceil(table.len() as u64 + 1) as u8 + extra;
                    table.resize(lg2);
                }
            }
        }

        prop_assert_eq!(table.len(), model.len());
        for (key, v) in &model {
            prop_assert_eq!(table.lookup(&arena, key), Some(Value::from_u32(*v)));
        }
    }
}

#[derive(Debug, Clone)]
enum Walk {
    Next,
    Insert(u8),
    RemoveAt,
    Resize(u8),
}

fn walk_step() -> impl Strategy<Value = Walk> {
    prop_oneof![
        4 => Just(Walk::Next),
        3 => (0u8..48).prop_map(Walk::Insert),
        2 => Just(Walk::RemoveAt),
        1 => (0u8..3).prop_map(Walk::Resize),
    ]
}
