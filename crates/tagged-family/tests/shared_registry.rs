// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Registration concurrent with decoding.

use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tagged_family::{DecodeError, Expected, PrimitiveKind, SharedRegistry, TypeBuilder};

fn shared() -> SharedRegistry {
    let _ = env_logger::try_init();
    let shared = SharedRegistry::default();
    shared.register_family("Expression").unwrap();
    shared
        .declare(
            TypeBuilder::new("Value")
                .member_of("Expression")
                .field("value", PrimitiveKind::Number),
        )
        .unwrap();
    shared
        .declare(
            TypeBuilder::new("Add")
                .member_of("Expression")
                .family_field("left", "Expression")
                .family_field("right", "Expression"),
        )
        .unwrap();
    shared
}

#[test]
fn readers_never_see_partial_registration() {
    let shared = shared();
    let done = Arc::new(AtomicBool::new(false));
    let input = json!({
        "left": {"value": 1, "type": "Value"},
        "right": {"operand": {"value": 2, "type": "Value"}, "type": "Negate"},
        "type": "Add"
    });

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let shared = shared.clone();
            let done = Arc::clone(&done);
            let input = input.clone();
            thread::spawn(move || {
                let mut accepted = 0usize;
                while !done.load(Ordering::Acquire) {
                    let snapshot = shared.snapshot();
                    let known = snapshot.family("Expression").unwrap().serializer_for_tag("Negate");
                    match snapshot.deserialize(&input, Expected::Family("Expression")) {
                        Ok(_) => {
                            // Once Negate is a member, Add must accept it too.
                            assert!(known.is_some());
                            accepted += 1;
                        }
                        Err(DecodeError::UnknownVariant { tag, .. }) => {
                            assert_eq!(tag, "Negate");
                            assert!(known.is_none());
                        }
                        Err(other) => panic!("unexpected error: {other}"),
                    }
                }
                accepted
            })
        })
        .collect();

    thread::sleep(std::time::Duration::from_millis(5));
    shared
        .declare(
            TypeBuilder::new("Negate")
                .member_of("Expression")
                .family_field("operand", "Expression"),
        )
        .unwrap();
    thread::sleep(std::time::Duration::from_millis(5));
    done.store(true, Ordering::Release);

    for reader in readers {
        reader.join().unwrap();
    }
    assert!(shared
        .deserialize(&input, Expected::Family("Expression"))
        .is_ok());
}

#[test]
fn concurrent_writers_all_land() {
    let shared = shared();
    let writers: Vec<_> = (0..8)
        .map(|i| {
            let shared = shared.clone();
            thread::spawn(move || {
                shared
                    .declare(
                        TypeBuilder::new(format!("Op{i}"))
                            .member_of("Expression")
                            .family_field("arg", "Expression"),
                    )
                    .unwrap();
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    let snapshot = shared.snapshot();
    let family = snapshot.family("Expression").unwrap();
    assert_eq!(family.members().len(), 10);
    let union = snapshot.schema_of("Add").unwrap().fields[0].resolved.union().unwrap().clone();
    assert_eq!(union.len(), 10);
    for i in 0..8 {
        let schema = snapshot.schema_of(&format!("Op{i}")).unwrap();
        assert_eq!(schema.fields[0].resolved.union().unwrap().len(), 10);
    }
}
