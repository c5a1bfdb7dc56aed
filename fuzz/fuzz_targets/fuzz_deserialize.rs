// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::sync::OnceLock;
use tagged_family::Expected;
use tagged_family_expr::Expressions;

fn expressions() -> &'static Expressions {
    static EXPRESSIONS: OnceLock<Expressions> = OnceLock::new();
    EXPRESSIONS.get_or_init(|| Expressions::new().expect("declare expression family"))
}

fuzz_target!(|data: &[u8]| {
    let Ok(json) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let expressions = expressions();

    // Structural decode
    let _ = expressions
        .registry()
        .deserialize(&json, Expected::Family("Expression"));

    // Typed decode; anything accepted must serialize back to the same value
    if let Ok(expr) = expressions.deserialize(&json) {
        let again = expressions.serialize(&*expr).expect("re-serialize decoded value");
        let reparsed = expressions.deserialize(&again).expect("decode re-serialized value");
        assert_eq!(expr.to_string(), reparsed.to_string());
    }
});
