//! Property-based tests for the config pipeline.
//!
//! 1. A value outside the legal set never changes what `get` returns.
//! 2. After-hooks fire once per stored change, in call order, with the
//!    correct (new, old) pair.

use proptest::prelude::*;
use std::sync::LazyLock;
use weft_core::config::initialize;
use weft_core::{ConfigDescriptor, ConfigSchema, ConfigStore, ConfigValue, Configurable, Result};

struct Knob {
    config: ConfigStore<Knob>,
    changes: Vec<(i64, i64)>,
}

impl Configurable for Knob {
    fn config(&self) -> &ConfigStore<Self> {
        &self.config
    }
    fn config_mut(&mut self) -> &mut ConfigStore<Self> {
        &mut self.config
    }
}

fn record(knob: &mut Knob, new: &ConfigValue, old: Option<&ConfigValue>) -> Result<()> {
    let old = old.and_then(ConfigValue::as_int).unwrap_or(-1);
    knob.changes.push((new.as_int().unwrap_or(-1), old));
    Ok(())
}

static SCHEMA: LazyLock<ConfigSchema<Knob>> = LazyLock::new(|| {
    ConfigSchema::builder("Knob")
        .declare(ConfigDescriptor::new("size", "m").legal_values(["s", "m", "l"]))
        .declare(ConfigDescriptor::new("level", 0).after_set(record))
        .build()
});

fn knob() -> Knob {
    let mut k = Knob {
        config: ConfigStore::new(&SCHEMA, "knob"),
        changes: Vec::new(),
    };
    initialize(&mut k, Vec::<(&str, ConfigValue)>::new()).unwrap();
    k
}

// ── Strategies ────────────────────────────────────────────────────────────

fn size_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("s"),
        Just("m"),
        Just("l"),
        Just("xl"),
        Just(""),
        Just("M"),
    ]
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Legal-set enforcement
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn illegal_values_never_stick(sizes in proptest::collection::vec(size_strategy(), 1..30)) {
        let mut k = knob();
        let mut expected = "m";
        for size in sizes {
            let outcome = k.set_config("size", size).unwrap();
            if ["s", "m", "l"].contains(&size) {
                prop_assert!(!outcome.is_rejected());
                expected = size;
            } else {
                prop_assert!(outcome.is_rejected());
            }
            prop_assert_eq!(k.get_config("size").unwrap(), ConfigValue::from(expected));
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. After-hook ordering
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn after_hooks_see_each_change_in_order(levels in proptest::collection::vec(0i64..5, 1..30)) {
        let mut k = knob();
        let mut expected = Vec::new();
        let mut current = 0;
        for level in levels {
            k.set_config("level", level).unwrap();
            if level != current {
                expected.push((level, current));
                current = level;
            }
        }
        prop_assert_eq!(&k.changes, &expected);
    }
}
