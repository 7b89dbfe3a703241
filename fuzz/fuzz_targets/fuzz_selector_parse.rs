#![no_main]

use libfuzzer_sys::fuzz_target;
use weft_core::{PathNode, Selector};

fuzz_target!(|data: &[u8]| {
    let Ok(src) = std::str::from_utf8(data) else {
        return;
    };
    if src.len() > 512 {
        return;
    }

    let Ok(selector) = Selector::parse(src) else {
        return;
    };

    let path = [
        PathNode::new("span").with_class("label"),
        PathNode::new("li").with_id("first").with_class("item").with_class("active"),
        PathNode::new("div").with_flag("list"),
    ];
    // A match index always points into the path.
    if let Some(i) = selector.first_match(&path) {
        assert!(i < path.len());
        assert!(selector.matches(&path[i]));
    }
});
