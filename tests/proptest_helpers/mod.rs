#![allow(dead_code)]

use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(256);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// A single path segment as it may appear in a zip entry name.
pub fn arb_segment() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[A-Za-z0-9_ .-]{1,12}",
        2 => Just("..".to_string()),
        1 => Just(".".to_string()),
    ]
}

/// Entry names built from segments, optionally rooted.
pub fn arb_entry_name() -> impl Strategy<Value = String> {
    (any::<bool>(), prop::collection::vec(arb_segment(), 1..8)).prop_map(|(rooted, segments)| {
        let joined = segments.join("/");
        if rooted {
            format!("/{joined}")
        } else {
            joined
        }
    })
}

/// True when walking the segments of `name` never climbs above the start.
pub fn min_depth_ok(name: &str) -> bool {
    let mut depth: i64 = 0;
    for segment in name.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => depth += 1,
        }
    }
    true
}
