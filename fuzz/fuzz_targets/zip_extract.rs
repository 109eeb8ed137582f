//! Fuzz target for archive extraction.
//!
//! This fuzzer feeds arbitrary byte sequences to the zip extractor as an
//! archive file and checks that nothing is ever written outside the
//! destination directory.

#![no_main]

use std::fs;

use geolife2one::dataset::extract::extract_archive;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let Ok(temp) = tempfile::tempdir() else {
        return;
    };
    let archive = temp.path().join("input.zip");
    if fs::write(&archive, data).is_err() {
        return;
    }
    let destination = temp.path().join("out");
    if fs::create_dir(&destination).is_err() {
        return;
    }

    let _ = extract_archive(&archive, &destination);

    for entry in fs::read_dir(temp.path()).into_iter().flatten().flatten() {
        let name = entry.file_name();
        assert!(
            name == "input.zip" || name == "out",
            "extraction escaped destination: {:?}",
            entry.path()
        );
    }
});
