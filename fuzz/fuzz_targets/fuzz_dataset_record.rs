//! Fuzz target for JSONL record parsing and annotation extraction.
//!
//! Arbitrary lines must parse or fail with an error, never panic, and any
//! record that parses must survive label extraction and re-serialization.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sl_common::Dimension;
use sl_core::dataset::AnnotatedRecord;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(record) = AnnotatedRecord::parse(1, text) else {
        return;
    };
    for dimension in Dimension::ALL {
        if let Ok(labels) = record.labels(dimension.as_str()) {
            let spec = dimension.spec();
            for label in &labels {
                let _ = spec.encode(label);
            }
        }
        let _ = record.softlabel(dimension.as_str());
    }
    let line = record.to_jsonl().expect("parsed record serializes");
    let reparsed = AnnotatedRecord::parse(1, &line).expect("serialized record reparses");
    assert_eq!(reparsed.fields, record.fields);
});
