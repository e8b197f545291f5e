#![no_main]

use jsonbind::{parse_bytes, print, PrintMode};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(value) = parse_bytes(data) {
        for mode in [PrintMode::Compact, PrintMode::Pretty] {
            let text = print(&value, mode);
            let reparsed = parse_bytes(text.as_bytes()).expect("printed output reparses");
            assert_eq!(reparsed, value);
        }
    }
});
