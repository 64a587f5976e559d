#![no_main]

use libfuzzer_sys::fuzz_target;
use logalert_watcher::buffer::{MAX_BUFFER_SIZE, MIN_BUFFER_SIZE, parse_buffer_size};

fuzz_target!(|data: &[u8]| {
    if let Ok(raw) = std::str::from_utf8(data) {
        if let Some(size) = parse_buffer_size(raw) {
            assert!((MIN_BUFFER_SIZE..=MAX_BUFFER_SIZE).contains(&size));
        }
    }
});
