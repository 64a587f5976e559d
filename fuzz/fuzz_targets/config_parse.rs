#![no_main]

use libfuzzer_sys::fuzz_target;
use logalert_core::config::LogalertConfig;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        if let Ok(config) = LogalertConfig::parse(content) {
            let _ = config.validate();
        }
    }
});
