#![no_main]

use std::path::Path;

use libfuzzer_sys::fuzz_target;
use suiterun_config::{OptionSchema, SuiteDefinition};

fuzz_target!(|data: &[u8]| {
    // Suite files are UTF-8 TOML; other bytes never reach the parser
    if let Ok(s) = std::str::from_utf8(data) {
        if let Err(e) = SuiteDefinition::parse("fuzz", s, Path::new("inputs"), &OptionSchema::default()) {
            // Rendering walks the source spans, so exercise it too
            let _ = e.render();
        }
    }
});
