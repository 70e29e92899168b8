#![no_main]

use libfuzzer_sys::fuzz_target;
use shimcov::catalog::UsageCatalog;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(catalog) = UsageCatalog::from_json_str(input, "fuzz") {
            // Anything accepted must survive a write and re-read
            let json = catalog.to_json_pretty().unwrap();
            let reparsed = UsageCatalog::from_json_str(&json, "fuzz").unwrap();
            assert_eq!(reparsed.len(), catalog.len());
        }
    }
});
