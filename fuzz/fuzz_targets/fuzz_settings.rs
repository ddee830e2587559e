//! Fuzz target for settings.json parsing and validation.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sl_config::validate::validate_settings;
use sl_config::Settings;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(settings) = Settings::from_json(text) {
        if validate_settings(&settings).is_ok() {
            assert!(settings.em.tolerance > 0.0);
            assert!(settings.em.max_iterations > 0);
        }
    }
});
