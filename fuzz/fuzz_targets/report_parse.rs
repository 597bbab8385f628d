#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Reports are read back by downstream tooling; decoding must never panic.
    let Ok(s) = std::str::from_utf8(data) else { return };
    if let Ok(report) = serde_json::from_str::<confmut_types::RunReport>(s) {
        let _ = serde_json::to_string(&report);
    }
});
