#![no_main]

use libfuzzer_sys::fuzz_target;
use rule_debugger::StepResult;

fuzz_target!(|data: &[u8]| {
    let stdout = String::from_utf8_lossy(data);
    let _ = StepResult::from_run(&stdout, "", Some(0), None);
    let _ = StepResult::from_run(&stdout, "stderr", Some(1), None);
});
