#![no_main]

use libfuzzer_sys::fuzz_target;
use rule_debugger::instrument::{Instrumenter, HOOK_NAME};

fuzz_target!(|data: &[u8]| {
    if let Ok(source) = std::str::from_utf8(data) {
        if let Ok(program) = Instrumenter::default().instrument(source, None) {
            assert_eq!(program.line_map.len(), program.body.lines().count());
            for hook in &program.hooks {
                assert!(hook.step_id.starts_with("STMT_"));
                assert!(program.body.contains(HOOK_NAME));
            }
        }
    }
});
