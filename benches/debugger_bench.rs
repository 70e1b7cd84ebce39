use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rule_debugger::instrument::Instrumenter;
use rule_debugger::protocol::{PausePayload, StepRecord, TerminalEvent, Variables};
use rule_debugger::runtime::parser;
use rule_debugger::{SourceMap, SourceMapEntry, StepResult};

fn generated_script(blocks: usize) -> String {
    let mut source = String::from("total = 0\n");
    for i in 0..blocks {
        source.push_str(&format!(
            "def rule_{i}(value):\n    if value > {i}:\n        return value - {i}\n    return value\n\
             total += rule_{i}(total)\nlabel_{i} = \"\"\"rule {i}\nspans lines\"\"\"\n"
        ));
    }
    source
}

fn pause_stdout(variables: usize, noise_lines: usize) -> String {
    let mut stdout = "program output line\n".repeat(noise_lines);
    let vars: Variables = (0..variables)
        .map(|i| (format!("var_{}", i), serde_json::json!({"id": i, "tags": ["a", "b"]})))
        .collect();
    let event = TerminalEvent::Pause(PausePayload {
        step_info: StepRecord {
            step_id: "STMT_42".to_string(),
            step_number: 42,
            generated_line: 42,
            origin_line: 0,
            variables: vars,
            description: "total += rule_3(total)".to_string(),
            mode: "step".to_string(),
            on_breakpoint: false,
        },
        hit_breakpoint: false,
        total_steps: 42,
        can_continue: true,
        stop_reason: None,
    });
    stdout.push_str(&event.to_frame());
    stdout
}

fn bench_instrument(c: &mut Criterion) {
    let source = generated_script(200);
    let instrumenter = Instrumenter::default();
    let map = SourceMap::new(
        (1..source.lines().count())
            .step_by(3)
            .map(|line| SourceMapEntry::new(line, line / 3 + 1))
            .collect(),
    )
    .unwrap();

    c.bench_function("instrument_200_rules", |b| {
        b.iter(|| {
            let program = instrumenter.instrument(black_box(&source), None).unwrap();
            black_box(program);
        })
    });

    c.bench_function("instrument_200_rules_with_source_map", |b| {
        b.iter(|| {
            let program = instrumenter
                .instrument(black_box(&source), Some(&map))
                .unwrap();
            black_box(program);
        })
    });
}

fn bench_parse(c: &mut Criterion) {
    let stdout = pause_stdout(100, 1000);

    c.bench_function("find_frame_after_1000_output_lines", |b| {
        b.iter(|| {
            let frame = parser::find_frame(black_box(&stdout));
            black_box(frame);
        })
    });

    c.bench_function("step_result_from_pause_100_variables", |b| {
        b.iter(|| {
            let result = StepResult::from_run(black_box(&stdout), "", Some(0), None);
            black_box(result);
        })
    });
}

criterion_group!(benches, bench_instrument, bench_parse);
criterion_main!(benches);
