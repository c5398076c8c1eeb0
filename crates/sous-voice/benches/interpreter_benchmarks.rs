//! Transcript interpretation cost.
//!
//! Runs once per partial transcript, several times per spoken phrase, so it
//! has to stay far below the recognizer's own refresh rate.

use std::time::{Duration, Instant};

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sous_voice::{CommandTable, StepNumberParser, TranscriptKind, VoiceInterpreter};

const TRANSCRIPTS: &[&str] = &[
    "next step",
    "okay go to step fourteen please",
    "how much salt do i add",
    "continue timer",
    "can you say again the last bit",
    "jump to step 7",
    "hold on a second the pan is smoking",
    "restart timer",
];

fn bench_interpretation(c: &mut Criterion) {
    let table = CommandTable::new();
    let parser = StepNumberParser::new();

    let mut group = c.benchmark_group("voice_interpretation");
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("command_table", |b| {
        let mut idx = 0usize;
        b.iter(|| {
            let text = TRANSCRIPTS[idx % TRANSCRIPTS.len()];
            idx += 1;
            table.match_transcript(black_box(text))
        });
    });

    group.bench_function("step_number", |b| {
        let mut idx = 0usize;
        b.iter(|| {
            let text = TRANSCRIPTS[idx % TRANSCRIPTS.len()];
            idx += 1;
            parser.resolve(black_box(text), 20)
        });
    });

    // Zero cooldown so every call runs the full pipeline.
    group.bench_function("interpreter_full", |b| {
        let mut interp = VoiceInterpreter::new(Duration::ZERO);
        let mut idx = 0usize;
        b.iter(|| {
            let text = TRANSCRIPTS[idx % TRANSCRIPTS.len()];
            idx += 1;
            interp.interpret(black_box(text), TranscriptKind::Partial, 20, Instant::now())
        });
    });

    group.finish();
}

criterion_group!(benches, bench_interpretation);
criterion_main!(benches);
