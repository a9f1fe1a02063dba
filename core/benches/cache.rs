//! Cache benchmarks: repeated lines and LRU churn.

use lognorm::prelude::*;
use lognorm::LineCache;
use std::sync::Arc;

fn main() {
    divan::main();
}

fn rules() -> Arc<RuleSet> {
    Arc::new(
        RuleSet::new(vec![Rule::new(
            "request",
            vec![
                Component::field("ts"),
                Component::literal(" GET "),
                Component::field("path"),
                Component::literal(" "),
                Component::numeric("status"),
            ],
            "GET {path} {status}",
        )
        .unwrap()])
        .unwrap(),
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
// Processor: hit vs. miss
// ═══════════════════════════════════════════════════════════════════════════════

#[divan::bench]
fn process_line_cache_hit(bencher: divan::Bencher) {
    let mut processor = Processor::new(rules());
    let line = "10:00:00 GET /index.html 200";
    processor.process_line(line);
    bencher.bench_local(|| processor.process_line(divan::black_box(line)));
}

#[divan::bench]
fn process_line_cache_disabled(bencher: divan::Bencher) {
    let mut processor = Processor::with_config(
        rules(),
        ProcessorConfig {
            cache_capacity: 0,
            ..ProcessorConfig::default()
        },
    );
    let line = "10:00:00 GET /index.html 200";
    bencher.bench_local(|| processor.process_line(divan::black_box(line)));
}

// ═══════════════════════════════════════════════════════════════════════════════
// LineCache: eviction churn
// ═══════════════════════════════════════════════════════════════════════════════

#[divan::bench(args = [16, 1024, 65536])]
fn line_cache_churn(bencher: divan::Bencher, capacity: usize) {
    let lines: Vec<String> = (0..capacity * 2).map(|i| format!("line {i}")).collect();
    let mut cache = LineCache::new(capacity);
    let mut next = 0;

    // Working set is twice the capacity: every lookup misses and evicts.
    bencher.bench_local(|| {
        let line = &lines[next % lines.len()];
        next += 1;
        cache.get_or_compute(line, str::len)
    });
}
