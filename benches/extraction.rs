use std::hint::black_box;

use chrono::Utc;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use gemini_chat_exporter::config::{DedupPolicy, ExporterConfig, ScanPolicy};
use gemini_chat_exporter::dom::{Snapshot, SnapshotPage};
use gemini_chat_exporter::extractor::MessageScanner;
use gemini_chat_exporter::{ExportFormat, NullSink, extract_chat, format_export};

/// Generate a synthetic conversation snapshot with N alternating turns
fn generate_snapshot(num_turns: usize) -> Snapshot {
    let turns: Vec<String> = (0..num_turns)
        .map(|i| {
            let role = if i % 2 == 0 { "user" } else { "model" };
            format!(
                r#"{{"tag":"div","attrs":{{"data-message-author-role":"{}"}},"children":[{{"tag":"p","text":"Turn {} of the benchmark conversation with a little extra text."}}]}}"#,
                role, i
            )
        })
        .collect();
    let json = format!(
        r#"{{"url":"https://gemini.google.com/app/bench","title":"Benchmark","root":{{"tag":"body","children":[{{"tag":"main","children":[{}]}}]}}}}"#,
        turns.join(",")
    );
    Snapshot::from_json(&json).unwrap()
}

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan_document");

    for size in [10, 100, 1_000].iter() {
        let doc = generate_snapshot(*size).build_document().unwrap();
        let scanner = MessageScanner::new(ScanPolicy::default(), DedupPolicy::default());

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| scanner.scan(black_box(&doc), Utc::now()));
        });
    }

    group.finish();
}

fn bench_extract_and_format(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_and_format");
    let config = ExporterConfig::default();

    for size in [10, 100, 1_000].iter() {
        let snapshot = generate_snapshot(*size);

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let mut page = SnapshotPage::from_snapshot(snapshot.clone()).unwrap();
                let result = extract_chat(&mut page, &config, &mut NullSink).unwrap();
                format_export(black_box(&result), ExportFormat::Markdown).unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_scan, bench_extract_and_format);
criterion_main!(benches);
