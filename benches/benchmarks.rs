use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use ipenrich::error::Result;
use ipenrich::{Enricher, ExtractorBuilder, Location, LocationLookup, Tag, Tagged};

// Answers every lookup without touching a database, so the numbers measure
// scanning, classification and rewriting only
struct Fixed;

impl LocationLookup for Fixed {
    fn lookup(&self, _token: &str) -> Result<Option<Location>> {
        Ok(Some(Location::new("United States", "California", "Mountain View")))
    }
}

// ss -nt style output, one connection per line
fn generate_socket_lines(count: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|i| {
            format!(
                "ESTAB 0 0 192.168.{}.{}:{} {}.{}.{}.{}:443",
                i % 256,
                (i * 3) % 256,
                30000 + (i % 30000),
                (i % 223) + 1,
                (i * 7) % 256,
                (i * 13) % 256,
                (i * 17) % 256,
            )
            .into_bytes()
        })
        .collect()
}

// Mixed IPv4 and bracketed IPv6 listeners
fn generate_mixed_lines(count: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|i| {
            if i % 2 == 0 {
                format!("LISTEN 0 128 0.0.0.0:{} 0.0.0.0:*", 1024 + i).into_bytes()
            } else {
                format!(
                    "LISTEN 0 128 [2001:db8:{:x}::{:x}]:{} [::]:*",
                    i % 65536,
                    (i * 7) % 65536,
                    1024 + i
                )
                .into_bytes()
            }
        })
        .collect()
}

fn total_len(lines: &[Vec<u8>]) -> u64 {
    lines.iter().map(|l| l.len() as u64).sum()
}

fn bench_extract(c: &mut Criterion) {
    let extractor = ExtractorBuilder::new().build().unwrap();
    let lines = generate_mixed_lines(1000);

    let mut group = c.benchmark_group("extract");
    group.throughput(Throughput::Bytes(total_len(&lines)));
    group.bench_function("find_iter", |b| {
        b.iter(|| {
            lines
                .iter()
                .map(|line| extractor.find_iter(black_box(line)).count())
                .sum::<usize>()
        });
    });
    group.finish();
}

fn bench_enrich_line(c: &mut Criterion) {
    let enricher = Enricher::new(Fixed).unwrap();

    let mut group = c.benchmark_group("enrich_line");
    for (name, lines) in [
        ("sockets", generate_socket_lines(1000)),
        ("mixed", generate_mixed_lines(1000)),
    ] {
        group.throughput(Throughput::Bytes(total_len(&lines)));
        group.bench_function(name, |b| {
            b.iter(|| {
                for line in &lines {
                    black_box(enricher.enrich_line(black_box(line)));
                }
            });
        });
    }

    // Lines without addresses take the borrowed fast path
    let plain = vec![b"State Recv-Q Send-Q Local Address:Port Peer Address:Port".to_vec(); 1000];
    group.throughput(Throughput::Bytes(total_len(&plain)));
    group.bench_function("no_addresses", |b| {
        b.iter(|| {
            for line in &plain {
                black_box(enricher.enrich_line(black_box(line)));
            }
        });
    });
    group.finish();
}

// Benchmark Tagged.annotate() with varying number of tags
fn bench_tagged_annotate(c: &mut Criterion) {
    let mut group = c.benchmark_group("tagged_annotate");

    let line = b"192.168.1.1 connected to 10.0.0.1 via 172.16.0.1 from 8.8.8.8 through 1.1.1.1 and 93.184.216.34 also 142.250.185.78 plus 151.101.1.140 then 104.16.132.229 more 13.107.42.14 end 192.168.1.15 start 8.8.4.4 here 1.0.0.1 now 8.26.56.26 also 208.67.222.222";

    for tag_count in [1, 2, 5, 20] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_tags", tag_count)),
            &tag_count,
            |b, &tag_count| {
                let mut tagged = Tagged::new(line);
                let mut pos = 10;
                for i in 0..tag_count {
                    tagged = tagged.tag(Tag::new(pos..pos, format!("Country{}", i)));
                    pos += (line.len() - 10) / (tag_count + 1);
                }

                b.iter(|| black_box(tagged.annotate()));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_extract, bench_enrich_line, bench_tagged_annotate);
criterion_main!(benches);
