use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;
use vita_coredump::formats::vita::{parse_module_table, parse_register_table, parse_thread_table};

fn blob(count: u32, record: impl Fn(u32) -> Vec<u8>) -> Vec<u8> {
    let mut out = vec![0u8; 4];
    out.extend_from_slice(&count.to_le_bytes());
    for i in 0..count {
        out.extend_from_slice(&record(i));
    }
    out
}

fn thread(id: u32) -> Vec<u8> {
    let mut rec = vec![0u8; 0xA0];
    rec[0..4].copy_from_slice(&0xA0u32.to_le_bytes());
    rec[4..8].copy_from_slice(&id.to_le_bytes());
    rec[8..12].copy_from_slice(b"thr\0");
    rec[0x9C..0xA0].copy_from_slice(&0x8100_0000u32.to_le_bytes());
    rec
}

fn registers(id: u32) -> Vec<u8> {
    let mut rec = vec![0u8; 0x48];
    rec[0..4].copy_from_slice(&0x48u32.to_le_bytes());
    rec[4..8].copy_from_slice(&id.to_le_bytes());
    rec
}

fn module(id: u32) -> Vec<u8> {
    let mut rec = vec![0u8; 0x50 + 2 * 0x14 + 0x10];
    rec[4..8].copy_from_slice(&id.to_le_bytes());
    rec[0x24..0x28].copy_from_slice(b"mod\0");
    rec[0x4C..0x50].copy_from_slice(&2u32.to_le_bytes());
    rec
}

fn bench_tables(c: &mut Criterion) {
    let mut group = c.benchmark_group("tables");
    let threads = blob(1024, thread);
    let regs = blob(1024, registers);
    let modules = blob(256, module);

    group.throughput(Throughput::Bytes(threads.len() as u64));
    group.bench_function("threads", |b| {
        b.iter(|| parse_thread_table(black_box(&threads)))
    });
    group.throughput(Throughput::Bytes(regs.len() as u64));
    group.bench_function("registers", |b| {
        b.iter(|| parse_register_table(black_box(&regs)))
    });
    group.throughput(Throughput::Bytes(modules.len() as u64));
    group.bench_function("modules", |b| {
        b.iter(|| parse_module_table(black_box(&modules)))
    });
    group.finish();
}

criterion_group!(benches, bench_tables);
criterion_main!(benches);
