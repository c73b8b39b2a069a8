use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use emberc::checker;
use emberc::diagnostics::Diagnostics;
use emberc::ir;
use emberc::optimize::optimize;
use emberc::parser::parse_source;

fn compile_to_bytecode(source: &str) {
    let mut diagnostics = Diagnostics::new();
    let (unit, mut interner) = parse_source(source, &mut diagnostics);
    let output = checker::check(&unit, &interner, &mut diagnostics);
    let mut module = ir::lower(&unit, &mut interner, &output.expr_types);
    optimize(&mut module);
    let _ = emberc::bytecode::generate(&module);
}

fn bench_summation_loop(c: &mut Criterion) {
    let source = "flux n = 1000;\nflux i = 1;\nflux acc = 0;\nloop i <= n => { acc += i; i += 1; }\nreturn acc;\n";
    c.bench_function("lex_to_bytecode/summation_loop", |b| {
        b.iter(|| compile_to_bytecode(black_box(source)));
    });
}

fn bench_narrowing_casts(c: &mut Criterion) {
    let source = "float f = 3.9;\nint i = (int)f;\nreturn i;\n";
    c.bench_function("lex_to_bytecode/narrowing_cast", |b| {
        b.iter(|| compile_to_bytecode(black_box(source)));
    });
}

fn bench_branching_kernel(c: &mut Criterion) {
    let mut group = c.benchmark_group("lex_to_bytecode");

    let source = "flux n = 250;\nflux i = 1;\nflux acc = 0;\nloop i <= n => { if (i % 3) == 0 => { acc += i*2; } -> { acc += i; } i += 1; }\nreturn acc;\n";
    group.throughput(Throughput::Bytes(source.len() as u64));
    group.bench_with_input(BenchmarkId::new("fizzbuzz_style", "250 iterations"), &source, |b, source| {
        b.iter(|| compile_to_bytecode(black_box(source)));
    });

    group.finish();
}

fn bench_large_program(c: &mut Criterion) {
    let mut group = c.benchmark_group("lex_to_bytecode");

    let mut source = String::new();
    for i in 0..200 {
        source.push_str(&format!("flux v{i} = {i} * 2 + 1;\n"));
    }
    source.push_str("return v199;\n");

    group.throughput(Throughput::Bytes(source.len() as u64));
    group.bench_with_input(BenchmarkId::new("200_declarations", format!("{} bytes", source.len())), &source, |b, source| {
        b.iter(|| compile_to_bytecode(black_box(source)));
    });

    group.finish();
}

criterion_group!(benches, bench_summation_loop, bench_narrowing_casts, bench_branching_kernel, bench_large_program);
criterion_main!(benches);
