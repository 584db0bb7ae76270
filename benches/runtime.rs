use criterion::{black_box, criterion_group, criterion_main, Criterion};
use parvm::runtime::Core;
use parvm::{samples, Runtime};

fn grow_tree(depth: u64, tids: usize) -> String {
  let mut rt = Runtime::new(1 << 22, tids);
  samples::tree_fft(&mut rt.prog);
  let seed = Core::fun(
    samples::GEN_TREE,
    vec![
      Core::num(depth),
      Core::ctr(
        samples::BOTH,
        vec![
          Core::ctr(samples::LEAF, vec![Core::num(0)]),
          Core::ctr(samples::LEAF, vec![Core::num(1)]),
        ],
      ),
    ],
  );
  let host = rt.alloc_term(&seed);
  rt.normalize(black_box(host));
  rt.readback(host)
}

fn tree_growth(c: &mut Criterion) {
  c.bench_function("gen_tree 128, serial", |b| b.iter(|| grow_tree(128, 1)));
  c.bench_function("gen_tree 128, parallel", |b| {
    b.iter(|| grow_tree(128, parvm::default_heap_tids()))
  });
}

criterion_group!(benches, tree_growth);
criterion_main!(benches);
