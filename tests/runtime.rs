use parvm::runtime::*;
use parvm::{samples, Runtime};
use proptest::prelude::*;
use std::collections::HashSet;

fn runtime(tids: usize) -> Runtime {
  Runtime::new(1 << 20, tids)
}

fn tree_runtime(tids: usize) -> Runtime {
  let mut rt = runtime(tids);
  samples::tree_fft(&mut rt.prog);
  rt
}

fn leaf_pair() -> Core {
  Core::ctr(
    samples::BOTH,
    vec![
      Core::ctr(samples::LEAF, vec![Core::num(0)]),
      Core::ctr(samples::LEAF, vec![Core::num(1)]),
    ],
  )
}

// Walks the normalized graph and checks that every variable still points at
// a binder whose slot points back at the variable's location.
fn check_back_edges(heap: &Heap, prog: &Program, host: u64) {
  let mut seen: HashSet<u64> = HashSet::new();
  let mut next: Vec<u64> = vec![host];
  while let Some(loc) = next.pop() {
    if !seen.insert(loc) {
      continue;
    }
    let term = load_ptr(heap, loc);
    match get_tag(term) {
      Tag::VAR | Tag::DP0 | Tag::DP1 => {
        let slot = get_loc(term, get_tag(term).binder_slot());
        assert_eq!(
          load_ptr(heap, slot),
          Arg(loc),
          "variable at {} has a broken binder slot at {}",
          loc,
          slot
        );
        if get_tag(term) != Tag::VAR {
          next.push(get_loc(term, 2));
        }
      }
      Tag::LAM => next.push(get_loc(term, 1)),
      Tag::APP | Tag::SUP | Tag::OP2 => {
        next.push(get_loc(term, 0));
        next.push(get_loc(term, 1));
      }
      Tag::CTR | Tag::FUN => {
        for i in 0..arity_of(&prog.aris, term) {
          next.push(get_loc(term, i));
        }
      }
      _ => {}
    }
  }
}

#[test]
fn identity_application() {
  let mut rt = runtime(1);
  let host = rt.alloc_term(&Core::app(Core::lam(Core::var(0)), Core::num(42)));
  rt.normalize(host);
  assert_eq!(rt.readback(host), "42");
  assert_eq!(rt.cost(), 1);
}

#[test]
fn duplication_of_a_number() {
  // dup a b = 7; (+ a b)
  let mut rt = runtime(1);
  let host =
    rt.alloc_term(&Core::dup(Core::num(7), Core::op2(ADD, Core::var(0), Core::var(1))));
  rt.normalize(host);
  assert_eq!(rt.readback(host), "14");
  assert_eq!(rt.cost(), 2);
}

#[test]
fn duplication_of_a_lambda() {
  // dup f g = λx.x; (g (f 3))
  let mut rt = runtime(1);
  let host = rt.alloc_term(&Core::dup(
    Core::lam(Core::var(0)),
    Core::app(Core::var(1), Core::app(Core::var(0), Core::num(3))),
  ));
  rt.normalize(host);
  assert_eq!(rt.readback(host), "3");
}

#[test]
fn superposition_through_application() {
  // ({λx.x λx.x} 5)
  let mut rt = runtime(1);
  let host = rt.alloc_term(&Core::app(
    Core::sup(Core::lam(Core::var(0)), Core::lam(Core::var(0))),
    Core::num(5),
  ));
  rt.normalize(host);
  assert_eq!(rt.readback(host), "{5 5}");
}

#[test]
fn operator_commutes_through_superpositions() {
  let mut rt = runtime(1);
  let host =
    rt.alloc_term(&Core::op2(ADD, Core::sup(Core::num(1), Core::num(2)), Core::num(10)));
  rt.normalize(host);
  assert_eq!(rt.readback(host), "{11 12}");

  let host =
    rt.alloc_term(&Core::op2(ADD, Core::num(10), Core::sup(Core::num(1), Core::num(2))));
  rt.normalize(host);
  assert_eq!(rt.readback(host), "{11 12}");
}

#[test]
fn let_binding_inlines() {
  let mut rt = runtime(1);
  let host = rt.alloc_term(&Core::Let {
    expr: Box::new(Core::num(2)),
    body: Box::new(Core::op2(ADD, Core::var(0), Core::num(40))),
  });
  rt.normalize(host);
  assert_eq!(rt.readback(host), "42");
}

#[test]
fn gen_tree_grows_a_balanced_tree() {
  let mut rt = tree_runtime(1);
  let host =
    rt.alloc_term(&Core::fun(samples::GEN_TREE, vec![Core::num(3), leaf_pair()]));
  rt.normalize(host);
  assert_eq!(rt.readback(host), "(Both (Both (Leaf 2) (Leaf 0)) (Both (Leaf 1) (Leaf 3)))");
  let cost = rt.cost();
  assert!(cost > 0);

  // the rewrite count is deterministic for a single worker
  let mut again = tree_runtime(1);
  let host =
    again.alloc_term(&Core::fun(samples::GEN_TREE, vec![Core::num(3), leaf_pair()]));
  again.normalize(host);
  assert_eq!(again.cost(), cost);
}

#[test]
fn fft_of_a_leaf_is_the_leaf() {
  let mut rt = tree_runtime(1);
  let host = rt.alloc_term(&Core::fun(
    samples::FFT,
    vec![Core::ctr(samples::LEAF, vec![Core::num(5)])],
  ));
  rt.normalize(host);
  assert_eq!(rt.readback(host), "(Leaf 5)");
}

#[test]
fn fft_of_a_tree_is_a_butterfly_plan() {
  let mut rt = tree_runtime(1);
  let host = rt.alloc_term(&Core::fun(samples::FFT, vec![leaf_pair()]));
  rt.normalize(host);
  let code = rt.readback(host);
  assert!(code.starts_with("(Both (Zip "), "unexpected shape: {}", code);

  let mut par = tree_runtime(4);
  let host = par.alloc_term(&Core::fun(samples::FFT, vec![leaf_pair()]));
  par.normalize(host);
  assert_eq!(par.readback(host), code);
}

#[test]
fn parallel_normalization_matches_serial() {
  let seeds = [
    Core::fun(samples::GEN_TREE, vec![Core::num(8), leaf_pair()]),
    samples::main_call(4),
  ];
  for seed in &seeds {
    let mut one = tree_runtime(1);
    let host = one.alloc_term(seed);
    one.normalize(host);
    let expected = one.readback(host);

    let mut many = tree_runtime(4);
    let host = many.alloc_term(seed);
    many.normalize(host);
    assert_eq!(many.readback(host), expected);
  }
}

#[test]
fn cost_is_stable_after_normalization() {
  let mut rt = tree_runtime(2);
  let host = rt.alloc_term(&samples::main_call(3));
  rt.normalize(host);
  let cost = rt.cost();
  assert!(cost > 0);
  rt.normalize(host);
  assert_eq!(rt.cost(), cost);
}

#[test]
fn dup_sup_annihilation_with_matching_labels() {
  // dup x y = {1 2}, with x erased and y demanded at the root
  let heap = Heap::new(64);
  let prog = Program::new();
  let mut lvars = LocalVars::new(0, 64, 1);
  let host = alloc(&mut lvars, 1);
  let dupn = alloc(&mut lvars, 3);
  let supn = alloc(&mut lvars, 2);
  link(&heap, supn, Num(1));
  link(&heap, supn + 1, Num(2));
  link(&heap, dupn, Era());
  link(&heap, dupn + 2, Sup(9, supn));
  link(&heap, host, Dp1(9, dupn));

  let done = reduce(&heap, &prog, &mut lvars, host, 1);
  assert_eq!(done, Num(2));
  assert_eq!(lvars.cost, 1);
  // both nodes were reclaimed by the single interaction
  assert_eq!(lvars.free[3].len(), 1);
  assert_eq!(lvars.free[2].len(), 1);
}

#[test]
fn back_edges_survive_normalization() {
  const PAIR: u64 = 0;
  let mut rt = runtime(1);
  rt.prog.register(PAIR, "Pair", 2);

  let host = rt.alloc_term(&Core::lam(Core::lam(Core::ctr(
    PAIR,
    vec![Core::var(0), Core::var(1)],
  ))));
  rt.normalize(host);
  check_back_edges(&rt.heap, &rt.prog, host);
  assert_eq!(rt.readback(host), "λx0.λx1.(Pair x0 x1)");

  // dup f g = λx.x; (Pair f g)
  let host = rt.alloc_term(&Core::dup(
    Core::lam(Core::var(0)),
    Core::ctr(PAIR, vec![Core::var(0), Core::var(1)]),
  ));
  rt.normalize(host);
  check_back_edges(&rt.heap, &rt.prog, host);
  assert_eq!(rt.readback(host), "(Pair λx0.x0 λx1.x1)");
}

#[test]
fn erasing_rules_collect_their_garbage() {
  // (Fst (Pair a *)) = a
  const PAIR: u64 = 0;
  const FST: u64 = 1;
  let mut rt = runtime(1);
  rt.prog.register(PAIR, "Pair", 2);
  let rules = vec![build_rule(
    &rt.prog.aris,
    vec![Pat::Ctr(PAIR)],
    vec![
      RuleVar { param: 0, field: Some(0), erase: false },
      RuleVar { param: 0, field: Some(1), erase: true },
    ],
    &Core::var(0),
  )];
  rt.prog.define(FST, "Fst", &[true], rules);

  let host = rt.alloc_term(&Core::fun(
    FST,
    vec![Core::ctr(
      PAIR,
      vec![
        Core::num(7),
        Core::ctr(PAIR, vec![Core::num(8), Core::num(9)]),
      ],
    )],
  ));
  rt.normalize(host);
  assert_eq!(rt.readback(host), "7");
}

fn op2_model(op: u64, a: u64, b: u64) -> u64 {
  const MASK: u128 = 0xFFF_FFFF_FFFF_FFFF;
  match op {
    ADD => ((a as u128 + b as u128) & MASK) as u64,
    SUB => (a as i128 - b as i128).rem_euclid(1 << 60) as u64,
    MUL => ((a as u128 * b as u128) & MASK) as u64,
    DIV => {
      if b == 0 {
        0
      } else {
        a / b
      }
    }
    MOD => {
      if b == 0 {
        0
      } else {
        a % b
      }
    }
    AND => a & b,
    OR => a | b,
    XOR => a ^ b,
    SHL => (((a as u128) << (b % 64)) as u64 as u128 & MASK) as u64,
    SHR => (a >> (b % 64)) & MASK as u64,
    LTN => u64::from(a < b),
    LTE => u64::from(a <= b),
    EQL => u64::from(a == b),
    GTE => u64::from(a >= b),
    GTN => u64::from(a > b),
    NEQ => u64::from(a != b),
    _ => unreachable!(),
  }
}

proptest! {
  #[test]
  fn numeric_ops_close_in_one_step(
    op in 0u64..16,
    a in 0u64..(1u64 << 60),
    b in 0u64..(1u64 << 60),
  ) {
    let heap = Heap::new(64);
    let prog = Program::new();
    let mut lvars = LocalVars::new(0, 64, 1);
    let host = alloc_term(&heap, &mut lvars, &Core::op2(op, Core::num(a), Core::num(b)));
    let done = reduce(&heap, &prog, &mut lvars, host, 1);
    prop_assert_eq!(done, Num(op2_model(op, a, b)));
    prop_assert_eq!(lvars.cost, 1);
  }
}
