// The built-in demo program: grows a balanced binary tree of leaves by
// repeatedly grafting a leaf onto each flank, then runs a symbolic FFT pass
// over it. The FFT side has no rules for its combinators (W, Map, Range,
// Zip, Complex.*), so the normal form is the unevaluated butterfly plan.
//
//   (Main d) = (FFT (GenTree d (Both (Leaf 0) (Leaf 1))))

use crate::runtime::*;

pub const MAIN: u64 = 0;
pub const GEN_TREE: u64 = 1;
pub const ADD_LEFT_LEAF: u64 = 2;
pub const ADD_RIGHT_LEAF: u64 = 3;
pub const FFT: u64 = 4;
pub const BOTH: u64 = 5;
pub const LEAF: u64 = 6;
pub const TREE_LENGTH: u64 = 7;
pub const MAP: u64 = 8;
pub const W: u64 = 9;
pub const RANGE: u64 = 10;
pub const ZIP: u64 = 11;
pub const COMPLEX_MUL: u64 = 12;
pub const COMPLEX_ADD: u64 = 13;
pub const COMPLEX_SUB: u64 = 14;

fn var(param: u64) -> RuleVar {
  RuleVar { param, field: None, erase: false }
}

fn field(param: u64, field: u64) -> RuleVar {
  RuleVar { param, field: Some(field), erase: false }
}

pub fn tree_fft(prog: &mut Program) {
  prog.register(BOTH, "Both", 2);
  prog.register(LEAF, "Leaf", 1);
  prog.register(TREE_LENGTH, "Tree.length", 1);
  prog.register(MAP, "Map", 2);
  prog.register(W, "W", 2);
  prog.register(RANGE, "Range", 2);
  prog.register(ZIP, "Zip", 3);
  prog.register(COMPLEX_MUL, "Complex.mul", 2);
  prog.register(COMPLEX_ADD, "Complex.add", 2);
  prog.register(COMPLEX_SUB, "Complex.sub", 2);

  // (GenTree 0 t) = t
  // (GenTree 1 t) = t
  // (GenTree 2 t) = (AddLeftLeaf 1 (AddRightLeaf 2 t))
  // (GenTree n t) = dup n0 n1 = n; dup m0 m1 = n0;
  //                 (GenTree (- n1 2) (AddLeftLeaf (- m0 1) (AddRightLeaf m1 t)))
  let rules = vec![
    build_rule(&prog.aris, vec![Pat::Num(0), Pat::Wild], vec![var(1)], &Core::var(0)),
    build_rule(&prog.aris, vec![Pat::Num(1), Pat::Wild], vec![var(1)], &Core::var(0)),
    build_rule(
      &prog.aris,
      vec![Pat::Num(2), Pat::Wild],
      vec![var(1)],
      &Core::fun(
        ADD_LEFT_LEAF,
        vec![Core::num(1), Core::fun(ADD_RIGHT_LEAF, vec![Core::num(2), Core::var(0)])],
      ),
    ),
    build_rule(
      &prog.aris,
      vec![Pat::Data, Pat::Wild],
      vec![var(0), var(1)],
      &Core::dup(
        Core::var(0),
        Core::dup(
          Core::var(2),
          Core::fun(
            GEN_TREE,
            vec![
              Core::op2(SUB, Core::var(3), Core::num(2)),
              Core::fun(
                ADD_LEFT_LEAF,
                vec![
                  Core::op2(SUB, Core::var(4), Core::num(1)),
                  Core::fun(ADD_RIGHT_LEAF, vec![Core::var(5), Core::var(1)]),
                ],
              ),
            ],
          ),
        ),
      ),
    ),
  ];
  prog.define(GEN_TREE, "GenTree", &[true, false], rules);

  // (AddLeftLeaf n (Leaf a)) = (Both (Leaf n) (Leaf a))
  // (AddLeftLeaf n (Both a b)) = (Both (AddLeftLeaf n a) b)
  let rules = vec![
    build_rule(
      &prog.aris,
      vec![Pat::Wild, Pat::Ctr(LEAF)],
      vec![var(0), field(1, 0)],
      &Core::ctr(
        BOTH,
        vec![Core::ctr(LEAF, vec![Core::var(0)]), Core::ctr(LEAF, vec![Core::var(1)])],
      ),
    ),
    build_rule(
      &prog.aris,
      vec![Pat::Wild, Pat::Ctr(BOTH)],
      vec![var(0), field(1, 0), field(1, 1)],
      &Core::ctr(
        BOTH,
        vec![Core::fun(ADD_LEFT_LEAF, vec![Core::var(0), Core::var(1)]), Core::var(2)],
      ),
    ),
  ];
  prog.define(ADD_LEFT_LEAF, "AddLeftLeaf", &[false, true], rules);

  // (AddRightLeaf n (Leaf a)) = (Both (Leaf a) (Leaf n))
  // (AddRightLeaf n (Both a b)) = (Both a (AddRightLeaf n b))
  let rules = vec![
    build_rule(
      &prog.aris,
      vec![Pat::Wild, Pat::Ctr(LEAF)],
      vec![var(0), field(1, 0)],
      &Core::ctr(
        BOTH,
        vec![Core::ctr(LEAF, vec![Core::var(1)]), Core::ctr(LEAF, vec![Core::var(0)])],
      ),
    ),
    build_rule(
      &prog.aris,
      vec![Pat::Wild, Pat::Ctr(BOTH)],
      vec![var(0), field(1, 0), field(1, 1)],
      &Core::ctr(
        BOTH,
        vec![Core::var(1), Core::fun(ADD_RIGHT_LEAF, vec![Core::var(0), Core::var(2)])],
      ),
    ),
  ];
  prog.define(ADD_RIGHT_LEAF, "AddRightLeaf", &[false, true], rules);

  // (FFT (Leaf a)) = (Leaf a)
  // (FFT (Both a b)) = dup a0 a1 = a; dup b0 b1 = b;
  //                    dup e0 e1 = (FFT a0);
  //                    dup l0 l1 = (Tree.length (Both a1 b1));
  //                    dup z0 z1 = (Zip λx λy (Complex.mul x y)
  //                                     (Map λk (W l0 k) (Range 0 l1))
  //                                     (FFT b0));
  //                    (Both (Zip λx λy (Complex.add x y) e0 z0)
  //                          (Zip λx λy (Complex.sub x y) e1 z1))
  let zip_expr = Core::ctr(
    ZIP,
    vec![
      Core::lam(Core::lam(Core::ctr(COMPLEX_MUL, vec![Core::var(10), Core::var(11)]))),
      Core::ctr(
        MAP,
        vec![
          Core::lam(Core::ctr(W, vec![Core::var(8), Core::var(10)])),
          Core::ctr(RANGE, vec![Core::num(0), Core::var(9)]),
        ],
      ),
      Core::fun(FFT, vec![Core::var(4)]),
    ],
  );
  let both_body = Core::ctr(
    BOTH,
    vec![
      Core::ctr(
        ZIP,
        vec![
          Core::lam(Core::lam(Core::ctr(COMPLEX_ADD, vec![Core::var(12), Core::var(13)]))),
          Core::var(6),
          Core::var(10),
        ],
      ),
      Core::ctr(
        ZIP,
        vec![
          Core::lam(Core::lam(Core::ctr(COMPLEX_SUB, vec![Core::var(12), Core::var(13)]))),
          Core::var(7),
          Core::var(11),
        ],
      ),
    ],
  );
  let rules = vec![
    build_rule(
      &prog.aris,
      vec![Pat::Ctr(LEAF)],
      vec![field(0, 0)],
      &Core::ctr(LEAF, vec![Core::var(0)]),
    ),
    build_rule(
      &prog.aris,
      vec![Pat::Ctr(BOTH)],
      vec![field(0, 0), field(0, 1)],
      &Core::dup(
        Core::var(0),
        Core::dup(
          Core::var(1),
          Core::dup(
            Core::fun(FFT, vec![Core::var(2)]),
            Core::dup(
              Core::ctr(
                TREE_LENGTH,
                vec![Core::ctr(BOTH, vec![Core::var(3), Core::var(5)])],
              ),
              Core::dup(zip_expr, both_body),
            ),
          ),
        ),
      ),
    ),
  ];
  prog.define(FFT, "FFT", &[true], rules);

  // (Main d) = (FFT (GenTree d (Both (Leaf 0) (Leaf 1))))
  let rules = vec![build_rule(
    &prog.aris,
    vec![Pat::Wild],
    vec![var(0)],
    &Core::fun(
      FFT,
      vec![Core::fun(
        GEN_TREE,
        vec![
          Core::var(0),
          Core::ctr(
            BOTH,
            vec![Core::ctr(LEAF, vec![Core::num(0)]), Core::ctr(LEAF, vec![Core::num(1)])],
          ),
        ],
      )],
    ),
  )];
  prog.define(MAIN, "Main", &[false], rules);
}

// The term the CLI seeds: `(Main depth)`.
pub fn main_call(depth: u64) -> Core {
  Core::fun(MAIN, vec![Core::num(depth)])
}
