// The program table
// -----------------
//
// Before normalization the runtime receives the program as data: an arity
// table and a name table indexed by function/constructor id, and, for every
// function id, a strictness list plus an ordered list of rewrite rules. The
// reducer interprets these tables directly; there is no generated code.
//
// A rule's right-hand side is compiled once, ahead of time, into a body
// template: a graph of node templates whose cells are either fixed values,
// references to left-hand-side variables, or pointers into sibling template
// nodes. Firing the rule stamps the template into the heap, drawing fresh
// duplication labels from the worker's rolling counter.

use crate::runtime::*;
use std::sync::atomic::Ordering;

// A runtime term, used for rule right-hand sides and for seeding the heap.
// Variables are de Bruijn-style indices into the rule's variable list,
// extended by each Dup (two entries), Let and Lam (one entry) in scope.
#[derive(Clone, Debug)]
pub enum Core {
  Var { bidx: u64 },
  Dup { expr: Box<Core>, body: Box<Core> },
  Sup { val0: Box<Core>, val1: Box<Core> },
  Let { expr: Box<Core>, body: Box<Core> },
  Lam { body: Box<Core> },
  App { func: Box<Core>, argm: Box<Core> },
  Fun { func: u64, args: Vec<Core> },
  Ctr { func: u64, args: Vec<Core> },
  Num { numb: u64 },
  Op2 { oper: u64, val0: Box<Core>, val1: Box<Core> },
}

impl Core {
  pub fn var(bidx: u64) -> Core {
    Core::Var { bidx }
  }

  pub fn dup(expr: Core, body: Core) -> Core {
    Core::Dup { expr: Box::new(expr), body: Box::new(body) }
  }

  pub fn sup(val0: Core, val1: Core) -> Core {
    Core::Sup { val0: Box::new(val0), val1: Box::new(val1) }
  }

  pub fn lam(body: Core) -> Core {
    Core::Lam { body: Box::new(body) }
  }

  pub fn app(func: Core, argm: Core) -> Core {
    Core::App { func: Box::new(func), argm: Box::new(argm) }
  }

  pub fn fun(func: u64, args: Vec<Core>) -> Core {
    Core::Fun { func, args }
  }

  pub fn ctr(func: u64, args: Vec<Core>) -> Core {
    Core::Ctr { func, args }
  }

  pub fn num(numb: u64) -> Core {
    Core::Num { numb }
  }

  pub fn op2(oper: u64, val0: Core, val1: Core) -> Core {
    Core::Op2 { oper, val0: Box::new(val0), val1: Box::new(val1) }
  }
}

// A left-hand-side pattern, one per function argument.
#[derive(Clone, Copy, Debug)]
pub enum Pat {
  Wild,     // matches anything, the argument is not inspected
  Data,     // matches any constructor or number (a forced wildcard)
  Ctr(u64), // matches a constructor with this id
  Num(u64), // matches this exact number
}

// A left-hand-side variable: the whole argument `param`, or, when `field` is
// set, a field of the constructor matched at that argument. Erased variables
// are collected when the rule fires.
#[derive(Clone, Debug)]
pub struct RuleVar {
  pub param: u64,
  pub field: Option<u64>,
  pub erase: bool,
}

// A cell of a body template.
#[derive(Copy, Clone, Debug)]
pub enum RuleBodyCell {
  Val { value: u64 },                       // fixed value, used as-is
  Var { index: u64 },                       // left-hand-side variable
  Ptr { value: u64, targ: u64, slot: u64 }, // pointer into template node `targ`
}

pub type RuleBodyNode = Vec<RuleBodyCell>;

#[derive(Clone, Debug)]
pub struct RuleBody {
  pub elem: RuleBodyCell,
  pub nodes: Vec<RuleBodyNode>,
  // Dup nodes whose duplicated expression is a bare rule variable. When the
  // variable turns out to hold an unboxed number, the node is not allocated
  // at all: both outputs copy the number directly.
  pub cpys: Vec<u64>,
  // How many fresh duplication labels this body consumes.
  pub dupk: u64,
}

#[derive(Clone, Debug)]
pub struct Rule {
  pub pats: Vec<Pat>,
  pub vars: Vec<RuleVar>,
  pub body: RuleBody,
  // (argument index, arity) of every constructor node consumed by the match.
  pub free: Vec<(u64, u64)>,
}

pub struct Function {
  pub arity: u64,
  pub stricts: Vec<u64>,
  pub rules: Vec<Rule>,
}

pub type Funs = U64Map<Function>;
pub type Aris = U64Map<u64>;
pub type Nams = U64Map<String>;

pub struct Program {
  pub funs: Funs,
  pub aris: Aris,
  pub nams: Nams,
}

impl Default for Program {
  fn default() -> Self {
    Self::new()
  }
}

impl Program {
  pub fn new() -> Program {
    Program { funs: U64Map::new(), aris: U64Map::new(), nams: U64Map::new() }
  }

  // Declares a constructor: name and arity only.
  pub fn register(&mut self, fid: u64, name: &str, arity: u64) {
    self.aris.insert(fid, arity);
    self.nams.insert(fid, name.to_string());
  }

  // Declares a function: its strictness map and its rules, in match order.
  pub fn define(&mut self, fid: u64, name: &str, smap: &[bool], rules: Vec<Rule>) {
    self.register(fid, name, smap.len() as u64);
    let stricts = smap
      .iter()
      .enumerate()
      .filter_map(|(i, strict)| if *strict { Some(i as u64) } else { None })
      .collect();
    self.funs.insert(fid, Function { arity: smap.len() as u64, stricts, rules });
  }
}

// Builds a rule from its patterns, variables and right-hand side. The arity
// table must already know every constructor the patterns mention.
pub fn build_rule(aris: &Aris, pats: Vec<Pat>, vars: Vec<RuleVar>, core: &Core) -> Rule {
  let mut free = Vec::new();
  for (i, pat) in pats.iter().enumerate() {
    if let Pat::Ctr(fid) = pat {
      free.push((i as u64, *aris.get(fid).unwrap_or(&0)));
    }
  }
  let body = build_body(core, vars.len() as u64);
  Rule { pats, vars, body, free }
}

// Compiles a Core term into a body template.
pub fn build_body(term: &Core, free_vars: u64) -> RuleBody {
  fn link(nodes: &mut [RuleBodyNode], targ: u64, slot: u64, elem: RuleBodyCell) {
    nodes[targ as usize][slot as usize] = elem;
    if let RuleBodyCell::Ptr { value, targ: var_targ, slot: var_slot } = elem {
      let tag = get_tag(value);
      if tag <= Tag::VAR {
        nodes[var_targ as usize][(var_slot + tag.binder_slot()) as usize] =
          RuleBodyCell::Ptr { value: Arg(0), targ, slot };
      }
    }
  }

  #[allow(clippy::too_many_arguments)]
  fn gen_elems(
    term: &Core,
    dupk: &mut u64,
    vars: &mut Vec<RuleBodyCell>,
    nodes: &mut Vec<RuleBodyNode>,
    links: &mut Vec<(u64, u64, RuleBodyCell)>,
    cpys: &mut Vec<u64>,
  ) -> RuleBodyCell {
    match term {
      Core::Var { bidx } => {
        if *bidx < vars.len() as u64 {
          vars[*bidx as usize]
        } else {
          panic!("unbound variable");
        }
      }
      Core::Dup { expr, body } => {
        let dupc = *dupk;
        let targ = nodes.len() as u64;
        *dupk += 1;
        nodes.push(vec![RuleBodyCell::Val { value: 0 }; 3]);
        links.push((targ, 0, RuleBodyCell::Val { value: Era() }));
        links.push((targ, 1, RuleBodyCell::Val { value: Era() }));
        let expr = gen_elems(expr, dupk, vars, nodes, links, cpys);
        links.push((targ, 2, expr));
        // a dup of a rule variable, or of another copy's output, can elide
        // its node when the value turns out to be an unboxed number
        let is_copy = match expr {
          RuleBodyCell::Var { .. } => true,
          RuleBodyCell::Ptr { value, targ: src, .. } => {
            get_tag(value) <= Tag::DP1 && cpys.contains(&src)
          }
          RuleBodyCell::Val { .. } => false,
        };
        if is_copy {
          cpys.push(targ);
        }
        vars.push(RuleBodyCell::Ptr { value: Dp0(dupc, 0), targ, slot: 0 });
        vars.push(RuleBodyCell::Ptr { value: Dp1(dupc, 0), targ, slot: 0 });
        let body = gen_elems(body, dupk, vars, nodes, links, cpys);
        vars.pop();
        vars.pop();
        body
      }
      Core::Sup { val0, val1 } => {
        let dupc = *dupk;
        let targ = nodes.len() as u64;
        *dupk += 1;
        nodes.push(vec![RuleBodyCell::Val { value: 0 }; 2]);
        let val0 = gen_elems(val0, dupk, vars, nodes, links, cpys);
        links.push((targ, 0, val0));
        let val1 = gen_elems(val1, dupk, vars, nodes, links, cpys);
        links.push((targ, 1, val1));
        RuleBodyCell::Ptr { value: Sup(dupc, 0), targ, slot: 0 }
      }
      Core::Let { expr, body } => {
        let expr = gen_elems(expr, dupk, vars, nodes, links, cpys);
        vars.push(expr);
        let body = gen_elems(body, dupk, vars, nodes, links, cpys);
        vars.pop();
        body
      }
      Core::Lam { body } => {
        let targ = nodes.len() as u64;
        nodes.push(vec![RuleBodyCell::Val { value: 0 }; 2]);
        link(nodes, targ, 0, RuleBodyCell::Val { value: Era() });
        vars.push(RuleBodyCell::Ptr { value: Var(0), targ, slot: 0 });
        let body = gen_elems(body, dupk, vars, nodes, links, cpys);
        links.push((targ, 1, body));
        vars.pop();
        RuleBodyCell::Ptr { value: Lam(0), targ, slot: 0 }
      }
      Core::App { func, argm } => {
        let targ = nodes.len() as u64;
        nodes.push(vec![RuleBodyCell::Val { value: 0 }; 2]);
        let func = gen_elems(func, dupk, vars, nodes, links, cpys);
        links.push((targ, 0, func));
        let argm = gen_elems(argm, dupk, vars, nodes, links, cpys);
        links.push((targ, 1, argm));
        RuleBodyCell::Ptr { value: App(0), targ, slot: 0 }
      }
      Core::Fun { func, args } => {
        if args.is_empty() {
          RuleBodyCell::Val { value: Fun(*func, 0) }
        } else {
          let targ = nodes.len() as u64;
          nodes.push(vec![RuleBodyCell::Val { value: 0 }; args.len()]);
          for (i, arg) in args.iter().enumerate() {
            let arg = gen_elems(arg, dupk, vars, nodes, links, cpys);
            links.push((targ, i as u64, arg));
          }
          RuleBodyCell::Ptr { value: Fun(*func, 0), targ, slot: 0 }
        }
      }
      Core::Ctr { func, args } => {
        if args.is_empty() {
          RuleBodyCell::Val { value: Ctr(*func, 0) }
        } else {
          let targ = nodes.len() as u64;
          nodes.push(vec![RuleBodyCell::Val { value: 0 }; args.len()]);
          for (i, arg) in args.iter().enumerate() {
            let arg = gen_elems(arg, dupk, vars, nodes, links, cpys);
            links.push((targ, i as u64, arg));
          }
          RuleBodyCell::Ptr { value: Ctr(*func, 0), targ, slot: 0 }
        }
      }
      Core::Num { numb } => RuleBodyCell::Val { value: Num(*numb) },
      Core::Op2 { oper, val0, val1 } => {
        let targ = nodes.len() as u64;
        nodes.push(vec![RuleBodyCell::Val { value: 0 }; 2]);
        let val0 = gen_elems(val0, dupk, vars, nodes, links, cpys);
        links.push((targ, 0, val0));
        let val1 = gen_elems(val1, dupk, vars, nodes, links, cpys);
        links.push((targ, 1, val1));
        RuleBodyCell::Ptr { value: Op2(*oper, 0), targ, slot: 0 }
      }
    }
  }

  let mut links: Vec<(u64, u64, RuleBodyCell)> = Vec::new();
  let mut nodes: Vec<RuleBodyNode> = Vec::new();
  let mut cpys: Vec<u64> = Vec::new();
  let mut vars: Vec<RuleBodyCell> =
    (0..free_vars).map(|i| RuleBodyCell::Var { index: i }).collect();
  let mut dupk: u64 = 0;

  let elem = gen_elems(term, &mut dupk, &mut vars, &mut nodes, &mut links, &mut cpys);
  for (targ, slot, elem) in links {
    link(&mut nodes, targ, slot, elem);
  }

  RuleBody { elem, nodes, cpys, dupk }
}

// Reads a left-hand-side variable out of the matched redex.
pub fn get_var(heap: &Heap, term: Ptr, var: &RuleVar) -> Ptr {
  match var.field {
    Some(i) => load_arg(heap, load_arg(heap, term, var.param), i),
    None => load_arg(heap, term, var.param),
  }
}

fn cell_to_ptr(
  heap: &Heap,
  aloc: &[u64],
  dups: u64,
  term: Ptr,
  vars: &[RuleVar],
  cell: &RuleBodyCell,
) -> Ptr {
  match cell {
    RuleBodyCell::Val { value } => *value,
    RuleBodyCell::Var { index } => get_var(heap, term, &vars[*index as usize]),
    RuleBodyCell::Ptr { value, targ, slot } => {
      let pos = aloc[*targ as usize];
      if get_tag(pos) == Tag::NUM {
        // the target dup collapsed into a direct number copy
        return pos;
      }
      let mut val = value + pos + slot;
      let tag = get_tag(*value);
      if tag <= Tag::DP1 || tag == Tag::SUP {
        val += (dups & LABEL_MASK) * EXT;
      }
      val
    }
  }
}

// Stamps a body template into the heap and returns its root cell. `term` is
// the matched redex the rule variables are read from.
pub fn alloc_body(
  heap: &Heap,
  lvars: &mut LocalVars,
  term: Ptr,
  vars: &[RuleVar],
  body: &RuleBody,
) -> Ptr {
  let RuleBody { elem, nodes, cpys, dupk } = body;
  if lvars.dups + dupk >= 1 << 24 {
    lvars.dups = 0;
  }
  if lvars.aloc.len() < nodes.len() {
    lvars.aloc.resize(nodes.len(), 0);
  }
  for i in 0..nodes.len() {
    lvars.aloc[i] = u64::MAX;
  }
  // numbers are copied directly, without a dup node; chains of copies
  // resolve in creation order
  for &i in cpys {
    let got = match nodes[i as usize][2] {
      RuleBodyCell::Var { index } => get_var(heap, term, &vars[index as usize]),
      RuleBodyCell::Ptr { targ, .. } => lvars.aloc[targ as usize],
      RuleBodyCell::Val { .. } => u64::MAX,
    };
    if get_tag(got) == Tag::NUM {
      inc_cost(lvars);
      lvars.aloc[i as usize] = got;
    }
  }
  for i in 0..nodes.len() {
    if lvars.aloc[i] == u64::MAX {
      let loc = alloc(lvars, nodes[i].len() as u64);
      lvars.aloc[i] = loc;
    }
  }
  for i in 0..nodes.len() {
    let host = lvars.aloc[i];
    if get_tag(host) == Tag::NUM {
      continue;
    }
    for (j, cell) in nodes[i].iter().enumerate() {
      let ptr = cell_to_ptr(heap, &lvars.aloc, lvars.dups, term, vars, cell);
      if let RuleBodyCell::Var { .. } = cell {
        link(heap, host + j as u64, ptr);
      } else {
        heap.node[(host + j as u64) as usize].store(ptr, Ordering::Relaxed);
      }
    }
  }
  let done = cell_to_ptr(heap, &lvars.aloc, lvars.dups, term, vars, elem);
  lvars.dups += dupk;
  done
}

// Seeds a closed term and returns its host location.
pub fn alloc_term(heap: &Heap, lvars: &mut LocalVars, core: &Core) -> u64 {
  let host = alloc(lvars, 1);
  let body = build_body(core, 0);
  let term = alloc_body(heap, lvars, 0, &[], &body);
  link(heap, host, term);
  host
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn seed_a_pair_of_numbers() {
    let heap = Heap::new(256);
    let mut lvars = LocalVars::new(0, 256, 1);
    let core = Core::ctr(1, vec![Core::num(7), Core::num(8)]);
    let host = alloc_term(&heap, &mut lvars, &core);
    let term = load_ptr(&heap, host);
    assert_eq!(get_tag(term), Tag::CTR);
    assert_eq!(get_ext(term), 1);
    assert_eq!(load_arg(&heap, term, 0), Num(7));
    assert_eq!(load_arg(&heap, term, 1), Num(8));
  }

  #[test]
  fn seed_identity_lambda() {
    let heap = Heap::new(256);
    let mut lvars = LocalVars::new(0, 256, 1);
    let host = alloc_term(&heap, &mut lvars, &Core::lam(Core::var(0)));
    let term = load_ptr(&heap, host);
    assert_eq!(get_tag(term), Tag::LAM);
    // binder and body point at each other
    let body = load_arg(&heap, term, 1);
    assert_eq!(get_tag(body), Tag::VAR);
    assert_eq!(load_arg(&heap, term, 0), Arg(get_loc(term, 1)));
  }

  #[test]
  fn dup_of_a_variable_is_a_copy_candidate() {
    let body = build_body(
      &Core::dup(Core::var(0), Core::op2(ADD, Core::var(1), Core::var(2))),
      1,
    );
    assert_eq!(body.cpys.len(), 1);
    assert_eq!(body.dupk, 1);
  }
}
