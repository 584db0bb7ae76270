// Readback: normalized graph -> textual term.
//
// Lambda-bound variables are named x0, x1, ... in the order their binders
// are first seen; erased binders print as `_`. Duplication variables are
// transparent: reading through a DP0/DP1 pushes its side (0 or 1) onto a
// per-label direction stack, and any superposition of the same label deeper
// in picks that side. A superposition with no direction in scope prints as
// `{a b}`.

use crate::language::syntax::Term;
use crate::runtime::{self, *};
use std::collections::{HashMap, HashSet};

pub fn as_code(heap: &Heap, prog: &Program, host: u64) -> String {
  format!("{}", as_term(heap, prog, host))
}

struct Dirs {
  stacks: HashMap<u64, Stack>,
}

impl Dirs {
  fn new() -> Dirs {
    Dirs { stacks: HashMap::new() }
  }

  fn peek(&self, col: u64) -> Option<u64> {
    self.stacks.get(&col).and_then(|stk| stk.peek())
  }

  fn push(&mut self, col: u64, side: u64) {
    self.stacks.entry(col).or_insert_with(Stack::new).push(side);
  }

  fn pop(&mut self, col: u64) -> Option<u64> {
    self.stacks.entry(col).or_insert_with(Stack::new).pop()
  }
}

pub fn as_term(heap: &Heap, prog: &Program, host: u64) -> Box<Term> {
  // Collects the bound variables in first-seen order.
  fn gen_var_names(heap: &Heap, prog: &Program, vars: &mut Stack, seen: &mut HashSet<Ptr>, term: Ptr) {
    if seen.contains(&term) {
      return;
    }
    seen.insert(term);
    match get_tag(term) {
      Tag::LAM => {
        if get_tag(load_arg(heap, term, 0)) != Tag::ERA {
          vars.push(runtime::Var(get_loc(term, 0)));
        }
        gen_var_names(heap, prog, vars, seen, load_arg(heap, term, 1));
      }
      Tag::APP | Tag::SUP | Tag::OP2 => {
        gen_var_names(heap, prog, vars, seen, load_arg(heap, term, 0));
        gen_var_names(heap, prog, vars, seen, load_arg(heap, term, 1));
      }
      Tag::DP0 | Tag::DP1 => {
        gen_var_names(heap, prog, vars, seen, load_arg(heap, term, 2));
      }
      Tag::CTR | Tag::FUN => {
        let arity = arity_of(&prog.aris, term);
        for i in 0..arity {
          gen_var_names(heap, prog, vars, seen, load_arg(heap, term, i));
        }
      }
      _ => {}
    }
  }

  fn go(heap: &Heap, prog: &Program, vars: &Stack, dirs: &mut Dirs, term: Ptr) -> Box<Term> {
    match get_tag(term) {
      Tag::LAM => {
        let name = if get_tag(load_arg(heap, term, 0)) == Tag::ERA {
          "_".to_string()
        } else {
          match vars.find(runtime::Var(get_loc(term, 0))) {
            Some(idx) => format!("x{}", idx),
            None => format!("^{}", get_loc(term, 0)),
          }
        };
        let body = go(heap, prog, vars, dirs, load_arg(heap, term, 1));
        Box::new(Term::Lam { name, body })
      }
      Tag::APP => {
        let func = go(heap, prog, vars, dirs, load_arg(heap, term, 0));
        let argm = go(heap, prog, vars, dirs, load_arg(heap, term, 1));
        Box::new(Term::App { func, argm })
      }
      Tag::SUP => {
        let col = get_ext(term);
        match dirs.peek(col) {
          Some(side) => {
            dirs.pop(col);
            let done = go(heap, prog, vars, dirs, load_arg(heap, term, side));
            dirs.push(col, side);
            done
          }
          None => {
            let val0 = go(heap, prog, vars, dirs, load_arg(heap, term, 0));
            let val1 = go(heap, prog, vars, dirs, load_arg(heap, term, 1));
            Box::new(Term::Sup { val0, val1 })
          }
        }
      }
      Tag::DP0 | Tag::DP1 => {
        let col = get_ext(term);
        dirs.push(col, get_tag(term).binder_slot());
        let done = go(heap, prog, vars, dirs, load_arg(heap, term, 2));
        dirs.pop(col);
        done
      }
      Tag::OP2 => {
        let oper = get_ext(term);
        let val0 = go(heap, prog, vars, dirs, load_arg(heap, term, 0));
        let val1 = go(heap, prog, vars, dirs, load_arg(heap, term, 1));
        Box::new(Term::Op2 { oper, val0, val1 })
      }
      Tag::NUM => Box::new(Term::Num { numb: get_num(term) }),
      Tag::CTR | Tag::FUN => {
        let func = get_ext(term);
        let arity = arity_of(&prog.aris, term);
        let mut args = Vec::with_capacity(arity as usize);
        for i in 0..arity {
          args.push(go(heap, prog, vars, dirs, load_arg(heap, term, i)));
        }
        let name = match prog.nams.get(&func) {
          Some(name) => name.clone(),
          None => format!("${}", func),
        };
        Box::new(Term::Ctr { name, args })
      }
      Tag::VAR => {
        let name = match vars.find(term) {
          Some(idx) => format!("x{}", idx),
          None => format!("^{}", get_loc(term, 0)),
        };
        Box::new(Term::Var { name })
      }
      Tag::ERA => Box::new(Term::Var { name: "*".to_string() }),
      _ => Box::new(Term::Var { name: "?".to_string() }),
    }
  }

  let term = load_ptr(heap, host);
  let mut vars = Stack::new();
  let mut seen = HashSet::new();
  gen_var_names(heap, prog, &mut vars, &mut seen, term);
  let mut dirs = Dirs::new();
  go(heap, prog, &vars, &mut dirs, term)
}
