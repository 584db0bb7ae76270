// The reducer
// -----------
//
// `reduce` drives the cell at `root` to weak head normal form. It is a
// two-phase machine over an explicit continuation stack. The descend phase
// walks down the spine looking for a redex: applications descend into their
// function, duplications lock their node and descend into the duplicated
// expression, operators descend into both operands, function calls descend
// into their strict arguments. The reduce phase fires the interaction rule
// for whatever the descent stopped on, then resumes descending at the same
// location, since the rewrite may have exposed a new redex there.
//
// Stack entries are packed: bit 31 marks a location that still has to be
// descended into; entries without it are redex candidates whose children
// just finished. Heap locations are therefore limited to 2^31 cells.
//
// Duplication nodes are the only shared mutable spot: their expression can
// be reached from two slices at once. A worker that fails the test-and-set
// on the node's lock byte does not wait; it leaves the node alone, and the
// normalizer's outer pass loop picks the work up again once the lock is
// gone.

use crate::runtime::*;

const VISIT: u64 = 0x8000_0000;
const HOST_MASK: u64 = 0x7FFF_FFFF;

pub fn reduce(heap: &Heap, prog: &Program, lvars: &mut LocalVars, root: u64, slen: u64) -> Ptr {
  let tid = lvars.tid;
  let mut stack = Stack::new();
  let mut init = true;
  let mut host = root;

  'main: loop {
    let term = load_ptr(heap, host);

    if init {
      match get_tag(term) {
        Tag::APP => {
          stack.push(host);
          host = get_loc(term, 0);
          continue 'main;
        }
        Tag::DP0 | Tag::DP1 => {
          if acquire_lock(heap, tid, term).is_ok() {
            // the node may have been rewritten before we got the lock
            if term != load_ptr(heap, host) {
              release_lock(heap, tid, term);
              continue 'main;
            }
            stack.push(host);
            host = get_loc(term, 2);
            continue 'main;
          }
          // busy: skip it, a later pass retries
        }
        Tag::OP2 => {
          // with spare workers and nothing above us, stop here so the
          // normalizer can parallelize the operands
          if slen == 1 || !stack.is_empty() {
            stack.push(host);
            stack.push(get_loc(term, 0) | VISIT);
            host = get_loc(term, 1);
            continue 'main;
          }
        }
        Tag::FUN => {
          if let Some(function) = prog.funs.get(&get_ext(term)) {
            if let Some((&first, rest)) = function.stricts.split_first() {
              stack.push(host);
              for &idx in rest.iter().rev() {
                stack.push(get_loc(term, idx) | VISIT);
              }
              host = get_loc(term, first);
            } else {
              init = false;
            }
            continue 'main;
          }
        }
        _ => {}
      }
    } else {
      match get_tag(term) {
        Tag::APP => {
          let arg0 = load_arg(heap, term, 0);
          match get_tag(arg0) {
            // (λx(body) a)
            // ------------ APP-LAM
            // x <- a
            // body
            Tag::LAM => {
              inc_cost(lvars);
              subst(heap, prog, lvars, load_arg(heap, arg0, 0), load_arg(heap, term, 1));
              link(heap, host, load_arg(heap, arg0, 1));
              clear(lvars, get_loc(term, 0), 2);
              clear(lvars, get_loc(arg0, 0), 2);
              init = true;
              continue 'main;
            }
            // ({a b} c)
            // --------------- APP-SUP
            // dup x0 x1 = c
            // {(a x0) (b x1)}
            Tag::SUP => {
              inc_cost(lvars);
              let app0 = get_loc(term, 0);
              let app1 = get_loc(arg0, 0);
              let let0 = alloc(lvars, 3);
              let par0 = alloc(lvars, 2);
              link(heap, let0 + 2, load_arg(heap, term, 1));
              link(heap, app0 + 1, Dp0(get_ext(arg0), let0));
              link(heap, app0, load_arg(heap, arg0, 0));
              link(heap, app1, load_arg(heap, arg0, 1));
              link(heap, app1 + 1, Dp1(get_ext(arg0), let0));
              link(heap, par0, App(app0));
              link(heap, par0 + 1, App(app1));
              link(heap, host, Sup(get_ext(arg0), par0));
            }
            _ => {}
          }
        }
        Tag::DP0 | Tag::DP1 => {
          let arg0 = load_arg(heap, term, 2);
          match get_tag(arg0) {
            // dup r s = λx(f)
            // --------------- DUP-LAM
            // dup f0 f1 = f
            // r <- λx0(f0)
            // s <- λx1(f1)
            // x <- {x0 x1}
            Tag::LAM => {
              inc_cost(lvars);
              let let0 = get_loc(term, 0);
              let par0 = get_loc(arg0, 0);
              let lam0 = alloc(lvars, 2);
              let lam1 = alloc(lvars, 2);
              link(heap, let0 + 2, load_arg(heap, arg0, 1));
              link(heap, par0 + 1, Var(lam1));
              let arg0_arg_0 = load_arg(heap, arg0, 0);
              link(heap, par0, Var(lam0));
              subst(heap, prog, lvars, arg0_arg_0, Sup(get_ext(term), par0));
              let term_arg_0 = load_arg(heap, term, 0);
              link(heap, lam0 + 1, Dp0(get_ext(term), let0));
              subst(heap, prog, lvars, term_arg_0, Lam(lam0));
              let term_arg_1 = load_arg(heap, term, 1);
              link(heap, lam1 + 1, Dp1(get_ext(term), let0));
              subst(heap, prog, lvars, term_arg_1, Lam(lam1));
              link(heap, host, Lam(if get_tag(term) == Tag::DP0 { lam0 } else { lam1 }));
              release_lock(heap, tid, term);
              init = true;
              continue 'main;
            }
            Tag::SUP => {
              // dup x y = {a b}
              // --------------- DUP-SUP (same label)
              // x <- a
              // y <- b
              if get_ext(term) == get_ext(arg0) {
                inc_cost(lvars);
                subst(heap, prog, lvars, load_arg(heap, term, 0), load_arg(heap, arg0, 0));
                subst(heap, prog, lvars, load_arg(heap, term, 1), load_arg(heap, arg0, 1));
                let sel = if get_tag(term) == Tag::DP0 { 0 } else { 1 };
                link(heap, host, load_arg(heap, arg0, sel));
                clear(lvars, get_loc(term, 0), 3);
                clear(lvars, get_loc(arg0, 0), 2);
                release_lock(heap, tid, term);
                init = true;
                continue 'main;
              }
              // dup x y = {a b}
              // ----------------- DUP-SUP (different labels)
              // x <- {xA xB}
              // y <- {yA yB}
              // dup xA yA = a
              // dup xB yB = b
              inc_cost(lvars);
              let par0 = alloc(lvars, 2);
              let let0 = get_loc(term, 0);
              let par1 = get_loc(arg0, 0);
              let let1 = alloc(lvars, 3);
              link(heap, let0 + 2, load_arg(heap, arg0, 0));
              link(heap, let1 + 2, load_arg(heap, arg0, 1));
              let term_arg_0 = load_arg(heap, term, 0);
              let term_arg_1 = load_arg(heap, term, 1);
              link(heap, par1, Dp1(get_ext(term), let0));
              link(heap, par1 + 1, Dp1(get_ext(term), let1));
              link(heap, par0, Dp0(get_ext(term), let0));
              link(heap, par0 + 1, Dp0(get_ext(term), let1));
              subst(heap, prog, lvars, term_arg_0, Sup(get_ext(arg0), par0));
              subst(heap, prog, lvars, term_arg_1, Sup(get_ext(arg0), par1));
              let sel = if get_tag(term) == Tag::DP0 { par0 } else { par1 };
              link(heap, host, Sup(get_ext(arg0), sel));
              release_lock(heap, tid, term);
            }
            // dup x y = N
            // ----------- DUP-NUM
            // x <- N
            // y <- N
            Tag::NUM => {
              inc_cost(lvars);
              subst(heap, prog, lvars, load_arg(heap, term, 0), arg0);
              subst(heap, prog, lvars, load_arg(heap, term, 1), arg0);
              clear(lvars, get_loc(term, 0), 3);
              link(heap, host, arg0);
              release_lock(heap, tid, term);
            }
            // dup x y = (K a b c ...)
            // ----------------------- DUP-CTR
            // dup a0 a1 = a
            // dup b0 b1 = b
            // dup c0 c1 = c
            // ...
            // x <- (K a0 b0 c0 ...)
            // y <- (K a1 b1 c1 ...)
            Tag::CTR => {
              inc_cost(lvars);
              let func = get_ext(arg0);
              let arit = arity_of(&prog.aris, arg0);
              if arit == 0 {
                subst(heap, prog, lvars, load_arg(heap, term, 0), Ctr(func, 0));
                subst(heap, prog, lvars, load_arg(heap, term, 1), Ctr(func, 0));
                clear(lvars, get_loc(term, 0), 3);
                link(heap, host, Ctr(func, 0));
              } else {
                let ctr0 = get_loc(arg0, 0);
                let ctr1 = alloc(lvars, arit);
                for i in 0..arit - 1 {
                  let leti = alloc(lvars, 3);
                  link(heap, leti + 2, load_arg(heap, arg0, i));
                  link(heap, ctr0 + i, Dp0(get_ext(term), leti));
                  link(heap, ctr1 + i, Dp1(get_ext(term), leti));
                }
                // the dup node itself is reused for the last field
                let leti = get_loc(term, 0);
                link(heap, leti + 2, load_arg(heap, arg0, arit - 1));
                let term_arg_0 = load_arg(heap, term, 0);
                link(heap, ctr0 + arit - 1, Dp0(get_ext(term), leti));
                subst(heap, prog, lvars, term_arg_0, Ctr(func, ctr0));
                let term_arg_1 = load_arg(heap, term, 1);
                link(heap, ctr1 + arit - 1, Dp1(get_ext(term), leti));
                subst(heap, prog, lvars, term_arg_1, Ctr(func, ctr1));
                let sel = if get_tag(term) == Tag::DP0 { ctr0 } else { ctr1 };
                link(heap, host, Ctr(func, sel));
              }
              release_lock(heap, tid, term);
            }
            // dup x y = *
            // ----------- DUP-ERA
            // x <- *
            // y <- *
            Tag::ERA => {
              inc_cost(lvars);
              subst(heap, prog, lvars, load_arg(heap, term, 0), Era());
              subst(heap, prog, lvars, load_arg(heap, term, 1), Era());
              link(heap, host, Era());
              clear(lvars, get_loc(term, 0), 3);
              release_lock(heap, tid, term);
              init = true;
              continue 'main;
            }
            // not a value this node can consume
            _ => {
              release_lock(heap, tid, term);
            }
          }
        }
        Tag::OP2 => {
          let arg0 = load_arg(heap, term, 0);
          let arg1 = load_arg(heap, term, 1);
          // (+ a b)
          // --------- OP2-NUM
          // add(a, b)
          if get_tag(arg0) == Tag::NUM && get_tag(arg1) == Tag::NUM {
            inc_cost(lvars);
            let a = get_num(arg0);
            let b = get_num(arg1);
            let c = match get_ext(term) {
              ADD => u60::add(a, b),
              SUB => u60::sub(a, b),
              MUL => u60::mul(a, b),
              DIV => u60::div(a, b),
              MOD => u60::mdl(a, b),
              AND => u60::and(a, b),
              OR => u60::or(a, b),
              XOR => u60::xor(a, b),
              SHL => u60::shl(a, b),
              SHR => u60::shr(a, b),
              LTN => u60::ltn(a, b),
              LTE => u60::lte(a, b),
              EQL => u60::eql(a, b),
              GTE => u60::gte(a, b),
              GTN => u60::gtn(a, b),
              NEQ => u60::neq(a, b),
              _ => 0,
            };
            clear(lvars, get_loc(term, 0), 2);
            link(heap, host, Num(c));
          }
          // (+ {a0 a1} b)
          // --------------------- OP2-SUP-0
          // dup b0 b1 = b
          // {(+ a0 b0) (+ a1 b1)}
          else if get_tag(arg0) == Tag::SUP {
            inc_cost(lvars);
            let op20 = get_loc(term, 0);
            let op21 = get_loc(arg0, 0);
            let let0 = alloc(lvars, 3);
            let par0 = alloc(lvars, 2);
            link(heap, let0 + 2, arg1);
            link(heap, op20 + 1, Dp0(get_ext(arg0), let0));
            link(heap, op20, load_arg(heap, arg0, 0));
            link(heap, op21, load_arg(heap, arg0, 1));
            link(heap, op21 + 1, Dp1(get_ext(arg0), let0));
            link(heap, par0, Op2(get_ext(term), op20));
            link(heap, par0 + 1, Op2(get_ext(term), op21));
            link(heap, host, Sup(get_ext(arg0), par0));
          }
          // (+ a {b0 b1})
          // --------------------- OP2-SUP-1
          // dup a0 a1 = a
          // {(+ a0 b0) (+ a1 b1)}
          else if get_tag(arg1) == Tag::SUP {
            inc_cost(lvars);
            let op20 = get_loc(term, 0);
            let op21 = get_loc(arg1, 0);
            let let0 = alloc(lvars, 3);
            let par0 = alloc(lvars, 2);
            link(heap, let0 + 2, arg0);
            link(heap, op20, Dp0(get_ext(arg1), let0));
            link(heap, op20 + 1, load_arg(heap, arg1, 0));
            link(heap, op21 + 1, load_arg(heap, arg1, 1));
            link(heap, op21, Dp1(get_ext(arg1), let0));
            link(heap, par0, Op2(get_ext(term), op20));
            link(heap, par0 + 1, Op2(get_ext(term), op21));
            link(heap, host, Sup(get_ext(arg1), par0));
          }
        }
        Tag::FUN => {
          if let Some(function) = prog.funs.get(&get_ext(term)) {
            if fun_apply(heap, prog, lvars, host, term, function) {
              init = true;
              continue 'main;
            }
          }
        }
        _ => {}
      }
    }

    match stack.pop() {
      Some(item) => {
        init = item & VISIT != 0;
        host = item & HOST_MASK;
      }
      None => break 'main,
    }
  }

  load_ptr(heap, root)
}

// Tries the function's rules against the redex at `host`, in order. Fires
// the first match and reports whether anything rewrote.
fn fun_apply(
  heap: &Heap,
  prog: &Program,
  lvars: &mut LocalVars,
  host: u64,
  term: Ptr,
  function: &Function,
) -> bool {
  // a strict argument that is a superposition splits the whole call
  for &i in &function.stricts {
    let argi = load_arg(heap, term, i);
    if get_tag(argi) == Tag::SUP {
      fun_sup(heap, prog, lvars, host, term, argi, i);
      return true;
    }
  }
  'rules: for rule in &function.rules {
    for (i, pat) in rule.pats.iter().enumerate() {
      let arg = load_arg(heap, term, i as u64);
      let hit = match pat {
        Pat::Wild => true,
        Pat::Data => matches!(get_tag(arg), Tag::CTR | Tag::NUM),
        Pat::Ctr(fid) => get_tag(arg) == Tag::CTR && get_ext(arg) == *fid,
        Pat::Num(num) => get_tag(arg) == Tag::NUM && get_num(arg) == *num,
      };
      if !hit {
        continue 'rules;
      }
    }
    inc_cost(lvars);
    let done = alloc_body(heap, lvars, term, &rule.vars, &rule.body);
    link(heap, host, done);
    clear(lvars, get_loc(term, 0), function.arity);
    for (i, arity) in &rule.free {
      clear(lvars, get_loc(load_arg(heap, term, *i), 0), *arity);
    }
    for var in &rule.vars {
      if var.erase {
        collect(heap, prog, lvars, get_var(heap, term, var));
      }
    }
    return true;
  }
  false
}

// (F {a0 a1} b c ...)
// ------------------- FUN-SUP
// dup b0 b1 = b
// dup c0 c1 = c
// ...
// {(F a0 b0 c0 ...) (F a1 b1 c1 ...)}
pub fn fun_sup(
  heap: &Heap,
  prog: &Program,
  lvars: &mut LocalVars,
  host: u64,
  term: Ptr,
  argn: Ptr,
  n: u64,
) -> Ptr {
  inc_cost(lvars);
  let arit = arity_of(&prog.aris, term);
  let func = get_ext(term);
  let fun0 = get_loc(term, 0);
  let fun1 = alloc(lvars, arit);
  let par0 = get_loc(argn, 0);
  for i in 0..arit {
    if i != n {
      let leti = alloc(lvars, 3);
      let argi = load_arg(heap, term, i);
      link(heap, fun0 + i, Dp0(get_ext(argn), leti));
      link(heap, fun1 + i, Dp1(get_ext(argn), leti));
      link(heap, leti + 2, argi);
    } else {
      link(heap, fun0 + i, load_arg(heap, argn, 0));
      link(heap, fun1 + i, load_arg(heap, argn, 1));
    }
  }
  link(heap, par0, Fun(func, fun0));
  link(heap, par0 + 1, Fun(func, fun1));
  let done = Sup(get_ext(argn), par0);
  link(heap, host, done);
  done
}
