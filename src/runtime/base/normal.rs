// The normalizer
// --------------
//
// `normal_go` normalizes the graph under `host`: it reduces the head to
// weak head normal form, then recurses into the children. Hosts already
// visited during the current pass are memoized in the heap's shared bit-set.
// When a node has two or more children and the slice still has spare
// workers, the slice is split evenly: every child but the first is shipped
// to another worker, and the results are linked back in after joining.
//
// `normal` runs passes until a fixed point. The first pass keeps the full
// slice, which lets the reducer leave numeric operations unreduced so their
// operands can be normalized in parallel; follow-up passes run with a
// single-worker slice, forcing the remaining operations to their answers.
// The pass loop also picks up any duplication that was skipped because a
// peer worker held its lock.

use crate::runtime::*;

pub fn normal_go(
  heap: &Heap,
  prog: &Program,
  pool: &Pool,
  lvars: &mut LocalVars,
  host: u64,
  sidx: u64,
  slen: u64,
) -> Ptr {
  let term = load_ptr(heap, host);
  if heap.seen.get(host) {
    return term;
  }
  let term = reduce(heap, prog, lvars, host, slen);
  heap.seen.set(host);
  let mut rec_locs = Vec::with_capacity(4);
  match get_tag(term) {
    Tag::LAM => {
      rec_locs.push(get_loc(term, 1));
    }
    Tag::APP | Tag::SUP => {
      rec_locs.push(get_loc(term, 0));
      rec_locs.push(get_loc(term, 1));
    }
    Tag::DP0 | Tag::DP1 => {
      rec_locs.push(get_loc(term, 2));
    }
    Tag::OP2 => {
      if slen > 1 {
        rec_locs.push(get_loc(term, 0));
        rec_locs.push(get_loc(term, 1));
      }
    }
    Tag::CTR | Tag::FUN => {
      let arity = arity_of(&prog.aris, term);
      for i in 0..arity {
        rec_locs.push(get_loc(term, i));
      }
    }
    _ => {}
  }
  let rec_len = rec_locs.len() as u64;
  if rec_len >= 2 && slen >= rec_len {
    // enough workers for every child: keep the first, fork the rest
    let space = slen / rec_len;
    for (i, rec_loc) in rec_locs.iter().enumerate().skip(1) {
      pool.fork(sidx + i as u64 * space, *rec_loc, sidx + i as u64 * space, space);
    }
    let done = normal_go(heap, prog, pool, lvars, rec_locs[0], sidx, space);
    link(heap, rec_locs[0], done);
    for (i, rec_loc) in rec_locs.iter().enumerate().skip(1) {
      link(heap, *rec_loc, pool.join(sidx + i as u64 * space));
    }
  } else {
    for rec_loc in &rec_locs {
      let done = normal_go(heap, prog, pool, lvars, *rec_loc, sidx, slen);
      link(heap, *rec_loc, done);
    }
  }
  term
}

pub fn normal(
  heap: &Heap,
  prog: &Program,
  pool: &Pool,
  lvars: &mut LocalVars,
  host: u64,
  sidx: u64,
  slen: u64,
) -> Ptr {
  heap.seen.reset();
  normal_go(heap, prog, pool, lvars, host, sidx, slen);
  let mut cost = lvars.cost;
  loop {
    heap.seen.reset();
    let done = normal_go(heap, prog, pool, lvars, host, 0, 1);
    if lvars.cost == cost {
      return done;
    }
    cost = lvars.cost;
  }
}
