// The embedder-facing surface: a Runtime owns the shared heap, the program
// tables, and one LocalVars per worker. Worker 0 is the caller's thread;
// the rest are spawned for the duration of each normalize call.

use crate::language;
use crate::runtime::*;

pub fn default_heap_size() -> usize {
  4 * CELLS_PER_GB
}

pub fn default_heap_tids() -> usize {
  std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

pub struct Runtime {
  pub heap: Heap,
  pub prog: Program,
  locals: Vec<LocalVars>,
}

impl Runtime {
  // `size` is in cells; each worker gets an equal band of it.
  pub fn new(size: usize, tids: usize) -> Runtime {
    let tids = tids.max(1);
    Runtime {
      heap: Heap::new(size),
      prog: Program::new(),
      locals: (0..tids).map(|tid| LocalVars::new(tid, size, tids)).collect(),
    }
  }

  pub fn tids(&self) -> usize {
    self.locals.len()
  }

  // Seeds a closed term into worker 0's band, returning its location.
  pub fn alloc_term(&mut self, core: &Core) -> u64 {
    alloc_term(&self.heap, &mut self.locals[0], core)
  }

  // Reduces the graph at `host` to normal form, using every worker.
  pub fn normalize(&mut self, host: u64) -> Ptr {
    let heap = &self.heap;
    let prog = &self.prog;
    let tids = self.locals.len();
    let pool = Pool::new(tids);
    let (main, rest) = self.locals.split_at_mut(1);
    let main = &mut main[0];
    std::thread::scope(|s| {
      for lvars in rest.iter_mut() {
        let pool = &pool;
        s.spawn(move || worker(heap, prog, pool, lvars));
      }
      let done = normal(heap, prog, &pool, main, host, 0, tids as u64);
      for tid in 1..tids {
        pool.stop(tid as u64);
      }
      done
    })
  }

  pub fn readback(&self, host: u64) -> String {
    language::readback::as_code(&self.heap, &self.prog, host)
  }

  // Total rewrites across all workers.
  pub fn cost(&self) -> u64 {
    self.locals.iter().map(|lvars| lvars.cost).sum()
  }

  // Total cells bump-allocated across all worker bands.
  pub fn heap_size(&self) -> u64 {
    self.locals.iter().map(|lvars| lvars.size()).sum()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::runtime::{Core, Pat, RuleVar};

  #[test]
  fn normalizes_a_recursive_sum() {
    // (Sum 0) = 0
    // (Sum n) = (+ n (Sum (- n 1)))
    const SUM: u64 = 0;
    let mut rt = Runtime::new(1 << 16, 1);
    let rules = vec![
      build_rule(&rt.prog.aris, vec![Pat::Num(0)], vec![], &Core::num(0)),
      build_rule(
        &rt.prog.aris,
        vec![Pat::Data],
        vec![RuleVar { param: 0, field: None, erase: false }],
        &Core::dup(
          Core::var(0),
          Core::op2(
            ADD,
            Core::var(1),
            Core::fun(SUM, vec![Core::op2(SUB, Core::var(2), Core::num(1))]),
          ),
        ),
      ),
    ];
    rt.prog.define(SUM, "Sum", &[true], rules);
    let host = rt.alloc_term(&Core::fun(SUM, vec![Core::num(10)]));
    rt.normalize(host);
    assert_eq!(rt.readback(host), "55");
  }
}
