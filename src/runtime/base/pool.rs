// The worker pool
// ---------------
//
// Each worker owns one slot with two condvar/mutex pairs: one for incoming
// work, one for the outgoing result. A work packet packs the slice index in
// the high 16 bits, the slice length in the next 16, and the host location
// in the low 32. Two sentinels share the work word: WORK_NONE (idle) and
// WORK_STOP (shut down). A slot only ever carries a packet while its worker
// is idle; the slice discipline in the normalizer guarantees that.
//
// Worker 0 is the caller's thread and has no loop; workers 1..N run
// `worker` until stopped.

use crate::runtime::*;
use crossbeam::utils::CachePadded;
use std::sync::{Condvar, Mutex};

pub const WORK_NONE: u64 = u64::MAX;
pub const WORK_STOP: u64 = u64::MAX - 1;

pub fn new_work(sidx: u64, slen: u64, host: u64) -> u64 {
  (sidx << 48) | (slen << 32) | host
}

pub struct WorkerSlot {
  work: Mutex<u64>,
  work_signal: Condvar,
  result: Mutex<u64>,
  result_signal: Condvar,
}

pub struct Pool {
  pub slots: Box<[CachePadded<WorkerSlot>]>,
}

impl Pool {
  pub fn new(tids: usize) -> Pool {
    let slots = (0..tids)
      .map(|_| {
        CachePadded::new(WorkerSlot {
          work: Mutex::new(WORK_NONE),
          work_signal: Condvar::new(),
          result: Mutex::new(WORK_NONE),
          result_signal: Condvar::new(),
        })
      })
      .collect::<Vec<_>>()
      .into_boxed_slice();
    Pool { slots }
  }

  // Hands a normalization packet to an idle worker.
  pub fn fork(&self, tid: u64, host: u64, sidx: u64, slen: u64) {
    let slot = &self.slots[tid as usize];
    let mut work = slot.work.lock().unwrap();
    *work = new_work(sidx, slen, host);
    slot.work_signal.notify_one();
  }

  // Blocks until the forked worker publishes its result cell.
  pub fn join(&self, tid: u64) -> Ptr {
    let slot = &self.slots[tid as usize];
    let mut result = slot.result.lock().unwrap();
    while *result == WORK_NONE {
      result = slot.result_signal.wait(result).unwrap();
    }
    let done = *result;
    *result = WORK_NONE;
    done
  }

  pub fn stop(&self, tid: u64) {
    let slot = &self.slots[tid as usize];
    let mut work = slot.work.lock().unwrap();
    *work = WORK_STOP;
    slot.work_signal.notify_one();
  }

  fn take_work(&self, tid: usize) -> u64 {
    let slot = &self.slots[tid];
    let mut work = slot.work.lock().unwrap();
    while *work == WORK_NONE {
      work = slot.work_signal.wait(work).unwrap();
    }
    let got = *work;
    if got != WORK_STOP {
      *work = WORK_NONE;
    }
    got
  }

  fn put_result(&self, tid: usize, done: Ptr) {
    let slot = &self.slots[tid];
    let mut result = slot.result.lock().unwrap();
    *result = done;
    slot.result_signal.notify_one();
  }
}

// The loop run by workers 1..N.
pub fn worker(heap: &Heap, prog: &Program, pool: &Pool, lvars: &mut LocalVars) {
  loop {
    let work = pool.take_work(lvars.tid);
    if work == WORK_STOP {
      break;
    }
    let sidx = (work >> 48) & 0xFFFF;
    let slen = (work >> 32) & 0xFFFF;
    let host = work & 0xFFFF_FFFF;
    let done = normal_go(heap, prog, pool, lvars, host, sidx, slen);
    pool.put_result(lvars.tid, done);
  }
}
