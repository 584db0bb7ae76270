// Atomic Bit-Set
// --------------
// A fixed-size bit array shared by all workers. The normalizer uses one bit
// per heap location to memoize which hosts already reached weak head normal
// form during the current pass.

use std::sync::atomic::{AtomicU64, Ordering};

pub struct AtomicBits {
  pub data: Box<[AtomicU64]>,
}

impl AtomicBits {
  pub fn new(size: usize) -> AtomicBits {
    let words = (size + 63) / 64;
    let data = (0..words).map(|_| AtomicU64::new(0)).collect::<Vec<_>>().into_boxed_slice();
    AtomicBits { data }
  }

  pub fn set(&self, bit: u64) {
    self.data[(bit >> 6) as usize].fetch_or(1 << (bit & 0x3F), Ordering::Relaxed);
  }

  pub fn get(&self, bit: u64) -> bool {
    (self.data[(bit >> 6) as usize].load(Ordering::Relaxed) >> (bit & 0x3F)) & 1 == 1
  }

  pub fn reset(&self) {
    for word in self.data.iter() {
      word.store(0, Ordering::Relaxed);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn set_get_reset() {
    let bits = AtomicBits::new(256);
    assert!(!bits.get(137));
    bits.set(137);
    assert!(bits.get(137));
    assert!(!bits.get(136));
    bits.reset();
    assert!(!bits.get(137));
  }
}
