// Implements u60: 60-bit unsigned integers over u64 and u128

type U60 = u64;

#[inline(always)]
pub fn new(a: u64) -> U60 {
  a & 0xFFF_FFFF_FFFF_FFFF
}

#[inline(always)]
pub fn val(a: u64) -> U60 {
  a
}

#[inline(always)]
pub fn add(a: U60, b: U60) -> U60 {
  new(a + b)
}

#[inline(always)]
pub fn sub(a: U60, b: U60) -> U60 {
  if a >= b {
    a - b
  } else {
    0x1000_0000_0000_0000 - (b - a)
  }
}

#[inline(always)]
pub fn mul(a: U60, b: U60) -> U60 {
  new((a as u128 * b as u128) as u64)
}

// Division and modulo by zero yield 0.
#[inline(always)]
pub fn div(a: U60, b: U60) -> U60 {
  a.checked_div(b).unwrap_or(0)
}

#[inline(always)]
pub fn mdl(a: U60, b: U60) -> U60 {
  a.checked_rem(b).unwrap_or(0)
}

#[inline(always)]
pub fn and(a: U60, b: U60) -> U60 {
  a & b
}

#[inline(always)]
pub fn or(a: U60, b: U60) -> U60 {
  a | b
}

#[inline(always)]
pub fn xor(a: U60, b: U60) -> U60 {
  a ^ b
}

#[inline(always)]
pub fn shl(a: U60, b: U60) -> U60 {
  new(a.wrapping_shl(b as u32))
}

#[inline(always)]
pub fn shr(a: U60, b: U60) -> U60 {
  new(a.wrapping_shr(b as u32))
}

#[inline(always)]
pub fn ltn(a: U60, b: U60) -> U60 {
  u64::from(a < b)
}

#[inline(always)]
pub fn lte(a: U60, b: U60) -> U60 {
  u64::from(a <= b)
}

#[inline(always)]
pub fn eql(a: U60, b: U60) -> U60 {
  u64::from(a == b)
}

#[inline(always)]
pub fn gte(a: U60, b: U60) -> U60 {
  u64::from(a >= b)
}

#[inline(always)]
pub fn gtn(a: U60, b: U60) -> U60 {
  u64::from(a > b)
}

#[inline(always)]
pub fn neq(a: U60, b: U60) -> U60 {
  u64::from(a != b)
}

#[inline(always)]
pub fn show(a: U60) -> String {
  format!("{}", a)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn wraps_at_60_bits() {
    let max = new(u64::MAX);
    assert_eq!(add(max, 1), 0);
    assert_eq!(sub(0, 1), max);
    assert_eq!(mul(1 << 59, 2), 0);
    assert_eq!(shl(1, 60), 0);
  }

  #[test]
  fn total_on_zero_divisor() {
    assert_eq!(div(42, 0), 0);
    assert_eq!(mdl(42, 0), 0);
  }
}
