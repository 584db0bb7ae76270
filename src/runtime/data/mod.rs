pub mod bitset;
pub mod stack;
pub mod u60;
pub mod u64_map;

pub use bitset::AtomicBits;
pub use stack::Stack;
pub use u64_map::U64Map;
