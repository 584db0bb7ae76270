pub mod base;
pub mod data;

pub use base::debug::*;
pub use base::memory::*;
pub use base::normal::*;
pub use base::pool::*;
pub use base::program::*;
pub use base::reducer::*;

pub use data::bitset::AtomicBits;
pub use data::stack::Stack;
pub use data::u60;
pub use data::u64_map::U64Map;
