pub mod debug;
pub mod memory;
pub mod normal;
pub mod pool;
pub mod program;
pub mod reducer;
