pub mod readback;
pub mod syntax;

pub use readback::{as_code, as_term};
pub use syntax::Term;
