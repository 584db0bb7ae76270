#![allow(non_snake_case)]
#![allow(clippy::identity_op)]

pub mod api;
pub mod cli;
pub mod language;
pub mod runtime;
pub mod samples;

pub use api::{default_heap_size, default_heap_tids, Runtime};
pub use language::{as_code, as_term, Term};
pub use runtime::*;
