mod client;
mod outcome;
mod spec;

pub use client::*;
pub use outcome::*;
pub use spec::*;
