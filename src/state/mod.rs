//! Client-side state shared by every page.

pub mod gate;
pub mod latest;
pub mod session;
