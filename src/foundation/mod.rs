pub(crate) mod core;
pub(crate) mod error;
pub(crate) mod frame;
pub(crate) mod grid;
