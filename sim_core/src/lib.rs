#![forbid(unsafe_code)]

pub mod fault;
pub mod logging;
