pub mod catalog;
pub mod cli;
pub mod error;
pub mod probe;
pub mod reporting;
pub mod session;
pub mod template;
pub mod transport;
