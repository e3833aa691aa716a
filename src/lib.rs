pub mod application;
pub mod cli;
pub mod domain;
pub mod io;
pub mod server;

pub use application::{AggregateOptions, AppError, ReportService};
pub use domain::*;
