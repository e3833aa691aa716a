// Application layer - use cases shared by the HTTP server and the CLI.

pub mod error;
pub mod reporting;
pub mod service;

pub use error::*;
pub use reporting::*;
pub use service::*;
