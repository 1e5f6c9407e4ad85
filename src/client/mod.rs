//! Client side of the upload → process → download workflow.

pub mod driver;
pub mod state;

pub use driver::{ClientDriver, ClientError};
pub use state::ClientState;
