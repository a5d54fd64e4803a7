pub mod channel;
pub mod data;
pub mod error;
pub mod model;

pub use error::{PyxError, PyxResult};
