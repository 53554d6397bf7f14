pub mod client;
pub mod types;

pub use client::{DucoClient, FetchFailure};
pub use types::UserData;
