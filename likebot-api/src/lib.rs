pub mod client;
pub mod error;
pub mod model;
pub mod region;

pub use client::{LikeClient, RapidApiCredentials};
pub use error::LikeError;
pub use model::{LikeOutcome, LikeReport, LikeResponse};
pub use region::region_code;
