//! HTTP request handlers

pub mod activity_stream;
pub mod caller;
pub mod datasets;
pub mod health;

pub use activity_stream::activity_stream;
pub use caller::whoami;
pub use datasets::datasets;
pub use health::health;
