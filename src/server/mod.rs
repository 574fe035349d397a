pub mod handler;
pub mod listener;
pub mod error;

pub type Result<T> = std::result::Result<T, Error>;

pub use error::Error;
pub use handler::{ApiRoute, Gateway, GatewayOptions};
pub use listener::ServerListener;
