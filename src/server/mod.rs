mod objects;
mod repos;
pub mod response;
mod router;
pub mod webhook;

pub use repos::repos_router;
pub use router::{AppState, create_router};
pub use webhook::webhook_router;
