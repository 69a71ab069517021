pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod settings;
pub mod torrents;

pub use routes::create_router;
