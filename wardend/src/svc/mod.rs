pub mod routes;
pub mod scheduler;
pub mod server;
