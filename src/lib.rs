pub mod auth;
pub mod command;
pub mod directory;
pub mod engine;
pub mod limits;
pub mod model;
pub mod observability;
pub mod seed;
pub mod tls;
pub mod wire;
