pub mod api;
pub mod cert_manager;
pub mod crypto;
pub mod errors;
pub mod http_request;
pub mod types;
