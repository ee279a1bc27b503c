pub mod request;
pub mod requestbody;
pub mod response;
pub mod transport;

// Re-exports for convenience
pub use request::Request;
pub use requestbody::RequestBody;
pub use response::Response;
pub use transport::Transport;
