pub mod client_request;
pub mod host_message;
