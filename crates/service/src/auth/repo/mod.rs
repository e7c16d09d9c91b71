pub mod http;

pub use http::HttpAuthRepository;
