pub mod poller;
pub mod service;

pub use poller::Poller;
pub use service::ChatService;
