mod traits;
mod http;

pub use traits::*;
pub use http::HttpChatBackend;
