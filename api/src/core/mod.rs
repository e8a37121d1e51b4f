pub mod app_state;
pub mod chat_service;
pub mod http;
pub mod pipeline;
pub mod session;

#[cfg(test)]
pub mod test_support;
