pub mod client;
pub mod interface;
pub mod lang;
pub mod payload;
pub mod response;
pub mod transport;

#[cfg(test)]
pub mod mock;

pub use client::DeeplClient;
pub use interface::{TranslateInterface, TranslationRequest, TranslationResponse};
