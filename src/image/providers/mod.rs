//! Image generation backends.

mod together;

pub use together::{TogetherClient, TogetherClientBuilder};
