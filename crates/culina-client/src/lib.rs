//! HTTP implementations of the remote collaborators.
//!
//! One [`ApiClient`] talks to the Culina backend and serves as the image
//! search, the ingredient recognizer and the chat assistant.

pub mod assistant;
pub mod client;
pub mod images;
pub mod recognizer;

#[cfg(test)]
mod test_server;

pub use client::ApiClient;
