mod client;

pub use client::FeedClient;
