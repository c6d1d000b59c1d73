//! GitHub REST client backing commit, file, and pull request lookups.

pub mod client;
pub mod error;
pub mod tree;

pub use {
    client::GithubClient,
    error::{Error, Result},
    tree::TreeCache,
};
