pub mod channel;
pub mod config;
pub mod error;
pub mod graph;
pub mod resolve;
pub mod storage;
pub mod store;
pub mod sync;

#[cfg(test)]
mod tests;

pub const GITHUB_WEB_URL: &str = "https://github.com";
pub const GITHUB_API_URL: &str = "https://api.github.com";
pub const GITLAB_WEB_URL: &str = "https://gitlab.com";
pub const GITLAB_API_URL: &str = const_format::concatcp!(GITLAB_WEB_URL, "/api/v4");
pub const BITBUCKET_WEB_URL: &str = "https://bitbucket.org";
pub const BITBUCKET_API_URL: &str = "https://api.bitbucket.org/2.0";
pub const JSONBIN_API_URL: &str = "https://api.jsonbin.io/v3";
