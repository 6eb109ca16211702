pub mod cli;
pub mod commands;
pub mod document;
pub mod error;
pub mod host;
pub mod logger;

#[cfg(test)]
mod tests;
