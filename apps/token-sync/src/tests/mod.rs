mod commands;
mod document;
mod error;
mod host;
mod logger;
