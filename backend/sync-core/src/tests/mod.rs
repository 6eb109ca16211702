mod alias;
mod composition;
mod config;
mod edit;
mod expression;
mod files;
mod merge;
mod store;
mod tree;
