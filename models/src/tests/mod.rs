mod builder;
mod sync;
mod tokens;
