mod adapters;
mod channel;
mod helpers;
mod orchestrator;
mod sources;
