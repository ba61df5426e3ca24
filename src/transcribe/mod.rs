pub mod assemblyai;
pub mod backend;
pub mod chunks;
pub mod poller;
pub mod runner;
pub mod writer;
