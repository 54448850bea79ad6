pub mod network;
pub mod platform;
pub mod process;
pub mod provider;
pub mod sampler;
pub mod sampling;
pub mod snapshot;
pub mod store;
