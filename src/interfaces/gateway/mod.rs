pub mod client;
pub mod sandbox;
pub mod translate;
pub mod wire;
