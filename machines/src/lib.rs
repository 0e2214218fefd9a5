pub mod hex_loader;
pub mod sdk85;

pub use hex_loader::HexLoadError;
pub use sdk85::{Mode, Sdk85System};
