pub mod i8155;
pub mod i8279;
pub mod serial;

pub use i8155::I8155;
pub use i8279::I8279;
pub use serial::SerialChannel;
