pub mod encoding;
pub mod progress;

pub use encoding::*;
