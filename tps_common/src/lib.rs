mod rupiah;

pub mod op;
mod secret;

pub use rupiah::{Rupiah, RupiahConversionError};
pub use secret::Secret;
