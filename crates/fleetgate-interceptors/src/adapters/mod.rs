pub mod memory;
#[cfg(feature = "with-tonic")]
pub mod tonic;
