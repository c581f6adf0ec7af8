mod client;
mod codec;
pub use client::*;
pub use codec::*;

#[cfg(test)]
mod codec_test;
