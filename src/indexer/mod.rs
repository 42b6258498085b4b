pub mod chunker;
pub mod client;
pub mod decoder;
pub mod driver;
pub mod envelope;
pub mod scanner;
pub mod selector;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;
