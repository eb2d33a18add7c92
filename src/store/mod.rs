//! Alternative repository backends.

#[cfg(test)]
pub mod memory;
