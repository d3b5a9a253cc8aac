//! Checks that `acvp-harness` builds with only `alloc`.

#![no_std]

pub use acvp_harness;
