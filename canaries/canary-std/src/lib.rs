//! Checks that `acvp-harness` builds with `std`.

pub use acvp_harness;
