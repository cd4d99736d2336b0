//! Seed sources other than code search.

mod seeds;

pub use seeds::{SEED_SENTINEL, Seed, parse_seed_list};
