//! # picprune
//!
//! Finds exact and visually similar images in a directory tree and removes
//! all but one file per group.
//!
//! The pipeline has four stages, each usable on its own:
//!
//! - **Extraction** ([`duplicates::perceptual`]): walk the tree, decode each
//!   `.png/.jpg/.jpeg/.gif/.bmp` file and index it by perceptual hash
//!   (dHash by default, aHash or pHash on request)
//! - **Grouping** ([`duplicates::grouper`]): fold hash buckets within a
//!   Hamming distance threshold of an anchor into duplicate groups
//! - **Retention** ([`duplicates::resolver`]): pick the survivor of each group
//!   (`keep_first` with a pluggable copy heuristic, or `keep_smallest`)
//! - **Execution** ([`duplicates::executor`]): delete or dry-run the plan,
//!   tolerating per-file failures
//!
//! Everything runs synchronously on the calling thread. State is created per
//! run; nothing is shared between runs.

pub mod cli;
pub mod common;
pub mod duplicates;
