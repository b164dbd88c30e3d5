//! In-crate integration tests.
//!
//! The catalogue engine and resolver are exercised against in-memory
//! doubles of the external collaborators (product source, embedding model,
//! order store); the CSV stores get their own file-backed tests.

mod support;
mod web;
