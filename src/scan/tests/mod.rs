//! Scan orchestration tests

mod helpers;
