//! Integration test harness. Each suite lives in its own module; run with
//! `cargo test -- --ignored` against a server started beforehand.

mod api_tests;
