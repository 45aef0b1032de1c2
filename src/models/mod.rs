//! Data models for Pustaka entities

pub mod item;
pub mod loan;
pub mod review;
pub mod title;
pub mod user;
