//! Integration test suite modules

mod conversation;
mod deploy;
mod vault;
