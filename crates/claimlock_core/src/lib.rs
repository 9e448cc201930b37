#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod guard;
pub mod key;

pub fn crate_bootstrapped() -> bool {
    true
}
