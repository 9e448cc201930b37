#![forbid(unsafe_code)]

pub mod settings;
pub mod store;

pub fn infra_bootstrapped() -> bool {
    claimlock_core::crate_bootstrapped()
}
