#![doc(test(attr(deny(warnings))))]

//! Finance Ledger keeps a signed-in user's income and spending records, maintains the
//! running net/spent/saved balances incrementally, and serves category-filtered views.

pub mod cli;
pub mod config;
pub mod errors;
pub mod ledger;
pub mod session;
pub mod storage;
pub mod time;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Finance Ledger tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
        super::init();
    }
}
