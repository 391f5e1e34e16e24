//! Count from the number of extracted symbols

use setfinder_core::Count;

/// Count attribute for `symbols` extracted symbols, `None` outside 1..=3
pub fn classify_count(symbols: usize) -> Option<Count> {
    let count = Count::from_symbols(symbols);
    if count.is_none() {
        tracing::debug!("{} symbols is not a valid count", symbols);
    }
    count
}
