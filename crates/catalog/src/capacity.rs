//! Build-capacity arithmetic.
//!
//! Advisory snapshot computation: the caller supplies per-item availability
//! and the result may be stale the moment it is returned.

use stockforge_core::ItemId;

use crate::configuration::Configuration;

/// How many complete builds of `config` the given availability supports.
///
/// `min` over component lines of `floor(available / quantity)`. A
/// configuration with no lines reports zero (nothing to build), and a line
/// with quantity zero forces zero rather than a division fault. Negative
/// availability (an item missing from the snapshot counts as zero) also
/// yields zero.
pub fn can_build<F>(config: &Configuration, availability: F) -> i64
where
    F: Fn(ItemId) -> i64,
{
    config
        .components()
        .iter()
        .map(|line| {
            if line.quantity <= 0 {
                return 0;
            }
            let available = availability(line.item_id).max(0);
            available / line.quantity
        })
        .min()
        .unwrap_or(0)
}
