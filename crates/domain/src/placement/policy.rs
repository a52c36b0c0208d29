//! Stock handling options for order placement.

/// Controls how stock is checked and decremented.
///
/// The default checks each line on its own against the stock read at the
/// start of placement and writes the new stock unconditionally. Two lines
/// for the same product can therefore both pass, and two concurrent
/// placements can both sell the same units.
///
/// Reads from environment variables in `from_env`:
/// - `ORDER_MERGE_DUPLICATE_LINES`: sets `merge_duplicate_lines`
/// - `ORDER_GUARD_STOCK_UPDATES`: sets `guard_stock_updates`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlacementPolicy {
    /// Check and decrement the per-product total of duplicate lines.
    pub merge_duplicate_lines: bool,

    /// Only write stock if it still equals the quantity read, and do so
    /// before the order is stored.
    pub guard_stock_updates: bool,
}

impl PlacementPolicy {
    /// Both stricter behaviors enabled.
    pub fn strict() -> Self {
        Self {
            merge_duplicate_lines: true,
            guard_stock_updates: true,
        }
    }

    /// Loads the policy from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            merge_duplicate_lines: env_flag("ORDER_MERGE_DUPLICATE_LINES")
                .unwrap_or(defaults.merge_duplicate_lines),
            guard_stock_updates: env_flag("ORDER_GUARD_STOCK_UPDATES")
                .unwrap_or(defaults.guard_stock_updates),
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name).ok().and_then(|v| parse_flag(&v))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
