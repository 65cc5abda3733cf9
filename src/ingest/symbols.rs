use std::collections::HashSet;

/// Nifty 50 constituents polled when no symbol list is configured
pub const NIFTY_50: &[&str] = &[
    "TCS", "INFY", "RELIANCE", "HDFCBANK", "HINDUNILVR", "ICICIBANK", "KOTAKBANK",
    "LT", "AXISBANK", "ITC", "SBIN", "BHARTIARTL", "HCLTECH", "BAJFINANCE", "BAJAJFINSV",
    "MARUTI", "TECHM", "WIPRO", "SUNPHARMA", "TITAN", "ONGC", "HINDALCO", "ULTRACEMCO",
    "NESTLEIND", "POWERGRID", "ADANIENT", "M&M", "HDFC", "JSWSTEEL", "COALINDIA", "GRASIM",
    "EICHERMOT", "DRREDDY", "BPCL", "TATAMOTORS", "BRITANNIA", "DIVISLAB", "SHREECEM",
    "TATAPOWER", "UPL", "GAIL", "CIPLA", "ZEEL", "BAJAJ-AUTO", "ASIANPAINT", "ADANIPORTS",
];

/// Default polling universe
pub fn default_universe() -> Vec<String> {
    dedup_symbols(NIFTY_50.iter().map(|s| s.to_string()))
}

/// Parse a comma-separated symbol list
///
/// Entries are trimmed and upper-cased; blanks and repeats are dropped,
/// first occurrence wins.
pub fn parse_symbol_list(raw: &str) -> Vec<String> {
    dedup_symbols(
        raw.split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty()),
    )
}

fn dedup_symbols(symbols: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    symbols.filter(|s| seen.insert(s.clone())).collect()
}
