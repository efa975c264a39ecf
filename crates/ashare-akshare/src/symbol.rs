//! Translation between standard symbols and Akshare identifiers.

use ashare_core::{DataError, Result, Symbol};

/// Converts a standard symbol (`000001.SZ`) into the Akshare form (`sz000001`).
///
/// Only the `SZ` suffix maps to Shenzhen; every other suffix is treated as
/// Shanghai. Unrecognized suffixes are therefore routed to `sh` rather than
/// rejected.
///
/// # Errors
///
/// Returns [`DataError::InvalidSymbolFormat`] when the symbol has no `.`
/// separator, more than one, or a code that is not six ASCII digits.
pub fn to_ak_symbol(symbol: &Symbol) -> Result<String> {
    let raw = symbol.as_str();
    let (code, suffix) = raw.split_once('.').ok_or_else(|| {
        DataError::InvalidSymbolFormat(format!("{raw}: expected <code>.<SZ|SH>"))
    })?;

    if suffix.contains('.') {
        return Err(DataError::InvalidSymbolFormat(format!(
            "{raw}: more than one '.' separator"
        )));
    }

    if code.len() != 6 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DataError::InvalidSymbolFormat(format!(
            "{raw}: code must be six digits"
        )));
    }

    let prefix = if suffix == "SZ" { "sz" } else { "sh" };
    Ok(format!("{prefix}{code}"))
}
