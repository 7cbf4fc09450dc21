//! Table name derivation for model types

/// Derive a table name from a Rust type name
///
/// Module paths and generic arguments are dropped, then the name is split
/// into `_`-separated lowercase words. A word starts at an uppercase letter
/// that follows a lowercase letter or digit, or that ends a run of capitals
/// (`HTTPLog` maps to `http_log`). Digits stay attached to the preceding
/// word, so `User2` maps to `user2`.
///
/// ```
/// use bindery_core::model::naming::derive_table_name;
///
/// assert_eq!(derive_table_name("app::models::UserAddress"), "user_address");
/// assert_eq!(derive_table_name("User2"), "user2");
/// assert_eq!(derive_table_name("HTTPLog"), "http_log");
/// ```
pub fn derive_table_name(type_name: &str) -> String {
    let base = type_name.split('<').next().unwrap_or(type_name);
    let base = base.rsplit("::").next().unwrap_or(base);
    let chars: Vec<char> = base.chars().collect();

    let mut out = String::with_capacity(base.len() + 4);
    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_ascii_uppercase() && i > 0 && !out.ends_with('_') {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|c| c.is_ascii_lowercase());
            let after_word = prev.is_ascii_lowercase() || prev.is_ascii_digit();
            if after_word || (prev.is_ascii_uppercase() && next_is_lower) {
                out.push('_');
            }
        }
        out.push(ch.to_ascii_lowercase());
    }
    out
}

/// Table name for a concrete type
pub fn table_name_for<T: ?Sized>() -> String {
    derive_table_name(std::any::type_name::<T>())
}

/// Whether `name` can be used as a table, column or bind identifier
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
