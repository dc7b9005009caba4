/// JSON name of a field: underscores dropped, the following letter upper-cased.
///
/// # Examples
/// ```
/// use minidesc_core::utils::to_json_name;
/// assert_eq!(to_json_name("foo_bar"), "fooBar");
/// assert_eq!(to_json_name("foo__bar_"), "fooBar");
/// assert_eq!(to_json_name("Foo9_baz"), "Foo9Baz");
/// ```
pub fn to_json_name(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut capitalize_next = false;
    for c in s.chars() {
        if c == '_' {
            capitalize_next = true;
            continue;
        }
        if capitalize_next {
            result.push(c.to_ascii_uppercase());
            capitalize_next = false;
        } else {
            result.push(c);
        }
    }
    result
}

/// Smallest `n` with `2^n >= x`; 0 for `x <= 1`.
///
/// # Examples
/// ```
/// use minidesc_core::utils::log2_ceil;
/// assert_eq!(log2_ceil(1), 0);
/// assert_eq!(log2_ceil(5), 3);
/// assert_eq!(log2_ceil(8), 3);
/// ```
pub fn log2_ceil(x: u64) -> u32 {
    if x <= 1 {
        return 0;
    }
    64 - (x - 1).leading_zeros()
}
