#![forbid(unsafe_code)]

//! Name casing helpers.
//!
//! Event convention strings carry kebab-case suffixes (`state-change`) that
//! map onto camelCase method names (`stateChange`). The conversion is exact:
//! split on `-`, keep the first segment untouched, upper-case the first
//! character of every following segment, concatenate.

/// Upper-case the first character of `s`, leaving the rest untouched.
///
/// ```
/// assert_eq!(apollo_core::capitalize("refresh"), "Refresh");
/// assert_eq!(apollo_core::capitalize(""), "");
/// ```
#[must_use]
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Convert a kebab-case name to camelCase.
///
/// ```
/// use apollo_core::kebab_to_camel;
///
/// assert_eq!(kebab_to_camel("state-change"), "stateChange");
/// assert_eq!(kebab_to_camel("refresh"), "refresh");
/// assert_eq!(kebab_to_camel("a-b-c"), "aBC");
/// ```
#[must_use]
pub fn kebab_to_camel(kebab: &str) -> String {
    let mut segments = kebab.split('-');
    let mut camel = String::with_capacity(kebab.len());
    if let Some(first) = segments.next() {
        camel.push_str(first);
    }
    for segment in segments {
        camel.push_str(&capitalize(segment));
    }
    camel
}
