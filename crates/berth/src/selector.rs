use std::collections::HashMap;

const MAX_NAME_LEN: usize = 63;
const MAX_PREFIX_LEN: usize = 253;

/// A label set that cannot form a valid selector.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SelectorError {
    #[error("label set is empty, cannot build a selector")]
    Empty,
    #[error("invalid label key: {0:?}")]
    InvalidKey(String),
    #[error("invalid value {value:?} for label key {key:?}")]
    InvalidValue { key: String, value: String },
}

/// Builds a validated equality selector (`k1=v1,k2=v2`) from a label set.
///
/// Keys are emitted in sorted order so the same label set always yields the
/// same selector string. Keys and values are checked against the Kubernetes
/// label syntax rules before being accepted.
pub fn selector_from_labels(labels: &HashMap<String, String>) -> Result<String, SelectorError> {
    if labels.is_empty() {
        return Err(SelectorError::Empty);
    }

    let mut keys: Vec<&String> = labels.keys().collect();
    keys.sort();

    let mut selector = String::new();
    for key in keys {
        let value = &labels[key];
        if !valid_key(key) {
            return Err(SelectorError::InvalidKey(key.clone()));
        }
        if !valid_value(value) {
            return Err(SelectorError::InvalidValue {
                key: key.clone(),
                value: value.clone(),
            });
        }
        if !selector.is_empty() {
            selector.push(',');
        }
        selector.push_str(key);
        selector.push('=');
        selector.push_str(value);
    }

    Ok(selector)
}

/// `name` or `prefix/name`, where the prefix is a DNS subdomain.
fn valid_key(key: &str) -> bool {
    match key.split_once('/') {
        Some((prefix, name)) => valid_prefix(prefix) && valid_name(name),
        None => valid_name(key),
    }
}

fn valid_prefix(prefix: &str) -> bool {
    !prefix.is_empty() && prefix.len() <= MAX_PREFIX_LEN && prefix.split('.').all(valid_dns_label)
}

/// One dot-separated piece of a DNS subdomain: lowercase alphanumerics and
/// `-` only, with an alphanumeric at each end.
fn valid_dns_label(label: &str) -> bool {
    let alnum = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    !label.is_empty()
        && label.chars().next().is_some_and(alnum)
        && label.chars().last().is_some_and(alnum)
        && label.chars().all(|c| alnum(c) || c == '-')
}

fn valid_name(name: &str) -> bool {
    valid_segment(name, |c: char| c.is_ascii_alphanumeric()) && name.len() <= MAX_NAME_LEN
}

/// Empty values are allowed; non-empty ones follow the same rules as names.
fn valid_value(value: &str) -> bool {
    value.is_empty() || valid_name(value)
}

fn valid_segment(segment: &str, alnum: impl Fn(char) -> bool) -> bool {
    !segment.is_empty()
        && segment.chars().next().is_some_and(&alnum)
        && segment.chars().last().is_some_and(&alnum)
        && segment
            .chars()
            .all(|c| alnum(c) || matches!(c, '-' | '_' | '.'))
}
