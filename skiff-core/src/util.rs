/// Write `values` into `out` calling `f` for each one and placing `separator` between
/// the ones that actually produced output.
pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut len = out.len();
    for v in values {
        if out.len() > len {
            out.push_str(separator);
        }
        len = out.len();
        f(out, v);
    }
}

/// Collapse every run of whitespace (new lines included) into a single space and trim the ends.
pub fn single_line(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for word in value.split_whitespace() {
        if !result.is_empty() {
            result.push(' ');
        }
        result.push_str(word);
    }
    result
}

/// Longest prefix of `value` not exceeding `max` bytes that ends on a char boundary.
pub fn truncated(value: &str, max: usize) -> &str {
    if value.len() <= max {
        return value;
    }
    let mut end = max;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

/// Truncate long SQL text before it lands in logs or error messages.
#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {
        format_args!(
            "{}{}",
            $crate::truncated(&$query, 497).trim_end(),
            if $query.len() > 497 { "..." } else { "" },
        )
    };
}

/// Await `$future` unless `$token` gets cancelled first.
#[macro_export]
macro_rules! cancellable {
    ($token:expr, $future:expr) => {{
        let token: &::tokio_util::sync::CancellationToken = $token;
        if token.is_cancelled() {
            Err($crate::Error::Cancelled)
        } else {
            ::tokio::select! {
                biased;
                _ = token.cancelled() => Err($crate::Error::Cancelled),
                result = $future => result,
            }
        }
    }};
}
