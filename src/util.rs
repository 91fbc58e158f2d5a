/// Checks that a numerical value is in the provided interval `[a,b]` and returns early
/// with a [`Configuration`](crate::Error::Configuration) error if not
///
/// ### Example
/// ```ignore
/// let discount_rate = 2.0;
/// ensure_interval!(discount_rate, 0.0, 1.0);
/// ```
/// This returns the error "invalid configuration: invalid value for \`discount_rate\`: 2 is not in the interval \[0, 1\]".
#[macro_export]
macro_rules! ensure_interval {
    ($var:expr, $a:expr, $b:expr) => {
        if !($var >= $a && $var <= $b) {
            return Err($crate::Error::Configuration {
                message: format!(
                    "invalid value for `{}`: {} is not in the interval [{}, {}]",
                    stringify!($var),
                    $var,
                    $a,
                    $b,
                ),
            });
        }
    };
}
