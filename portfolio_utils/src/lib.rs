mod macros;

/// Version string reported by the CLI and sent in the outbound `User-Agent`.
pub fn portfolio_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub trait Apply {
    /// Applies the function `f` to `self`.
    ///
    /// #### Example
    /// ```rust
    /// # use portfolio_utils::Apply;
    /// assert_eq!(2.apply(|x| x * 3), 6);
    /// ```
    fn apply<U>(self, f: impl FnOnce(Self) -> U) -> U
    where
        Self: Sized,
    {
        f(self)
    }

    /// Applies the function `f` only if `value` is `Some(...)` and provides the
    /// contained value to `f`.
    ///
    /// #### Example
    /// ```rust
    /// # use portfolio_utils::Apply;
    /// fn add_option(a: i32, b: Option<i32>) -> i32 {
    ///     a.apply_map(b, |slf, arg| slf + arg)
    /// }
    /// assert_eq!(add_option(1, None), 1);
    /// assert_eq!(add_option(1, Some(2)), 3);
    /// ```
    fn apply_map<U>(self, value: Option<U>, f: impl FnOnce(Self, U) -> Self) -> Self
    where
        Self: Sized,
    {
        if let Some(value) = value {
            f(self, value)
        } else {
            self
        }
    }
}

impl<T> Apply for T {}
