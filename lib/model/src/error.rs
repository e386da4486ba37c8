use oxiri::IriParseError;
use oxsdatatypes::{
    ParseDateTimeError, ParseDecimalError, TooLargeForDecimalError, TooLargeForIntegerError,
};
use std::fmt::{Display, Formatter};
use std::num::{ParseFloatError, ParseIntError, TryFromIntError};
use std::str::ParseBoolError;
use thiserror::Error;

/// The result of evaluating a function or operator on a single solution.
pub type ThinResult<T> = Result<T, ThinError>;

/// A function or operator is not defined for its arguments.
///
/// The failure belongs to one solution and carries no reason: a type mismatch, a malformed
/// lexical form, and a numeric overflow all have the same effect on the query. Once the engine
/// converts it into an expression error, `FILTER` and `OPTIONAL` conditions treat it as `false`,
/// `COALESCE` and `IF` skip the argument, and aggregates ignore the value. Errors that abort the
/// whole query (e.g., storage failures or timeouts) are never represented by a [ThinError].
#[derive(Clone, Copy, Debug, Default, Error, PartialEq, Eq)]
pub struct ThinError {}

impl ThinError {
    /// Fails the current invocation.
    pub fn expected<T>() -> ThinResult<T> {
        Err(ThinError::default())
    }
}

impl Display for ThinError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("The operation is not defined for its arguments")
    }
}

/// Lets `?` turn the errors of lexical-form parsing and numeric conversions into a [ThinError].
macro_rules! undefined_on {
    ($($error:ty),+ $(,)?) => {
        $(
            impl From<$error> for ThinError {
                fn from(_: $error) -> Self {
                    ThinError::default()
                }
            }
        )+
    };
}

undefined_on!(
    ParseBoolError,
    ParseIntError,
    ParseFloatError,
    ParseDecimalError,
    ParseDateTimeError,
    IriParseError,
    TooLargeForDecimalError,
    TooLargeForIntegerError,
    TryFromIntError,
);
