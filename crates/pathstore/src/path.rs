//! Name validation and dotted-path parsing.

use crate::error::Error;

/// A name is valid if it is non-empty, does not start or end with the delimiter, and never
/// contains two consecutive delimiters.
pub(crate) fn validate_name(name: &str, delimiter: char) -> Result<(), Error> {
    if name.is_empty() || name.starts_with(delimiter) || name.ends_with(delimiter) {
        return Err(Error::InvalidName(name.to_string()));
    }
    let mut prev = None;
    for c in name.chars() {
        if prev == Some(delimiter) && c == delimiter {
            return Err(Error::InvalidName(name.to_string()));
        }
        prev = Some(c);
    }
    Ok(())
}

/// Validates `name` and splits it into its dot-separated segments.
pub(crate) fn parse_name<'a>(name: &'a str, delimiter: char) -> Result<Vec<&'a str>, Error> {
    validate_name(name, delimiter)?;
    Ok(name.split(delimiter).collect())
}

/// The inverse of `parse_name`: joins segments back into a dotted name with `delimiter`.
pub(crate) fn path_to_name(segments: &[&str], delimiter: char) -> String {
    segments.join(&delimiter.to_string())
}
