use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum InvalidFilter {
    #[error("Invalid id {0:?}: expected a comma-separated list of integers")]
    Id(String),

    #[error("Invalid flag {0:?}: expected an integer such as 0 or 1")]
    Flag(String),
}

/// Parse a comma-separated list of ids such as `"1,2, 3"`.
///
/// An empty or blank value means no filter and yields `None`.
pub fn parse_id_list(raw: &str) -> Result<Option<Vec<i32>>, InvalidFilter> {
    if raw.trim().is_empty() {
        return Ok(None);
    }

    raw.split(',')
        .map(str::trim)
        .map(|token| {
            token
                .parse::<i32>()
                .map_err(|_| InvalidFilter::Id(token.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// Parse an integer query flag: `0` is false, any other integer is true.
pub fn parse_flag(raw: &str) -> Result<bool, InvalidFilter> {
    raw.trim()
        .parse::<i64>()
        .map(|value| value != 0)
        .map_err(|_| InvalidFilter::Flag(raw.to_string()))
}
