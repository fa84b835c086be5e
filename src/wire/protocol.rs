use std::fmt;

/// The only command a replica understands.
pub const GET_COUNTER: &str = "GET_COUNTER";

const OK_MARKER: &str = "OK";
const ERROR_MARKER: &str = "ERROR";

/// A request line as understood by a replica.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Command {
    GetCounter,
    Unrecognized(String),
}

impl Command {
    /// Surrounding whitespace is ignored. Anything other than `GET_COUNTER` is unrecognized, not
    /// a parse failure; the replica still answers it.
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            GET_COUNTER => Command::GetCounter,
            other => Command::Unrecognized(other.to_string()),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::GetCounter => f.write_str(GET_COUNTER),
            Command::Unrecognized(raw) => f.write_str(raw),
        }
    }
}

/// A response line. `OK <counter>` on success, `ERROR <reason>` otherwise.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Reply {
    Counter(u64),
    Error(String),
}

impl Reply {
    pub(crate) fn unknown_command() -> Self {
        Reply::Error("unknown command".to_string())
    }

    /// Returns `None` for lines that carry neither marker.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let (marker, rest) = match line.split_once(' ') {
            Some((marker, rest)) => (marker, rest.trim()),
            None => (line, ""),
        };

        match marker {
            OK_MARKER => rest.parse().ok().map(Reply::Counter),
            ERROR_MARKER => Some(Reply::Error(rest.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Counter(value) => write!(f, "{} {}", OK_MARKER, value),
            Reply::Error(reason) => write!(f, "{} {}", ERROR_MARKER, reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_parse() {
        assert_eq!(Command::parse("GET_COUNTER"), Command::GetCounter);
        assert_eq!(Command::parse("  GET_COUNTER \r"), Command::GetCounter);
        assert_eq!(Command::parse("get_counter"), Command::Unrecognized("get_counter".into()));
        assert_eq!(Command::parse(""), Command::Unrecognized("".into()));
    }

    #[test]
    fn reply_wire_format() {
        assert_eq!(Reply::Counter(42).to_string(), "OK 42");
        assert_eq!(Reply::unknown_command().to_string(), "ERROR unknown command");
    }

    #[test]
    fn reply_parse() {
        assert_eq!(Reply::parse("OK 3"), Some(Reply::Counter(3)));
        assert_eq!(Reply::parse("ERROR unknown command"), Some(Reply::unknown_command()));
        assert_eq!(Reply::parse("OK not-a-number"), None);
        assert_eq!(Reply::parse("HELLO"), None);
    }
}
