//! The closed set of remote operations and the validated server address.
//!
//! A [`Command`] is a pure value describing *what* the user wants the remote
//! display to do.  It carries no local state and maps 1:1 to an HTTP endpoint
//! on the server (see [`crate::protocol::messages::RequestSpec`]).
//!
//! An [`Address`] is the user-supplied host (IP or hostname) after
//! validation.  It is immutable once a session starts: reconnecting to a
//! different host always means discarding the old session and building a new
//! one.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for address validation.
///
/// Validation happens before any network call; an invalid address never
/// reaches the HTTP layer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    /// The input was empty (or only whitespace).
    #[error("address must not be empty")]
    Empty,
    /// The input contains characters that cannot appear in a host.
    #[error("address contains invalid characters: {0:?}")]
    InvalidCharacters(String),
}

/// A validated host string (IP address or hostname), without scheme or port.
///
/// The scheme and port are fixed by the server contract; [`Address::base_url`]
/// combines them into the session's base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address(String);

impl Address {
    /// Validates a raw user-supplied host string.
    ///
    /// Leading and trailing whitespace is trimmed, matching what the original
    /// UI does with the address text field.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::Empty`] for empty/whitespace input and
    /// [`AddressError::InvalidCharacters`] when the host contains embedded
    /// whitespace or a scheme separator.
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        let host = raw.trim();
        if host.is_empty() {
            return Err(AddressError::Empty);
        }
        if host.chars().any(char::is_whitespace) || host.contains("://") {
            return Err(AddressError::InvalidCharacters(host.to_string()));
        }
        Ok(Self(host.to_string()))
    }

    /// Returns the host as a string slice.
    pub fn host(&self) -> &str {
        &self.0
    }

    /// Builds the session base URL: `http://<host>:<port>/`.
    ///
    /// The trailing slash is part of the contract; request paths are joined
    /// onto it without a second slash.
    pub fn base_url(&self, port: u16) -> String {
        format!("http://{}:{}/", self.0, port)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Navigation direction for the focus-based TV navigation.
///
/// The wire representation is the lowercase name (`"up"`, `"enter"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Back,
}

impl Direction {
    /// Returns the wire name of the direction.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Enter => "enter",
            Direction::Back => "back",
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            "enter" => Ok(Direction::Enter),
            "back" => Ok(Direction::Back),
            other => Err(format!("unknown direction: {other}")),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A remote operation, mapped 1:1 to a server endpoint.
///
/// Commands carry no local state; dispatching the same command twice issues
/// two independent HTTP exchanges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Launch the Chromium kiosk on the display device.
    OpenBrowser,
    /// Terminate the Chromium kiosk.
    CloseBrowser,
    /// Move the focus highlight in the given direction (or activate/go back).
    Navigate(Direction),
    /// Type text into the focused element.
    InputText(String),
    /// Navigate the browser to the given URL.
    OpenUrl(String),
    /// Click the focused element.
    Click,
    /// Query server and browser status.  Also used as the liveness probe.
    GetStatus,
}

impl Command {
    /// Short human-readable label used in log lines and failure reports.
    pub fn label(&self) -> &'static str {
        match self {
            Command::OpenBrowser => "open browser",
            Command::CloseBrowser => "close browser",
            Command::Navigate(_) => "navigate",
            Command::InputText(_) => "input text",
            Command::OpenUrl(_) => "open url",
            Command::Click => "click",
            Command::GetStatus => "get status",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Navigate(dir) => write!(f, "navigate({dir})"),
            Command::InputText(_) => f.write_str("input text"),
            Command::OpenUrl(url) => write!(f, "open url({url})"),
            other => f.write_str(other.label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_parse_accepts_ip() {
        let addr = Address::parse("192.168.1.50").unwrap();
        assert_eq!(addr.host(), "192.168.1.50");
    }

    #[test]
    fn test_address_parse_accepts_hostname() {
        let addr = Address::parse("living-room-pi.local").unwrap();
        assert_eq!(addr.host(), "living-room-pi.local");
    }

    #[test]
    fn test_address_parse_trims_whitespace() {
        let addr = Address::parse("  10.0.0.5  ").unwrap();
        assert_eq!(addr.host(), "10.0.0.5");
    }

    #[test]
    fn test_address_parse_rejects_empty() {
        assert_eq!(Address::parse(""), Err(AddressError::Empty));
        assert_eq!(Address::parse("   "), Err(AddressError::Empty));
    }

    #[test]
    fn test_address_parse_rejects_embedded_whitespace() {
        assert!(matches!(
            Address::parse("10.0.0.5 extra"),
            Err(AddressError::InvalidCharacters(_))
        ));
    }

    #[test]
    fn test_address_parse_rejects_scheme() {
        assert!(matches!(
            Address::parse("http://10.0.0.5"),
            Err(AddressError::InvalidCharacters(_))
        ));
    }

    #[test]
    fn test_base_url_has_scheme_port_and_trailing_slash() {
        let addr = Address::parse("10.0.0.5").unwrap();
        assert_eq!(addr.base_url(5000), "http://10.0.0.5:5000/");
    }

    #[test]
    fn test_direction_round_trips_through_wire_name() {
        for dir in [
            Direction::Up,
            Direction::Down,
            Direction::Left,
            Direction::Right,
            Direction::Enter,
            Direction::Back,
        ] {
            assert_eq!(dir.as_str().parse::<Direction>(), Ok(dir));
        }
    }

    #[test]
    fn test_direction_from_str_rejects_unknown() {
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn test_direction_serializes_lowercase() {
        let json = serde_json::to_string(&Direction::Enter).unwrap();
        assert_eq!(json, "\"enter\"");
    }
}
