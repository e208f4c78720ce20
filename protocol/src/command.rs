//! Inbound command parsing.

use std::fmt;

use saltpow_types::{Challenge, Profile};

use crate::ProtocolError;

/// A profile field the server can ask for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Name,
    MailCount,
    /// 1-based index into the profile's mail addresses.
    Mail(usize),
    Skype,
    BirthDate,
    Country,
    AddressCount,
    /// 1-based index into the profile's address lines.
    AddressLine(usize),
}

impl Field {
    /// Parse a command keyword such as `NAME` or `MAIL2`.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let field = match keyword {
            "NAME" => Self::Name,
            "MAILNUM" => Self::MailCount,
            "SKYPE" => Self::Skype,
            "BIRTHDATE" => Self::BirthDate,
            "COUNTRY" => Self::Country,
            "ADDRNUM" => Self::AddressCount,
            _ => {
                if let Some(index) = keyword.strip_prefix("ADDRLINE") {
                    Self::AddressLine(parse_index(index)?)
                } else if let Some(index) = keyword.strip_prefix("MAIL") {
                    Self::Mail(parse_index(index)?)
                } else {
                    return None;
                }
            }
        };
        Some(field)
    }

    /// The profile value sent back for this field.
    pub fn value(&self, profile: &Profile) -> Result<String, ProtocolError> {
        let value = match *self {
            Self::Name => profile.name.clone(),
            Self::MailCount => profile.mails.len().to_string(),
            Self::Mail(n) => nth(&profile.mails, n).ok_or_else(|| self.missing())?,
            Self::Skype => profile.skype.clone(),
            Self::BirthDate => profile.birth_date.clone(),
            Self::Country => profile.country.clone(),
            Self::AddressCount => profile.address.len().to_string(),
            Self::AddressLine(n) => nth(&profile.address, n).ok_or_else(|| self.missing())?,
        };
        Ok(value)
    }

    fn missing(&self) -> ProtocolError {
        ProtocolError::MissingProfileField {
            field: self.to_string(),
        }
    }
}

fn parse_index(digits: &str) -> Option<usize> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().filter(|n| *n >= 1)
}

fn nth(values: &[String], one_based: usize) -> Option<String> {
    values.get(one_based.checked_sub(1)?).cloned()
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => f.write_str("NAME"),
            Self::MailCount => f.write_str("MAILNUM"),
            Self::Mail(n) => write!(f, "MAIL{n}"),
            Self::Skype => f.write_str("SKYPE"),
            Self::BirthDate => f.write_str("BIRTHDATE"),
            Self::Country => f.write_str("COUNTRY"),
            Self::AddressCount => f.write_str("ADDRNUM"),
            Self::AddressLine(n) => write!(f, "ADDRLINE{n}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Helo,
    End,
    /// Server-side failure; the rest of the line is the message.
    Error(String),
    /// Profile field request carrying the server's per-field token.
    Field { field: Field, token: String },
    Pow(Challenge),
}

impl Command {
    /// Parse one inbound line (terminator already stripped).
    ///
    /// Arguments are whitespace-separated. Trailing extra arguments are
    /// ignored.
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let mut parts = line.split_whitespace();
        let keyword = parts.next().unwrap_or_default();

        match keyword {
            "HELO" => Ok(Self::Helo),
            "END" => Ok(Self::End),
            "ERROR" => {
                let message = line.trim_start()["ERROR".len()..].trim();
                Ok(Self::Error(message.to_string()))
            }
            "POW" => {
                let (Some(authdata), Some(difficulty)) = (parts.next(), parts.next()) else {
                    return Err(ProtocolError::MalformedCommand(format!(
                        "POW expects <authdata> <difficulty>, got {line:?}"
                    )));
                };
                Ok(Self::Pow(Challenge::parse(authdata, difficulty)?))
            }
            _ => {
                let field = Field::from_keyword(keyword)
                    .ok_or_else(|| ProtocolError::UnknownCommand(keyword.to_string()))?;
                let token = parts.next().ok_or_else(|| {
                    ProtocolError::MalformedCommand(format!("{field} expects a token"))
                })?;
                Ok(Self::Field {
                    field,
                    token: token.to_string(),
                })
            }
        }
    }

    pub fn name(&self) -> String {
        match self {
            Self::Helo => "HELO".into(),
            Self::End => "END".into(),
            Self::Error(_) => "ERROR".into(),
            Self::Field { field, .. } => field.to_string(),
            Self::Pow(_) => "POW".into(),
        }
    }
}
