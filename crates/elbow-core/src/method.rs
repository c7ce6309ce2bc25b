//! HTTP methods a schema may declare, and how each one attaches parameters

use std::str::FromStr;

/// Closed set of methods a schema can exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Head,
}

/// Channel through which request parameters travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attachment {
    /// Appended to the URL as a query string
    Query,
    /// Serialized as the JSON request body
    Body,
}

impl Method {
    pub const ALL: [Self; 5] = [Self::Get, Self::Post, Self::Put, Self::Delete, Self::Head];

    /// Upper-case wire name, e.g. "GET".
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
        }
    }

    /// Where parameters (including the legacy `params` bag) are attached.
    #[must_use]
    pub const fn attachment(self) -> Attachment {
        match self {
            Self::Get | Self::Head => Attachment::Query,
            Self::Post | Self::Put | Self::Delete => Attachment::Body,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = UnsupportedMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(Self::Get),
            "post" => Ok(Self::Post),
            "put" => Ok(Self::Put),
            "delete" => Ok(Self::Delete),
            "head" => Ok(Self::Head),
            _ => Err(UnsupportedMethod(s.to_string())),
        }
    }
}

/// A schema declared a method outside [`Method::ALL`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported HTTP method '{0}' (expected one of get, post, put, delete, head)")]
pub struct UnsupportedMethod(pub String);
