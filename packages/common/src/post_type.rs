#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which section of the site a post belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    /// Regular blog article.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "post"))]
    Post,
    /// Visitor guestbook entry.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "guestbook"))]
    Guestbook,
    /// Portfolio showcase item.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "portfolio"))]
    Portfolio,
}

impl PostType {
    pub const ALL: &'static [PostType] = &[Self::Post, Self::Guestbook, Self::Portfolio];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Guestbook => "guestbook",
            Self::Portfolio => "portfolio",
        }
    }
}

impl fmt::Display for PostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for PostType {
    fn default() -> Self {
        Self::Post
    }
}

/// Error when parsing an invalid post type string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePostTypeError {
    invalid: String,
}

impl fmt::Display for ParsePostTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid post type '{}'. Valid values: post, guestbook, portfolio",
            self.invalid
        )
    }
}

impl std::error::Error for ParsePostTypeError {}

impl FromStr for PostType {
    type Err = ParsePostTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" => Ok(Self::Post),
            "guestbook" => Ok(Self::Guestbook),
            "portfolio" => Ok(Self::Portfolio),
            _ => Err(ParsePostTypeError {
                invalid: s.to_string(),
            }),
        }
    }
}
