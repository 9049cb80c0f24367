use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::user::UserRef;

/// Closed genre set. The wire labels are part of the compatibility surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Genre {
    Fiction,
    #[serde(rename = "Non-Fiction")]
    NonFiction,
    Mystery,
    Romance,
    #[serde(rename = "Sci-Fi")]
    SciFi,
    Fantasy,
    Thriller,
    Biography,
    History,
    #[serde(rename = "Self-Help")]
    SelfHelp,
    Poetry,
    Drama,
    Horror,
    Adventure,
    Other,
}

impl Genre {
    pub const ALL: [Genre; 15] = [
        Genre::Fiction,
        Genre::NonFiction,
        Genre::Mystery,
        Genre::Romance,
        Genre::SciFi,
        Genre::Fantasy,
        Genre::Thriller,
        Genre::Biography,
        Genre::History,
        Genre::SelfHelp,
        Genre::Poetry,
        Genre::Drama,
        Genre::Horror,
        Genre::Adventure,
        Genre::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Fiction => "Fiction",
            Genre::NonFiction => "Non-Fiction",
            Genre::Mystery => "Mystery",
            Genre::Romance => "Romance",
            Genre::SciFi => "Sci-Fi",
            Genre::Fantasy => "Fantasy",
            Genre::Thriller => "Thriller",
            Genre::Biography => "Biography",
            Genre::History => "History",
            Genre::SelfHelp => "Self-Help",
            Genre::Poetry => "Poetry",
            Genre::Drama => "Drama",
            Genre::Horror => "Horror",
            Genre::Adventure => "Adventure",
            Genre::Other => "Other",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Genre {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Genre::ALL
            .iter()
            .find(|g| g.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown genre: {}", s))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub description: String,
    pub genre: Genre,
    pub published_year: i32,
    pub cover_image: Option<String>,
    /// Derived: mean of the book's review ratings, one fractional digit.
    /// Only ever written by the rating aggregator.
    pub average_rating: f64,
    /// Derived: number of reviews referencing this book.
    pub review_count: i64,
    pub added_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Client payload for book creation. Derived rating fields are not part of
/// this struct, so they can never be accepted from input.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub description: String,
    pub genre: Genre,
    pub published_year: i32,
    #[serde(default)]
    pub cover_image: Option<String>,
}

/// Partial update; unset fields retain their prior value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookChanges {
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub genre: Option<Genre>,
    pub published_year: Option<i32>,
    pub cover_image: Option<String>,
}

impl BookChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.description.is_none()
            && self.genre.is_none()
            && self.published_year.is_none()
            && self.cover_image.is_none()
    }
}

/// Book read model served to the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookView {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub description: String,
    pub genre: Genre,
    pub published_year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    pub average_rating: f64,
    pub review_count: i64,
    pub added_by: UserRef,
    pub created_at: DateTime<Utc>,
}

impl BookView {
    pub fn from_parts(book: Book, owner: UserRef) -> Self {
        BookView {
            id: book.id,
            title: book.title,
            author: book.author,
            description: book.description,
            genre: book.genre,
            published_year: book.published_year,
            cover_image: book.cover_image,
            average_rating: book.average_rating,
            review_count: book.review_count,
            added_by: owner,
            created_at: book.created_at,
        }
    }
}
