use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type Id = i64;

/// Genre scope for list and report queries. `All` is sent by omitting
/// `genre_id` from the query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenreFilter {
    #[default]
    All,
    Genre(Id),
}

impl GenreFilter {
    /// Query pairs for the request; empty for `All`.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            GenreFilter::All => Vec::new(),
            GenreFilter::Genre(id) => vec![("genre_id", id.to_string())],
        }
    }

    /// Parses the selector value used by the genre dropdown: empty or `all`
    /// means every genre.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
            return Some(GenreFilter::All);
        }
        raw.parse().ok().map(GenreFilter::Genre)
    }
}

impl fmt::Display for GenreFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenreFilter::All => f.write_str("all"),
            GenreFilter::Genre(id) => write!(f, "{id}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub id: Id,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewGenre {
    pub name: String,
}

/// Form values for a review. Rating and genre id travel as the raw strings
/// typed into the form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookDraft {
    pub title: String,
    pub description: String,
    pub user_username: String,
    pub rating: String,
    pub genre_id: String,
}

/// A stored rating. The server keeps whatever string the form sent, so a
/// row may come back with text where a number is expected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rating {
    Number(f64),
    Text(String),
}

impl Rating {
    /// Reads a raw form value the way the store does: numeric text becomes a number.
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Rating::Number(n),
            _ => Rating::Text(raw.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Rating::Number(n) => Some(*n),
            Rating::Text(_) => None,
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rating::Number(n) => write!(f, "{n}"),
            Rating::Text(t) => f.write_str(t),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: Id,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub user_username: String,
    #[serde(default)]
    pub rating: Option<Rating>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre_id: Option<Id>,
    #[serde(default)]
    pub genre: Option<Genre>,
    #[serde(default)]
    pub created_at: String,
}

impl Book {
    /// Rating as shown in the list; whole numbers print without a fraction.
    pub fn rating_text(&self) -> String {
        self.rating.as_ref().map(Rating::to_string).unwrap_or_default()
    }
}

/// Aggregate snapshot returned by `/books/report`. The server answers `{}`
/// when nothing matches, so every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct Report {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_ratings: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_users: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_books: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highest_rated_book: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lowest_rated_book: Option<String>,
    /// The body carried at least one key, even if every value was null.
    #[serde(skip)]
    pub has_keys: bool,
}

impl TryFrom<Map<String, Value>> for Report {
    type Error = serde_json::Error;

    fn try_from(mut body: Map<String, Value>) -> Result<Self, Self::Error> {
        fn take<T: DeserializeOwned>(
            body: &mut Map<String, Value>,
            key: &str,
        ) -> serde_json::Result<Option<T>> {
            match body.remove(key) {
                None | Some(Value::Null) => Ok(None),
                Some(v) => serde_json::from_value(v).map(Some),
            }
        }
        let has_keys = !body.is_empty();
        Ok(Report {
            genre_name: take(&mut body, "genre_name")?,
            avg_rating: take(&mut body, "avg_rating")?,
            num_ratings: take(&mut body, "num_ratings")?,
            num_users: take(&mut body, "num_users")?,
            num_books: take(&mut body, "num_books")?,
            highest_rated_book: take(&mut body, "highest_rated_book")?,
            lowest_rated_book: take(&mut body, "lowest_rated_book")?,
            has_keys,
        })
    }
}

impl Report {
    /// Nothing to show: no keys came back and no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Report::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiMessage {
    pub message: String,
}
