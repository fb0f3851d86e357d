use async_trait::async_trait;

use crate::error::ClientResult;
use crate::models::*;

// Mutating calls resolve to the server's `message` text.

#[async_trait]
pub trait UserApi: Send + Sync {
    async fn create_user(&self, user: &NewUser) -> ClientResult<String>;
}

#[async_trait]
pub trait BookApi: Send + Sync {
    async fn list_books(&self, filter: GenreFilter) -> ClientResult<Vec<Book>>;
    async fn create_book(&self, draft: &BookDraft) -> ClientResult<String>;
    async fn update_book(&self, id: Id, draft: &BookDraft) -> ClientResult<String>;
    async fn delete_book(&self, id: Id) -> ClientResult<String>;
    async fn book_report(&self, filter: GenreFilter) -> ClientResult<Report>;
}

#[async_trait]
pub trait GenreApi: Send + Sync {
    async fn list_genres(&self) -> ClientResult<Vec<Genre>>;
    async fn create_genre(&self, genre: &NewGenre) -> ClientResult<String>;
}

pub trait ReviewApi: UserApi + BookApi + GenreApi {}

impl<T> ReviewApi for T where T: UserApi + BookApi + GenreApi {}

pub mod http {
    use std::time::Duration;

    use serde::de::DeserializeOwned;
    use tracing::debug;

    use super::*;
    use crate::config::Config;
    use crate::error::ClientError;

    /// Gateway to the review server over plain JSON/HTTP.
    #[derive(Clone)]
    pub struct HttpApi {
        client: reqwest::Client,
        base: String,
    }

    impl HttpApi {
        pub fn new(base: &str, timeout: Option<Duration>) -> ClientResult<Self> {
            let mut builder = reqwest::Client::builder();
            if let Some(t) = timeout {
                builder = builder.timeout(t);
            }
            Ok(Self {
                client: builder.build()?,
                base: base.trim_end_matches('/').to_string(),
            })
        }

        pub fn from_config(cfg: &Config) -> ClientResult<Self> {
            Self::new(&cfg.api_base, cfg.request_timeout)
        }

        pub fn base(&self) -> &str {
            &self.base
        }

        fn url(&self, path: &str) -> String {
            format!("{}{}", self.base, path)
        }
    }

    // Non-2xx becomes a Status error carrying the server's `message` when it sent one.
    async fn checked(resp: reqwest::Response) -> ClientResult<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let message = match resp.json::<ApiMessage>().await {
            Ok(body) => body.message,
            Err(_) => status.canonical_reason().unwrap_or("request failed").to_string(),
        };
        Err(ClientError::status(status.as_u16(), message))
    }

    async fn message(resp: reqwest::Response) -> ClientResult<String> {
        let text = checked(resp).await?.text().await?;
        Ok(serde_json::from_str::<ApiMessage>(&text).map(|m| m.message).unwrap_or(text))
    }

    async fn json<T: DeserializeOwned>(resp: reqwest::Response) -> ClientResult<T> {
        checked(resp).await?.json::<T>().await.map_err(ClientError::Decode)
    }

    #[async_trait]
    impl UserApi for HttpApi {
        async fn create_user(&self, user: &NewUser) -> ClientResult<String> {
            let resp = self.client.post(self.url("/users")).json(user).send().await?;
            message(resp).await
        }
    }

    #[async_trait]
    impl BookApi for HttpApi {
        async fn list_books(&self, filter: GenreFilter) -> ClientResult<Vec<Book>> {
            debug!(%filter, "GET /books");
            let resp = self
                .client
                .get(self.url("/books"))
                .query(&filter.query())
                .send()
                .await?;
            json(resp).await
        }

        async fn create_book(&self, draft: &BookDraft) -> ClientResult<String> {
            let resp = self.client.post(self.url("/books")).json(draft).send().await?;
            message(resp).await
        }

        async fn update_book(&self, id: Id, draft: &BookDraft) -> ClientResult<String> {
            let resp = self
                .client
                .put(self.url(&format!("/books/{id}")))
                .json(draft)
                .send()
                .await?;
            message(resp).await
        }

        async fn delete_book(&self, id: Id) -> ClientResult<String> {
            let resp = self.client.delete(self.url(&format!("/books/{id}"))).send().await?;
            message(resp).await
        }

        async fn book_report(&self, filter: GenreFilter) -> ClientResult<Report> {
            debug!(%filter, "GET /books/report");
            let resp = self
                .client
                .get(self.url("/books/report"))
                .query(&filter.query())
                .send()
                .await?;
            json(resp).await
        }
    }

    #[async_trait]
    impl GenreApi for HttpApi {
        async fn list_genres(&self) -> ClientResult<Vec<Genre>> {
            let resp = self.client.get(self.url("/genres")).send().await?;
            json(resp).await
        }

        async fn create_genre(&self, genre: &NewGenre) -> ClientResult<String> {
            let resp = self.client.post(self.url("/genres")).json(genre).send().await?;
            message(resp).await
        }
    }
}

#[cfg(feature = "inmem-api")]
pub mod inmem {
    use std::collections::{BTreeMap, HashMap, HashSet};
    use std::sync::{Arc, RwLock};

    use chrono::Local;

    use super::*;
    use crate::error::ClientError;

    /// Genres the review server seeds on startup.
    pub const BASIC_GENRES: [&str; 9] = [
        "Fiction",
        "Non-Fiction",
        "Mystery",
        "Fantasy",
        "Science Fiction",
        "Romance",
        "Thriller",
        "Biography",
        "History",
    ];

    /// One request as the fake server saw it.
    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        CreateUser(NewUser),
        ListBooks(GenreFilter),
        CreateBook(BookDraft),
        UpdateBook(Id, BookDraft),
        DeleteBook(Id),
        Report(GenreFilter),
        ListGenres,
        CreateGenre(NewGenre),
    }

    #[derive(Clone)]
    struct StoredBook {
        id: Id,
        title: String,
        description: String,
        user_username: String,
        // Kept as sent; the server does not validate either field.
        rating: String,
        genre_id: String,
        created_at: String,
    }

    impl StoredBook {
        fn genre(&self) -> Option<Id> {
            self.genre_id.trim().parse().ok()
        }

        fn score(&self) -> Option<f64> {
            Rating::from_raw(&self.rating).as_number()
        }

        fn in_scope(&self, filter: GenreFilter) -> bool {
            match filter {
                GenreFilter::All => true,
                GenreFilter::Genre(g) => self.genre() == Some(g),
            }
        }
    }

    #[derive(Default)]
    struct State {
        users: HashMap<String, NewUser>,
        genres: BTreeMap<Id, Genre>,
        books: BTreeMap<Id, StoredBook>,
        next_genre: Id,
        next_book: Id,
        calls: Vec<Call>,
        failing: bool,
    }

    /// In-process stand-in for the review server.
    #[derive(Clone, Default)]
    pub struct InMemApi {
        state: Arc<RwLock<State>>,
    }

    impl InMemApi {
        pub fn new() -> Self {
            Self::default()
        }

        /// Fresh server holding the basic genre catalogue.
        pub fn seeded() -> Self {
            let api = Self::new();
            {
                let mut s = api.state.write().unwrap();
                for name in BASIC_GENRES {
                    Self::insert_genre(&mut s, name);
                }
            }
            api
        }

        /// Every request fails with 503 while set.
        pub fn set_failing(&self, failing: bool) {
            self.state.write().unwrap().failing = failing;
        }

        pub fn calls(&self) -> Vec<Call> {
            self.state.read().unwrap().calls.clone()
        }

        pub fn clear_calls(&self) {
            self.state.write().unwrap().calls.clear();
        }

        fn insert_genre(s: &mut State, name: &str) -> Id {
            s.next_genre += 1;
            let id = s.next_genre;
            s.genres.insert(id, Genre { id, name: name.to_string() });
            id
        }

        fn record(&self, call: Call) -> ClientResult<std::sync::RwLockWriteGuard<'_, State>> {
            let mut s = self.state.write().unwrap();
            s.calls.push(call);
            if s.failing {
                return Err(ClientError::status(503, "Service Unavailable"));
            }
            Ok(s)
        }

        // The server only checks that the reviewer exists.
        fn require_user(s: &State, draft: &BookDraft) -> ClientResult<()> {
            if !s.users.contains_key(&draft.user_username) {
                return Err(ClientError::status(404, "User not found"));
            }
            Ok(())
        }

        fn to_book(s: &State, b: &StoredBook) -> Book {
            Book {
                id: b.id,
                title: b.title.clone(),
                description: Some(b.description.clone()),
                user_username: b.user_username.clone(),
                rating: Some(Rating::from_raw(&b.rating)),
                genre_id: None,
                genre: b.genre().and_then(|id| s.genres.get(&id)).cloned(),
                created_at: b.created_at.clone(),
            }
        }
    }

    fn labelled(b: &StoredBook, score: f64) -> String {
        format!("{} ({score:.2})", b.title)
    }

    #[async_trait]
    impl UserApi for InMemApi {
        async fn create_user(&self, user: &NewUser) -> ClientResult<String> {
            let mut s = self.record(Call::CreateUser(user.clone()))?;
            if s.users.contains_key(&user.username) {
                return Err(ClientError::status(409, "User already exists"));
            }
            s.users.insert(user.username.clone(), user.clone());
            Ok("User created successfully".into())
        }
    }

    #[async_trait]
    impl BookApi for InMemApi {
        async fn list_books(&self, filter: GenreFilter) -> ClientResult<Vec<Book>> {
            let s = self.record(Call::ListBooks(filter))?;
            Ok(s.books
                .values()
                .filter(|b| b.in_scope(filter))
                .map(|b| Self::to_book(&s, b))
                .collect())
        }

        async fn create_book(&self, draft: &BookDraft) -> ClientResult<String> {
            let mut s = self.record(Call::CreateBook(draft.clone()))?;
            Self::require_user(&s, draft)?;
            s.next_book += 1;
            let id = s.next_book;
            let book = StoredBook {
                id,
                title: draft.title.clone(),
                description: draft.description.clone(),
                user_username: draft.user_username.clone(),
                rating: draft.rating.clone(),
                genre_id: draft.genre_id.clone(),
                created_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            };
            s.books.insert(id, book);
            Ok("Book created successfully".into())
        }

        async fn update_book(&self, id: Id, draft: &BookDraft) -> ClientResult<String> {
            let mut s = self.record(Call::UpdateBook(id, draft.clone()))?;
            if !s.books.contains_key(&id) {
                return Err(ClientError::status(404, "Book not found"));
            }
            Self::require_user(&s, draft)?;
            let Some(book) = s.books.get_mut(&id) else {
                return Err(ClientError::status(404, "Book not found"));
            };
            book.title = draft.title.clone();
            book.description = draft.description.clone();
            book.user_username = draft.user_username.clone();
            book.rating = draft.rating.clone();
            book.genre_id = draft.genre_id.clone();
            Ok("Book updated successfully".into())
        }

        async fn delete_book(&self, id: Id) -> ClientResult<String> {
            let mut s = self.record(Call::DeleteBook(id))?;
            match s.books.remove(&id) {
                Some(_) => Ok("Book deleted successfully".into()),
                None => Err(ClientError::status(404, "Book not found")),
            }
        }

        async fn book_report(&self, filter: GenreFilter) -> ClientResult<Report> {
            let s = self.record(Call::Report(filter))?;
            let scoped: Vec<&StoredBook> = s
                .books
                .values()
                .filter(|b| b.in_scope(filter))
                .collect();

            // A scoped query with no rows yields `{}`; the unscoped one still reports zeros.
            if scoped.is_empty() {
                return Ok(match filter {
                    GenreFilter::Genre(_) => Report::default(),
                    GenreFilter::All => Report {
                        num_ratings: Some(0),
                        num_users: Some(0),
                        num_books: Some(0),
                        has_keys: true,
                        ..Report::default()
                    },
                });
            }

            let users: HashSet<&str> = scoped.iter().map(|b| b.user_username.as_str()).collect();
            // Only numeric ratings take part in the average and the extremes.
            let scored: Vec<(&StoredBook, f64)> =
                scoped.iter().filter_map(|b| b.score().map(|r| (*b, r))).collect();
            let avg = (!scored.is_empty())
                .then(|| scored.iter().map(|(_, r)| r).sum::<f64>() / scored.len() as f64);
            // Ties go to the lowest id.
            let best = scored.iter().copied().reduce(|acc, b| if b.1 > acc.1 { b } else { acc });
            let worst = scored.iter().copied().reduce(|acc, b| if b.1 < acc.1 { b } else { acc });
            let count = scoped.len() as u64;

            Ok(Report {
                genre_name: match filter {
                    GenreFilter::All => None,
                    GenreFilter::Genre(g) => s.genres.get(&g).map(|g| g.name.clone()),
                },
                avg_rating: avg,
                num_ratings: Some(count),
                num_users: Some(users.len() as u64),
                num_books: Some(count),
                highest_rated_book: best.map(|(b, r)| labelled(b, r)),
                lowest_rated_book: worst.map(|(b, r)| labelled(b, r)),
                has_keys: true,
            })
        }
    }

    #[async_trait]
    impl GenreApi for InMemApi {
        async fn list_genres(&self) -> ClientResult<Vec<Genre>> {
            let s = self.record(Call::ListGenres)?;
            Ok(s.genres.values().cloned().collect())
        }

        async fn create_genre(&self, genre: &NewGenre) -> ClientResult<String> {
            let mut s = self.record(Call::CreateGenre(genre.clone()))?;
            Self::insert_genre(&mut s, &genre.name);
            Ok("Genre created successfully".into())
        }
    }
}
