use std::sync::Arc;

use async_trait::async_trait;
use bookreview::api::{BookApi, GenreApi, UserApi};
use bookreview::models::*;
use bookreview::state::Notice;
use bookreview::{ClientError, ClientResult, ReviewDesk};
use tokio::sync::Notify;

/// Scoped queries block until released; unscoped ones answer at once.
/// With `fail_scoped` the released queries answer with a server error.
#[derive(Default)]
struct GatedApi {
    gate: Notify,
    fail_scoped: bool,
}

impl GatedApi {
    fn failing() -> Self {
        Self { fail_scoped: true, ..Self::default() }
    }

    async fn release<T>(&self, value: T) -> ClientResult<T> {
        self.gate.notified().await;
        if self.fail_scoped {
            return Err(ClientError::status(500, "Internal Server Error"));
        }
        Ok(value)
    }
}

fn book(id: Id, title: &str) -> Book {
    Book {
        id,
        title: title.into(),
        description: None,
        user_username: "ada".into(),
        rating: Some(Rating::Number(3.0)),
        genre_id: None,
        genre: None,
        created_at: String::new(),
    }
}

#[async_trait]
impl UserApi for GatedApi {
    async fn create_user(&self, _user: &NewUser) -> ClientResult<String> {
        Ok("ok".into())
    }
}

#[async_trait]
impl BookApi for GatedApi {
    async fn list_books(&self, filter: GenreFilter) -> ClientResult<Vec<Book>> {
        match filter {
            GenreFilter::All => Ok(vec![book(1, "everything")]),
            GenreFilter::Genre(_) => self.release(vec![book(2, "scoped")]).await,
        }
    }
    async fn create_book(&self, _draft: &BookDraft) -> ClientResult<String> {
        Ok("ok".into())
    }
    async fn update_book(&self, _id: Id, _draft: &BookDraft) -> ClientResult<String> {
        Ok("ok".into())
    }
    async fn delete_book(&self, _id: Id) -> ClientResult<String> {
        Ok("ok".into())
    }
    async fn book_report(&self, filter: GenreFilter) -> ClientResult<Report> {
        match filter {
            GenreFilter::All => Ok(Report { num_books: Some(10), ..Report::default() }),
            GenreFilter::Genre(_) => {
                self.release(Report { num_books: Some(1), ..Report::default() }).await
            }
        }
    }
}

#[async_trait]
impl GenreApi for GatedApi {
    async fn list_genres(&self) -> ClientResult<Vec<Genre>> {
        Ok(Vec::new())
    }
    async fn create_genre(&self, _genre: &NewGenre) -> ClientResult<String> {
        Ok("ok".into())
    }
}

#[tokio::test]
async fn older_book_list_resolving_last_is_dropped() {
    let api = Arc::new(GatedApi::default());
    let desk = ReviewDesk::new(api.clone());

    // the scoped fetch is issued first but answers after the unscoped one
    let slow = desk.fetch_books(GenreFilter::Genre(4));
    let fast = async {
        let r = desk.fetch_books(GenreFilter::All).await;
        api.gate.notify_one();
        r
    };
    let (slow, fast) = tokio::join!(slow, fast);
    assert!(slow.is_ok() && fast.is_ok());

    let view = desk.snapshot();
    assert_eq!(view.books.len(), 1);
    assert_eq!(view.books[0].title, "everything");
}

#[tokio::test]
async fn later_request_still_applies_when_it_resolves_last() {
    let api = Arc::new(GatedApi::default());
    let desk = ReviewDesk::new(api.clone());

    desk.fetch_books(GenreFilter::All).await.unwrap();
    let slow = desk.fetch_books(GenreFilter::Genre(4));
    let release = async { api.gate.notify_one() };
    let (slow, ()) = tokio::join!(slow, release);
    slow.unwrap();

    assert_eq!(desk.snapshot().books[0].title, "scoped");
}

#[tokio::test]
async fn older_report_resolving_last_is_dropped() {
    let api = Arc::new(GatedApi::default());
    let desk = ReviewDesk::new(api.clone());

    desk.select_genre(GenreFilter::Genre(4));
    let slow = desk.generate_report();
    let fast = async {
        desk.select_genre(GenreFilter::All);
        let r = desk.generate_report().await;
        api.gate.notify_one();
        r
    };
    let (slow, fast) = tokio::join!(slow, fast);
    assert!(slow.is_ok() && fast.is_ok());

    // the superseded report neither lands nor fetches its scoped list
    let view = desk.snapshot();
    assert_eq!(view.report.unwrap().num_books, Some(10));
    assert_eq!(view.books[0].title, "everything");
}

#[tokio::test]
async fn failure_of_superseded_list_raises_no_notice() {
    let api = Arc::new(GatedApi::failing());
    let desk = ReviewDesk::new(api.clone());

    let slow = desk.fetch_books(GenreFilter::Genre(4));
    let fast = async {
        let r = desk.fetch_books(GenreFilter::All).await;
        api.gate.notify_one();
        r
    };
    let (slow, fast) = tokio::join!(slow, fast);
    assert_eq!(slow.unwrap_err().http_status(), Some(500));
    fast.unwrap();

    let view = desk.snapshot();
    assert_eq!(view.notice, None);
    assert_eq!(view.books[0].title, "everything");
}

#[tokio::test]
async fn failure_of_superseded_report_raises_no_notice() {
    let api = Arc::new(GatedApi::failing());
    let desk = ReviewDesk::new(api.clone());

    desk.select_genre(GenreFilter::Genre(4));
    let slow = desk.generate_report();
    let fast = async {
        desk.select_genre(GenreFilter::All);
        let r = desk.generate_report().await;
        api.gate.notify_one();
        r
    };
    let (slow, fast) = tokio::join!(slow, fast);
    assert!(slow.is_err());
    fast.unwrap();

    let view = desk.snapshot();
    assert_eq!(view.notice, None);
    assert_eq!(view.report.unwrap().num_books, Some(10));
}

#[tokio::test]
async fn failure_of_latest_request_is_still_reported() {
    let api = Arc::new(GatedApi::failing());
    let desk = ReviewDesk::new(api.clone());

    desk.fetch_books(GenreFilter::All).await.unwrap();
    let slow = desk.fetch_books(GenreFilter::Genre(4));
    let release = async { api.gate.notify_one() };
    let (slow, ()) = tokio::join!(slow, release);
    assert!(slow.is_err());

    let view = desk.snapshot();
    assert!(matches!(view.notice, Some(Notice::Error(ref m)) if m.starts_with("Error fetching books")));
    assert_eq!(view.books[0].title, "everything");
}
