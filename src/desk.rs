use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, error, info};

use crate::api::ReviewApi;
use crate::error::{ClientError, ClientResult};
use crate::models::*;
use crate::state::{BookField, FormMode, Notice, Sequencer, Ticket, ViewState};

#[derive(Default)]
struct Inner {
    view: ViewState,
    books_seq: Sequencer,
    genres_seq: Sequencer,
    report_seq: Sequencer,
}

/// Owns the page state and performs every user action against the API.
///
/// State is behind a lock that is never held across a request, so each
/// operation's reads and writes are atomic while overlapping operations
/// remain possible. List, genre and report responses are sequenced: a
/// response issued before one already applied is dropped.
pub struct ReviewDesk {
    api: Arc<dyn ReviewApi>,
    inner: RwLock<Inner>,
}

impl ReviewDesk {
    pub fn new(api: Arc<dyn ReviewApi>) -> Self {
        Self { api, inner: RwLock::new(Inner::default()) }
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> ViewState {
        self.read().view.clone()
    }

    /// Initial load: the unfiltered book list and the genre list.
    pub async fn mount(&self) {
        let (books, genres) = tokio::join!(self.fetch_books(GenreFilter::All), self.fetch_genres());
        // failures are already logged and surfaced as a notice
        let _ = (books, genres);
    }

    // ---- drafts -------------------------------------------------------

    pub fn set_username(&self, value: impl Into<String>) {
        self.write().view.user_draft.username = value.into();
    }

    pub fn set_email(&self, value: impl Into<String>) {
        self.write().view.user_draft.email = value.into();
    }

    pub fn set_book_field(&self, field: BookField, value: impl Into<String>) {
        field.apply(&mut self.write().view.book_draft, value.into());
    }

    pub fn set_genre_draft(&self, value: impl Into<String>) {
        self.write().view.genre_draft = value.into();
    }

    /// Genre scope used by the next report.
    pub fn select_genre(&self, filter: GenreFilter) {
        self.write().view.selected_genre = filter;
    }

    pub fn dismiss_notice(&self) {
        self.write().view.notice = None;
    }

    // ---- users --------------------------------------------------------

    pub async fn create_user(&self) -> ClientResult<()> {
        let user = self.read().view.user_draft.clone();
        match self.api.create_user(&user).await {
            Ok(message) => {
                self.write().view.user_draft = NewUser::default();
                self.succeed(message);
                Ok(())
            }
            Err(e) => Err(self.fail("creating user", e)),
        }
    }

    // ---- books --------------------------------------------------------

    /// Creates or updates depending on the form mode. On success the form
    /// resets and the unfiltered list is fetched again.
    pub async fn submit_book(&self) -> ClientResult<()> {
        let (mode, draft) = {
            let g = self.read();
            (g.view.mode, g.view.book_draft.clone())
        };
        let message = match mode {
            FormMode::Creating => self
                .api
                .create_book(&draft)
                .await
                .map_err(|e| self.fail("creating book", e))?,
            FormMode::Editing(id) => self
                .api
                .update_book(id, &draft)
                .await
                .map_err(|e| self.fail("updating book", e))?,
        };
        self.reset_book_form();
        self.succeed(message);
        let _ = self.fetch_books(GenreFilter::All).await;
        Ok(())
    }

    /// Loads a listed book into the form and switches to editing it.
    ///
    /// The genre selector is left empty rather than set from the book;
    /// submitting without picking a genre sends an empty `genre_id`.
    pub fn start_edit(&self, book: &Book) {
        let mut g = self.write();
        g.view.mode = FormMode::Editing(book.id);
        g.view.book_draft = BookDraft {
            title: book.title.clone(),
            description: book.description.clone().unwrap_or_default(),
            user_username: book.user_username.clone(),
            rating: book.rating_text(),
            genre_id: String::new(),
        };
    }

    pub fn start_edit_by_id(&self, id: Id) -> ClientResult<()> {
        let book = self.read().view.book(id).cloned();
        match book {
            Some(book) => {
                self.start_edit(&book);
                Ok(())
            }
            None => Err(self.fail("editing book", ClientError::UnknownBook(id))),
        }
    }

    /// Leaves editing mode and clears the form.
    pub fn cancel_edit(&self) {
        self.reset_book_form();
    }

    pub async fn delete_book(&self, id: Id) -> ClientResult<()> {
        match self.api.delete_book(id).await {
            Ok(message) => {
                self.succeed(message);
                let _ = self.fetch_books(GenreFilter::All).await;
                Ok(())
            }
            Err(e) => Err(self.fail("deleting book", e)),
        }
    }

    /// Replaces the book list with the server's list for `filter`.
    pub async fn fetch_books(&self, filter: GenreFilter) -> ClientResult<()> {
        let ticket = self.write().books_seq.issue();
        match self.api.list_books(filter).await {
            Ok(books) => {
                let mut g = self.write();
                if g.books_seq.admit(ticket) {
                    g.view.books = books;
                } else {
                    debug!(%filter, "discarding stale book list");
                }
                Ok(())
            }
            Err(e) if self.read().books_seq.is_stale(ticket) => {
                debug!(%filter, "ignoring failure of stale book list: {e}");
                Err(e)
            }
            Err(e) => Err(self.fail("fetching books", e)),
        }
    }

    fn reset_book_form(&self) {
        let mut g = self.write();
        g.view.book_draft = BookDraft::default();
        g.view.mode = FormMode::Creating;
    }

    // ---- genres -------------------------------------------------------

    pub async fn fetch_genres(&self) -> ClientResult<()> {
        let ticket = self.write().genres_seq.issue();
        match self.api.list_genres().await {
            Ok(genres) => {
                let mut g = self.write();
                if g.genres_seq.admit(ticket) {
                    g.view.genres = genres;
                } else {
                    debug!("discarding stale genre list");
                }
                Ok(())
            }
            Err(e) if self.read().genres_seq.is_stale(ticket) => {
                debug!("ignoring failure of stale genre list: {e}");
                Err(e)
            }
            Err(e) => Err(self.fail("fetching genres", e)),
        }
    }

    pub async fn create_genre(&self) -> ClientResult<()> {
        let genre = NewGenre { name: self.read().view.genre_draft.clone() };
        match self.api.create_genre(&genre).await {
            Ok(message) => {
                self.write().view.genre_draft.clear();
                self.succeed(message);
                let _ = self.fetch_genres().await;
                Ok(())
            }
            Err(e) => Err(self.fail("creating genre", e)),
        }
    }

    // ---- report -------------------------------------------------------

    /// Fetches the report for the selected genre, then the book list under
    /// the same scope.
    pub async fn generate_report(&self) -> ClientResult<()> {
        let filter = self.read().view.selected_genre;
        let ticket = self.write().report_seq.issue();
        let report = match self.api.book_report(filter).await {
            Ok(report) => report,
            Err(e) if self.read().report_seq.is_stale(ticket) => {
                debug!(%filter, "ignoring failure of stale report: {e}");
                return Err(e);
            }
            Err(e) => return Err(self.fail("fetching book report", e)),
        };
        // A superseded report also skips its list fetch.
        if self.apply_report(ticket, report) {
            let _ = self.fetch_books(filter).await;
        }
        Ok(())
    }

    fn apply_report(&self, ticket: Ticket, report: Report) -> bool {
        let mut g = self.write();
        let fresh = g.report_seq.admit(ticket);
        if fresh {
            g.view.report = Some(report);
        } else {
            debug!("discarding stale report");
        }
        fresh
    }

    // ---- notices ------------------------------------------------------

    fn succeed(&self, message: String) {
        info!("{message}");
        self.write().view.notice = Some(Notice::Info(message));
    }

    fn fail(&self, context: &str, err: ClientError) -> ClientError {
        error!("Error {context}: {err}");
        self.write().view.notice = Some(Notice::Error(format!("Error {context}: {err}")));
        err
    }
}
