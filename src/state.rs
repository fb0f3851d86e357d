use crate::models::*;

/// Which operation the book form submits to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormMode {
    #[default]
    Creating,
    Editing(Id),
}

impl FormMode {
    pub fn editing_id(&self) -> Option<Id> {
        match self {
            FormMode::Creating => None,
            FormMode::Editing(id) => Some(*id),
        }
    }
}

/// Outcome of the last operation, shown above the page.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Info(String),
    Error(String),
}

/// Input on the book form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookField {
    Title,
    Description,
    User,
    Rating,
    Genre,
}

impl BookField {
    pub fn apply(self, draft: &mut BookDraft, value: String) {
        match self {
            BookField::Title => draft.title = value,
            BookField::Description => draft.description = value,
            BookField::User => draft.user_username = value,
            BookField::Rating => draft.rating = value,
            BookField::Genre => draft.genre_id = value,
        }
    }
}

/// Everything the page shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub user_draft: NewUser,
    pub book_draft: BookDraft,
    pub mode: FormMode,
    pub genres: Vec<Genre>,
    pub selected_genre: GenreFilter,
    pub genre_draft: String,
    /// `None` until a report has been fetched.
    pub report: Option<Report>,
    pub books: Vec<Book>,
    pub notice: Option<Notice>,
}

impl ViewState {
    pub fn genre_name(&self, id: Id) -> Option<&str> {
        self.genres.iter().find(|g| g.id == id).map(|g| g.name.as_str())
    }

    pub fn book(&self, id: Id) -> Option<&Book> {
        self.books.iter().find(|b| b.id == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Orders responses of one logical query. A response is applied only if
/// its ticket is newer than the last one applied.
#[derive(Debug, Default)]
pub struct Sequencer {
    issued: u64,
    applied: u64,
}

impl Sequencer {
    pub fn issue(&mut self) -> Ticket {
        self.issued += 1;
        Ticket(self.issued)
    }

    /// Returns false for a stale response; otherwise marks it applied.
    pub fn admit(&mut self, ticket: Ticket) -> bool {
        if ticket.0 <= self.applied {
            return false;
        }
        self.applied = ticket.0;
        true
    }

    /// True once a newer response has been applied; a failure for this
    /// ticket is no longer worth reporting.
    pub fn is_stale(&self, ticket: Ticket) -> bool {
        ticket.0 <= self.applied
    }
}
