//! Plain-text rendering of the page. Pure functions of `ViewState`.

use crate::models::{Book, GenreFilter, Id, Report};
use crate::state::{FormMode, Notice, ViewState};

pub const NO_REPORT: &str = "No data available for the selected genre.";
pub const NO_BOOKS: &str = "No book reviews found.";

/// Two decimals when the server computed an average, `N/A` otherwise.
pub fn avg_rating(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.2}"),
        _ => "N/A".to_string(),
    }
}

fn count(value: Option<u64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Report block. One path for every scope; the report already carries it.
pub fn report(report: Option<&Report>) -> Vec<String> {
    let Some(r) = report.filter(|r| !r.is_empty()) else {
        return vec![NO_REPORT.to_string()];
    };
    let mut lines = Vec::new();
    if let Some(name) = present(&r.genre_name) {
        lines.push(format!("Genre: {name}"));
    }
    lines.push(format!("Average Ratings: {}", avg_rating(r.avg_rating)));
    lines.push(format!("Ratings: {}", count(r.num_ratings)));
    lines.push(format!("Users: {}", count(r.num_users)));
    lines.push(format!("Books: {}", count(r.num_books)));
    if let Some(best) = present(&r.highest_rated_book) {
        lines.push(format!("Best Rated: {best}"));
    }
    if let Some(worst) = present(&r.lowest_rated_book) {
        lines.push(format!("Worst Rated: {worst}"));
    }
    lines
}

fn book_item(book: &Book) -> Vec<String> {
    let genre = book.genre.as_ref().map(|g| g.name.as_str()).unwrap_or_default();
    vec![
        format!("[{}] {}", book.id, book.title),
        format!("    Review: {}", book.description.as_deref().unwrap_or_default()),
        format!("    Posted by: {}", book.user_username),
        format!("    Rating: {}", book.rating_text()),
        format!("    Genre: {genre}"),
        format!("    Posted at: {}", book.created_at),
    ]
}

pub fn books(books: &[Book]) -> Vec<String> {
    if books.is_empty() {
        return vec![NO_BOOKS.to_string()];
    }
    books.iter().flat_map(book_item).collect()
}

fn heading(lines: &mut Vec<String>, title: &str) {
    lines.push(String::new());
    lines.push(format!("== {title} =="));
}

pub fn page(view: &ViewState) -> Vec<String> {
    let mut lines = Vec::new();

    match &view.notice {
        Some(Notice::Info(msg)) => lines.push(format!("* {msg}")),
        Some(Notice::Error(msg)) => lines.push(format!("! {msg}")),
        None => {}
    }

    heading(&mut lines, "Create User");
    lines.push(format!("User: {}", view.user_draft.username));
    lines.push(format!("Email: {}", view.user_draft.email));

    let (verb, button) = match view.mode {
        FormMode::Creating => ("Create", "Create Book"),
        FormMode::Editing(_) => ("Edit", "Update Book"),
    };
    heading(&mut lines, &format!("{verb} Review"));
    let draft = &view.book_draft;
    lines.push(format!("Title: {}", draft.title));
    lines.push(format!("Review: {}", draft.description));
    lines.push(format!("User: {}", draft.user_username));
    lines.push(format!("Rating: {}", draft.rating));
    let genre = match draft.genre_id.trim().parse::<Id>() {
        Ok(id) => view.genre_name(id).unwrap_or(draft.genre_id.as_str()).to_string(),
        Err(_) if draft.genre_id.is_empty() => "Select Genre".to_string(),
        Err(_) => draft.genre_id.clone(),
    };
    lines.push(format!("Genre: {genre}"));
    lines.push(format!("[{button}]"));

    heading(&mut lines, "Add Genre");
    lines.push(format!("Genre Name: {}", view.genre_draft));
    let names: Vec<String> = view.genres.iter().map(|g| format!("{}={}", g.id, g.name)).collect();
    lines.push(format!("Genres: {}", names.join(", ")));

    heading(&mut lines, "Generate Report");
    let selected = match view.selected_genre {
        GenreFilter::All => "All Genres".to_string(),
        GenreFilter::Genre(id) => view.genre_name(id).map(str::to_string).unwrap_or_else(|| id.to_string()),
    };
    lines.push(format!("Select Genre: {selected}"));
    lines.extend(report(view.report.as_ref()));

    heading(&mut lines, "Book Reviews");
    lines.extend(books(&view.books));

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Genre;

    #[test]
    fn average_formatting() {
        assert_eq!(avg_rating(Some(4.0)), "4.00");
        assert_eq!(avg_rating(Some(3.456)), "3.46");
        assert_eq!(avg_rating(None), "N/A");
        assert_eq!(avg_rating(Some(f64::NAN)), "N/A");
    }

    #[test]
    fn missing_or_empty_report() {
        assert_eq!(report(None), vec![NO_REPORT]);
        assert_eq!(report(Some(&Report::default())), vec![NO_REPORT]);
    }

    #[test]
    fn null_only_report_still_renders_block() {
        let r: Report =
            serde_json::from_str(r#"{"avg_rating":null,"highest_rated_book":null}"#).unwrap();
        assert_eq!(
            report(Some(&r)),
            vec!["Average Ratings: N/A", "Ratings: ", "Users: ", "Books: "]
        );
    }

    #[test]
    fn report_omits_absent_names() {
        let r = Report {
            avg_rating: None,
            num_ratings: Some(0),
            num_users: Some(0),
            num_books: Some(0),
            highest_rated_book: Some(String::new()),
            ..Report::default()
        };
        assert_eq!(
            report(Some(&r)),
            vec!["Average Ratings: N/A", "Ratings: 0", "Users: 0", "Books: 0"]
        );
    }

    #[test]
    fn scoped_report_same_shape() {
        let r = Report {
            genre_name: Some("Mystery".into()),
            avg_rating: Some(4.5),
            num_ratings: Some(2),
            num_users: Some(1),
            num_books: Some(2),
            highest_rated_book: Some("Gone (5.00)".into()),
            lowest_rated_book: Some("Found (4.00)".into()),
            has_keys: true,
        };
        assert_eq!(
            report(Some(&r)),
            vec![
                "Genre: Mystery",
                "Average Ratings: 4.50",
                "Ratings: 2",
                "Users: 1",
                "Books: 2",
                "Best Rated: Gone (5.00)",
                "Worst Rated: Found (4.00)",
            ]
        );
    }

    #[test]
    fn page_labels_follow_mode() {
        let mut view = ViewState {
            genres: vec![Genre { id: 2, name: "Fantasy".into() }],
            ..ViewState::default()
        };
        view.book_draft.genre_id = "2".into();
        let text = page(&view).join("\n");
        assert!(text.contains("== Create Review =="));
        assert!(text.contains("[Create Book]"));
        assert!(text.contains("Genre: Fantasy"));
        assert!(text.contains("Select Genre: All Genres"));
        assert!(text.contains(NO_BOOKS));

        view.mode = FormMode::Editing(9);
        view.book_draft.genre_id.clear();
        let text = page(&view).join("\n");
        assert!(text.contains("== Edit Review =="));
        assert!(text.contains("[Update Book]"));
        assert!(text.contains("Genre: Select Genre"));
    }
}
