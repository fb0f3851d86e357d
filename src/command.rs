//! Grammar for the terminal front end.
//!
//! Field values are either the rest of the line or a double-quoted string
//! (`\"`, `\\` and `\n` escapes); an omitted value clears the field.

use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, is_not, tag, tag_no_case},
    character::complete::{char, i64 as id, space0, space1},
    combinator::{all_consuming, eof, map, map_opt, opt, peek, rest, value},
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};

use crate::models::{GenreFilter, Id};
use crate::state::BookField;

pub const HELP: &str = "\
user name|email <value>      edit the new-user form
user create                  register the user
book title|review|user|rating|genre <value>
                             edit the review form
book submit                  create, or update the book being edited
book cancel                  leave edit mode and clear the form
edit <id>                    load a listed book into the form
delete <id>                  delete a book
genre name <value>           edit the new-genre form
genre add                    create the genre
report genre <id|all>        pick the report scope
report run                   fetch the report and the matching books
refresh                      reload books and genres
show                         print the page
help                         this text
quit                         exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserField {
    Name,
    Email,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetUser(UserField, String),
    CreateUser,
    SetBook(BookField, String),
    SubmitBook,
    CancelEdit,
    Edit(Id),
    Delete(Id),
    SetGenreName(String),
    AddGenre,
    SelectGenre(GenreFilter),
    RunReport,
    Refresh,
    Show,
    Help,
    Quit,
}

fn kw<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    terminated(tag_no_case(word), peek(alt((space1, eof))))
}

fn quoted(input: &str) -> IResult<&str, String> {
    delimited(
        char('"'),
        map(
            opt(escaped_transform(
                is_not("\\\""),
                '\\',
                alt((value("\\", tag("\\")), value("\"", tag("\"")), value("\n", tag("n")))),
            )),
            Option::unwrap_or_default,
        ),
        char('"'),
    )(input)
}

fn text(input: &str) -> IResult<&str, String> {
    preceded(
        space0,
        alt((
            terminated(quoted, space0),
            map(rest, |s: &str| s.trim_end().to_string()),
        )),
    )(input)
}

fn user(input: &str) -> IResult<&str, Command> {
    preceded(
        pair(kw("user"), space1),
        alt((
            map(preceded(kw("name"), text), |v| Command::SetUser(UserField::Name, v)),
            map(preceded(kw("email"), text), |v| Command::SetUser(UserField::Email, v)),
            value(Command::CreateUser, kw("create")),
        )),
    )(input)
}

fn book_field(input: &str) -> IResult<&str, BookField> {
    alt((
        value(BookField::Title, kw("title")),
        value(BookField::Description, kw("review")),
        value(BookField::Description, kw("description")),
        value(BookField::User, kw("user")),
        value(BookField::Rating, kw("rating")),
        value(BookField::Genre, kw("genre")),
    ))(input)
}

fn book(input: &str) -> IResult<&str, Command> {
    preceded(
        pair(kw("book"), space1),
        alt((
            map(pair(book_field, text), |(f, v)| Command::SetBook(f, v)),
            value(Command::SubmitBook, kw("submit")),
            value(Command::CancelEdit, kw("cancel")),
        )),
    )(input)
}

fn genre(input: &str) -> IResult<&str, Command> {
    preceded(
        pair(kw("genre"), space1),
        alt((
            map(preceded(kw("name"), text), Command::SetGenreName),
            value(Command::AddGenre, kw("add")),
        )),
    )(input)
}

fn report(input: &str) -> IResult<&str, Command> {
    preceded(
        pair(kw("report"), space1),
        alt((
            map_opt(preceded(kw("genre"), text), |v| GenreFilter::parse(&v).map(Command::SelectGenre)),
            value(Command::RunReport, kw("run")),
        )),
    )(input)
}

fn by_id(input: &str) -> IResult<&str, Command> {
    alt((
        map(preceded(pair(kw("edit"), space1), id), Command::Edit),
        map(preceded(pair(kw("delete"), space1), id), Command::Delete),
    ))(input)
}

fn bare(input: &str) -> IResult<&str, Command> {
    alt((
        value(Command::Quit, alt((kw("quit"), kw("exit"), kw("q")))),
        value(Command::Help, alt((kw("help"), kw("?")))),
        value(Command::Show, kw("show")),
        value(Command::Refresh, kw("refresh")),
    ))(input)
}

pub fn parse_line(line: &str) -> Option<Command> {
    all_consuming(delimited(
        space0,
        alt((user, book, genre, report, by_id, bare)),
        space0,
    ))(line)
    .ok()
    .map(|(_, cmd)| cmd)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_values() {
        assert_eq!(
            parse_line("user name  Ada Lovelace"),
            Some(Command::SetUser(UserField::Name, "Ada Lovelace".into()))
        );
        assert_eq!(
            parse_line(r#"book review "said \"wow\"""#),
            Some(Command::SetBook(BookField::Description, "said \"wow\"".into()))
        );
        assert_eq!(parse_line("book rating 5"), Some(Command::SetBook(BookField::Rating, "5".into())));
        assert_eq!(parse_line("book title"), Some(Command::SetBook(BookField::Title, String::new())));
        assert_eq!(parse_line(r#"genre name """#), Some(Command::SetGenreName(String::new())));
    }

    #[test]
    fn actions() {
        assert_eq!(parse_line("user create"), Some(Command::CreateUser));
        assert_eq!(parse_line(" book submit "), Some(Command::SubmitBook));
        assert_eq!(parse_line("BOOK cancel"), Some(Command::CancelEdit));
        assert_eq!(parse_line("edit 12"), Some(Command::Edit(12)));
        assert_eq!(parse_line("delete 3"), Some(Command::Delete(3)));
        assert_eq!(parse_line("genre add"), Some(Command::AddGenre));
        assert_eq!(parse_line("report run"), Some(Command::RunReport));
        assert_eq!(parse_line("q"), Some(Command::Quit));
        assert_eq!(parse_line("refresh"), Some(Command::Refresh));
    }

    #[test]
    fn report_scope() {
        assert_eq!(parse_line("report genre all"), Some(Command::SelectGenre(GenreFilter::All)));
        assert_eq!(parse_line("report genre"), Some(Command::SelectGenre(GenreFilter::All)));
        assert_eq!(parse_line("report genre 4"), Some(Command::SelectGenre(GenreFilter::Genre(4))));
        assert_eq!(parse_line("report genre fantasy"), None);
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_line("edit twelve"), None);
        assert_eq!(parse_line("booktitle x"), None);
        assert_eq!(parse_line("user nickname bob"), None);
        assert_eq!(parse_line(r#"book title "open"#), Some(Command::SetBook(BookField::Title, "\"open".into())));
        assert_eq!(parse_line(""), None);
    }
}
