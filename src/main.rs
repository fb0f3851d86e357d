use std::sync::Arc;

use anyhow::Context;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{debug, info, Level};
use tracing_subscriber::EnvFilter;

use bookreview::api::http::HttpApi;
use bookreview::command::{parse_line, Command, UserField, HELP};
use bookreview::config::Config;
use bookreview::{render, ReviewApi, ReviewDesk};

const PROMPT: &str = "reviews> ";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env automatically only in debug builds to reduce manual setup overhead.
    if cfg!(debug_assertions) {
        let _ = dotenv::dotenv();
    }

    // Logs go to stderr; stdout carries the page.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_writer(std::io::stderr)
        .init();

    let cfg = Config::from_env();
    let api = build_api(&cfg)?;
    let desk = ReviewDesk::new(api);

    desk.mount().await;
    print_page(&desk);

    let mut rl = DefaultEditor::new().context("terminal line editor")?;
    loop {
        let line = match rl.readline(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        if line.trim().is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(line.as_str());

        let Some(cmd) = parse_line(&line) else {
            println!("Unrecognised command, try `help`");
            continue;
        };
        if cmd == Command::Quit {
            break;
        }
        if cmd == Command::Help {
            println!("{HELP}");
            continue;
        }
        dispatch(&desk, cmd).await;
        print_page(&desk);
    }

    info!("Good bye");
    Ok(())
}

fn build_api(cfg: &Config) -> anyhow::Result<Arc<dyn ReviewApi>> {
    if cfg.offline {
        #[cfg(feature = "inmem-api")]
        {
            info!("Offline mode: using the in-process review server");
            return Ok(Arc::new(bookreview::api::inmem::InMemApi::seeded()));
        }
        #[cfg(not(feature = "inmem-api"))]
        tracing::warn!("BOOKREVIEW_OFFLINE ignored: built without the inmem-api feature");
    }
    info!("Review server: {}", cfg.api_base);
    let api = HttpApi::from_config(cfg).context("building HTTP client")?;
    Ok(Arc::new(api))
}

// Failures are already logged by the desk and shown as the page notice.
async fn dispatch(desk: &ReviewDesk, cmd: Command) {
    let result = match cmd {
        Command::SetUser(UserField::Name, v) => {
            desk.set_username(v);
            Ok(())
        }
        Command::SetUser(UserField::Email, v) => {
            desk.set_email(v);
            Ok(())
        }
        Command::CreateUser => desk.create_user().await,
        Command::SetBook(field, v) => {
            desk.set_book_field(field, v);
            Ok(())
        }
        Command::SubmitBook => desk.submit_book().await,
        Command::CancelEdit => {
            desk.cancel_edit();
            Ok(())
        }
        Command::Edit(id) => desk.start_edit_by_id(id),
        Command::Delete(id) => desk.delete_book(id).await,
        Command::SetGenreName(v) => {
            desk.set_genre_draft(v);
            Ok(())
        }
        Command::AddGenre => desk.create_genre().await,
        Command::SelectGenre(filter) => {
            desk.select_genre(filter);
            Ok(())
        }
        Command::RunReport => desk.generate_report().await,
        Command::Refresh => {
            desk.mount().await;
            Ok(())
        }
        Command::Show | Command::Help | Command::Quit => Ok(()),
    };
    if let Err(e) = result {
        debug!("command failed: {e}");
    }
}

fn print_page(desk: &ReviewDesk) {
    let view = desk.snapshot();
    for line in render::page(&view) {
        println!("{line}");
    }
    desk.dismiss_notice();
}
