use super::watched::{entries_table, summary_line};
use super::{format_average, open_watched_store};
use crate::output::Output;
use color_eyre::Result;
use owo_colors::OwoColorize;
use popcorn_config::{Config, CredentialStore, PathManager};
use popcorn_core::{
    Applied, DetailCompletion, DetailTicket, FileKeyValueStore, SearchCompletion, SearchTicket, Session,
    SessionError,
};
use popcorn_sources::{MovieCatalog, OmdbClient};
use serde_json::json;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

const HELP: &str = "\
Type to search (at least 3 characters). Commands:
  :open N    show details for result N
  :rate N    rate the open movie from 1 to 10
  :add       add the open movie to the watched list
  :close     close the detail view
  :watched   show the watched list and summary
  :rm ID     remove a movie from the watched list
  :clear     clear the search
  :help      show this help
  :quit      exit";

/// One line of user input
#[derive(Debug, PartialEq)]
enum Input {
    Query(String),
    Open(usize),
    Rate(u8),
    Add,
    Close,
    Watched,
    Remove(String),
    Clear,
    Help,
    Quit,
    Invalid(String),
}

fn parse_input(line: &str) -> Input {
    let Some(command) = line.strip_prefix(':') else {
        return Input::Query(line.to_string());
    };

    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or("");
    let arg = parts.next();

    match (name, arg) {
        ("open" | "o", Some(n)) => n
            .parse()
            .ok()
            .filter(|n| *n > 0)
            .map(Input::Open)
            .unwrap_or_else(|| Input::Invalid(format!("not a result number: {}", n))),
        ("rate" | "r", Some(n)) => n
            .parse()
            .map(Input::Rate)
            .unwrap_or_else(|_| Input::Invalid(format!("not a rating: {}", n))),
        ("rm", Some(id)) => Input::Remove(id.to_string()),
        ("add" | "a", None) => Input::Add,
        ("close" | "c", None) => Input::Close,
        ("watched" | "w", None) => Input::Watched,
        ("clear", None) => Input::Clear,
        ("help" | "h" | "?", None) => Input::Help,
        ("quit" | "q" | "exit", None) => Input::Quit,
        _ => Input::Invalid(format!("unknown command :{} (try :help)", command.trim())),
    }
}

enum Completed {
    Search(SearchCompletion),
    Detail(DetailCompletion),
}

/// Everything the loop needs to run a request off the input path
struct Dispatcher {
    catalog: Arc<dyn MovieCatalog>,
    tx: mpsc::UnboundedSender<Completed>,
}

impl Dispatcher {
    fn search(&self, ticket: SearchTicket) {
        let catalog = Arc::clone(&self.catalog);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let completion = ticket.run(catalog.as_ref()).await;
            // Receiver gone means the client is shutting down
            let _ = tx.send(Completed::Search(completion));
        });
    }

    fn detail(&self, ticket: DetailTicket) {
        let catalog = Arc::clone(&self.catalog);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let completion = ticket.run(catalog.as_ref()).await;
            let _ = tx.send(Completed::Detail(completion));
        });
    }
}

pub async fn run_interactive(config: &Config, paths: &PathManager, output: &Output) -> Result<()> {
    let mut credentials = CredentialStore::new(paths.credentials_file());
    credentials
        .load()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load credentials: {}", e))?;

    // A missing key stops us here, before any request is made
    let client = OmdbClient::from_config(config, &credentials)?;
    let catalog: Arc<dyn MovieCatalog> = Arc::new(client);

    let store = open_watched_store(paths, output)?;
    let mut session = Session::new(catalog, config, store);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let dispatcher = Dispatcher {
        catalog: session.catalog(),
        tx,
    };

    output.println(format!("{} {}", "🍿 popcorn".bold(), "(:help for commands)".bright_black()));
    output.println(summary_line(&session.summary()));
    output.print("> ")?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if handle_input(parse_input(line.trim_end()), &mut session, &dispatcher, output) {
                    break;
                }
                output.print("> ")?;
            }
            Some(done) = rx.recv() => {
                match done {
                    Completed::Search(completion) => {
                        if session.finish_query(completion) == Applied::Updated {
                            render_search(&session, output);
                            output.print("> ")?;
                        }
                    }
                    Completed::Detail(completion) => {
                        if session.finish_select(completion) == Applied::Updated {
                            render_detail(&session, output);
                            output.print("> ")?;
                        }
                    }
                }
            }
        }
    }

    session.shutdown();
    debug!("Interactive session closed");
    Ok(())
}

/// Returns true when the user asked to leave
fn handle_input(
    input: Input,
    session: &mut Session<FileKeyValueStore>,
    dispatcher: &Dispatcher,
    output: &Output,
) -> bool {
    match input {
        Input::Query(text) => {
            let ticket = session.begin_query(text);
            render_search(session, output);
            if let Some(ticket) = ticket {
                dispatcher.search(ticket);
            }
        }
        Input::Open(n) => {
            let Some(item) = session.search().results().get(n - 1) else {
                output.warn(format!("There is no result #{}", n));
                return false;
            };
            let id = item.id.clone();
            if let Some(ticket) = session.begin_select(id) {
                render_detail(session, output);
                dispatcher.detail(ticket);
            }
        }
        Input::Rate(rating) => match session.rate(rating) {
            Ok(()) => render_detail(session, output),
            Err(e) => output.warn(e.to_string()),
        },
        Input::Add => match session.add_watched() {
            Ok(entry) => {
                output.success(format!("Added {} with your rating {}/10", entry.title, entry.user_rating));
                output.println(summary_line(&session.summary()));
            }
            Err(SessionError::Detail(e)) => output.warn(e.to_string()),
            Err(SessionError::Store(e)) => output.error(format!("Could not save the watched list: {}", e)),
        },
        Input::Close => {
            session.close_movie();
            render_search(session, output);
        }
        Input::Watched => render_watched(session, output),
        Input::Remove(id) => match session.delete_watched(&id) {
            Ok(true) => {
                output.success(format!("Removed {}", id));
                output.println(summary_line(&session.summary()));
            }
            Ok(false) => output.warn(format!("{} is not in the watched list", id)),
            Err(e) => output.error(format!("Could not save the watched list: {}", e)),
        },
        Input::Clear => {
            session.clear_query();
            render_search(session, output);
        }
        Input::Help => output.println(HELP),
        Input::Quit => return true,
        Input::Invalid(reason) => output.warn(reason),
    }
    false
}

fn render_search(session: &Session<FileKeyValueStore>, output: &Output) {
    let search = session.search();

    if !output.is_human() {
        output.json(&json!({ "type": "search", "state": search.state() }));
        return;
    }

    if search.is_loading() {
        output.println("Loading...".bright_black().to_string());
        return;
    }
    if let Some(message) = search.error_message() {
        output.error(message);
        return;
    }
    if search.state().shows_results() {
        output.println(format!("Found {} results", search.state().result_count()));
        for (i, item) in search.results().iter().enumerate() {
            output.println(format!(
                "{:>3}. {} {} {}",
                i + 1,
                item.title.bold(),
                format!("({})", item.year).bright_black(),
                item.id.bright_black()
            ));
        }
    }
}

fn render_detail(session: &Session<FileKeyValueStore>, output: &Output) {
    let detail = session.detail();

    if !output.is_human() {
        output.json(&json!({
            "type": "detail",
            "selected_id": detail.selected_id(),
            "is_loading": detail.is_loading(),
            "error_message": detail.error_message(),
            "detail": detail.detail(),
            "is_highly_rated": detail.is_highly_rated(),
            "pending_rating": detail.pending_rating(),
            "watched_rating": session.watched_rating(),
        }));
        return;
    }

    if detail.is_loading() {
        output.println("Loading...".bright_black().to_string());
        return;
    }
    if let Some(message) = detail.error_message() {
        output.error(message);
        return;
    }
    let Some(movie) = detail.detail() else {
        return;
    };

    let rating = movie.imdb_rating.map(format_average).unwrap_or_else(|| "N/A".to_string());
    output.println(format!("{} ({})", movie.title.bold(), movie.year));
    output.println(format!("{} • {}", movie.released, movie.runtime));
    output.println(&movie.genre);
    if detail.is_highly_rated() {
        output.println(format!("⭐️ {} IMDb rating {}", rating, "highly rated".green()));
    } else {
        output.println(format!("⭐️ {} IMDb rating", rating));
    }
    output.println(format!("\n{}", movie.plot.italic()));
    output.println(format!("Starring {}", movie.actors));
    output.println(format!("Directed by {}", movie.director));

    match (session.watched_rating(), detail.pending_rating()) {
        (Some(previous), _) => output.println(format!("You rated this movie {} ⭐️", previous)),
        (None, Some(pending)) => output.println(format!("Your rating: {}/10 (:add to save)", pending)),
        (None, None) => output.println("Rate it with :rate N".bright_black().to_string()),
    }
}

fn render_watched(session: &Session<FileKeyValueStore>, output: &Output) {
    let store = session.watched();

    if !output.is_human() {
        output.json(&json!({
            "type": "watched",
            "entries": store.entries(),
            "summary": session.summary(),
        }));
        return;
    }

    if !store.is_empty() {
        output.println(entries_table(store.entries()).to_string());
    }
    output.println(summary_line(&session.summary()));
}
