use anyhow::{Context, Result};
use clap::builder::styling::{AnsiColor, Color, Style};
use clap::builder::Styles;
use clap::{CommandFactory, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use splat_catalog_server::catalog_store::{
    validation, CatalogId, CatalogResult, CatalogStore, SqliteCatalogStore,
};

use rustyline::{
    completion::Completer, highlight::Highlighter, history::FileHistory, validate::Validator,
    CompletionType, Config, Editor, Helper,
};

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

fn get_styles() -> Styles {
    Styles::styled()
        .usage(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Cyan))),
        )
        .header(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Cyan))),
        )
        .literal(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
        )
        .invalid(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
        .error(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
        .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightBlack))))
}

#[derive(Parser, Debug)]
#[command(styles=get_styles())]
struct CliArgs {
    /// Path to the SQLite catalog database file.
    #[clap(value_parser = parse_path, default_value = "catalog.db")]
    pub path: PathBuf,
}

#[derive(Parser)]
#[command(styles=get_styles(),name = "")]
struct InnerCli {
    #[command(subcommand)]
    command: InnerCommand,
}

#[derive(Subcommand)]
enum InnerCommand {
    /// Runs a raw SQL statement and prints the resulting rows.
    Query { sql: String },

    /// Drops every catalog table and recreates an empty schema.
    Reset,

    /// Shows a song with its artists and albums.
    Song { id: String },

    /// Shows an album with its artists and tracklist.
    Album { id: String },

    /// Shows an artist.
    Artist { id: String },

    /// Average length of the artist's songs.
    AvgLength { artist_id: String },

    /// Number of the artist's songs that appear on no album.
    Singles { artist_id: String },

    /// Top n artists by total song length.
    TopLength { n: u32 },

    /// Albums whose tracks are all credited only to the releasing artist.
    SoloAlbums,

    /// Most played song on a YYYY-MM-DD date.
    TopSong { date: String },

    /// Source that contributed most plays of a song on a date.
    TopSource { song_id: String, date: String },

    /// Country with the most plays on a date.
    TopCountry { date: String },

    /// Shows the path of the current catalog db.
    Where,

    /// Close this program.
    Exit,
}

enum CommandExecutionResult {
    Ok,
    Exit,
    Error(String),
}

const PROMPT: &str = ">> ";

fn print_json<T: Serialize>(result: CatalogResult<T>) -> CommandExecutionResult {
    match result {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(json) => {
                println!("{}", json);
                CommandExecutionResult::Ok
            }
            Err(err) => CommandExecutionResult::Error(format!("{}", err)),
        },
        Err(err) => CommandExecutionResult::Error(format!("{}", err)),
    }
}

fn execute_command(
    line: String,
    store: &SqliteCatalogStore,
    db_path: String,
) -> CommandExecutionResult {
    if line.is_empty() {
        return CommandExecutionResult::Ok;
    }

    let args =
        shlex::split(&line).unwrap_or_else(|| line.split_whitespace().map(String::from).collect());

    let cli = InnerCli::try_parse_from(std::iter::once(" ").chain(args.iter().map(String::as_str)));

    match cli {
        Ok(cli) => {
            println!("{} {}", PROMPT, &line);
            let id = |s: &str| CatalogId::from_path_segment(s);
            match cli.command {
                InnerCommand::Query { sql } => return print_json(store.run_query(&sql)),
                InnerCommand::Reset => {
                    if let Err(err) = store.reset() {
                        return CommandExecutionResult::Error(format!("{:#}", err));
                    }
                    println!("Catalog reset.");
                }
                InnerCommand::Song { id: song_id } => return print_json(store.get_song(&id(&song_id))),
                InnerCommand::Album { id: album_id } => {
                    return print_json(store.get_album(&id(&album_id)))
                }
                InnerCommand::Artist { id: artist_id } => {
                    return print_json(store.get_artist(&id(&artist_id)))
                }
                InnerCommand::AvgLength { artist_id } => {
                    return print_json(store.average_song_length(&id(&artist_id)))
                }
                InnerCommand::Singles { artist_id } => {
                    return print_json(store.count_singles(&id(&artist_id)))
                }
                InnerCommand::TopLength { n } => return print_json(store.top_artists_by_length(n)),
                InnerCommand::SoloAlbums => return print_json(store.solo_albums()),
                InnerCommand::TopSong { date } => {
                    return print_json(
                        validation::parse_date("date", &date)
                            .and_then(|date| store.top_song_on_date(date)),
                    )
                }
                InnerCommand::TopSource { song_id, date } => {
                    return print_json(
                        validation::parse_date("date", &date)
                            .and_then(|date| store.top_source_for_song(&id(&song_id), date)),
                    )
                }
                InnerCommand::TopCountry { date } => {
                    return print_json(
                        validation::parse_date("date", &date)
                            .and_then(|date| store.top_country_on_date(date)),
                    )
                }
                InnerCommand::Where => {
                    println!("{}", db_path);
                }
                InnerCommand::Exit => return CommandExecutionResult::Exit,
            }
        }

        Err(e) => {
            if e.print().is_err() {
                println!("{}", e);
            }
        }
    }
    CommandExecutionResult::Ok
}

#[derive(rustyline_derive::Hinter)]
struct MyHelper {
    commands_names: Vec<String>,
}

impl MyHelper {
    pub fn new() -> Self {
        let commands_names: Vec<String> = InnerCli::command()
            .get_subcommands()
            .map(|sc| sc.get_name().to_string())
            .collect();

        MyHelper { commands_names }
    }
}

impl Completer for MyHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        _pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        if line.contains(' ') {
            return Ok((0, Vec::with_capacity(0)));
        }
        let matches = self
            .commands_names
            .iter()
            .filter(|c| c.starts_with(line))
            .map(|c| c.to_string())
            .collect::<Vec<_>>();

        Ok((0, matches))
    }
}

impl Highlighter for MyHelper {}
impl Validator for MyHelper {}
impl Helper for MyHelper {}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();
    let db_path = cli_args.path;
    let store = SqliteCatalogStore::new(&db_path, 1)
        .with_context(|| format!("Could not open catalog db {:?}", db_path))?;

    InnerCli::command().print_long_help()?;

    let config = Config::builder()
        .completion_type(CompletionType::List)
        .build();

    let mut rl = Editor::<MyHelper, FileHistory>::with_config(config)?;
    rl.set_helper(Some(MyHelper::new()));

    loop {
        let readline = rl.readline(PROMPT);

        match readline {
            Ok(line) => {
                let _ = rl.add_history_entry(&line);
                match execute_command(line, &store, db_path.display().to_string()) {
                    CommandExecutionResult::Ok => {}
                    CommandExecutionResult::Exit => {
                        break;
                    }
                    CommandExecutionResult::Error(err) => {
                        eprintln!("Error: {}", err);
                        continue;
                    }
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("CTRL-D: exiting.");
                break;
            }
            Err(e) => {
                println!("Error: {:?}", e);
                break;
            }
        }
    }
    Ok(())
}
