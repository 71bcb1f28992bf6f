use clap::{Parser, Subcommand};
use log::info;
use std::cell::RefCell;
use std::error::Error;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::rc::Rc;
use uuid::Uuid;

use plusminus::destroyable::Destroyable;
use plusminus::events::Channel;
use plusminus::game::{daily_stats, CompositionRunner, Environment, RoundRunner};
use plusminus::helpers::{format_clock, format_short};
use plusminus::model::{
    CompositionConfiguration, GameRecord, OperationMode, RoundConfiguration, RoundEvent,
};
use plusminus::storage::{FileStore, GameStorage, HistoryRecorder};

type CliResult = Result<(), Box<dyn Error>>;
type Storage = Rc<RefCell<GameStorage<FileStore>>>;

#[derive(Parser)]
#[command(name = "plusminus", version, about = "Arithmetic drills for kids")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play an addition/subtraction round
    Play {
        #[arg(long)]
        min: Option<i32>,
        #[arg(long)]
        max: Option<i32>,
        /// Number of problems
        #[arg(long)]
        count: Option<usize>,
        /// addition, subtraction or mixed
        #[arg(long)]
        mode: Option<OperationMode>,
    },
    /// Play a number composition session
    Compose {
        #[arg(long)]
        min: Option<i32>,
        #[arg(long)]
        max: Option<i32>,
        #[arg(long)]
        repetitions: Option<u32>,
    },
    /// Statistics of the current player
    Stats,
    /// Per-day totals of the current player
    Daily,
    /// Export the current player's data as JSON
    Export {
        /// Output file; stdout when omitted
        path: Option<PathBuf>,
    },
    /// Import a previously exported file
    Import { path: PathBuf },
    /// Show or set the player name
    Name { name: Option<String> },
    /// Show saved settings
    Settings {
        /// Restore the defaults
        #[arg(long)]
        reset: bool,
    },
    /// Clear the current player's statistics
    Clear {
        /// Delete a single game by id
        #[arg(long, conflicts_with = "all")]
        game: Option<Uuid>,
        /// Remove every stored value
        #[arg(long)]
        all: bool,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let data_dir = Environment::data_dir();
    info!(target: "storage", "Using data directory {:?}", data_dir);
    let storage: Storage = Rc::new(RefCell::new(GameStorage::new(FileStore::new(data_dir))));

    let result = match cli.command {
        Commands::Play {
            min,
            max,
            count,
            mode,
        } => play(&storage, min, max, count, mode),
        Commands::Compose {
            min,
            max,
            repetitions,
        } => compose(&storage, min, max, repetitions),
        Commands::Stats => stats(&storage),
        Commands::Daily => daily(&storage),
        Commands::Export { path } => export(&storage, path),
        Commands::Import { path } => import(&storage, path),
        Commands::Name { name } => player_name(&storage, name),
        Commands::Settings { reset } => settings(&storage, reset),
        Commands::Clear { game, all } => clear(&storage, game, all),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn require_player(storage: &Storage) -> Result<String, Box<dyn Error>> {
    storage
        .borrow()
        .load_player_name()
        .ok_or_else(|| "no player name yet, run `plusminus name <NAME>` first".into())
}

/// Prompts and reads one line. None on end of input.
fn prompt(message: &str) -> io::Result<Option<String>> {
    print!("{message}");
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn play(
    storage: &Storage,
    min: Option<i32>,
    max: Option<i32>,
    count: Option<usize>,
    mode: Option<OperationMode>,
) -> CliResult {
    let player = require_player(storage)?;
    let mut config = storage.borrow().load_settings();
    config.min_number = min.unwrap_or(config.min_number);
    config.max_number = max.unwrap_or(config.max_number);
    config.problem_count = count.unwrap_or(config.problem_count);
    config.operation_mode = mode.unwrap_or(config.operation_mode);
    config.validate()?;
    storage.borrow_mut().save_settings(&config);

    let (emitter, observer) = Channel::<RoundEvent>::new();
    let recorder = HistoryRecorder::new(Rc::clone(storage), observer);
    let mut runner = RoundRunner::new(&player, emitter, Environment::rng(Environment::seed_from_env()));
    runner.start(config)?;
    let debug_mode = Environment::is_debug_mode();
    println!("Type the answer and press Enter, q to quit.");

    while let Some(problem) = runner.current_problem().cloned() {
        let (index, total) = runner.progress();
        let clock = runner.tick().map(format_clock).unwrap_or_default();
        if debug_mode {
            println!("(debug: {})", problem.result);
        }
        let Some(line) = prompt(&format!("[{}/{}] {} {}", index + 1, total, clock, problem.text))?
        else {
            runner.abandon();
            break;
        };
        if line.eq_ignore_ascii_case("q") {
            runner.abandon();
            break;
        }
        match runner.submit_answer(&line) {
            Ok(outcome) if outcome.correct => println!("Correct!"),
            Ok(outcome) => println!("Wrong, {}{}", problem.text, outcome.correct_answer),
            Err(e) => println!("{e}"),
        }
    }

    if let Some(results) = runner.results() {
        let elapsed = runner.elapsed();
        println!(
            "\n{}/{} correct ({}%) in {}",
            results.score,
            results.total,
            results.percentage,
            format_short(elapsed)
        );
        for missed in &results.wrong_examples {
            println!(
                "  {}{} (you answered {})",
                missed.problem.text, missed.problem.result, missed.user_answer
            );
        }
    }
    runner.destroy();
    recorder.borrow_mut().destroy();
    Ok(())
}

fn parse_selection(line: &str) -> Result<Vec<usize>, String> {
    line.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| match part.parse::<usize>() {
            Ok(n) if n > 0 => Ok(n - 1),
            _ => Err(format!("'{}' is not an option number", part)),
        })
        .collect()
}

fn compose(
    storage: &Storage,
    min: Option<i32>,
    max: Option<i32>,
    repetitions: Option<u32>,
) -> CliResult {
    let player = require_player(storage)?;
    let mut config = storage.borrow().load_composition_settings();
    config.min_number = min.unwrap_or(config.min_number);
    config.max_number = max.unwrap_or(config.max_number);
    config.repetitions = repetitions.unwrap_or(config.repetitions);
    config.validate()?;
    storage.borrow_mut().save_composition_settings(&config);

    let (emitter, observer) = Channel::<RoundEvent>::new();
    let recorder = HistoryRecorder::new(Rc::clone(storage), observer);
    let mut runner =
        CompositionRunner::new(&player, emitter, Environment::rng(Environment::seed_from_env()));
    runner.start(config)?;
    println!("Pick every option that makes the number, e.g. `1 3 4`. q to quit.");

    while let Some(target) = runner.current_target() {
        let (index, total) = runner.progress();
        println!(
            "\n[{}/{}] round {} {}: which ones make {}?",
            index + 1,
            total,
            runner.current_repetition(),
            runner.tick().map(format_clock).unwrap_or_default(),
            target
        );
        for (n, item) in runner.current_items().iter().enumerate() {
            println!("  {}) {}", n + 1, item.text);
        }
        let Some(line) = prompt("> ")? else {
            runner.abandon();
            break;
        };
        if line.eq_ignore_ascii_case("q") {
            runner.abandon();
            break;
        }
        let selection = match parse_selection(&line) {
            Ok(selection) => selection,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };
        match runner.submit_selection(&selection) {
            Ok(verdict) if verdict.is_fully_correct() => println!("All right!"),
            Ok(verdict) => {
                for missed in &verdict.mistakes {
                    println!("  {}: {:?}", missed.example, missed.mistake);
                }
            }
            Err(e) => println!("{e}"),
        }
    }

    if let Some(record) = runner.last_record() {
        println!(
            "\n{} correct, {} mistakes in {}",
            record.correct_answers,
            record.incorrect_answers,
            format_short(record.game_time)
        );
    }
    runner.destroy();
    recorder.borrow_mut().destroy();
    Ok(())
}

fn describe(record: &GameRecord) -> String {
    match record {
        GameRecord::Arithmetic(r) => format!(
            "{}/{} {} {}-{}",
            r.score, r.total_examples, r.operation_mode, r.min_number, r.max_number
        ),
        GameRecord::Composition(r) => format!(
            "{} correct, {} wrong, composition {} x{}",
            r.correct_answers,
            r.incorrect_answers,
            r.range_label(),
            r.repetitions
        ),
    }
}

fn stats(storage: &Storage) -> CliResult {
    let player = require_player(storage)?;
    let stats = storage.borrow().player_statistics(&player);
    println!("Player:        {}", stats.player_name);
    println!(
        "Games:         {} ({} arithmetic, {} composition)",
        stats.total_games, stats.arithmetic_games, stats.composition_games
    );
    println!("Best score:    {}", stats.best_score);
    println!("Average score: {}", stats.average_score);
    println!(
        "Perfect games: {} ({}%)",
        stats.perfect_games,
        stats.perfect_percentage()
    );
    println!("Total time:    {}", format_short(stats.total_time));
    println!("Average time:  {}", format_short(stats.average_time));
    if let Some(last_played) = stats.last_played {
        println!("Last played:   {}", last_played.format("%Y-%m-%d %H:%M"));
    }
    if !stats.recent_games.is_empty() {
        println!("\nRecent games:");
        for record in &stats.recent_games {
            println!(
                "  {} {} {}  {}",
                record.id(),
                record.timestamp().format("%Y-%m-%d %H:%M"),
                format_short(record.normalized_duration()),
                describe(record)
            );
        }
    }
    Ok(())
}

fn daily(storage: &Storage) -> CliResult {
    let player = require_player(storage)?;
    let days = daily_stats(&storage.borrow().all_records(), &player);
    if days.is_empty() {
        println!("No games yet.");
    }
    for day in days {
        println!(
            "{}  {:>3} games  {:>4}/{:<4} {:>3}%  avg {}",
            day.date,
            day.games,
            day.total_score,
            day.total_examples,
            day.percentage,
            format_short(day.average_time)
        );
    }
    Ok(())
}

fn export(storage: &Storage, path: Option<PathBuf>) -> CliResult {
    let json = storage
        .borrow()
        .export_data()
        .ok_or("nothing to export, set a player name first")?;
    match path {
        Some(path) => {
            fs::write(&path, json)?;
            println!("Exported to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn import(storage: &Storage, path: PathBuf) -> CliResult {
    let json = fs::read_to_string(&path)?;
    let summary = storage.borrow_mut().import_data(&json)?;
    println!(
        "Imported {} games and {} composition games for {}",
        summary.games_imported, summary.composition_games_imported, summary.player_name
    );
    Ok(())
}

fn player_name(storage: &Storage, name: Option<String>) -> CliResult {
    match name {
        Some(name) => {
            if !storage.borrow_mut().save_player_name(&name) {
                return Err("could not save the player name".into());
            }
            println!("Hello, {}!", name.trim());
        }
        None => match storage.borrow().load_player_name() {
            Some(name) => println!("{name}"),
            None => println!("No player name set."),
        },
    }
    Ok(())
}

fn settings(storage: &Storage, reset: bool) -> CliResult {
    if reset {
        let mut storage = storage.borrow_mut();
        if !storage.save_settings(&RoundConfiguration::default())
            || !storage.save_composition_settings(&CompositionConfiguration::default())
        {
            return Err("could not save settings".into());
        }
    }
    let storage = storage.borrow();
    let round = storage.load_settings();
    let composition = storage.load_composition_settings();
    println!(
        "play:    {} problems, {} {}..{}",
        round.problem_count, round.operation_mode, round.min_number, round.max_number
    );
    println!(
        "compose: {} x{}",
        composition.range_label(),
        composition.repetitions
    );
    Ok(())
}

fn clear(storage: &Storage, game: Option<Uuid>, all: bool) -> CliResult {
    let mut storage = storage.borrow_mut();
    let ok = match (game, all) {
        (Some(id), _) => storage.delete_game(id),
        (None, true) => storage.clear_all_data(),
        (None, false) => {
            let player = storage
                .load_player_name()
                .ok_or("no player name yet, nothing to clear")?;
            storage.clear_player_statistics(&player)
        }
    };
    if !ok {
        return Err("nothing was cleared".into());
    }
    println!("Done.");
    Ok(())
}
