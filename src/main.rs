pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use itertools::Itertools;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use serde::Serialize;
use std::{
    error::Error,
    io::{self, stdin},
    sync::mpsc::Sender,
    thread,
    time::Duration,
};

use jtype::{
    config::{Config, ConfigStore, FileConfigStore},
    drill::{CompareMode, Drill},
    extract::{parse_examples, Example},
    history::{self, PracticeRecord},
    judge::{CodeRunner, Judge0Client, RunKind, RunTracker},
    notes::{BundledNotes, HttpNotesSource, NotesSource},
    runtime::{Event, Events, RunMessage},
    topic::{derive_topic, Topic},
    TICK_RATE_MS,
};

/// terminal typing trainer for java, driven by scraped lecture notes
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Scrapes a plain-text Java lecture-notes document, extracts runnable class snippets, and drives a character-exact typing drill with optional compile-and-run through a remote execution service."
)]
pub struct Cli {
    /// url of the plain-text notes document to scrape
    #[clap(short = 'u', long)]
    notes_url: Option<String>,

    /// use the bundled sample notes instead of fetching
    #[clap(long)]
    offline: bool,

    /// only practice snippets classified under this topic (e.g. "Loops")
    #[clap(short = 't', long)]
    topic: Option<String>,

    /// completion rule for the drill
    #[clap(short = 'm', long, value_enum)]
    compare_mode: Option<CompareMode>,

    /// smallest snippet to keep, in bytes
    #[clap(long)]
    min_len: Option<usize>,

    /// largest snippet to keep, in bytes
    #[clap(long)]
    max_len: Option<usize>,

    /// cap on the number of snippets
    #[clap(long)]
    max_snippets: Option<usize>,

    /// seconds between completing a snippet and auto-advancing to the next
    #[clap(long)]
    auto_advance_secs: Option<f64>,

    /// print the curated snippet list and exit
    #[clap(long)]
    list: bool,

    /// with --list, print the examples payload as json instead of a table
    #[clap(long)]
    json: bool,
}

impl Cli {
    /// File config overridden by whatever was given on the command line.
    fn merged_config(&self, mut cfg: Config) -> Config {
        if let Some(url) = &self.notes_url {
            cfg.notes_url = url.clone();
        }
        if let Some(mode) = self.compare_mode {
            cfg.compare_mode = mode;
        }
        if let Some(v) = self.min_len {
            cfg.min_snippet_len = v;
        }
        if let Some(v) = self.max_len {
            cfg.max_snippet_len = v;
        }
        if let Some(v) = self.max_snippets {
            cfg.max_snippets = v;
        }
        if let Some(v) = self.auto_advance_secs {
            cfg.auto_advance_secs = v;
        }
        cfg
    }
}

#[derive(Debug)]
pub struct App {
    pub examples: Vec<Example>,
    pub index: usize,
    pub drill: Drill,
    pub config: Config,
    pub tracker: RunTracker,
    pub run_display: Option<String>,
}

impl App {
    pub fn new(examples: Vec<Example>, config: Config) -> Self {
        let mut app = Self {
            examples,
            index: 0,
            drill: Drill::new(String::new(), config.compare_mode, config.auto_advance_secs),
            config,
            tracker: RunTracker::default(),
            run_display: None,
        };
        app.reset_drill();
        app
    }

    pub fn current(&self) -> Option<&Example> {
        self.examples.get(self.index)
    }

    fn reset_drill(&mut self) {
        let target = self.current().map(|e| e.code.clone()).unwrap_or_default();
        self.drill = Drill::new(target, self.config.compare_mode, self.config.auto_advance_secs);
    }

    /// Any navigation resets the drill, drops the run pane, and makes every
    /// in-flight run stale.
    fn navigate_to(&mut self, index: usize) {
        self.index = index;
        self.tracker.invalidate();
        self.run_display = None;
        self.reset_drill();
    }

    pub fn next(&mut self) {
        if self.examples.is_empty() {
            return;
        }
        self.navigate_to((self.index + 1) % self.examples.len());
    }

    pub fn prev(&mut self) {
        if self.examples.is_empty() {
            return;
        }
        self.navigate_to((self.index + self.examples.len() - 1) % self.examples.len());
    }

    pub fn restart(&mut self) {
        self.navigate_to(self.index);
    }

    /// Advances the tick-driven state; returns true when auto-advance fired.
    pub fn on_tick(&mut self) -> bool {
        self.drill.on_tick();
        if self.drill.should_advance() {
            self.next();
            return true;
        }
        false
    }

    /// Returns false when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent, runner: &Judge0Client, tx: &Sender<Event>) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return false,
            KeyCode::Char('c') if ctrl => return false,
            KeyCode::Char('r') if ctrl => self.restart(),
            KeyCode::Char('n') if ctrl => self.next(),
            KeyCode::Char('p') if ctrl => self.prev(),
            KeyCode::Right if ctrl => self.next(),
            KeyCode::Left if ctrl => self.prev(),
            KeyCode::Char('o') if ctrl => self.dispatch_run(RunKind::Target, runner, tx),
            KeyCode::Char('t') if ctrl => self.dispatch_run(RunKind::Typed, runner, tx),
            KeyCode::Tab => self.next(),
            KeyCode::Enter => {
                if self.drill.is_complete() {
                    // skip the auto-advance wait
                    self.next();
                } else {
                    self.drill.enter();
                }
            }
            KeyCode::Backspace => self.drill.backspace(),
            KeyCode::Char(c) if !ctrl => self.drill.write(c),
            _ => {}
        }
        true
    }

    fn dispatch_run(&mut self, kind: RunKind, runner: &Judge0Client, tx: &Sender<Event>) {
        let Some(ticket) = self.tracker.begin(kind) else {
            return; // already in flight
        };
        let code = match kind {
            RunKind::Target => self.current().map(|e| e.code.clone()).unwrap_or_default(),
            RunKind::Typed => self.drill.typed_string(),
        };
        let runner = runner.clone();
        let tx = tx.clone();
        thread::spawn(move || {
            let result = runner.run(&code, "");
            let _ = tx.send(Event::RunDone(RunMessage { ticket, result }));
        });
        self.run_display = None;
    }

    pub fn apply_run_message(&mut self, msg: RunMessage) {
        if !self.tracker.accept(msg.ticket) {
            return; // stale: the snippet changed while the run was in flight
        }
        self.run_display = Some(match msg.result {
            Ok(outcome) => {
                if outcome.status.is_empty() {
                    outcome.display_text().to_string()
                } else {
                    format!("[{}] {}", outcome.status, outcome.display_text())
                }
            }
            Err(err) => format!("Request failed: {err}"),
        });
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = cli.merged_config(FileConfigStore::new().load());

    let notes = load_notes(&cli, &config)?;
    let examples = curate(&cli, &config, &notes)?;

    if cli.list {
        print_list(&examples, cli.json);
        return Ok(());
    }

    if examples.is_empty() {
        println!("No examples found in the notes document.");
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Judge0Client::new(config.run_url.as_str());
    let mut app = App::new(examples, config);
    let result = run_loop(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn load_notes(cli: &Cli, config: &Config) -> Result<String, Box<dyn Error>> {
    let fetched = if cli.offline {
        BundledNotes::default().fetch()
    } else {
        HttpNotesSource::new(config.notes_url.as_str()).fetch()
    };
    fetched.map_err(|e| format!("failed to load notes: {e}\nhint: retry with --offline").into())
}

fn curate(cli: &Cli, config: &Config, notes: &str) -> Result<Vec<Example>, Box<dyn Error>> {
    let mut examples = config.curation().apply(parse_examples(notes));

    if let Some(wanted) = &cli.topic {
        let Some(topic) = Topic::parse(wanted) else {
            let known = Topic::ALL.iter().map(|t| t.to_string()).join(", ");
            return Err(format!("unknown topic {wanted:?}; known topics: {known}").into());
        };
        examples.retain(|e| derive_topic(e) == topic);
    }

    Ok(examples)
}

#[derive(Serialize)]
struct ExamplesPayload<'a> {
    examples: &'a [Example],
}

fn print_list(examples: &[Example], json: bool) {
    if json {
        let payload = ExamplesPayload { examples };
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).unwrap_or_default()
        );
        return;
    }

    for (i, e) in examples.iter().enumerate() {
        println!(
            "{:>3}  {:<24} {:<18} {}",
            i + 1,
            e.filename,
            derive_topic(e).to_string(),
            e.title
        );
    }
    let topics = examples
        .iter()
        .map(|e| derive_topic(e).to_string())
        .unique()
        .join(", ");
    println!("\n{} examples across topics: {}", examples.len(), topics);
}

fn run_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Judge0Client,
) -> Result<(), Box<dyn Error>> {
    let events = Events::new();
    events.spawn_ticker(Duration::from_millis(TICK_RATE_MS));
    events.spawn_terminal_reader();
    let tx = events.sender();

    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    loop {
        match events.next()? {
            Event::Tick => {
                let advanced = app.on_tick();
                // Redraw only while something on screen is moving.
                if advanced || app.drill.has_started() || app.drill.is_complete() {
                    terminal.draw(|f| f.render_widget(&*app, f.area()))?;
                }
            }
            Event::Resize => {
                terminal.draw(|f| f.render_widget(&*app, f.area()))?;
            }
            Event::RunDone(msg) => {
                app.apply_run_message(msg);
                terminal.draw(|f| f.render_widget(&*app, f.area()))?;
            }
            Event::Key(key) => {
                let was_complete = app.drill.is_complete();
                if !app.handle_key(key, runner, &tx) {
                    break;
                }
                if !was_complete && app.drill.is_complete() {
                    log_completion(app);
                }
                terminal.draw(|f| f.render_widget(&*app, f.area()))?;
            }
        }
    }

    Ok(())
}

fn log_completion(app: &App) {
    let Some(example) = app.current() else {
        return;
    };
    let record = PracticeRecord {
        filename: example.filename.clone(),
        topic: derive_topic(example).to_string(),
        chars: app.drill.target_len(),
        elapsed_secs: app.drill.elapsed_ms() as f64 / 1000.0,
        wpm: app.drill.wpm(),
        accuracy: app.drill.accuracy(),
    };
    if let Some(path) = history::default_log_path() {
        let _ = history::append_record(&path, &record);
    }
}
