mod console;
mod lesson;
mod logging;

use std::fmt;

use course_core::model::{CourseId, ModuleId, UserId};
use services::{AppServices, Clock};

use crate::console::Console;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    MissingText { what: &'static str },
    UnknownArg(String),
    InvalidId { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required"),
            ArgsError::MissingText { what } => write!(f, "a {what} is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidId { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_id<T: std::str::FromStr>(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<T, ArgsError> {
    let value = require_value(args, flag)?;
    value
        .parse()
        .map_err(|_| ArgsError::InvalidId { flag, raw: value })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- lesson   --course <id> [--module <id>]");
    eprintln!("  cargo run -p app -- syllabus --course <id>");
    eprintln!("  cargo run -p app -- catalog  [query]");
    eprintln!("  cargo run -p app -- bookmark [--course <id>]");
    eprintln!("  cargo run -p app -- recommend <goal>");
    eprintln!("  cargo run -p app -- roadmap  <goal>");
    eprintln!("  cargo run -p app -- tutor");
    eprintln!("  cargo run -p app -- seed");
    eprintln!();
    eprintln!("Common options:");
    eprintln!("  --db <sqlite_url>    (default: sqlite://learnx.sqlite3)");
    eprintln!("  --user <id>          (default: u1)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  LEARN_DB_URL, LEARN_USER_ID, LEARN_LOG");
    eprintln!("  LEARN_AI_API_KEY, LEARN_AI_BASE_URL, LEARN_AI_MODEL,");
    eprintln!("  LEARN_AI_TTS_MODEL, LEARN_AI_VOICE, LEARN_AI_TIMEOUT_SECS");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Lesson,
    Syllabus,
    Catalog,
    Bookmark,
    Recommend,
    Roadmap,
    Tutor,
    Seed,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "lesson" => Some(Self::Lesson),
            "syllabus" => Some(Self::Syllabus),
            "catalog" => Some(Self::Catalog),
            "bookmark" => Some(Self::Bookmark),
            "recommend" => Some(Self::Recommend),
            "roadmap" => Some(Self::Roadmap),
            "tutor" => Some(Self::Tutor),
            "seed" => Some(Self::Seed),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    user_id: UserId,
    course_id: Option<CourseId>,
    module_id: Option<ModuleId>,
    text: Vec<String>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("LEARN_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://learnx.sqlite3".into(), normalize_sqlite_url);
        let mut user_id = std::env::var("LEARN_USER_ID")
            .ok()
            .and_then(|value| value.parse::<UserId>().ok())
            .unwrap_or_else(|| UserId::new("u1"));
        let mut course_id = None;
        let mut module_id = None;
        let mut text = Vec::new();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--user" => user_id = parse_id(args, "--user")?,
                "--course" => course_id = Some(parse_id(args, "--course")?),
                "--module" => module_id = Some(parse_id(args, "--module")?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                flag if flag.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => text.push(arg),
            }
        }

        Ok(Self {
            db_url,
            user_id,
            course_id,
            module_id,
            text,
        })
    }

    fn require_course(&self) -> Result<&CourseId, ArgsError> {
        self.course_id
            .as_ref()
            .ok_or(ArgsError::MissingFlag { flag: "--course" })
    }

    fn require_text(&self, what: &'static str) -> Result<String, ArgsError> {
        let joined = self.text.join(" ");
        if joined.trim().is_empty() {
            return Err(ArgsError::MissingText { what });
        }
        Ok(joined)
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" || db_url.contains("mode=memory") {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);

    let cmd = match argv.next() {
        None => {
            print_usage();
            return Ok(());
        }
        Some(first) if first == "--help" || first == "-h" => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(&first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    prepare_sqlite_file(&args.db_url)?;
    let services = AppServices::new_sqlite(&args.db_url, Clock::default()).await?;
    let courses = services.courses();
    tracing::debug!(command = ?cmd, db = %args.db_url, user = %args.user_id, "starting");

    match cmd {
        Command::Lesson => {
            let course_id = args.require_course()?;
            let mut console = Console::new();
            lesson::run_lesson(
                &services,
                &mut console,
                args.user_id.clone(),
                course_id,
                args.module_id.as_ref(),
            )
            .await
        }
        Command::Syllabus => {
            let course = courses.load_course(args.require_course()?).await?;
            println!("{} ({}, {})", course.title(), course.category(), course.duration());
            println!("{}", courses.summary(&course).await);
            println!("Progress: {}%", courses.course_progress_percent(&course));
            for module in course.modules() {
                let marker = if module.is_completed() { "x" } else { " " };
                let remedial = if module.is_remedial() { " [remedial]" } else { "" };
                println!("[{marker}] {}  {}{remedial}", module.id(), module.title());
                for step in module.steps() {
                    println!("      {}. {}", step.order, step.title);
                }
            }
            Ok(())
        }
        Command::Catalog => {
            let query = args.text.join(" ");
            for course in courses.search_catalog(&query) {
                println!(
                    "{}  {} [{}, {}]",
                    course.id(),
                    course.title(),
                    course.category(),
                    course.duration()
                );
                println!("    {}", course.description());
            }
            Ok(())
        }
        Command::Bookmark => {
            if let Some(course_id) = &args.course_id {
                let saved = courses.toggle_bookmark(&args.user_id, course_id).await?;
                println!("{course_id}: {}", if saved { "saved" } else { "removed" });
            }
            let saved = courses.bookmarked(&args.user_id).await?;
            if saved.is_empty() {
                println!("No saved courses.");
            }
            for course in saved {
                println!("{}  {}", course.id(), course.title());
            }
            Ok(())
        }
        Command::Recommend => {
            let goal = args.require_text("goal")?;
            match courses.recommend(&goal).await {
                Some(rec) => println!("{} ({}): {}", rec.course.title(), rec.course.id(), rec.reason),
                None => println!("No catalog course matches that goal yet."),
            }
            Ok(())
        }
        Command::Roadmap => {
            let goal = args.require_text("goal")?;
            let roadmap = courses.roadmap(&goal).await?;
            println!("Roadmap: {}", roadmap.goal);
            for (i, milestone) in roadmap.milestones.iter().enumerate() {
                println!("{}. {}", i + 1, milestone.title);
                if !milestone.description.is_empty() {
                    println!("   {}", milestone.description);
                }
                for title in &milestone.course_titles {
                    println!("   - {title}");
                }
            }
            Ok(())
        }
        Command::Tutor => {
            let tutor = services.tutor();
            let mut console = Console::new();
            println!("Ask anything. Empty line to leave.");
            while let Some(message) = console.ask("you >").await? {
                if message.is_empty() {
                    break;
                }
                println!("tutor > {}", tutor.ask(&message).await);
            }
            Ok(())
        }
        Command::Seed => {
            for course in courses.catalog() {
                let loaded = courses.load_course(course.id()).await?;
                println!("{}: {} modules", loaded.id(), loaded.modules().len());
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    logging::init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
