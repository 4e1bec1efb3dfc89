use std::error::Error;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use quiz_api::InMemoryBackend;
use quiz_core::model::{
    AnswerLetter, AttemptId, CurrentUser, LessonId, QuestionDraft, QuestionId, Quiz, QuizAttempt,
    QuizHeader, QuizId, QuizResult, UNANSWERED, UserId,
};
use services::{
    AppServices, Notification, NotificationLevel, NotificationSink, Notifier, QuizSession,
    SessionPhase,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    InvalidId { flag: &'static str, raw: String },
    InvalidQuestion { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidId { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidQuestion { raw } => write!(
                f,
                "invalid --question value: {raw} (expected \"text|A|B|C|D|letter\")"
            ),
        }
    }
}

impl Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_id<T: FromStr>(flag: &'static str, raw: String) -> Result<T, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidId { flag, raw })
}

/// `text|optionA|optionB|optionC|optionD|letter`
fn parse_question(raw: String) -> Result<QuestionDraft, ArgsError> {
    let parts: Vec<&str> = raw.split('|').map(str::trim).collect();
    let [text, a, b, c, d, letter] = parts.as_slice() else {
        return Err(ArgsError::InvalidQuestion { raw: raw.clone() });
    };
    let Ok(correct) = letter.parse::<AnswerLetter>() else {
        return Err(ArgsError::InvalidQuestion { raw: raw.clone() });
    };
    Ok(QuestionDraft::new(*text, [*a, *b, *c, *d], correct))
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  quizctl take    --lesson-id <id> [--user-id <id>] [--demo]");
    eprintln!("  quizctl history [--attempt <id>] [--demo]");
    eprintln!(
        "  quizctl author  --lesson-id <id> [--title <title>] [--question \"text|A|B|C|D|letter\"]... [--demo]"
    );
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_API_BASE_URL, QUIZ_ADMIN_BASE_URL, QUIZ_API_TOKEN, QUIZ_API_TIMEOUT_SECS");
    eprintln!("  QUIZ_IDENTITY_RETRY_ATTEMPTS, QUIZ_IDENTITY_RETRY_DELAY_MS");
    eprintln!("  QUIZ_LESSON_ID, QUIZ_USER_ID, QUIZ_DEMO");
    eprintln!("  RUST_LOG (default: info)");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Take,
    History,
    Author,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "take" => Some(Self::Take),
            "history" => Some(Self::History),
            "author" => Some(Self::Author),
            _ => None,
        }
    }
}

struct Args {
    lesson_id: Option<LessonId>,
    user_id: Option<UserId>,
    attempt_id: Option<AttemptId>,
    title: Option<String>,
    questions: Vec<QuestionDraft>,
    demo: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut lesson_id = std::env::var("QUIZ_LESSON_ID")
            .ok()
            .and_then(|value| value.parse::<LessonId>().ok());
        let mut user_id = std::env::var("QUIZ_USER_ID")
            .ok()
            .and_then(|value| value.parse::<UserId>().ok());
        let mut demo = std::env::var("QUIZ_DEMO")
            .is_ok_and(|value| matches!(value.trim(), "1" | "true" | "yes"));
        let mut attempt_id = None;
        let mut title = None;
        let mut questions = Vec::new();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--lesson-id" => {
                    let value = require_value(args, "--lesson-id")?;
                    lesson_id = Some(parse_id("--lesson-id", value)?);
                }
                "--user-id" => {
                    let value = require_value(args, "--user-id")?;
                    user_id = Some(parse_id("--user-id", value)?);
                }
                "--attempt" => {
                    let value = require_value(args, "--attempt")?;
                    attempt_id = Some(parse_id("--attempt", value)?);
                }
                "--title" => title = Some(require_value(args, "--title")?),
                "--question" => questions.push(parse_question(require_value(args, "--question")?)?),
                "--demo" => demo = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            lesson_id,
            user_id,
            attempt_id,
            title,
            questions,
            demo,
        })
    }

    fn lesson_id(&self) -> Result<LessonId, ArgsError> {
        self.lesson_id.ok_or(ArgsError::MissingFlag {
            flag: "--lesson-id",
        })
    }
}

/// Prints notifications in the terminal, one line each.
struct ConsoleSink;

impl NotificationSink for ConsoleSink {
    fn notify(&self, notification: Notification) {
        let tag = match notification.level {
            NotificationLevel::Success => "ok",
            NotificationLevel::Info => "info",
            NotificationLevel::Warning => "warn",
            NotificationLevel::Error => "error",
        };
        println!("[{tag}] {}", notification.message);
    }
}

/// A small timed quiz for trying the CLI without a backend.
fn demo_backend(lesson_id: LessonId) -> Result<InMemoryBackend, Box<dyn Error>> {
    let backend = InMemoryBackend::new();
    backend.set_current_user(Some(CurrentUser {
        id: UserId::new(1),
        name: "Demo Learner".into(),
        email: "learner@example.com".into(),
        role: "STUDENT".into(),
    }))?;

    let drafts = [
        (
            "Which keyword moves a value into a closure?",
            ["ref", "move", "mut", "static"],
            AnswerLetter::B,
        ),
        (
            "What does `?` do on an `Err`?",
            ["Panics", "Ignores it", "Returns it early", "Retries"],
            AnswerLetter::C,
        ),
        (
            "Which type gives shared ownership across threads?",
            ["Rc", "Box", "Cell", "Arc"],
            AnswerLetter::D,
        ),
    ];
    let mut questions = Vec::with_capacity(drafts.len());
    for (id, (text, options, correct)) in (1..).zip(drafts) {
        let validated = QuestionDraft::new(text, options, correct).validate()?;
        questions.push(validated.assign_id(QuestionId::new(id)));
    }

    backend.seed_quiz(Quiz::new(
        QuizHeader {
            id: QuizId::new(1),
            lesson_id,
            title: "Rust basics".into(),
        },
        questions,
        70,
        Some(2),
    ))?;
    Ok(backend)
}

fn print_question(session: &QuizSession) {
    let Some(question) = session.current_question() else {
        return;
    };
    let index = session.current_index();
    let progress = session.progress();
    let selected = session.answers().get(index).copied().unwrap_or(UNANSWERED);

    println!();
    match progress.remaining_seconds {
        Some(_) => println!(
            "Question {}/{}  ({} answered, {} left)",
            index + 1,
            progress.total,
            progress.answered,
            session.time_formatted()
        ),
        None => println!(
            "Question {}/{}  ({} answered)",
            index + 1,
            progress.total,
            progress.answered
        ),
    }
    println!("{}", question.text);
    for letter in AnswerLetter::ALL {
        let marker = if letter.index() == selected { '*' } else { ' ' };
        println!(" {marker} {letter}) {}", question.option(letter));
    }
}

fn print_result(result: &QuizResult) {
    println!();
    println!(
        "Score: {}% ({}/{} correct) - {}",
        result.score,
        result.correct_count,
        result.total_questions,
        if result.passed { "passed" } else { "not passed" }
    );
    for (number, entry) in (1..).zip(&result.breakdown) {
        let answered = entry
            .user_answer
            .map_or_else(|| "-".to_owned(), |letter| letter.to_string());
        let mark = if entry.is_correct { "ok" } else { "x" };
        println!(
            "  {number}. [{mark}] {} (yours: {answered}, correct: {})",
            entry.question_text, entry.correct_answer
        );
        if let Some(explanation) = &entry.explanation {
            println!("       {explanation}");
        }
    }
    println!("Type r to retake or q to quit.");
}

fn print_controls() {
    println!("a-d answer | n next | p previous | g <n> go to | s submit | r retake | q quit");
}

enum Flow {
    Continue,
    Quit,
}

async fn handle_input(session: &QuizSession, input: &str) -> Flow {
    let mut words = input.split_whitespace();
    match words.next() {
        Some("q" | "quit") => return Flow::Quit,
        Some("n" | "next") => {
            session.next();
            print_question(session);
        }
        Some("p" | "prev") => {
            session.previous();
            print_question(session);
        }
        Some("g" | "go") => {
            match words.next().and_then(|raw| raw.parse::<usize>().ok()) {
                Some(number) => {
                    session.go_to(number.saturating_sub(1));
                    print_question(session);
                }
                None => print_controls(),
            }
        }
        Some("s" | "submit") => {
            // failures are already shown as notifications
            if let Err(err) = session.submit().await {
                debug!(error = %err, "submit refused");
            }
        }
        Some("r" | "retake") => match session.retake() {
            Ok(()) => {}
            Err(err) => println!("{err}"),
        },
        Some(raw) => match raw.parse::<AnswerLetter>() {
            Ok(letter) if session.phase() == SessionPhase::Answering => {
                session.select_current(letter.index());
                session.next();
                print_question(session);
            }
            _ => print_controls(),
        },
        None => print_question(session),
    }
    Flow::Continue
}

async fn take(services: &AppServices, args: &Args) -> Result<(), Box<dyn Error>> {
    let lesson_id = args.lesson_id()?;
    let user_id = match args.user_id {
        Some(user_id) => user_id,
        None => services.identity().refresh().await?.id,
    };

    let session = services.sessions().start_session(user_id, lesson_id).await?;
    println!("{}", session.quiz().title());
    print_controls();
    print_question(&session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticks = tokio::time::interval(Duration::from_secs(1));
    let mut shown = session.phase();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if let Flow::Quit = handle_input(&session, line.trim()).await {
                    break;
                }
            }
            _ = ticks.tick() => {}
        }

        let phase = session.phase();
        if phase != shown {
            match (phase, session.result()) {
                (SessionPhase::Results, Some(result)) => print_result(&result),
                _ => print_question(&session),
            }
            shown = phase;
        }
    }

    session.close();
    Ok(())
}

fn print_attempt(attempt: &QuizAttempt) {
    println!(
        "#{:<4} {}  lesson {:>4}  {:>3}% of {:>2}  {}",
        attempt.id.value(),
        attempt.attempted_at.format("%Y-%m-%d %H:%M"),
        attempt.lesson_id,
        attempt.score,
        attempt.total_questions,
        attempt.title
    );
}

async fn history(services: &AppServices, args: &Args) -> Result<(), Box<dyn Error>> {
    if let Some(attempt_id) = args.attempt_id {
        print_attempt(&services.sessions().attempt(attempt_id).await?);
        return Ok(());
    }
    let attempts = services.sessions().history().await?;
    if attempts.is_empty() {
        println!("No quiz attempts yet.");
        return Ok(());
    }
    for attempt in &attempts {
        print_attempt(attempt);
    }
    Ok(())
}

async fn author(services: &AppServices, args: Args) -> Result<(), Box<dyn Error>> {
    let lesson_id = args.lesson_id()?;
    let authoring = services.authoring();

    let mut draft = authoring.open_draft(lesson_id).await?;
    if let Some(title) = args.title {
        draft.set_title(title);
    }
    for question in args.questions {
        authoring.queue_question(&mut draft, question)?;
    }

    let report = authoring.save(&mut draft).await?;
    println!(
        "{} of {} question(s) saved; quiz {}",
        report.added.len(),
        report.queued,
        report
            .quiz_id
            .map_or_else(|| "not created".to_owned(), |id| format!("#{id}"))
    );
    if let Some(failure) = &report.failure {
        println!("stopped at {:?}: {}", failure.at, failure.error.reason());
        if !draft.pending().is_empty() {
            println!("{} question(s) were not sent", draft.pending().len());
        }
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn Error>> {
    let mut argv = std::env::args().skip(1);

    let cmd = match argv.next().as_deref() {
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(first).ok_or_else(|| {
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

    let notifier = Notifier::new(std::sync::Arc::new(ConsoleSink));
    let services = if args.demo {
        let lesson_id = args.lesson_id.unwrap_or(LessonId::new(1));
        AppServices::in_memory(demo_backend(lesson_id)?, notifier)
    } else {
        AppServices::from_env(notifier)?
    };

    match cmd {
        Command::Take => take(&services, &args).await,
        Command::History => history(&services, &args).await,
        Command::Author => author(&services, args).await,
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
