use std::fmt;
use std::io::{BufRead, Write};
use std::sync::Arc;

use pictalk_core::Clock;
use pictalk_core::model::{
    AutismLevel, Difficulty, ExerciseSession, ExerciseSettings, ExerciseSettingsError,
    ImageReference, ImageStyle, SpeakerRole,
};
use services::{
    ExerciseError, ExerciseService, GatewayClient, GatewayConfig, LocalSimulation, ProviderError,
};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidLevel { raw: String },
    InvalidStyle { raw: String },
    InvalidSettings(ExerciseSettingsError),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidLevel { raw } => write!(f, "invalid --level value: {raw}"),
            ArgsError::InvalidStyle { raw } => write!(f, "invalid --style value: {raw}"),
            ArgsError::InvalidSettings(err) => write!(f, "{err}"),
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

fn level_from_arg(raw: &str) -> Option<AutismLevel> {
    match raw {
        "1" => Some(AutismLevel::Level1),
        "2" => Some(AutismLevel::Level2),
        "3" => Some(AutismLevel::Level3),
        _ => None,
    }
}

fn style_from_arg(raw: &str) -> Option<ImageStyle> {
    match raw.to_lowercase().as_str() {
        "realistic" => Some(ImageStyle::Realistic),
        "illustration" => Some(ImageStyle::Illustration),
        "cartoon" => Some(ImageStyle::Cartoon),
        "watercolor" => Some(ImageStyle::Watercolor),
        "3d" => Some(ImageStyle::ThreeDRendering),
        _ => None,
    }
}

struct Args {
    settings: ExerciseSettings,
    local: bool,
    seed: Option<u64>,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --topic <text>       topic focus for generated images");
    eprintln!("  --plan <text>        treatment plan notes");
    eprintln!("  --age <n>            child's age (default 3)");
    eprintln!("  --level <1|2|3>      autism level (default 1)");
    eprintln!("  --style <name>       realistic|illustration|cartoon|watercolor|3d");
    eprintln!("  --attempts <n>       allowed attempts per image (default 3)");
    eprintln!("  --threshold <pct>    details threshold 0-100 (default 70)");
    eprintln!("  --local              use the local simulation, no network");
    eprintln!("  --seed <n>           seed the simulation for repeatable runs");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  PICTALK_HF_TOKEN, PICTALK_SPACE, PICTALK_HUB_URL");
    eprintln!();
    eprintln!("During a session:");
    eprintln!("  type the child's description, or one of:");
    eprintln!("  /checklist /progress /session /transcript /new /save-log /save-images /quit");
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut age: u8 = 3;
        let mut level = AutismLevel::Level1;
        let mut topic = String::new();
        let mut plan = String::new();
        let mut style = ImageStyle::Realistic;
        let mut attempts: u32 = 3;
        let mut threshold: f64 = 70.0;
        let mut local = false;
        let mut seed = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--topic" => topic = require_value(args, "--topic")?,
                "--plan" => plan = require_value(args, "--plan")?,
                "--age" => {
                    let value = require_value(args, "--age")?;
                    age = value.parse().map_err(|_| ArgsError::InvalidNumber {
                        flag: "--age",
                        raw: value.clone(),
                    })?;
                }
                "--level" => {
                    let value = require_value(args, "--level")?;
                    level = level_from_arg(&value)
                        .ok_or(ArgsError::InvalidLevel { raw: value.clone() })?;
                }
                "--style" => {
                    let value = require_value(args, "--style")?;
                    style = style_from_arg(&value)
                        .ok_or(ArgsError::InvalidStyle { raw: value.clone() })?;
                }
                "--attempts" => {
                    let value = require_value(args, "--attempts")?;
                    attempts = value.parse().map_err(|_| ArgsError::InvalidNumber {
                        flag: "--attempts",
                        raw: value.clone(),
                    })?;
                }
                "--threshold" => {
                    let value = require_value(args, "--threshold")?;
                    threshold = value.parse().map_err(|_| ArgsError::InvalidNumber {
                        flag: "--threshold",
                        raw: value.clone(),
                    })?;
                }
                "--local" => local = true,
                "--seed" => {
                    let value = require_value(args, "--seed")?;
                    seed = Some(value.parse().map_err(|_| ArgsError::InvalidNumber {
                        flag: "--seed",
                        raw: value.clone(),
                    })?);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let settings = ExerciseSettings::new(
            age,
            level,
            topic,
            plan,
            style,
            Difficulty::VerySimple,
            attempts,
            threshold,
        )
        .map_err(ArgsError::InvalidSettings)?;

        Ok(Self {
            settings,
            local,
            seed,
        })
    }
}

fn build_local_service(seed: Option<u64>) -> ExerciseService {
    let simulation = match seed {
        Some(seed) => LocalSimulation::with_seed(seed),
        None => LocalSimulation::new(),
    };
    ExerciseService::new(Clock::system(), Arc::new(simulation))
}

/// Picks the remote gateway when a token is configured, otherwise the local
/// simulation. Returns the service and whether it is simulation-backed.
fn build_service(args: &Args) -> Result<(ExerciseService, bool), Box<dyn std::error::Error>> {
    if args.local {
        return Ok((build_local_service(args.seed), true));
    }
    match GatewayConfig::from_env() {
        Some(config) => {
            let client = GatewayClient::new(config)?;
            Ok((
                ExerciseService::new(Clock::system(), Arc::new(client)),
                false,
            ))
        }
        None => {
            eprintln!("no PICTALK_HF_TOKEN configured; using the local simulation");
            Ok((build_local_service(args.seed), true))
        }
    }
}

fn describe_image(image: &ImageReference) -> String {
    if image.is_inline() {
        format!(
            "inline {} image ({} bytes)",
            image.mime().unwrap_or("unknown"),
            image.size_bytes()
        )
    } else {
        image.to_string()
    }
}

fn print_checklist(session: &ExerciseSession) {
    println!("Details to identify:");
    for item in session.checklist().items() {
        let mark = if item.is_identified() { "[x]" } else { "[ ]" };
        println!("  {mark} {}", item.text());
    }
}

fn print_progress(session: &ExerciseSession) {
    println!("Progress: {}", session.progress());
    println!(
        "Attempts: {}/{}",
        session.attempt_count(),
        session.settings().attempt_limit()
    );
    if session.meets_threshold() {
        println!("Details threshold reached.");
    }
}

fn print_session_details(session: &ExerciseSession) {
    let settings = session.settings();
    println!("Session {}", session.id());
    println!("  Topic focus:   {}", settings.topic_focus());
    println!("  Difficulty:    {}", settings.difficulty());
    println!("  Image style:   {}", settings.image_style());
    println!("  Autism level:  {}", settings.autism_level());
    println!("  Age:           {}", settings.age());
    println!("  Image:         {}", describe_image(session.image()));
    println!("  Progress:      {}", session.progress());
}

fn print_transcript(session: &ExerciseSession) {
    if session.transcript().is_empty() {
        println!("No conversation yet.");
        return;
    }
    for entry in session.transcript().entries() {
        let label = match entry.speaker() {
            SpeakerRole::Child => "Child",
            SpeakerRole::Teacher => "Teacher",
        };
        println!("{label}: {}", entry.text());
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv).map_err(|err| {
        eprintln!("{err}");
        print_usage();
        err
    })?;

    let (mut service, mut simulated) = build_service(&args)?;

    // On any gateway failure the app falls back to the local simulation
    // instead of becoming unusable.
    let mut session = match service.start_exercise(args.settings.clone()).await {
        Ok(session) => session,
        Err(err) if !simulated => {
            eprintln!("{err}");
            eprintln!("falling back to the local simulation");
            service = build_local_service(args.seed);
            simulated = true;
            service.start_exercise(args.settings.clone()).await?
        }
        Err(err) => return Err(err.into()),
    };

    if simulated {
        println!("Running in local simulation mode.");
    }
    println!("Image ready: {}", describe_image(session.image()));
    print_checklist(&session);
    println!();
    println!("Type what the child says about the image (or /help).");

    let stdin = std::io::stdin();
    loop {
        print!("child> ");
        std::io::stdout().flush()?;

        let Some(line) = stdin.lock().lines().next() else {
            break;
        };
        let line = line?;
        let input = line.trim();

        match input {
            "" => continue,
            "/quit" | "/q" => break,
            "/help" => print_usage(),
            "/checklist" => print_checklist(&session),
            "/progress" => print_progress(&session),
            "/session" => print_session_details(&session),
            "/transcript" => print_transcript(&session),
            "/new" => match service.start_exercise(args.settings.clone()).await {
                Ok(next) => {
                    session = next;
                    println!("Image ready: {}", describe_image(session.image()));
                    print_checklist(&session);
                }
                Err(err) => eprintln!("could not generate a new image: {err}"),
            },
            "/save-log" => report_save(service.save_log().await),
            "/save-images" => report_save(service.save_images().await),
            _ => match service.submit_description(&mut session, input).await {
                Ok(outcome) => {
                    println!("Teacher: {}", outcome.message);
                    print_progress(&session);
                    if outcome.exhausted {
                        println!("Attempt budget used up; type /new for a new image.");
                    }
                }
                Err(ExerciseError::EmptyUtterance) => {
                    eprintln!("please enter a description first");
                }
                Err(err) => {
                    eprintln!("{err}");
                    if !simulated {
                        eprintln!("falling back to the local simulation");
                        service = build_local_service(args.seed);
                        simulated = true;
                        session = service.start_exercise(args.settings.clone()).await?;
                        println!("Image ready: {}", describe_image(session.image()));
                        print_checklist(&session);
                    }
                }
            },
        }
    }

    Ok(())
}

fn report_save(result: Result<String, ExerciseError>) {
    match result {
        Ok(status) => println!("{status}"),
        Err(ExerciseError::Provider(ProviderError::Unsupported { operation })) => {
            eprintln!("{operation} is not available in local simulation");
        }
        Err(err) => eprintln!("{err}"),
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
