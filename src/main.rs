use tokio::io::{
    self,
    AsyncBufReadExt,
    BufReader,
    Lines,
    Stdin,
};
use tracing::{
    error,
    info,
    warn,
};
use tracing_subscriber::EnvFilter;
use wanipop::{
    config::{
        WanipopConfig,
        API_KEY_ENV,
    },
    core::{
        InputMode,
        SubmissionOutcome,
        WanipopError,
    },
    review::{
        Advance,
        ResetSignal,
        ReviewController,
        SessionSnapshot,
        SessionState,
        SubmissionCoordinator,
        TaskState,
    },
    wanikani::{
        WaniKaniClient,
        WaniKaniSource,
    },
};

type Controller = ReviewController<WaniKaniSource, WaniKaniClient>;
type Input = Lines<BufReader<Stdin>>;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wanipop=info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn input_hint(mode: Option<InputMode>) -> &'static str {
    match mode {
        Some(InputMode::Hiragana) => "romaji converts to ひらがな",
        Some(InputMode::Katakana) => "romaji converts to カタカナ",
        _ => "English",
    }
}

fn print_prompt(snapshot: &SessionSnapshot) {
    let characters = snapshot.characters.as_deref().unwrap_or("[radical image]");
    let placeholder = snapshot.placeholder.as_deref().unwrap_or_default();
    println!();
    println!("{characters}    ({} left)", snapshot.remaining);
    println!("{placeholder} [{}]", input_hint(snapshot.input_mode));
}

fn print_results(controller: &Controller) {
    let snapshot = controller.snapshot();
    let ledger = controller.session().ledger();
    println!();
    println!("Results");
    for outcome in &snapshot.results {
        match outcome {
            SubmissionOutcome::Success(review) => {
                let characters = ledger
                    .get(review.subject_id)
                    .and_then(|entry| entry.characters.clone())
                    .unwrap_or_else(|| format!("#{}", review.subject_id));
                let arrow = if review.leveled_up() { "⇑" } else { "⇓" };
                println!("  {characters}  {} {arrow}", review.ending_srs_stage.tier());
            }
            SubmissionOutcome::Failure { payload, error } => {
                println!("  assignment {} not saved: {error}", payload.assignment_id);
            }
        }
    }
}

async fn start_session(controller: &mut Controller) -> Result<bool, WanipopError> {
    match controller.start().await {
        Ok(()) if controller.session().state() == SessionState::Reviewing => Ok(true),
        Ok(()) | Err(WanipopError::NoReviewsAvailable) => {
            println!("No reviews available right now.");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// One line of user input, read against the current task state
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Quit,
    Reset,
    Batch(&'a str),
    Flip,
    FlipBeforeGrading,
    Answer(&'a str),
    Continue,
}

fn parse_command(line: &str, task_state: TaskState) -> Command<'_> {
    match (line, task_state) {
        (":quit", _) => Command::Quit,
        (":reset", _) => Command::Reset,
        (":flip", TaskState::Presenting) => Command::FlipBeforeGrading,
        (":flip", TaskState::Graded { .. }) => Command::Flip,
        _ => match line.strip_prefix(":batch") {
            Some(value) => Command::Batch(value),
            None if task_state == TaskState::Presenting => Command::Answer(line),
            None => Command::Continue,
        },
    }
}

/// Returns false once the session is over
async fn handle_command(
    controller: &mut Controller,
    config: &mut WanipopConfig,
    reset: &ResetSignal,
    command: Command<'_>,
) -> Result<bool, WanipopError> {
    match command {
        Command::Quit => return Ok(false),
        Command::Reset => {
            reset.trigger();
        }
        Command::Batch(value) => set_batch_size(controller, config, value)?,
        Command::FlipBeforeGrading => {
            println!("Answer first, :flip only overrides a graded answer");
        }
        Command::Flip => {
            let grade = controller.flip()?;
            println!("Marked as {grade:?}");
        }
        Command::Answer(attempt) => match controller.submit_attempt(attempt) {
            Ok(true) => println!("Correct!"),
            Ok(false) => {
                let expected = controller.snapshot().expected_answers.join(", ");
                println!("Incorrect. Accepted: {expected}  (enter to continue, :flip to override)");
            }
            Err(WanipopError::EmptyAttempt) => {}
            Err(e) => warn!("{e}"),
        },
        Command::Continue => {
            if controller.advance()? == Advance::Exhausted {
                let report = controller.finish().await?;
                info!(
                    "{} saved, {} unresolved after {} retries",
                    report.succeeded, report.unresolved, report.retry_passes
                );
                print_results(controller);
                return Ok(false);
            }
        }
    }
    Ok(true)
}

fn set_batch_size(
    controller: &Controller,
    config: &mut WanipopConfig,
    value: &str,
) -> Result<(), WanipopError> {
    match value.trim().parse::<usize>() {
        Ok(size) if size > 0 => {
            config.set_num_of_reviews_per_batch(size)?;
            controller.source().set_batch_size(size);
            println!("Batch size set to {size}, applies from the next session");
        }
        _ => println!("Usage: :batch <number greater than 0>"),
    }
    Ok(())
}

async fn run(
    controller: &mut Controller,
    config: &mut WanipopConfig,
    reset: &ResetSignal,
    lines: &mut Input,
) -> Result<(), WanipopError> {
    if !start_session(controller).await? {
        return Ok(());
    }

    loop {
        match controller.poll_reset().await {
            Ok(true) if controller.session().state() != SessionState::Reviewing => {
                println!("No reviews available right now.");
                return Ok(());
            }
            Ok(_) => {}
            Err(WanipopError::NoReviewsAvailable) => {
                println!("No reviews available right now.");
                return Ok(());
            }
            Err(e) => return Err(e),
        }

        let snapshot = controller.snapshot();
        if snapshot.task_state == TaskState::Presenting {
            print_prompt(&snapshot);
        }

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let command = parse_command(line.trim(), snapshot.task_state);
        if !handle_command(controller, config, reset, command).await? {
            break;
        }
    }
    Ok(())
}

/// Asks for a key on first run and stores it in the config file
async fn prompt_api_key(
    config: &mut WanipopConfig,
    lines: &mut Input,
) -> Result<String, WanipopError> {
    println!("No WaniKani API key found. Paste a personal access token:");
    let key = lines.next_line().await?.map(|l| l.trim().to_string()).unwrap_or_default();
    if key.is_empty() {
        error!(
            "Set {API_KEY_ENV} or add wanikani_api_key to {}",
            WanipopConfig::config_path().display()
        );
        return Err(WanipopError::MissingApiKey);
    }
    config.set_api_key(key.clone())?;
    Ok(key)
}

#[tokio::main]
async fn main() -> Result<(), WanipopError> {
    init_tracing();

    let mut config = WanipopConfig::load_or_create()?;
    let mut lines = BufReader::new(io::stdin()).lines();
    let api_key = match config.api_key().ok().map(str::to_string) {
        Some(key) => key,
        None => prompt_api_key(&mut config, &mut lines).await?,
    };

    let client = WaniKaniClient::new(&api_key, &config.api_base_url)?;
    match client.fetch_user().await {
        Ok(user) => info!("Logged in as {} (level {})", user.username, user.level),
        Err(e) => warn!("Could not load user: {e}"),
    }

    let source = WaniKaniSource::new(client.clone(), config.num_of_reviews_per_batch);
    let coordinator = SubmissionCoordinator::new(client, config.retry_policy());
    let mut controller = ReviewController::new(source, coordinator);

    let reset = ResetSignal::new();
    controller.subscribe_reset(&reset);
    let result = run(&mut controller, &mut config, &reset, &mut lines).await;
    controller.unsubscribe_reset();
    result
}
