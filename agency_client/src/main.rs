//! Command-line client for the Agency 360 dashboard backend.
//!
//! Runs a single command when one is given, otherwise an interactive prompt.
//! Credentials persist between runs in the session file.

use agency_client::app::{App, Flow, Prompt};
use agency_client::commands::{Command, parse_command};
use agency_client::logging;
use agency360::auth::AuthScheme;
use agency360::config::AppConfig;
use anyhow::{Context, Result};
use pico_args::Arguments;
use std::io::{self, BufRead, Write};

const HELP: &str = "\
Agency 360 session client

USAGE:
  agency_client [OPTIONS] [COMMAND]

COMMANDS:
  login                 Sign in
  register              Create an account
  profile               Fetch the signed-in user's profile
  logout                Sign out
  status                Show the session state
  route PATH            Show what PATH renders for this session
  (none)                Start the interactive prompt

OPTIONS:
  --server URL          Backend URL  [default: $AGENCY_API_BASE_URL]
  --scheme SCHEME       bearer | basic  [default: $AGENCY_AUTH_SCHEME]
  --email EMAIL         Email for login/register
  --username NAME       Username for register
  --password PASS       Password for login/register
  --password2 PASS      Password confirmation for register

FLAGS:
  -h, --help            Print help information
";

struct Args {
    server: Option<String>,
    scheme: Option<AuthScheme>,
    email: Option<String>,
    username: Option<String>,
    password: Option<String>,
    password2: Option<String>,
    command: Vec<String>,
}

/// Reads missing values from stdin
struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn ask(&mut self, label: &str, _secret: bool) -> Result<String> {
        print!("{label}: ");
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        Ok(input.trim().to_string())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is normal
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        server: pargs.opt_value_from_str("--server")?,
        scheme: pargs.opt_value_from_str("--scheme")?,
        email: pargs.opt_value_from_str("--email")?,
        username: pargs.opt_value_from_str("--username")?,
        password: pargs.opt_value_from_str("--password")?,
        password2: pargs.opt_value_from_str("--password2")?,
        command: pargs
            .finish()
            .into_iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect(),
    };

    let mut config = AppConfig::from_env().context("Invalid configuration")?;
    if let Some(server) = &args.server {
        config.api.base_url = server.clone();
        config.api.use_proxy = false;
    }
    if let Some(scheme) = args.scheme {
        config.auth.scheme = scheme;
    }
    config.validate().context("Invalid configuration")?;

    logging::init(config.debug);
    tracing::debug!("{} {}", config.app.name, config.app.version);

    run(args, config).await
}

async fn run(args: Args, config: AppConfig) -> Result<()> {
    let mut app = App::start(config).await?;
    let mut prompt = StdinPrompt;

    if args.command.is_empty() {
        return interactive(&mut app, &mut prompt).await;
    }

    let command = with_options(parse_command(&args.command.join(" "))?, &args);
    if let Flow::Continue(lines) = app.execute(command, &mut prompt).await? {
        print_lines(&lines);
    }
    Ok(())
}

async fn interactive(app: &mut App, prompt: &mut StdinPrompt) -> Result<()> {
    println!("{} {}", app.config().app.name, app.config().app.version);
    println!("Type 'help' for commands.");

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        match app.execute(command, prompt).await? {
            Flow::Continue(lines) => print_lines(&lines),
            Flow::Quit => break,
        }
    }
    Ok(())
}

/// Fill values missing from the command with the `--` options
fn with_options(command: Command, args: &Args) -> Command {
    match command {
        Command::Login { email, password } => Command::Login {
            email: email.or_else(|| args.email.clone()),
            password: password.or_else(|| args.password.clone()),
        },
        Command::Register {
            email,
            username,
            password,
            password2,
        } => Command::Register {
            email: email.or_else(|| args.email.clone()),
            username: username.or_else(|| args.username.clone()),
            password: password.or_else(|| args.password.clone()),
            password2: password2.or_else(|| args.password2.clone()),
        },
        other => other,
    }
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}
