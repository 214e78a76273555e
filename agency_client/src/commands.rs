use std::fmt;

/// A client command, from the command line or the interactive prompt.
///
/// Values left out are prompted for before the command runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login {
        email: Option<String>,
        password: Option<String>,
    },
    Register {
        email: Option<String>,
        username: Option<String>,
        password: Option<String>,
        password2: Option<String>,
    },
    Profile,
    Logout,
    Status,
    /// Check which view a path resolves to for the current session
    Route(String),
    Help,
    Quit,
}

/// Errors that can occur during command parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Route command missing its path.
    RouteMissingPath,
    /// Too many arguments for a command.
    UnexpectedArgument { command: &'static str, argument: String },
    /// Unrecognized command.
    UnrecognizedCommand(String),
    /// Nothing was entered.
    Empty,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RouteMissingPath => write!(f, "Route requires a path (e.g., 'route /login')"),
            Self::UnexpectedArgument { command, argument } => write!(
                f,
                "Unexpected argument '{}' for '{}'. Type 'help' to see usage",
                argument, command
            ),
            Self::UnrecognizedCommand(cmd) => write!(
                f,
                "Unrecognized command '{}'. Type 'help' to see available commands",
                cmd
            ),
            Self::Empty => write!(f, "No command given"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Help text for the interactive prompt.
pub const HELP: &str = "\
Commands:
  login [EMAIL] [PASSWORD]                    Sign in
  register [EMAIL] [USERNAME] [PASSWORD] [PASSWORD2]
                                              Create an account
  profile                                     Fetch the signed-in user's profile
  logout                                      Sign out and forget stored credentials
  status                                      Show the session state
  route PATH                                  Show what PATH renders for this session
  help                                        Show this message
  quit                                        Exit
";

/// Parse a command line.
///
/// # Arguments
///
/// * `input` - The raw command string from user input
///
/// # Returns
///
/// * `Ok(Command)` - Successfully parsed command
/// * `Err(ParseError)` - Parse error with descriptive message
///
/// # Examples
///
/// ```
/// use agency_client::commands::{Command, parse_command};
///
/// assert_eq!(parse_command("status"), Ok(Command::Status));
/// assert_eq!(parse_command("route /login"), Ok(Command::Route("/login".to_string())));
/// assert!(matches!(parse_command("login a@b.com"), Ok(Command::Login { password: None, .. })));
/// ```
pub fn parse_command(input: &str) -> Result<Command, ParseError> {
    let parts: Vec<&str> = input.split_ascii_whitespace().collect();
    let Some((&name, args)) = parts.split_first() else {
        return Err(ParseError::Empty);
    };

    match name {
        "login" => {
            let [email, password] = optional_args::<2>("login", args)?;
            Ok(Command::Login { email, password })
        }
        "register" => {
            let [email, username, password, password2] = optional_args::<4>("register", args)?;
            Ok(Command::Register {
                email,
                username,
                password,
                password2,
            })
        }
        "route" => match args {
            [path] => Ok(Command::Route(path.to_string())),
            [] => Err(ParseError::RouteMissingPath),
            [_, extra, ..] => Err(ParseError::UnexpectedArgument {
                command: "route",
                argument: extra.to_string(),
            }),
        },
        "profile" => no_args("profile", args, Command::Profile),
        "logout" => no_args("logout", args, Command::Logout),
        "status" => no_args("status", args, Command::Status),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        _ => Err(ParseError::UnrecognizedCommand(name.to_string())),
    }
}

/// Up to `N` positional arguments, `None` for the missing ones
fn optional_args<const N: usize>(
    command: &'static str,
    args: &[&str],
) -> Result<[Option<String>; N], ParseError> {
    if let Some(extra) = args.get(N) {
        return Err(ParseError::UnexpectedArgument {
            command,
            argument: extra.to_string(),
        });
    }
    Ok(std::array::from_fn(|i| args.get(i).map(|s| s.to_string())))
}

fn no_args(command: &'static str, args: &[&str], parsed: Command) -> Result<Command, ParseError> {
    match args.first() {
        Some(extra) => Err(ParseError::UnexpectedArgument {
            command,
            argument: extra.to_string(),
        }),
        None => Ok(parsed),
    }
}
