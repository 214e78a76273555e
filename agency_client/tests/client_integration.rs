//! Integration tests for agency_client command execution.
//!
//! Commands run against a wiremock backend with an in-memory session store.

use agency_client::app::{App, Flow, Prompt};
use agency_client::commands::{Command, parse_command};
use agency360::auth::AuthScheme;
use agency360::config::{ApiConfig, AppConfig};
use anyhow::Result;
use serde_json::json;
use std::collections::VecDeque;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Answers prompts from a fixed script and records what was asked
#[derive(Default)]
struct ScriptedPrompt {
    answers: VecDeque<String>,
    asked: Vec<(String, bool)>,
}

impl ScriptedPrompt {
    fn with(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| a.to_string()).collect(),
            asked: Vec::new(),
        }
    }
}

impl Prompt for ScriptedPrompt {
    fn ask(&mut self, label: &str, secret: bool) -> Result<String> {
        self.asked.push((label.to_string(), secret));
        self.answers
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("unexpected prompt for {label}"))
    }
}

/// Helper to start an app against the mock server
async fn start_app(server: &MockServer, scheme: AuthScheme) -> App {
    let mut config = AppConfig::default();
    config.api = ApiConfig::with_base_url(format!("{}/api/v1", server.uri()));
    config.auth.scheme = scheme;
    config.auth.store_path = None;
    App::start(config).await.expect("Failed to start app")
}

async fn run(app: &mut App, line: &str, prompt: &mut ScriptedPrompt) -> Vec<String> {
    let command = parse_command(line).expect("Command should parse");
    match app.execute(command, prompt).await.expect("Command failed") {
        Flow::Continue(lines) => lines,
        Flow::Quit => Vec::new(),
    }
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v1/token/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access": "tok",
            "user": {"id": 1, "email": "ana@agency.com", "username": "ana"},
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_starts_signed_out() {
    let server = MockServer::start().await;
    let mut app = start_app(&server, AuthScheme::Bearer).await;

    let lines = run(&mut app, "status", &mut ScriptedPrompt::default()).await;
    assert_eq!(lines[0], "No autenticado");
    assert!(lines[1].contains("bearer"));
}

#[tokio::test]
async fn test_login_prompts_for_missing_password() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    let mut app = start_app(&server, AuthScheme::Bearer).await;

    let mut prompt = ScriptedPrompt::with(&["secret12+"]);
    let lines = run(&mut app, "login ana@agency.com", &mut prompt).await;

    assert_eq!(prompt.asked, vec![("Password".to_string(), true)]);
    assert_eq!(lines[0], "Sesión iniciada como ana (AN)");
    assert!(lines.contains(&"-> navigate to /".to_string()));
    assert!(app.session().is_authenticated());
}

#[tokio::test]
async fn test_login_failure_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/token/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let mut app = start_app(&server, AuthScheme::Bearer).await;

    let lines = run(
        &mut app,
        "login ana@agency.com wrong123+",
        &mut ScriptedPrompt::default(),
    )
    .await;
    assert_eq!(lines, vec!["Error: Credenciales inválidas".to_string()]);

    let status = run(&mut app, "status", &mut ScriptedPrompt::default()).await;
    assert!(status[0].contains("Credenciales inválidas"));

    // A password that could never have been valid gets hints
    let lines = run(
        &mut app,
        "login ana@agency.com wrong",
        &mut ScriptedPrompt::default(),
    )
    .await;
    assert_eq!(lines[0], "Error: Credenciales inválidas");
    assert_eq!(
        lines[1],
        "  password: At least 8 characters; Must contain letters and numbers; \
         Must contain one of / * - +"
    );
}

#[tokio::test]
async fn test_route_follows_session() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    let mut app = start_app(&server, AuthScheme::Bearer).await;
    let mut prompt = ScriptedPrompt::default();

    let lines = run(&mut app, "route /", &mut prompt).await;
    assert_eq!(lines[0], "/ -> Redirigiendo...");
    assert_eq!(lines[1], "-> redirect to /login");

    let lines = run(&mut app, "route /login", &mut prompt).await;
    assert_eq!(lines, vec!["/login -> /login".to_string()]);

    run(&mut app, "login ana@agency.com secret12+", &mut prompt).await;

    let lines = run(&mut app, "route /campaigns", &mut prompt).await;
    assert_eq!(lines, vec!["/campaigns -> /".to_string()]);

    let lines = run(&mut app, "route /register", &mut prompt).await;
    assert_eq!(lines[1], "-> redirect to /");
}

#[tokio::test]
async fn test_register_validation_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/register/"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;
    let mut app = start_app(&server, AuthScheme::Bearer).await;

    let mut prompt = ScriptedPrompt::with(&["password", "password"]);
    let lines = run(&mut app, "register not-an-email an", &mut prompt).await;

    assert!(lines.iter().any(|l| l.contains("email")));
    assert!(lines.iter().any(|l| l.contains("username")));
    assert_eq!(prompt.asked.len(), 2);
}

#[tokio::test]
async fn test_revoked_session_is_noticed() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/profile/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let mut app = start_app(&server, AuthScheme::Bearer).await;
    let mut prompt = ScriptedPrompt::default();

    run(&mut app, "login ana@agency.com secret12+", &mut prompt).await;
    let lines = run(&mut app, "profile", &mut prompt).await;

    assert_eq!(lines[0], "Error: Credenciales inválidas");
    // The invalidation is applied by a background task
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(!app.session().is_authenticated());

    let lines = run(&mut app, "profile", &mut prompt).await;
    assert_eq!(lines, vec!["No hay sesión activa".to_string()]);
}

#[tokio::test]
async fn test_logout_and_quit() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    let mut app = start_app(&server, AuthScheme::Bearer).await;
    let mut prompt = ScriptedPrompt::default();

    run(&mut app, "login ana@agency.com secret12+", &mut prompt).await;
    let lines = run(&mut app, "logout", &mut prompt).await;
    assert_eq!(lines[0], "Sesión cerrada");
    assert_eq!(lines[1], "-> navigate to /login");

    let flow = app.execute(Command::Quit, &mut prompt).await.unwrap();
    assert_eq!(flow, Flow::Quit);
}
