use clap::{Parser, Subcommand};
use nb_events::bus::EventBus;
use nb_serve::middleware::auth::AuthVerifier;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "nb", about = "Neighborly community-assistance server")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server.
    Serve,
    /// Print the OpenAPI document and exit.
    Openapi,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve => {
            nb_serve::openapi::ensure_initialized();
            let auth = match auth_verifier_from_env() {
                Ok(auth) => auth,
                Err(message) => {
                    eprintln!("auth config error: {message}");
                    std::process::exit(1);
                }
            };
            let db_path = std::env::var("NEIGHBORLY_DB_PATH")
                .unwrap_or_else(|_| ".neighborly/neighborly.db".to_string());
            if let Some(parent) = Path::new(&db_path).parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let port = std::env::var("NEIGHBORLY_PORT")
                .ok()
                .and_then(|value| value.parse::<u16>().ok())
                .unwrap_or(8080);
            let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port);
            let state = nb_serve::AppState {
                db_path,
                event_bus: EventBus::new(1024),
                auth: Arc::new(auth),
            };
            if let Err(err) = nb_serve::serve(state, addr).await {
                eprintln!("serve error: {err}");
            }
        }
        Command::Openapi => {
            println!("{}", nb_serve::openapi::generate_spec());
        }
    }
}

/// Build the token verifier from the environment. RS256 against the
/// provider's public key is the normal configuration; an HS256 shared
/// secret is accepted for local development.
fn auth_verifier_from_env() -> Result<AuthVerifier, String> {
    let issuer = std::env::var("NEIGHBORLY_AUTH_ISSUER")
        .map_err(|_| "NEIGHBORLY_AUTH_ISSUER is not set".to_string())?;
    let audience = std::env::var("NEIGHBORLY_AUTH_AUDIENCE")
        .map_err(|_| "NEIGHBORLY_AUTH_AUDIENCE is not set".to_string())?;

    if let Ok(path) = std::env::var("NEIGHBORLY_AUTH_PUBLIC_KEY_PATH") {
        let pem = std::fs::read(&path).map_err(|err| format!("cannot read {path}: {err}"))?;
        return AuthVerifier::rs256(&pem, &issuer, &audience)
            .map_err(|err| format!("invalid public key: {err}"));
    }
    if let Ok(secret) = std::env::var("NEIGHBORLY_AUTH_HS256_SECRET") {
        return Ok(AuthVerifier::hs256(secret.as_bytes(), &issuer, &audience));
    }
    Err("set NEIGHBORLY_AUTH_PUBLIC_KEY_PATH or NEIGHBORLY_AUTH_HS256_SECRET".to_string())
}
