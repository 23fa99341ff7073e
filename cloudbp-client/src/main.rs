//! `cloudbp` - command-line front end for the CloudBP auth client.

use std::env;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cloudbp_client::{
    AuthApi, AuthClient, Config, FileStore, HttpTransport, KeyValueStore, Session,
};
use cloudbp_common::{RegisterRequest, User};

const VERSION: &str = env!("CARGO_PKG_VERSION");

const USAGE: &str = "\
usage: cloudbp <command> [args]

commands:
  login <username> <password>
  register <username> <email> <password> <confirm-password>
  logout
  refresh
  whoami
  status

Configuration is read from cloudbp.toml and CLOUDBP__SECTION__KEY variables.";

fn print_version() {
    println!("cloudbp {}", VERSION);
}

fn print_user(user: &User) {
    println!("{} <{}> (id {}, role {})", user.username, user.email, user.id, user.role);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|a| a == "--version" || a == "-V") {
        print_version();
        return Ok(());
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load().map_err(|e| {
        format!(
            "Failed to load configuration: {}. \
             Check cloudbp.toml or the CLOUDBP__* environment variables.",
            e
        )
    })?;
    tracing::debug!("Using API at {}", config.api.base_url);

    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(&config.storage.path));
    let transport = HttpTransport::new(&config.api)?;
    let session = Session::load(store)?;
    let mut client = AuthClient::new(AuthApi::new(Arc::new(transport)), session);

    let command: Vec<&str> = args.iter().map(String::as_str).collect();
    match command.as_slice() {
        ["login", username, password] => {
            let user = client.login(username, password).await?;
            print_user(user);
        }
        ["register", username, email, password, confirm] => {
            let request = RegisterRequest {
                username: username.to_string(),
                email: email.to_string(),
                password: password.to_string(),
                confirm_password: confirm.to_string(),
            };
            let user = client.register(&request).await?;
            print_user(user);
        }
        ["logout"] => {
            client.logout().await?;
            println!("Logged out");
        }
        ["refresh"] => {
            if client.refresh().await? {
                println!("Token refreshed");
            } else {
                println!("Server did not issue a new token");
            }
        }
        ["whoami"] => {
            let user = client.fetch_profile().await?;
            print_user(user);
        }
        ["status"] => {
            let session = client.session();
            if session.is_authenticated() {
                println!("Authenticated (profile not fetched; run `cloudbp whoami`)");
            } else {
                println!("Not logged in");
            }
        }
        [] | ["help"] | ["--help"] | ["-h"] => {
            println!("{}", USAGE);
        }
        _ => {
            eprintln!("{}", USAGE);
            return Err(format!("unrecognized command: {}", args.join(" ")).into());
        }
    }

    Ok(())
}
