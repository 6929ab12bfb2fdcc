use anyhow::Context;
use chrono::Duration;
use clap::Parser;
use secrecy::SecretString;
use shophub_api::identity::LocalClaims;

/// Mint an HS256 token accepted when the API runs with `JWT_SECRET`.
#[derive(Parser, Debug)]
#[command(name = "issue_token", about = "Mint a development bearer token")]
struct Cli {
    /// Subject (user id) carried in `sub`
    subject: String,

    /// Grant the `admin` role in addition to `user`
    #[arg(long)]
    admin: bool,

    /// Preferred username claim
    #[arg(long)]
    username: Option<String>,

    /// Lifetime of the token in hours
    #[arg(long, default_value_t = 24, value_parser = clap::value_parser!(i64).range(1..=24 * 365))]
    hours: i64,
}

impl Cli {
    fn roles(&self) -> Vec<String> {
        let mut roles = vec!["user".to_string()];
        if self.admin {
            roles.push("admin".to_string());
        }
        roles
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let secret = std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?;

    let mut claims = LocalClaims::new(cli.subject.clone(), cli.roles(), Duration::hours(cli.hours));
    if let Some(username) = cli.username {
        claims = claims.with_username(username);
    }
    let token = claims.encode(&SecretString::from(secret))?;
    println!("{token}");
    Ok(())
}
