use clap::{Parser, Subcommand};
use sea_orm_migration::MigratorTrait;
use shophub_api::{
    config::database_url_from_env,
    db::{create_orm_conn, run_migrations},
    migration::Migrator,
};

#[derive(Parser, Debug)]
#[command(name = "migrate", about = "Apply or roll back schema migrations")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Apply every pending migration (default)
    Up,
    /// Roll back the latest migrations
    Down {
        /// Number of migrations to roll back
        #[arg(short, long, default_value_t = 1)]
        steps: u32,
    },
    /// List applied and pending migrations
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let orm = create_orm_conn(&database_url_from_env()?).await?;

    match cli.command.unwrap_or(Command::Up) {
        Command::Up => {
            run_migrations(&orm).await?;
            println!("Migrations applied");
        }
        Command::Down { steps } => {
            Migrator::down(&orm, Some(steps)).await?;
            println!("Rolled back {steps} migration(s)");
        }
        Command::Status => Migrator::status(&orm).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_up_and_parses_down_steps() {
        assert_eq!(Cli::try_parse_from(["migrate"]).unwrap().command, None);
        assert_eq!(
            Cli::try_parse_from(["migrate", "down"]).unwrap().command,
            Some(Command::Down { steps: 1 })
        );
        assert_eq!(
            Cli::try_parse_from(["migrate", "down", "--steps", "3"]).unwrap().command,
            Some(Command::Down { steps: 3 })
        );
        assert!(Cli::try_parse_from(["migrate", "sideways"]).is_err());
    }
}
