// CLI module for administrative operations requiring server access

pub mod bootstrap;
pub mod migrate;

use clap::{Parser, Subcommand};

use crate::app_data::AppData;

/// Health tracking backend
#[derive(Parser, Debug)]
#[command(name = "healthtrack")]
#[command(about = "Health tracking backend server and administration CLI", long_about = None)]
pub struct Cli {
    /// Defaults to `serve`
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Run migrations and start the HTTP server
    Serve,

    /// Run pending database migrations and exit
    Migrate,

    /// Create the first SUPER_ADMIN account and the default thresholds
    Bootstrap {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,
    },
}

/// Execute an administrative CLI command
///
/// `Serve` and `Migrate` are handled by main before AppData exists.
pub async fn execute_command(command: Commands, app_data: &AppData) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Bootstrap { username, email } => {
            bootstrap::bootstrap_system(app_data, &username, &email).await?;
        }
        Commands::Serve | Commands::Migrate => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["healthtrack"]).unwrap();
        assert_eq!(cli.command, None);
    }

    #[test]
    fn test_bootstrap_requires_username_and_email() {
        assert!(Cli::try_parse_from(["healthtrack", "bootstrap", "--username", "root"]).is_err());

        let cli = Cli::try_parse_from([
            "healthtrack",
            "bootstrap",
            "--username",
            "root",
            "--email",
            "root@example.com",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Bootstrap {
                username: "root".to_string(),
                email: "root@example.com".to_string(),
            })
        );
    }
}
