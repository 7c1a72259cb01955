//! CLI definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for list/query commands.
#[derive(ValueEnum, Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table (default)
    #[default]
    Table,
    /// JSON (same as --json)
    Json,
    /// Comma-separated values
    Csv,
}

pub mod commands;

/// formsync - form submissions with a Google Sheets mirror
#[derive(Parser, Debug)]
#[command(name = "formsync", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (default: ~/.formsync/data/forms.db)
    #[arg(long, global = true, env = "FORMSYNC_DB")]
    pub db: Option<PathBuf>,

    /// Actor name for audit trail
    #[arg(long, global = true, env = "FORMSYNC_ACTOR")]
    pub actor: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Output format (table, json, csv)
    #[arg(long, value_enum, global = true, default_value_t)]
    pub format: OutputFormat,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the forms database
    Init {
        /// Overwrite existing database
        #[arg(long)]
        force: bool,
    },

    /// Run the HTTP API
    Serve {
        /// Address to bind
        #[arg(long, env = "FORMSYNC_HOST", default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(long, env = "FORMSYNC_PORT", default_value_t = 8000)]
        port: u16,
    },

    /// Form management
    Form {
        /// Skip the sheet sync after a mutation
        #[arg(long, global = true)]
        no_sync: bool,

        #[command(subcommand)]
        command: FormCommands,
    },

    /// Google Sheets mirror
    Sync {
        #[command(subcommand)]
        command: SyncCommands,
    },
}

// ============================================================================
// Form Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum FormCommands {
    /// Store a new form
    Create {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        /// Phone number (9-15 digits, optional leading +)
        #[arg(long = "phone")]
        phone_number: String,

        #[arg(long)]
        company: String,

        #[arg(long)]
        service: String,

        #[arg(short, long)]
        message: Option<String>,
    },

    /// List stored forms
    List {
        /// Number of forms to skip
        #[arg(long, default_value_t = 0)]
        skip: u32,

        /// Maximum forms to return
        #[arg(short, long, default_value_t = 10)]
        limit: u32,

        /// Ignore skip/limit and list everything
        #[arg(long)]
        all: bool,
    },

    /// Show one form
    Show {
        /// Form ID
        id: i64,
    },

    /// Update fields of a form
    Update {
        /// Form ID
        id: i64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long = "phone")]
        phone_number: Option<String>,

        #[arg(long)]
        company: Option<String>,

        #[arg(long)]
        service: Option<String>,

        #[arg(short, long, conflicts_with = "clear_message")]
        message: Option<String>,

        /// Remove the message
        #[arg(long)]
        clear_message: bool,
    },

    /// Delete a form
    Delete {
        /// Form ID
        id: i64,
    },

    /// Show the audit trail of a form
    History {
        /// Form ID
        id: i64,

        /// Maximum events to show
        #[arg(short, long, default_value_t = 20)]
        limit: u32,
    },
}

// ============================================================================
// Sync Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum SyncCommands {
    /// Publish the current forms to the sheet now
    Push {
        /// Publish a JSON array of form objects instead of the database
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Print the grid that would be published
    Preview {
        /// Render a JSON array of form objects instead of the database
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Show the resolved sheet configuration
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_form_create() {
        let cli = Cli::try_parse_from([
            "formsync", "form", "create", "--name", "A", "--email", "a@x.com", "--phone",
            "123456789", "--company", "C", "--service", "S", "--no-sync",
        ])
        .unwrap();

        match cli.command {
            Commands::Form {
                no_sync,
                command: FormCommands::Create { phone_number, message, .. },
            } => {
                assert!(no_sync);
                assert_eq!(phone_number, "123456789");
                assert_eq!(message, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_message_and_clear_conflict() {
        let result = Cli::try_parse_from([
            "formsync", "form", "update", "1", "--message", "x", "--clear-message",
        ]);
        assert!(result.is_err());
    }
}
