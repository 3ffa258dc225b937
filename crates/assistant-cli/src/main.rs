use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use assistant_core::store::ClientState;
use assistant_infrastructure::TomlStateStore;

mod repl;

#[derive(Parser)]
#[command(name = "edms-assistant")]
#[command(about = "EDMS Assistant - conversational client for the EDMS agent backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Pin a document context for the session
        #[arg(long)]
        document: Option<String>,
    },
    /// Store the identity fields used to authenticate against the backend
    Login {
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        token: String,
    },
    /// Remove the stored identity fields and the thread id
    Logout,
    /// Drop the persisted thread id; the next chat starts a fresh conversation
    Reset,
}

fn client_state() -> Result<ClientState> {
    let store = Arc::new(TomlStateStore::new_default()?);
    Ok(ClientState::new(store))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Chat { document } => repl::run_chat(document).await?,
        Commands::Login { user_id, token } => {
            let state = client_state()?;
            state.set_user_id(&user_id).await?;
            state.set_service_token(&token).await?;
            println!("Идентификация сохранена.");
        }
        Commands::Logout => {
            let state = client_state()?;
            state.clear().await?;
            println!("Идентификация удалена.");
        }
        Commands::Reset => {
            let state = client_state()?;
            state.set_thread_id(None).await?;
            println!("Диалог сброшен.");
        }
    }

    Ok(())
}
