//! To-do list API server binary.
//!
//! This binary creates the concrete database implementation and passes it
//! to the API server. The API layer remains agnostic of the storage backend.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::Parser;
use miette::Diagnostic;
use thiserror::Error;
use todolist::api::{self, ApiError, AppState, Config};
use todolist::db::{Database, DbError, SqliteDatabase};
use todolist::service::ServiceError;
use tracing::info;

#[derive(Error, Diagnostic, Debug)]
enum BinaryError {
    #[error("Database error: {0}")]
    #[diagnostic(code(todolist::binary::database))]
    Database(#[from] DbError),

    #[error("Failed to create data directory: {0}")]
    #[diagnostic(code(todolist::binary::io))]
    Io(#[from] std::io::Error),

    #[error("API server error: {0}")]
    #[diagnostic(code(todolist::binary::api))]
    Api(#[from] ApiError),

    #[error("Failed to promote admin: {0}")]
    #[diagnostic(
        code(todolist::binary::admin),
        help("The account must be registered before it can be promoted")
    )]
    Service(#[from] ServiceError),
}

#[derive(Parser)]
#[command(name = "todolist-api")]
#[command(author, version, about = "Shared to-do list API server", long_about = None)]
struct Cli {
    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to listen on
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Database file path
    #[arg(long, default_value = "./todolist.db")]
    db: PathBuf,

    /// Grant the Admin role to this registered account before serving
    #[arg(long)]
    admin_email: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), BinaryError> {
    let cli = Cli::parse();
    api::init_tracing();

    info!("Opening database at {:?}", cli.db);

    if let Some(parent) = cli.db.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let db = SqliteDatabase::open(&cli.db).await?;
    db.migrate().await?;
    info!("Database migrations complete");

    let state = AppState::new(db);

    if let Some(email) = cli.admin_email.as_deref() {
        let admin = state.users().promote_admin(email).await?;
        info!("Admin account: {} <{}>", admin.username, admin.email);
    }

    api::run(
        Config {
            host: cli.host,
            port: cli.port,
        },
        state,
    )
    .await?;

    Ok(())
}
