use std::{io::Write, path::PathBuf, sync::Arc};

use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand};
use ledger::{
    Auth, EntryForm, LedgerContext, LedgerSession, Projection, RecordStore, SqliteStore,
    Submission, export,
};
use migration::MigratorTrait;
use uuid::Uuid;

mod settings;

#[derive(Parser, Debug)]
#[command(name = "caixa")]
#[command(about = "Daily cash ledger for the studio: record entries, follow today's total")]
struct Cli {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,

    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Operator name signed in for this invocation.
    #[arg(long)]
    operator: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record a new entry.
    Add(AddArgs),
    /// Print the ledger, newest first.
    List,
    /// Print today's total.
    Total,
    /// Delete an entry (asks for confirmation).
    Delete(DeleteArgs),
    /// Write the CSV export.
    Export(ExportArgs),
    /// Stay subscribed and log the ledger as it changes.
    Watch,
}

#[derive(Args, Debug)]
struct AddArgs {
    #[arg(long)]
    client: String,
    #[arg(long)]
    artist: String,
    /// Display amount, e.g. "1.500,00" or "150".
    #[arg(long)]
    value: String,
    #[arg(long)]
    service: Option<String>,
    #[arg(long)]
    payment: Option<String>,
    #[arg(long)]
    obs: Option<String>,
}

#[derive(Args, Debug)]
struct DeleteArgs {
    id: Uuid,
    /// Skip the confirmation prompt.
    #[arg(long)]
    yes: bool,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Output path; defaults to the dated file name in the current
    /// directory.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    let mut settings = settings::load(cli.config.as_deref())?;
    if let Some(database_url) = cli.database_url {
        settings.database_url = database_url;
    }
    if let Some(operator) = cli.operator {
        settings.operator = operator;
    }

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "caixa={level},ledger={level}",
            level = settings.level
        ))
        .init();

    let timezone: Tz = settings
        .timezone
        .parse()
        .map_err(|_| format!("invalid timezone: {}", settings.timezone))?;

    let db = sea_orm::Database::connect(&settings.database_url).await?;
    migration::Migrator::up(&db, None).await?;
    let store: Arc<dyn RecordStore> = Arc::new(SqliteStore::for_tenant(db, &settings.tenant));

    let (auth, auth_watch) = Auth::new();
    if settings.operator.is_empty() {
        auth.sign_in_anonymous();
    } else {
        auth.sign_in(settings.operator.clone());
    }

    let context = LedgerContext::new(store, auth_watch, settings.catalog.clone(), timezone);

    match cli.command {
        Command::Add(args) => {
            let controller = context.controller();
            let mut form = EntryForm::new(context.catalog());
            form.client_name = args.client;
            form.artist = args.artist;
            form.value = args.value;
            if let Some(service) = args.service {
                form.service = service;
            }
            if let Some(payment) = args.payment {
                form.payment_method = payment;
            }
            if let Some(obs) = args.obs {
                form.obs = obs;
            }

            match controller.submit(&mut form).await? {
                Submission::Saved(id) => println!("registrado: {id}"),
                Submission::Rejected => {
                    eprintln!(
                        "entrada incompleta: cliente, artista e valor (conforme o catálogo) são obrigatórios"
                    );
                    std::process::exit(2);
                }
            }
        }
        Command::List => {
            let projection = first_snapshot(&context).await?;
            for tx in &projection.view().transactions {
                let local = tx.created_at.with_timezone(&timezone);
                let obs = tx.obs.as_deref().unwrap_or("");
                println!(
                    "{} {} | {} | {} | {} | {} | {} {}",
                    local.format("%d/%m/%Y %H:%M"),
                    tx.id,
                    tx.client_name,
                    tx.artist,
                    tx.service,
                    tx.payment_method,
                    tx.value,
                    obs
                );
            }
        }
        Command::Total => {
            let projection = first_snapshot(&context).await?;
            println!("Total hoje: {}", projection.view().day_total);
        }
        Command::Delete(args) => {
            let controller = context.controller();
            match controller
                .request_delete(args.id, || args.yes || confirm_on_terminal())
                .await?
            {
                ledger::Deletion::Removed => println!("registro apagado: {}", args.id),
                ledger::Deletion::Declined => println!("operação cancelada"),
            }
        }
        Command::Export(args) => {
            let projection = first_snapshot(&context).await?;
            let view = projection.view();
            if view.transactions.is_empty() {
                eprintln!("não há dados para exportar");
                std::process::exit(1);
            }

            let today = chrono::Utc::now().with_timezone(&timezone).date_naive();
            let path = args
                .out
                .unwrap_or_else(|| PathBuf::from(export::file_name(today)));
            let data = export::to_csv_bytes(&view.transactions, timezone)?;
            std::fs::write(&path, data)?;
            println!("exportado: {}", path.display());
        }
        Command::Watch => {
            let mut session = LedgerSession::new(context);
            session.refresh().await?;
            let Some(projection) = session.projection_mut() else {
                return Err("no active session".into());
            };

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    more = projection.changed() => {
                        if !more {
                            break;
                        }
                        let view = projection.view();
                        tracing::info!(
                            entries = view.transactions.len(),
                            total = %view.day_total,
                            "ledger updated"
                        );
                    }
                }
            }
        }
    }

    Ok(())
}

/// Opens the projection and waits for the initial snapshot.
async fn first_snapshot(
    context: &LedgerContext,
) -> Result<Projection, Box<dyn std::error::Error + Send + Sync>> {
    let mut projection = context.open_projection().await?;
    if !projection.changed().await {
        return Err("store closed the subscription before the first snapshot".into());
    }
    Ok(projection)
}

fn confirm_on_terminal() -> bool {
    eprint!("CONFIRMA A EXCLUSÃO DESTE REGISTRO? [s/N] ");
    let _ = std::io::stderr().flush();

    let mut line = String::new();
    if std::io::stdin().read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim(), "s" | "S" | "sim" | "Sim" | "SIM")
}
