use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskmaster::api::{self, AppState};
use taskmaster::config::{Config, Rules};
use taskmaster::db::Database;
use taskmaster::extract::Extractor;
use taskmaster::llm;
use taskmaster::models::{Task, TaskFilter};
use taskmaster::scoring::UrgencyScorer;
use taskmaster::store::{self, JsonStore};

#[derive(Parser)]
#[command(name = "taskmaster")]
#[command(about = "Turn meeting notes into a ranked task list")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
    /// Extract action items from a notes file ("-" reads stdin)
    Extract {
        file: PathBuf,

        /// Store the extracted tasks
        #[arg(long)]
        save: bool,
    },
    /// List stored tasks
    List {
        /// Sort open tasks by urgency score
        #[arg(long)]
        ranked: bool,

        /// Include archived tasks
        #[arg(long)]
        all: bool,
    },
    /// Import tasks from a JSON task file
    ImportJson { path: PathBuf },
    /// Export all tasks to a JSON task file
    ExportJson { path: PathBuf },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "taskmaster=debug,tower_http=debug".into()),
    );

    // stdout carries command output, so logs go to stderr
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_database(config: &Config) -> anyhow::Result<Database> {
    let db = match &config.db_path {
        Some(path) => Database::open(path.clone())?,
        None => Database::open_default()?,
    };
    db.migrate()?;
    Ok(db)
}

fn read_notes(file: &Path) -> anyhow::Result<String> {
    if file == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))
}

fn print_task(task: &Task) {
    let due = task
        .due_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "#{:<4} [{:<8}] {:<11} {:<10} {}",
        task.id,
        task.priority.as_str(),
        task.status.as_str(),
        due,
        task.title
    );
}

async fn serve(state: AppState, port: u16) -> anyhow::Result<()> {
    tracing::info!("Starting taskmaster server on port {}", port);

    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("taskmaster server listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = Config::from_env();
    let rules = Rules::load_or_default(&config.rules_path);
    let extractor = Extractor::new(llm::client_from_config(&config), rules);
    let db = open_database(&config)?;
    let today = chrono::Local::now().date_naive();

    match cli.command.unwrap_or(Commands::Serve { port: 3000 }) {
        Commands::Serve { port } => {
            serve(AppState::new(db, extractor), port).await?;
        }
        Commands::Extract { file, save } => {
            let text = read_notes(&file)?;
            let extraction = extractor.extract(&text, today).await;

            if save {
                let created = db.create_tasks(&extraction.tasks, true)?;
                for task in &created {
                    print_task(task);
                }
                println!("Saved {} tasks", created.len());
            } else {
                println!("{}", serde_json::to_string_pretty(&extraction)?);
            }
        }
        Commands::List { ranked, all } => {
            let tasks = db.list_tasks(&TaskFilter {
                status: None,
                include_archived: all,
            })?;

            if ranked {
                let scorer = UrgencyScorer::from_rules(extractor.normalizer().rules());
                for entry in scorer.rank_open(tasks, today) {
                    print!("{:.3} ", entry.urgency_score);
                    print_task(&entry.task);
                }
            } else {
                for task in &tasks {
                    print_task(task);
                }
            }
        }
        Commands::ImportJson { path } => {
            let report = store::import_json(&JsonStore::new(path), &db, extractor.normalizer())?;
            println!(
                "Imported {} tasks ({} skipped)",
                report.imported, report.skipped
            );
        }
        Commands::ExportJson { path } => {
            let count = store::export_json(&db, &JsonStore::new(path))?;
            println!("Exported {} tasks", count);
        }
    }

    Ok(())
}
