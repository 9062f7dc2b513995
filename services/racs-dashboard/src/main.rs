//! racs-tail CLI
//!
//! Command-line client for the RACS build service: list projects and tasks,
//! start builds, create projects, upload files and follow task logs.

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;

    use clap::{Parser, Subcommand};
    use racs_dashboard::api::{ApiClient, LogSource};
    use racs_dashboard::model::{ProjectForm, Stage};
    use racs_dashboard::session::follow_log;
    use racs_dashboard::{connect, load_config, Config};
    use tokio_util::sync::CancellationToken;
    use tracing::Level;

    #[derive(Parser)]
    #[command(name = "racs-tail")]
    #[command(about = "Client for the RACS build service")]
    #[command(version)]
    struct Args {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Server base URL (overrides config file)
        #[arg(long)]
        server: Option<String>,

        /// Log level
        #[arg(short, long, default_value = "warn")]
        log_level: Level,

        #[command(subcommand)]
        command: Command,
    }

    #[derive(Subcommand)]
    enum Command {
        /// List projects with their state and latest version
        Projects,
        /// List recent tasks, newest first
        Tasks {
            /// Number of tasks to skip
            #[arg(long, default_value_t = 0)]
            from: u64,
        },
        /// Start a build of a project at the given stage
        Build { id: u64, stage: Stage },
        /// Create a project
        Create {
            #[arg(long)]
            name: String,
            #[arg(long)]
            url: String,
            #[arg(long)]
            branch: String,
            #[arg(long, default_value = "")]
            labels: String,
        },
        /// Upload a file into a project's workspace
        Upload {
            id: u64,
            file: PathBuf,
            /// Name to store the file under (defaults to the file name)
            #[arg(long)]
            name: Option<String>,
        },
        /// Follow the log of a task
        Tail {
            task: String,
            /// Poll interval (overrides config file)
            #[arg(long)]
            interval_ms: Option<u64>,
            /// Exit once the task reaches a final state
            #[arg(long)]
            exit_on_finish: bool,
        },
    }

    pub async fn main() -> Result<(), Box<dyn std::error::Error>> {
        let args = Args::parse();

        tracing_subscriber::fmt()
            .with_max_level(args.log_level)
            .with_writer(std::io::stderr)
            .init();

        tracing::debug!(
            "Parsed command line arguments: config={:?}, server={:?}, log_level={:?}",
            args.config,
            args.server,
            args.log_level
        );

        let mut config = if let Some(config_path) = &args.config {
            tracing::debug!("Loading configuration from {:?}", config_path);
            load_config(config_path)?
        } else {
            tracing::debug!("Using default configuration");
            Config::default()
        };

        if let Some(server) = args.server {
            config.server.base_url = server;
        }

        let api = Arc::new(connect(&config)?);
        run(args.command, api, &config).await?;
        Ok(())
    }

    async fn run(
        command: Command,
        api: Arc<ApiClient>,
        config: &Config,
    ) -> racs_dashboard::Result<()> {
        match command {
            Command::Projects => {
                for project in api.list_projects().await? {
                    println!(
                        "{}\t{}\t{}\t{}\t{}",
                        project.id, project.name, project.state, project.version, project.branch
                    );
                }
            }
            Command::Tasks { from } => {
                for task in api.list_tasks(from).await? {
                    println!(
                        "{}\t{}\t{}\t{}\t{}",
                        task.id, task.project, task.kind, task.state, task.time
                    );
                }
            }
            Command::Build { id, stage } => {
                api.trigger_build(id, stage).await?;
                println!("Started {} of project {}", stage, id);
            }
            Command::Create {
                name,
                url,
                branch,
                labels,
            } => {
                let form = ProjectForm {
                    name,
                    url,
                    branch,
                    labels,
                };
                match api.create_project(&form).await? {
                    Some(id) => println!("Created project {} ({})", form.name, id),
                    None => println!("Created project {}", form.name),
                }
            }
            Command::Upload { id, file, name } => {
                let file_name = file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let name = name.unwrap_or_else(|| file_name.clone());
                let bytes = racs_dashboard::app::read_upload(&file).await?;
                api.upload(id, &name, &file_name, bytes).await?;
                println!("Uploaded {} to project {}", name, id);
            }
            Command::Tail {
                task,
                interval_ms,
                exit_on_finish,
            } => {
                let interval = interval_ms
                    .filter(|ms| *ms > 0)
                    .map(Duration::from_millis)
                    .unwrap_or_else(|| config.polling.log_interval());

                let cancel = CancellationToken::new();
                let on_signal = cancel.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        tracing::debug!("Interrupted");
                        on_signal.cancel();
                    }
                });

                let source: Arc<dyn LogSource> = api;
                let mut stdout = std::io::stdout();
                follow_log(source, &task, interval, exit_on_finish, &mut stdout, cancel).await?;
            }
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    cli::main().await
}

#[cfg(target_arch = "wasm32")]
fn main() {}
