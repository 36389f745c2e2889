use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use recipe_server::config::Config;
use recipe_server::{accounts, api, db, telemetry, AppState};

#[derive(Parser)]
#[command(name = "recipe-server")]
#[command(about = "Recipe API server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,
    /// Print the OpenAPI document as JSON and exit
    Openapi,
    /// Wait until the database accepts connections, retrying once per second
    WaitForDb {
        /// Give up after this many attempts
        #[arg(long, default_value_t = 60)]
        attempts: u32,
    },
    /// Create a user with staff and superuser rights
    CreateSuperuser {
        #[arg(long, env = "SUPERUSER_EMAIL")]
        email: String,
        #[arg(long, env = "SUPERUSER_PASSWORD")]
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Openapi => {
            let spec = api::openapi()
                .to_pretty_json()
                .context("Failed to serialize OpenAPI document")?;
            println!("{}", spec);
        }
        Commands::Serve => {
            let config = Config::from_env()?;
            telemetry::init_telemetry()?;
            serve(config).await?;
        }
        Commands::WaitForDb { attempts } => {
            let config = Config::from_env()?;
            telemetry::init_telemetry()?;
            tracing::info!("Waiting for database...");
            db::wait_for_db(&config.database_url, attempts)
                .context("Database unavailable")?;
            tracing::info!("Database available!");
        }
        Commands::CreateSuperuser { email, password } => {
            let config = Config::from_env()?;
            telemetry::init_telemetry()?;
            let pool = db::create_pool(&config.database_url)?;
            let mut conn = pool.get()?;
            let user = accounts::create_superuser(&mut conn, &email, &password)
                .context("Failed to create superuser")?;
            println!("Superuser {} created", user.email);
        }
    }

    Ok(())
}

async fn serve(config: Config) -> Result<()> {
    let pool = db::create_pool(&config.database_url)?;
    let bind_addr = config.bind_addr;
    let app = recipe_server::app(AppState::new(config, pool));

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    let local_addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", local_addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", local_addr);
    tracing::info!("OpenAPI spec available at http://{}/api-docs/openapi.json", local_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
