use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;

use passenger_service::infrastructure::config::{Config, LogFormat};
use passenger_service::infrastructure::open_repository;
use passenger_service::{AppError, CreatePassengerDto, Notification, PassengerService};

#[derive(Parser)]
#[command(name = "passenger-service")]
#[command(about = "Passenger records and flight notifications", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Database path (overrides config)
    #[arg(short, long)]
    database: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Store(StoreCommand),
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

/// Commands that need an open repository
#[derive(Subcommand)]
enum StoreCommand {
    /// List every passenger
    List,
    /// Show one passenger
    Get { id: i64 },
    /// List passengers booked on a flight
    Flight { flight_id: i64 },
    /// Create a passenger
    Create {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        flight_id: i64,
    },
    /// Delete one passenger and its notifications
    Delete { id: i64 },
    /// Delete every passenger
    DeleteAll,
    /// Send a notification to every passenger on a flight
    Notify {
        #[arg(long)]
        flight_id: i64,
        #[arg(long)]
        message: String,
    },
    /// List notifications of one passenger
    Notifications { passenger_id: i64 },
    /// List every notification with its passenger's email
    AllNotifications,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config);

    match run(cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(AppError::NotFound(what)) => {
            eprintln!("Not found: {}", what);
            ExitCode::from(2)
        }
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config, AppError> {
    let mut config = if Path::new(&cli.config).exists() {
        let mut config = Config::load(&cli.config)?;
        config.apply_env()?;
        config
    } else {
        Config::load_env()?
    };

    if let Some(ref path) = cli.database {
        config.storage.path = path.into();
    }
    Ok(config)
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(filter);

    match config.logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn run(cli: Cli, config: Config) -> Result<(), AppError> {
    match cli.command {
        Commands::Version => {
            println!("passenger-service v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::InitConfig => {
            std::fs::write(&cli.config, config.to_yaml()?)?;
            println!("Config written to {}", cli.config);
            Ok(())
        }
        Commands::Store(command) => {
            let rt = tokio::runtime::Runtime::new()?;
            let service = PassengerService::new(open_repository(&config.storage)?);
            rt.block_on(dispatch(&service, command))
        }
    }
}

async fn dispatch(service: &PassengerService, command: StoreCommand) -> Result<(), AppError> {
    match command {
        StoreCommand::List => print_json(&service.list_all().await?),
        StoreCommand::Get { id } => match service.get_passenger(id).await? {
            Some(passenger) => print_json(&passenger),
            None => Err(AppError::NotFound(format!("passenger {}", id))),
        },
        StoreCommand::Flight { flight_id } => {
            print_json(&service.get_passengers_for_flight(flight_id).await?)
        }
        StoreCommand::Create {
            first_name,
            last_name,
            email,
            flight_id,
        } => {
            let dto = CreatePassengerDto {
                first_name,
                last_name,
                email,
                flight_id,
            };
            print_json(&service.create_passenger(dto).await?)
        }
        StoreCommand::Delete { id } => {
            if service.delete_passenger(id).await? {
                println!("Deleted passenger {}", id);
                Ok(())
            } else {
                Err(AppError::NotFound(format!("passenger {}", id)))
            }
        }
        StoreCommand::DeleteAll => {
            let count = service.delete_all_passengers().await?;
            println!("Deleted {} passengers", count);
            Ok(())
        }
        StoreCommand::Notify { flight_id, message } => {
            service
                .add_notification_by_flight_id(flight_id, Notification::new(message))
                .await?;
            Ok(())
        }
        StoreCommand::Notifications { passenger_id } => {
            print_json(&service.find_notifications_for_passenger(passenger_id).await?)
        }
        StoreCommand::AllNotifications => {
            print_json(&service.find_notifications_with_email().await?)
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
