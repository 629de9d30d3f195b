use std::{
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};
use log::{error, info, warn};
use serde::Serialize;

use karttimer::{
    AppConfig, Database, DriverProfileStore, DriverProfiles, KartTimer, KartTimerError,
    MultipleSessionStore, Precision, SessionStore, StorageWorker, WeatherCondition,
    history,
    live::{multi::record_multiple_session, single::record_session},
    storage::DriverRemoval,
    timing::SLOT_COUNT,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    /// Config file to use instead of the one in the user config directory
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print history and driver listings as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Lap time precision, overrides the configured one
    #[arg(long, global = true, value_enum)]
    precision: Option<Precision>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage driver profiles
    Drivers {
        #[command(subcommand)]
        command: DriverCommands,
    },
    /// Browse single-driver session history
    Sessions {
        #[command(subcommand)]
        command: SessionCommands,
    },
    /// Browse multi-kart session history
    Multi {
        #[command(subcommand)]
        command: MultiCommands,
    },
    /// Time one driver from the terminal
    Record {
        #[arg(short, long)]
        name: String,

        /// Driver name or id
        #[arg(short, long)]
        driver: String,

        #[arg(short, long, value_enum, default_value_t = WeatherCondition::Dry)]
        weather: WeatherCondition,
    },
    /// Time up to four karts at once from the terminal
    RecordMulti {
        #[arg(short, long)]
        name: Option<String>,

        /// Slot label as NAME or NAME:KART, in slot order
        #[arg(short, long = "kart", value_parser = parse_slot)]
        karts: Vec<(String, String)>,
    },
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum DriverCommands {
    List,
    Add {
        name: String,
        kart: String,
    },
    Update {
        /// Driver name or id
        driver: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        kart: Option<String>,
    },
    Delete {
        /// Driver name or id
        driver: String,
    },
}

#[derive(Subcommand, Debug)]
enum SessionCommands {
    List,
    Show { id: i64 },
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
enum MultiCommands {
    List,
    Show {
        id: i64,
    },
    Delete {
        id: i64,
    },
    DeleteDriver {
        session_id: i64,
        driver_id: i64,
    },
    /// Delete every multi-kart session
    Clear {
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    Show,
    /// Write the current settings to the config file
    Init {
        #[arg(long)]
        force: bool,
    },
}

fn parse_slot(value: &str) -> Result<(String, String), String> {
    let (name, kart) = value.split_once(':').unwrap_or((value, ""));
    if name.trim().is_empty() {
        return Err("kart label needs a name".to_string());
    }
    Ok((name.trim().to_string(), kart.trim().to_string()))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), KartTimerError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| KartTimerError::OutputSerializeError { source: e })?;
    println!("{}", json);
    Ok(())
}

fn open_database(config: &AppConfig) -> Result<Database, KartTimerError> {
    Ok(Database::open(&config.database_path()?)?.with_session_list_limit(config.session_list_limit))
}

fn open_profiles(config: &AppConfig) -> Result<DriverProfiles, KartTimerError> {
    DriverProfiles::open(config.profiles_path()?)
}

fn resolve_driver(profiles: &DriverProfiles, query: &str) -> Result<uuid::Uuid, KartTimerError> {
    profiles
        .find(query)
        .map(|d| d.id)
        .ok_or_else(|| KartTimerError::DriverNotFound {
            id: query.to_string(),
        })
}

fn drivers(config: &AppConfig, command: &DriverCommands, json: bool) -> Result<(), KartTimerError> {
    let mut profiles = open_profiles(config)?;
    match command {
        DriverCommands::List if json => print_json(&profiles.list_drivers())?,
        DriverCommands::List => {
            for driver in profiles.list_drivers() {
                println!("{}  {:<20} kart {}", driver.id, driver.name, driver.kart_number);
            }
        }
        DriverCommands::Add { name, kart } => match profiles.add_driver(name, kart)? {
            Some(driver) => println!("Added {} ({})", driver.name, driver.id),
            None => warn!("Driver not added, delete a profile first"),
        },
        DriverCommands::Update { driver, name, kart } => {
            let id = resolve_driver(&profiles, driver)?;
            let (current_name, current_kart) = profiles
                .get(id)
                .map(|d| (d.name.clone(), d.kart_number.clone()))
                .unwrap_or_default();
            let updated = profiles.update_driver(
                id,
                name.as_deref().unwrap_or(&current_name),
                kart.as_deref().unwrap_or(&current_kart),
            )?;
            println!("Updated {} kart {}", updated.name, updated.kart_number);
        }
        DriverCommands::Delete { driver } => {
            let id = resolve_driver(&profiles, driver)?;
            profiles.delete_driver(id)?;
            println!("Deleted driver {}", id);
        }
    }
    Ok(())
}

fn sessions(
    config: &AppConfig,
    command: &SessionCommands,
    json: bool,
    precision: Precision,
) -> Result<(), KartTimerError> {
    match command {
        SessionCommands::List => {
            let worker = StorageWorker::spawn(open_database(config)?);
            let sessions = worker.run(|db| db.list_sessions())??;
            if json {
                print_json(&sessions)?;
            } else if sessions.is_empty() {
                println!("No sessions recorded yet");
            } else {
                for session in &sessions {
                    println!("{}", history::session_summary(session, precision));
                }
            }
        }
        SessionCommands::Show { id } => {
            let id = *id;
            let worker = StorageWorker::spawn(open_database(config)?);
            match worker.run(move |db| db.get_session(id))?? {
                Some(session) if json => print_json(&session)?,
                Some(session) => print!("{}", history::session_detail(&session, precision)),
                None => warn!("No session with id {}", id),
            }
        }
        SessionCommands::Delete { id } => {
            if open_database(config)?.delete_session(*id)? {
                println!("Deleted session {}", id);
            } else {
                warn!("No session with id {}", id);
            }
        }
    }
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool, KartTimerError> {
    print!("{} [y/N] ", prompt);
    io::stdout()
        .flush()
        .map_err(|e| KartTimerError::InputError { source: e })?;
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .map_err(|e| KartTimerError::InputError { source: e })?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn multi(
    config: &AppConfig,
    command: &MultiCommands,
    json: bool,
    precision: Precision,
) -> Result<(), KartTimerError> {
    match command {
        MultiCommands::List => {
            let worker = StorageWorker::spawn(open_database(config)?);
            let sessions = worker.run(|db| db.list_multiple_sessions())??;
            if json {
                print_json(&sessions)?;
            } else if sessions.is_empty() {
                println!("No multi-kart sessions recorded yet");
            } else {
                for session in &sessions {
                    println!("{}", history::multiple_session_summary(session, precision));
                }
            }
        }
        MultiCommands::Show { id } => {
            let id = *id;
            let worker = StorageWorker::spawn(open_database(config)?);
            match worker.run(move |db| db.get_multiple_session(id))?? {
                Some(session) if json => print_json(&session)?,
                Some(session) => print!("{}", history::multiple_session_detail(&session, precision)),
                None => warn!("No multi-kart session with id {}", id),
            }
        }
        MultiCommands::Delete { id } => {
            if open_database(config)?.delete_multiple_session(*id)? {
                println!("Deleted multi-kart session {}", id);
            } else {
                warn!("No multi-kart session with id {}", id);
            }
        }
        MultiCommands::DeleteDriver {
            session_id,
            driver_id,
        } => match open_database(config)?.delete_multiple_driver(*session_id, *driver_id)? {
            DriverRemoval::DriverRemoved => println!("Removed driver {}", driver_id),
            DriverRemoval::SessionRemoved => println!(
                "Removed driver {}, session {} had no drivers left and was deleted",
                driver_id, session_id
            ),
            DriverRemoval::NotFound => {
                warn!("No driver {} in multi-kart session {}", driver_id, session_id)
            }
        },
        MultiCommands::Clear { yes } => {
            let mut database = open_database(config)?;
            if !yes && !confirm("Delete every multi-kart session?")? {
                println!("Nothing deleted");
                return Ok(());
            }
            let removed = database.delete_all_multiple_sessions()?;
            println!("Deleted {} multi-kart sessions", removed);
        }
    }
    Ok(())
}

fn record(
    config: &AppConfig,
    session_name: &str,
    driver: &str,
    weather: WeatherCondition,
    precision: Precision,
) -> Result<(), KartTimerError> {
    let profiles = open_profiles(config)?;
    let driver_id = resolve_driver(&profiles, driver)?;
    let mut app = KartTimer::new(open_database(config)?, profiles, config);
    app.select_driver(driver_id)?;
    app.set_session_name(session_name);
    app.set_weather(weather);
    record_session(&mut app, precision)?;
    Ok(())
}

fn record_multi(
    config: &AppConfig,
    session_name: Option<&str>,
    karts: &[(String, String)],
    precision: Precision,
) -> Result<(), KartTimerError> {
    if karts.len() > SLOT_COUNT {
        return Err(KartTimerError::constraint(
            "kart",
            format!("at most {} karts can be timed together", SLOT_COUNT),
        ));
    }

    let mut app = KartTimer::new(open_database(config)?, open_profiles(config)?, config);
    for (index, (name, kart)) in karts.iter().enumerate() {
        if let Some(slot) = app.multi_mut().slot_mut(index) {
            slot.name = name.clone();
            slot.kart_number = kart.clone();
        }
    }
    record_multiple_session(&mut app, session_name, precision)?;
    Ok(())
}

fn config_command(
    config: &AppConfig,
    path: &Path,
    command: &ConfigCommands,
) -> Result<(), KartTimerError> {
    match command {
        ConfigCommands::Show => {
            println!("# {}", path.display());
            print_json(config)?;
        }
        ConfigCommands::Init { force } => {
            if path.exists() && !force {
                warn!("Config file {:?} already exists, use --force to overwrite", path);
                return Ok(());
            }
            config.save(path)?;
            info!("Wrote config file {:?}", path);
        }
    }
    Ok(())
}

fn run(cli: &Args) -> Result<(), KartTimerError> {
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => AppConfig::default_config_path()?,
    };
    let config = AppConfig::load(&config_path)?;
    let precision = cli.precision.unwrap_or(config.display_precision);

    match &cli.command {
        Commands::Drivers { command } => drivers(&config, command, cli.json),
        Commands::Sessions { command } => sessions(&config, command, cli.json, precision),
        Commands::Multi { command } => multi(&config, command, cli.json, precision),
        Commands::Record {
            name,
            driver,
            weather,
        } => record(&config, name, driver, *weather, precision),
        Commands::RecordMulti { name, karts } => {
            record_multi(&config, name.as_deref(), karts, precision)
        }
        Commands::Config { command } => config_command(&config, &config_path, command),
    }
}

fn main() {
    colog::init();

    let cli = Args::parse();
    if let Err(e) = ctrlc::set_handler(move || {
        println!("\nExiting, laps not saved are discarded");
        std::process::exit(0);
    }) {
        warn!("Could not set Ctrl-C handler: {}", e);
    }

    if let Err(e) = run(&cli) {
        error!("{}", e);
        std::process::exit(1);
    }
}
