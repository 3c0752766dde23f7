use clap::Parser;
use log::{error, info};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use warden::command_interface::{self, Command};
use warden::configuration::config::Config;
use warden::container_engine::{ContainerEngine, DockerCli};
use warden::host_metrics;
use warden::instance_management::VpsManager;

#[derive(Parser)]
#[command(name = "warden")]
#[command(version)]
#[command(about = "Container-backed VPS sandboxes with tmate remote access")]
struct Args {
    /// Path to the TOML configuration file; defaults apply when omitted
    config_file: Option<String>,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .init();

    println!(
        "
██╗    ██╗ █████╗ ██████╗ ██████╗ ███████╗███╗   ██╗
██║    ██║██╔══██╗██╔══██╗██╔══██╗██╔════╝████╗  ██║
██║ █╗ ██║███████║██████╔╝██║  ██║█████╗  ██╔██╗ ██║
██║███╗██║██╔══██║██╔══██╗██║  ██║██╔══╝  ██║╚██╗██║
╚███╔███╔╝██║  ██║██║  ██║██████╔╝███████╗██║ ╚████║
 ╚══╝╚══╝ ╚═╝  ╚═╝╚═╝  ╚═╝╚═════╝ ╚══════╝╚═╝  ╚═══╝
====================================================
   Container-backed VPS sandboxes v{}
====================================================
",
        env!("CARGO_PKG_VERSION")
    );

    let args = Args::parse();
    let config = match &args.config_file {
        Some(path) => match Config::from_file(Path::new(path)) {
            Ok(config) => {
                info!("configuration imported from {}", path);
                config
            }
            Err(e) => {
                error!("unable to import configuration from {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => {
            info!("no configuration file given, using defaults");
            Config::default()
        }
    };

    let engine = match DockerCli::new().await {
        Ok(engine) => engine,
        Err(e) => {
            error!("container engine unavailable: {}", e);
            std::process::exit(1);
        }
    };
    let engine: Arc<dyn ContainerEngine> = Arc::new(engine);

    let manager = VpsManager::new(engine, config).await;
    info!("lifecycle manager ready, type 'help' for commands");

    if let Err(e) = command_loop(&manager).await {
        error!("command loop failed: {}", e);
        std::process::exit(1);
    }
}

async fn command_loop(manager: &VpsManager) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let line = match lines.next_line().await? {
            Some(line) => line,
            None => break,
        };

        let command = match command_interface::parse(&line) {
            Ok(command) => command,
            Err(command_interface::ParseError::Empty) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match command {
            Command::Create {
                ram_gb,
                cpu_cores,
                disk_gb,
            } => match manager.create(ram_gb, cpu_cores, disk_gb).await {
                Ok(view) => {
                    println!("creation started, poll with: status {}", view.name);
                    println!("{}", command_interface::render_view(&view));
                }
                Err(e) => println!("{}", command_interface::render_error(&e)),
            },
            Command::List => {
                println!("{}", command_interface::render_list(&manager.list().await));
            }
            Command::Status { name } => match manager.get_info(&name).await {
                Some(view) => println!("{}", command_interface::render_view(&view)),
                None => println!("instance {} not found", name),
            },
            Command::Stop { name } => match manager.stop(&name).await {
                Ok(view) => println!("{}", command_interface::render_view(&view)),
                Err(e) => println!("{}", command_interface::render_error(&e)),
            },
            Command::Delete { name } => match manager.delete(&name).await {
                Ok(()) => println!("instance {} deleted", name),
                Err(e) => println!("{}", command_interface::render_error(&e)),
            },
            Command::Refresh { name } => match manager.refresh_session(&name).await {
                Ok(view) => println!("{}", command_interface::render_view(&view)),
                Err(e) => println!("{}", command_interface::render_error(&e)),
            },
            Command::Resources => {
                println!(
                    "{}",
                    command_interface::render_host_usage(&host_metrics::snapshot())
                );
            }
            Command::Help => println!("{}", command_interface::HELP_TEXT),
            Command::Quit => break,
        }
    }

    Ok(())
}
