#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::ArgMatches;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use strum::VariantNames;
use tokio::fs;
use yansi::Paint;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::context_string;
use crate::domain::models::Store;
use crate::domain::services::actions::help_text;
use crate::infrastructure::audio::device;
use crate::infrastructure::stores::file::FileStore;

const ARG_NO_HISTORY: &str = "no-history";

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

pub fn log_dir() -> path::PathBuf {
    if let Ok(dir) = std::env::var("LANG_CHAT_LOG_DIR") {
        return path::PathBuf::from(dir);
    }

    return dirs::cache_dir()
        .unwrap_or_else(|| return path::PathBuf::from("."))
        .join("lang-chat");
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    fs::write(&config_file_path, Config::serialize_default(build())).await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

async fn print_history() -> Result<()> {
    let messages = FileStore::default().load().await?;
    if messages.is_empty() {
        println!("There's no saved conversation yet. You should start your first lesson!");
    } else {
        println!("{}", context_string(&messages));
    }

    return Ok(());
}

async fn clear_history() -> Result<()> {
    let store = FileStore::default();
    store.clear().await?;
    println!(
        "Deleted saved conversation at {}",
        store.file_path.to_string_lossy()
    );

    return Ok(());
}

fn print_devices(devices: Vec<String>) {
    if devices.is_empty() {
        println!("No devices found.");
    } else {
        println!("{}", devices.join("\n"));
    }
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_history() -> Command {
    return Command::new("history")
        .about("Manage the saved conversation.")
        .arg_required_else_help(true)
        .subcommand(Command::new("path").about("Print the path of the saved conversation."))
        .subcommand(
            Command::new("show").about("Print the saved conversation as it's sent to the tutor."),
        )
        .subcommand(
            Command::new("clear")
                .about("Delete the saved conversation. The next chat starts a fresh lesson."),
        );
}

fn subcommand_debug() -> Command {
    let mut cmd = Command::new("debug");
    cmd = cmd.about("Debug helpers for lang-chat")
        .hide(true)
        .subcommand(
            Command::new("log-path").about("Output path to debug log file generated when running lang-chat with environment variable RUST_LOG=lang_chat")
        )
        .subcommand(
            Command::new("enum-config").about("List all config keys as strings.")
        )
        .subcommand(
            Command::new("inputs").about("List all microphones available for recording.")
        )
        .subcommand(
            Command::new("outputs").about("List all speakers available for playback.")
        );

    return cmd;
}

fn arg_no_history() -> Arg {
    return Arg::new(ARG_NO_HISTORY)
        .long(ARG_NO_HISTORY)
        .help("Keep the conversation in memory only, nothing is read from or written to the history file.")
        .action(ArgAction::SetTrue)
        .global(true);
}

fn subcommand_chat() -> Command {
    return Command::new("chat").about("Start or resume a lesson.");
}

pub fn build() -> Command {
    let commands_text = help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.starts_with("COMMANDS:")
                || line.starts_with("HOTKEYS:")
                || line.starts_with("SPECIAL CHARACTERS:")
            {
                return Paint::new(format!("CHAT {line}"))
                    .underline()
                    .bold()
                    .to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
    );

    return Command::new("lang-chat")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .subcommand(subcommand_chat())
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_debug())
        .subcommand(subcommand_history())
        .arg(arg_no_history())
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("LANG_CHAT_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true)
        )
        .arg(
            Arg::new(ConfigKey::ApiURL.to_string())
                .short('a')
                .long(ConfigKey::ApiURL.to_string())
                .env("LANG_CHAT_API_URL")
                .num_args(1)
                .help(format!("Base URL of the tutor backend. [default: {}]", Config::default(ConfigKey::ApiURL)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::RequestTimeout.to_string())
                .long(ConfigKey::RequestTimeout.to_string())
                .env("LANG_CHAT_REQUEST_TIMEOUT")
                .num_args(1)
                .help(format!("Time to wait in milliseconds for a tutor response, 0 waits forever. [default: {}]", Config::default(ConfigKey::RequestTimeout)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::HealthCheckTimeout.to_string())
                .long(ConfigKey::HealthCheckTimeout.to_string())
                .env("LANG_CHAT_HEALTH_CHECK_TIMEOUT")
                .num_args(1)
                .help(format!("Time to wait in milliseconds before timing out when doing a healthcheck for the backend. [default: {}]", Config::default(ConfigKey::HealthCheckTimeout)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::HistoryFile.to_string())
                .long(ConfigKey::HistoryFile.to_string())
                .env("LANG_CHAT_HISTORY_FILE")
                .num_args(1)
                .help(format!("File the conversation is saved to between runs. [default: {}]", Config::default(ConfigKey::HistoryFile)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::InputDevice.to_string())
                .short('i')
                .long(ConfigKey::InputDevice.to_string())
                .env("LANG_CHAT_INPUT_DEVICE")
                .num_args(1)
                .help("Name of the microphone to record from. Defaults to the system default input.")
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::OutputDevice.to_string())
                .short('o')
                .long(ConfigKey::OutputDevice.to_string())
                .env("LANG_CHAT_OUTPUT_DEVICE")
                .num_args(1)
                .help("Name of the speaker to play responses on. Defaults to the system default output.")
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::Username.to_string())
                .short('u')
                .long(ConfigKey::Username.to_string())
                .env("LANG_CHAT_USERNAME")
                .num_args(1)
                .help("Your name displayed in your chat bubbles.")
                .global(true),
        );
}

fn no_history(matches: &[&ArgMatches]) -> bool {
    return matches
        .iter()
        .any(|m| return matches!(m.try_get_one::<bool>(ARG_NO_HISTORY), Ok(Some(true))));
}

/// Loads configuration for a chat session. Without history the transcript
/// is kept in memory, signalled by an empty history file.
async fn load_chat_config(matches: Vec<&ArgMatches>) -> Result<()> {
    Config::load(matches.clone()).await?;
    if no_history(&matches) {
        Config::set(ConfigKey::HistoryFile, "");
    }

    return Ok(());
}

pub async fn parse() -> Result<bool> {
    return dispatch(build().get_matches()).await;
}

/// Runs the selected subcommand. Returns true when a chat session should start.
async fn dispatch(matches: ArgMatches) -> Result<bool> {
    match matches.subcommand() {
        Some(("debug", debug_matches)) => {
            match debug_matches.subcommand() {
                Some(("log-path", _)) => {
                    let log_path = log_dir().join("debug.log");
                    println!("{}", log_path.to_string_lossy());
                }
                Some(("enum-config", _)) => {
                    let res = ConfigKey::VARIANTS.join("\n");
                    println!("{}", res);
                }
                Some(("inputs", _)) => {
                    print_devices(device::list_inputs()?);
                }
                Some(("outputs", _)) => {
                    print_devices(device::list_outputs()?);
                }
                _ => {
                    subcommand_debug().print_long_help()?;
                }
            }

            return Ok(false);
        }
        Some(("chat", subcmd_matches)) => {
            load_chat_config(vec![&matches, subcmd_matches]).await?;
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            } else {
                subcommand_completions().print_long_help()?;
            }
            return Ok(false);
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(false);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(false);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(false);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(false);
            }
        },
        Some(("history", subcmd_matches)) => {
            Config::load(vec![&matches, subcmd_matches]).await?;
            match subcmd_matches.subcommand() {
                Some(("path", _)) => {
                    println!("{}", Config::get(ConfigKey::HistoryFile));
                }
                Some(("show", _)) => {
                    print_history().await?;
                }
                Some(("clear", _)) => {
                    clear_history().await?;
                }
                _ => {
                    subcommand_history().print_long_help()?;
                }
            }
            return Ok(false);
        }
        _ => {
            load_chat_config(vec![&matches]).await?;
        }
    }

    return Ok(true);
}
