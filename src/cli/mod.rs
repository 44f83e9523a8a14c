//! Command-line interface.
//!
//! Without a subcommand the binary runs the server. The other subcommands
//! talk to a running server through `client::ApiClient`:
//! - `login` / `logout` / `whoami` - manage the saved session
//! - `members list|show|expiring` - browse member profiles
//! - `config check` - validate the configuration file

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use crate::client::{ApiClient, ClientError, ListParams, SessionStore};
use crate::config::Config;
use crate::db::MemberResponse;

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "gymdesk")]
#[command(author, version, about = "Member management for fitness centres", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "gymdesk.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// API URL to connect to
    #[arg(long, env = "GYMDESK_API_URL", default_value = "http://localhost:8000")]
    pub api_url: String,

    /// Authentication token; takes precedence over the saved session
    #[arg(long, env = "GYMDESK_TOKEN")]
    pub token: Option<String>,

    /// Where `login` saves the session
    #[arg(long, env = "GYMDESK_SESSION_FILE", default_value = ".gymdesk-session.json")]
    pub session_file: PathBuf,

    /// Subcommand to run (if none, starts the server)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and save the session
    Login {
        email: String,
        /// Read from stdin when omitted
        #[arg(long, env = "GYMDESK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Revoke the saved session
    Logout {
        /// Revoke every session of the user
        #[arg(long)]
        all: bool,
    },

    /// Show the signed-in user
    Whoami,

    /// Member profile commands
    #[command(subcommand)]
    Members(MembersCommands),

    /// Configuration management commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
pub enum MembersCommands {
    /// List members
    List {
        #[arg(short, long)]
        search: Option<String>,
        /// Only active memberships
        #[arg(long)]
        active: bool,
        #[arg(long)]
        page: Option<i64>,
        #[arg(long)]
        per_page: Option<i64>,
    },
    /// Show one member profile
    Show { id: i64 },
    /// Active memberships ending soon
    Expiring {
        #[arg(short, long)]
        days: Option<i64>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate the configuration file
    Check,
}

fn create_client(cli: &Cli) -> Result<ApiClient> {
    let session = match &cli.token {
        Some(token) => SessionStore::with_token(token.clone()),
        None => SessionStore::load(&cli.session_file).with_context(|| {
            format!("Failed to read session file {}", cli.session_file.display())
        })?,
    };
    ApiClient::new(&cli.api_url, Arc::new(session)).context("Failed to create HTTP client")
}

/// Run a CLI command
pub async fn run_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Some(Commands::Login { email, password }) => cmd_login(cli, email, password.clone()).await,
        Some(Commands::Logout { all }) => cmd_logout(cli, *all).await,
        Some(Commands::Whoami) => cmd_whoami(cli).await,
        Some(Commands::Members(MembersCommands::List {
            search,
            active,
            page,
            per_page,
        })) => {
            let params = ListParams {
                page: *page,
                per_page: *per_page,
                search: search.clone(),
                status: active.then(|| "active".to_string()),
            };
            cmd_members_list(cli, &params).await
        }
        Some(Commands::Members(MembersCommands::Show { id })) => cmd_members_show(cli, *id).await,
        Some(Commands::Members(MembersCommands::Expiring { days })) => {
            cmd_members_expiring(cli, *days).await
        }
        Some(Commands::Config(ConfigCommands::Check)) => cmd_config_check(cli).await,
        None => {
            // No subcommand means start the server - this is handled in main.rs
            Ok(())
        }
    }
}

/// Turn client errors into readable CLI failures
fn explain(err: ClientError) -> anyhow::Error {
    match err {
        ClientError::Api {
            status: 401, ..
        } => anyhow::anyhow!("Session expired or revoked. Run `gymdesk login` again."),
        ClientError::Api {
            message,
            details: Some(details),
            ..
        } => anyhow::anyhow!("{}\n{}", message, details),
        other => anyhow::Error::new(other),
    }
}

fn read_password() -> Result<String> {
    print!("Password: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

async fn cmd_login(cli: &Cli, email: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => read_password()?,
    };

    let client = create_client(cli)?;
    let user = client.login(email, &password).await.map_err(explain)?;

    println!("Logged in as {} <{}>", user.name, user.email);
    if let Some(path) = client.session().path() {
        println!("Session saved to {}", path.display());
    }
    Ok(())
}

async fn cmd_logout(cli: &Cli, all: bool) -> Result<()> {
    let client = create_client(cli)?;
    if all {
        let revoked = client.logout_all().await.map_err(explain)?;
        println!("Logged out of {} session(s).", revoked);
    } else {
        client.logout().await.map_err(explain)?;
        println!("Logged out.");
    }
    Ok(())
}

async fn cmd_whoami(cli: &Cli) -> Result<()> {
    let client = create_client(cli)?;
    let user = client.me().await.map_err(explain)?;

    println!();
    println!("ID:     {}", user.id);
    println!("Name:   {}", user.name);
    println!("Email:  {}", user.email);
    match user.member_profile.as_deref() {
        Some(profile) => println!(
            "Member: #{} ({}, {})",
            profile.id, profile.membership_type, profile.membership_status
        ),
        None => println!("Member: no profile"),
    }
    println!();
    Ok(())
}

async fn cmd_members_list(cli: &Cli, params: &ListParams) -> Result<()> {
    let client = create_client(cli)?;
    let list = client.list_members(params).await.map_err(explain)?;

    if list.data.is_empty() {
        println!("No members found.");
        return Ok(());
    }

    print_member_table(&list.data);
    println!(
        "Page {} of {} ({} members)",
        list.meta.current_page, list.meta.last_page, list.meta.total
    );
    println!();
    Ok(())
}

async fn cmd_members_show(cli: &Cli, id: i64) -> Result<()> {
    let client = create_client(cli)?;
    let member = client.get_member(id).await.map_err(explain)?;

    println!();
    println!("=== Member #{}: {} ===", member.id, member.full_name);
    println!();
    println!("Phone:       {}", member.phone.as_deref().unwrap_or("-"));
    println!(
        "Born:        {}",
        member
            .date_of_birth
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    println!("City:        {}", member.city.as_deref().unwrap_or("-"));
    println!("Type:        {}", member.membership_type);
    println!("Status:      {}", member.membership_status);
    println!("Starts:      {}", member.membership_start_date);
    println!(
        "Ends:        {}{}",
        member
            .membership_end_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string()),
        if member.is_expired { " (expired)" } else { "" }
    );
    println!(
        "Emergency:   {} {}",
        member.emergency_contact_name.as_deref().unwrap_or("-"),
        member.emergency_contact_phone.as_deref().unwrap_or("")
    );
    println!();
    Ok(())
}

async fn cmd_members_expiring(cli: &Cli, days: Option<i64>) -> Result<()> {
    let client = create_client(cli)?;
    let members = client.expiring_members(days).await.map_err(explain)?;

    if members.is_empty() {
        println!("No memberships expiring soon.");
        return Ok(());
    }
    print_member_table(&members);
    Ok(())
}

fn print_member_table(members: &[MemberResponse]) {
    println!();
    println!(
        "{:<6}  {:<28}  {:<32}  {:<8}  {:<10}  {:<10}",
        "ID", "NAME", "EMAIL", "TYPE", "STATUS", "ENDS"
    );
    println!("{}", "-".repeat(104));

    for member in members {
        let email = member.user.as_ref().map(|u| u.email.as_str()).unwrap_or("-");
        let ends = member
            .membership_end_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<6}  {:<28}  {:<32}  {:<8}  {:<10}  {:<10}",
            member.id,
            truncate(&member.full_name, 28),
            truncate(email, 32),
            member.membership_type,
            member.membership_status,
            ends
        );
    }
    println!();
}

async fn cmd_config_check(cli: &Cli) -> Result<()> {
    let config_path = &cli.config;

    println!("Checking configuration file: {}", config_path.display());
    println!();

    if !config_path.exists() {
        println!(
            "[!!] Configuration file not found: {}",
            config_path.display()
        );
        println!();
        println!("A default configuration will be used when starting the server.");
        return Ok(());
    }

    let config = match Config::load(config_path).and_then(|c| c.check().map(|_| c)) {
        Ok(config) => config,
        Err(e) => {
            println!("[!!] Configuration file is invalid!");
            println!();
            println!("Error: {:#}", e);
            anyhow::bail!("Invalid configuration file");
        }
    };

    // The schema must apply cleanly to a scratch database
    crate::db::init_memory()
        .await
        .context("Database migrations failed")?;

    println!("[OK] Configuration file is valid!");
    println!();
    println!("=== Configuration Summary ===");
    println!();
    println!("Server:");
    println!("  Listen:       {}:{}", config.server.host, config.server.port);
    println!("  Database:     {}", config.database_url());
    println!("  Debug:        {}", config.server.debug);
    println!();
    println!("Auth:");
    println!("  Session TTL:  {}h", config.auth.session_ttl_hours);
    println!("  Min password: {}", config.auth.password.min_length);
    println!();
    println!("Members:");
    println!(
        "  Per page:     {} ({}..{})",
        config.members.default_per_page, config.members.min_per_page, config.members.max_per_page
    );
    println!("  Expiring:     {} days", config.members.expiring_within_days);
    println!();
    println!(
        "Rate limiting: {}",
        if config.rate_limit.enabled {
            "Enabled"
        } else {
            "Disabled"
        }
    );
    println!();

    if config.server.debug {
        println!("Warnings:");
        println!("  [!] server.debug is on - internal error details are sent to clients");
        println!();
    }

    Ok(())
}

/// Truncate a string to max characters with ellipsis
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_server_mode() {
        let cli = Cli::try_parse_from(["gymdesk", "--config", "custom.toml"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config, PathBuf::from("custom.toml"));
    }

    #[test]
    fn test_parse_members_list() {
        let cli = Cli::try_parse_from([
            "gymdesk", "members", "list", "--search", "tan", "--active", "--per-page", "20",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Members(MembersCommands::List {
                search,
                active,
                per_page,
                page,
            })) => {
                assert_eq!(search.as_deref(), Some("tan"));
                assert!(active);
                assert_eq!(per_page, Some(20));
                assert_eq!(page, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long name", 10), "a very ...");
    }
}
