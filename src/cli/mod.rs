//! CLI command implementations

pub mod error;
pub mod fetch;
pub mod routes;

use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub use error::CliError;
pub use fetch::FetchArgs;
pub use routes::RoutesArgs;

use crate::config::HarvestConfig;

/// WordPress REST Harvester CLI
#[derive(Parser, Debug)]
#[command(name = "wp-rest-harvester")]
#[command(about = "Fetch every collection a WordPress REST API exposes", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// JSON configuration file; flags override its values
    #[arg(long, global = true, env = "WP_HARVEST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Serve Prometheus metrics on this address (e.g. 127.0.0.1:9000)
    #[arg(long, global = true)]
    pub metrics_addr: Option<SocketAddr>,
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch every record and write them out
    Fetch(FetchArgs),

    /// List the routes that would be fetched
    Routes(RoutesArgs),
}

/// Site, filter and credential flags shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct SiteArgs {
    /// Site host and optional path, without protocol (e.g. blog.example.com)
    #[arg(long, env = "WP_BASE_URL")]
    pub base_url: Option<String>,

    /// http or https
    #[arg(long)]
    pub protocol: Option<String>,

    /// The site is hosted on wordpress.com
    #[arg(long)]
    pub hosting_wpcom: bool,

    /// Print the run configuration and per-route decisions
    #[arg(long, short)]
    pub verbose: bool,

    /// Fetch ACF routes and options
    #[arg(long)]
    pub use_acf: bool,

    /// ACF option page id to fetch individually (repeatable)
    #[arg(long = "acf-option-page-id")]
    pub acf_option_page_ids: Vec<String>,

    /// Page size (1-100)
    #[arg(long)]
    pub per_page: Option<u32>,

    /// Concurrent page requests per route; zero or less means one
    #[arg(long, allow_negative_numbers = true)]
    pub concurrent_requests: Option<i64>,

    /// Include glob, replaces the configured list (repeatable)
    #[arg(long = "include")]
    pub included_routes: Vec<String>,

    /// Exclude glob, added to the configured list (repeatable)
    #[arg(long = "exclude")]
    pub excluded_routes: Vec<String>,

    /// Prefix of every type name
    #[arg(long)]
    pub type_prefix: Option<String>,

    /// JWT Authentication user
    #[arg(long, env = "WP_JWT_USER")]
    pub jwt_user: Option<String>,

    /// JWT Authentication password
    #[arg(long, env = "WP_JWT_PASS", hide_env_values = true)]
    pub jwt_pass: Option<String>,

    /// wordpress.com application client id
    #[arg(long, env = "WPCOM_APP_CLIENT_ID")]
    pub wpcom_app_client_id: Option<String>,

    /// wordpress.com application client secret
    #[arg(long, env = "WPCOM_APP_CLIENT_SECRET", hide_env_values = true)]
    pub wpcom_app_client_secret: Option<String>,

    /// wordpress.com user
    #[arg(long, env = "WPCOM_USER")]
    pub wpcom_user: Option<String>,

    /// wordpress.com password
    #[arg(long, env = "WPCOM_PASS", hide_env_values = true)]
    pub wpcom_pass: Option<String>,

    /// HTTP Basic Auth user
    #[arg(long, env = "WP_HTACCESS_USER")]
    pub htaccess_user: Option<String>,

    /// HTTP Basic Auth password
    #[arg(long, env = "WP_HTACCESS_PASS", hide_env_values = true)]
    pub htaccess_pass: Option<String>,
}

impl SiteArgs {
    /// Build the run configuration: file values first, then flags
    pub fn resolve(&self, config_path: Option<&Path>) -> Result<HarvestConfig, CliError> {
        let mut config = match config_path {
            Some(path) => HarvestConfig::from_file(path)?,
            None => HarvestConfig::default(),
        };
        self.apply(&mut config);

        if config.base_url.is_empty() {
            return Err(CliError::InvalidArgument(
                "a base URL is required (--base-url, WP_BASE_URL or the config file)".to_string(),
            ));
        }
        config.validate()?;
        Ok(config)
    }

    fn apply(&self, config: &mut HarvestConfig) {
        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(value) = value {
                *target = value.clone();
            }
        }
        fn set_opt(target: &mut Option<String>, value: &Option<String>) {
            if value.is_some() {
                *target = value.clone();
            }
        }

        set(&mut config.base_url, &self.base_url);
        set(&mut config.protocol, &self.protocol);
        set(&mut config.per_page, &self.per_page);
        set(&mut config.concurrent_requests, &self.concurrent_requests);
        set(&mut config.type_prefix, &self.type_prefix);

        config.hosting_wpcom |= self.hosting_wpcom;
        config.verbose |= self.verbose;
        config.use_acf |= self.use_acf;

        if !self.acf_option_page_ids.is_empty() {
            config.acf_option_page_ids = self.acf_option_page_ids.clone();
        }
        if !self.included_routes.is_empty() {
            config.included_routes = self.included_routes.clone();
        }
        config.excluded_routes.extend(self.excluded_routes.iter().cloned());

        let auth = &mut config.auth;
        set_opt(&mut auth.jwt_user, &self.jwt_user);
        set_opt(&mut auth.jwt_pass, &self.jwt_pass);
        set_opt(&mut auth.wpcom_app_client_id, &self.wpcom_app_client_id);
        set_opt(&mut auth.wpcom_app_client_secret, &self.wpcom_app_client_secret);
        set_opt(&mut auth.wpcom_user, &self.wpcom_user);
        set_opt(&mut auth.wpcom_pass, &self.wpcom_pass);
        set_opt(&mut auth.htaccess_user, &self.htaccess_user);
        set_opt(&mut auth.htaccess_pass, &self.htaccess_pass);
    }
}
