use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the vitrine binary.
#[derive(Debug, Parser)]
#[command(name = "vitrine", version, about = "Storefront runtime core")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "VITRINE_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Refresh the collections the layout needs and print the render plan.
    Plan(PlanArgs),
    /// Inspect or update the guest "recently viewed" list.
    Recent(RecentArgs),
    /// Forward a shopper action to the storefront API.
    Act(ActArgs),
}

impl Default for Command {
    fn default() -> Self {
        Command::Plan(PlanArgs::default())
    }
}

#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Override the storefront API base URL.
    #[arg(long = "api-base-url", value_name = "URL", global = true)]
    pub api_base_url: Option<String>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct PlanArgs {
    /// Bearer token attached to every request.
    #[arg(long = "token", env = "VITRINE_TOKEN", value_name = "TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Product grid page to resolve (1-based).
    #[arg(long = "page", value_name = "PAGE")]
    pub page: Option<usize>,

    /// Pretty-print the plan.
    #[arg(long = "pretty", action = clap::ArgAction::SetTrue)]
    pub pretty: bool,
}

#[derive(Debug, Args, Clone)]
pub struct RecentArgs {
    #[command(subcommand)]
    pub action: RecentAction,
}

#[derive(Debug, Subcommand, Clone)]
pub enum RecentAction {
    /// Print the product ids viewed recently, newest first.
    List,
    /// Record a product view.
    Record {
        #[arg(value_name = "PRODUCT_ID")]
        product_id: String,
    },
    /// Forget every recorded view.
    Clear,
}

#[derive(Debug, Args, Clone)]
pub struct ActArgs {
    /// Bearer token; actions are refused without one.
    #[arg(long = "token", env = "VITRINE_TOKEN", value_name = "TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub action: ActAction,
}

#[derive(Debug, Subcommand, Clone)]
pub enum ActAction {
    /// Add a product to the cart.
    #[command(name = "add-to-cart")]
    AddToCart {
        #[arg(value_name = "PRODUCT_ID")]
        product_id: String,
        #[arg(long, default_value_t = 1)]
        quantity: u32,
    },
    /// Toggle a product on the wishlist.
    Wishlist {
        #[arg(value_name = "PRODUCT_ID")]
        product_id: String,
    },
    /// Clear saved recent searches.
    #[command(name = "clear-searches")]
    ClearSearches,
}
