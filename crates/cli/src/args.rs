//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// birdfeed: social network backend with follow graph, tweets and feeds
#[derive(Parser, Debug)]
#[command(name = "birdfeed")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new account
    Signup(SignupArgs),

    /// Sign in and print a token
    Signin(SigninArgs),

    /// Show the identity carried by a token
    Whoami(TokenArgs),

    /// Post a tweet
    Tweet(TweetArgs),

    /// List your own tweets
    Tweets(TokenArgs),

    /// Follow another account
    Follow(FollowArgs),

    /// Show the newest tweets of accounts you follow
    Feed(TokenArgs),

    /// Change your password
    SetPassword(SetPasswordArgs),

    /// Delete your account
    DeleteUser(TokenArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Validate configuration and show status
    Doctor(DoctorArgs),
}

#[derive(Args, Debug)]
pub struct TokenArgs {
    /// Bearer token from `birdfeed signin`
    #[arg(long, env = "BIRDFEED_TOKEN", hide_env_values = true)]
    pub token: String,
}

#[derive(Args, Debug)]
pub struct SignupArgs {
    #[arg(long)]
    pub first_name: String,

    #[arg(long)]
    pub last_name: String,

    #[arg(long)]
    pub age: u32,

    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub password: String,
}

#[derive(Args, Debug)]
pub struct SigninArgs {
    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub password: String,
}

#[derive(Args, Debug)]
pub struct SetPasswordArgs {
    #[command(flatten)]
    pub auth: TokenArgs,

    /// New password
    #[arg(long)]
    pub password: String,
}

#[derive(Args, Debug)]
pub struct TweetArgs {
    #[command(flatten)]
    pub auth: TokenArgs,

    /// Tweet text
    #[arg(long)]
    pub text: String,
}

#[derive(Args, Debug)]
pub struct FollowArgs {
    #[command(flatten)]
    pub auth: TokenArgs,

    /// Account id to follow, e.g. #1A2B3C4D5E
    pub account_id: String,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Init {
        /// Path to write config file
        #[arg(long, default_value = "./config.toml")]
        path: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
