//! Social commands - tweet, tweets, follow, feed

use anyhow::Result;
use std::path::PathBuf;

use crate::args::{FollowArgs, TokenArgs, TweetArgs};
use crate::commands::wiring::{build_service, emit};
use crate::config::AppConfig;

pub async fn tweet(args: TweetArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let service = build_service(&config).await?;

    emit(&service.create_tweet(&args.auth.token, &args.text).await)
}

pub async fn tweets(args: TokenArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let service = build_service(&config).await?;

    let response = service.get_tweets(&args.token).await;
    if let Some(ref tweets) = response.tweets {
        tracing::info!(count = tweets.len(), source = ?response.source, "Listed tweets");
    }
    emit(&response)
}

pub async fn follow(args: FollowArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let service = build_service(&config).await?;

    emit(&service.follow(&args.auth.token, &args.account_id).await)
}

pub async fn feed(args: TokenArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let service = build_service(&config).await?;

    let response = service.feed(&args.token).await;
    if let Some(ref tweets) = response.tweets {
        tracing::info!(count = tweets.len(), "Assembled feed");
    }
    emit(&response)
}
