//! Account commands - signup, signin, whoami, set-password, delete-user

use anyhow::{Context, Result};
use birdfeed_domain::{CreateUserRequest, IdentityVerifier, SignInRequest};
use std::path::PathBuf;

use crate::args::{SetPasswordArgs, SigninArgs, SignupArgs, TokenArgs};
use crate::commands::wiring::{build_authority, build_service, emit};
use crate::config::AppConfig;

pub async fn signup(args: SignupArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let service = build_service(&config).await?;

    let request = CreateUserRequest {
        first_name: args.first_name,
        last_name: args.last_name,
        age: args.age,
        email: args.email,
        password: args.password,
    };

    emit(&service.create_user(&request).await)
}

pub async fn signin(args: SigninArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let service = build_service(&config).await?;

    let request = SignInRequest {
        email: args.email,
        password: args.password,
    };

    emit(&service.sign_in(&request).await)
}

/// Decode a token locally; no store access
pub async fn whoami(args: TokenArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let authority = build_authority(&config)?;

    let claims = authority.verify(&args.token).context("Token rejected")?;
    println!("{}", serde_json::to_string_pretty(&claims)?);
    Ok(())
}

pub async fn set_password(args: SetPasswordArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let service = build_service(&config).await?;

    emit(&service.set_new_password(&args.auth.token, &args.password).await)
}

pub async fn delete_user(args: TokenArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let service = build_service(&config).await?;

    emit(&service.delete_user(&args.token).await)
}
