//! Login command: exchanges credentials for a session token.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use pc_api::Credentials;

use crate::Config;
use crate::commands::util::{api_error, client, open_database, runtime};

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// HR service username.
    #[arg(short, long, env = "PUNCH_USERNAME")]
    pub username: String,

    /// HR service password.
    #[arg(short, long, env = "PUNCH_PASSWORD", hide_env_values = true)]
    pub password: String,
}

pub fn run<W: Write>(writer: &mut W, args: &LoginArgs, config: &Config) -> Result<()> {
    let credentials = Credentials {
        username: args.username.trim().to_string(),
        password: args.password.clone(),
        company_code: config.company_code.clone(),
    };

    let client = client(config)?;
    let session = runtime()?
        .block_on(client.login(&credentials))
        .map_err(|err| api_error(err, "login failed"))?;

    let db = open_database(config)?;
    db.save_session(&session)?;
    tracing::info!(employee = %session.employee_code, "session stored");

    let name = if session.employee_name.is_empty() {
        &session.employee_code
    } else {
        &session.employee_name
    };
    writeln!(writer, "Welcome back, {name}!")?;
    Ok(())
}
