//! CLI command implementations

use crate::{output, scenario::Scenario};
use anyhow::Context;
use std::path::Path;
use std::time::Duration;
use url::Url;
use vigil_core::{Credentials, Error, HttpSessionBoundary, SessionApi};

fn client(api: &str, timeout_secs: u64) -> anyhow::Result<HttpSessionBoundary> {
    let base = Url::parse(api).with_context(|| format!("invalid API base: {}", api))?;
    Ok(HttpSessionBoundary::new(base, Duration::from_secs(timeout_secs))?)
}

/// Log in, check the protected route, optionally log out
pub async fn session(
    api: &str,
    timeout_secs: u64,
    username: String,
    password: String,
    logout: bool,
    format: &str,
) -> anyhow::Result<()> {
    let client = client(api, timeout_secs)?;
    let creds = Credentials { username, password };

    let login = client.login(&creds).await?;
    output::print_message("login", &login, format);

    let protected = client.check_session().await?;
    output::print_protected(&protected, format);

    if logout {
        let body = client.logout_now().await?;
        output::print_message("logout", &body, format);
    }

    Ok(())
}

/// Anonymous check; a 401 is the expected outcome
pub async fn check(api: &str, timeout_secs: u64, format: &str) -> anyhow::Result<()> {
    let client = client(api, timeout_secs)?;
    match client.check_session().await {
        Ok(body) => output::print_protected(&body, format),
        Err(Error::SessionRejected { status, message }) => {
            output::print_rejection(status, &message, format);
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Replay a scenario file
pub fn simulate(path: &Path, format: &str) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading scenario {}", path.display()))?;
    let scenario: Scenario = serde_json::from_str(&raw)
        .with_context(|| format!("parsing scenario {}", path.display()))?;

    println!("Replaying scenario: {}", path.display());
    let frames = scenario.run()?;
    output::print_frames(&frames, format);
    Ok(())
}
