use std::process::ExitCode;

use anyhow::{Context, Result};
use gardencast_auth::{GoogleOAuth2Provider, TokenCache};
use gardencast_core::Config;
use gardencast_gmail::{dispatch_report, DispatchError, GMAIL_API_BASE};
use gardencast_report::ReportGenerator;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    gardencast_core::init()?;

    let (config, _validation) = Config::load_validated()?;
    tracing::info!("Configuration directory: {}", config.config_dir.display());

    let generator = ReportGenerator::new(&config)?;
    let today = generator.today()?;
    let outcome = generator.run(today).await;

    if outcome.is_failure() && !config.mail.send_error_reports {
        eprintln!("{}", outcome.text());
        return Ok(ExitCode::FAILURE);
    }

    let provider = GoogleOAuth2Provider::new(config.client_secrets_path());
    let cache = TokenCache::new(config.token_cache_path());

    let result = dispatch_report(
        &provider,
        &cache,
        outcome.text(),
        &config.mail.subject,
        GMAIL_API_BASE,
    )
    .await;

    match result {
        Ok(sent) => {
            println!("Message Id: {}", sent.id);
            println!("Email sent successfully!");
            Ok(ExitCode::SUCCESS)
        }
        Err(DispatchError::Gmail(e)) => {
            tracing::error!("Failed to send report: {}", e);
            eprintln!("An error occurred: {}", e.user_message());
            Ok(ExitCode::FAILURE)
        }
        Err(DispatchError::Auth(e)) => {
            let hint = e.user_message();
            Err(e).context(hint)
        }
    }
}
