use std::path::Path;

use clap::Parser;
use client::ApiClient;
use settings::{Cli, Command, PartitionArg, Settings};
use staging::{ImportSession, StagingError};

use crate::error::{AppError, Result};

mod error;
mod render;
mod script;
mod settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(&cli)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "reconcile={level},staging={level},client={level}",
            level = settings.level
        ))
        .init();

    let api = ApiClient::new(&settings.base_url, settings.token.clone())?;
    match cli.command {
        Command::Preview { account, file } => {
            stage(&api, account.or(settings.account_id), &file).await?;
            Ok(())
        }
        Command::Import {
            account,
            file,
            script,
            partition,
        } => {
            let account = account.or(settings.account_id);
            import(&api, account, &file, script.as_deref(), partition).await
        }
    }
}

/// Uploads `file` and prints what was staged.
async fn stage(api: &ApiClient, account: Option<i64>, file: &Path) -> Result<ImportSession> {
    let account_id = account.ok_or(AppError::NoAccount)?;
    let bytes = tokio::fs::read(file).await?;
    let file_name = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut session = ImportSession::load(api).await?;
    if session.directory().account(account_id).is_none() {
        tracing::warn!("account {account_id} is not known to the ledger");
    }
    session.select_account(account_id);

    if let Err(err) = session.upload(api, &file_name, bytes).await {
        eprint!("{}", render::errors(&session.error_report()));
        return Err(err.into());
    }
    if let Some(batch) = session.batch() {
        print!("{}", render::batch(session.directory(), batch));
    }
    Ok(session)
}

async fn import(
    api: &ApiClient,
    account: Option<i64>,
    file: &Path,
    script: Option<&Path>,
    partition: PartitionArg,
) -> Result<()> {
    let mut session = stage(api, account, file).await?;

    if let Some(path) = script {
        let steps = script::parse(&tokio::fs::read_to_string(path).await?)?;
        tracing::info!("applying {} step(s) from {}", steps.len(), path.display());
        script::apply(&mut session, api, steps).await?;
    }

    let mut failed = 0;
    for partition in partition.partitions() {
        let staged = session
            .batch()
            .map(|batch| batch.partition(partition).len())
            .unwrap_or_default();
        if staged == 0 {
            println!("{partition}: nothing to import");
            continue;
        }

        match session.commit(api, partition).await {
            Ok(confirmed) => println!("{partition}: {}", confirmed.message),
            Err(StagingError::InvalidRows(issues)) => {
                failed += 1;
                eprintln!("{partition}: {} row(s) need attention", issues.len());
                for issue in issues {
                    eprintln!("  {issue}");
                }
            }
            Err(err) => {
                failed += 1;
                eprintln!("{partition}: {err}");
            }
        }
    }

    if failed > 0 {
        return Err(AppError::Incomplete(failed));
    }
    Ok(())
}
