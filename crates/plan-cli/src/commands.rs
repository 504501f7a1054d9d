//! Subcommand implementations
//!
//! Each command writes its result to `out` and returns the process exit code.

use std::io::{Read, Write};
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Utc;
use plan_model::{
    canonicalize, decode_plan, default_plan, encode_plan, validate, ModelError, Plan, PlanEdit,
    PlanHash,
};
use plan_sync::{
    EditSession, HttpPlanTransport, PlanEnvelope, PlanLocator, PlanTransport, SaveOutcome,
    SyncConfig,
};

use crate::cli::{Command, RemoteArgs};

/// Exit code when validation fails
const EXIT_INVALID: u8 = 1;
/// Exit code when a save lost to a concurrent write
const EXIT_CONFLICT: u8 = 3;

pub(crate) async fn run(command: Command, out: &mut impl Write) -> Result<ExitCode> {
    match command {
        Command::Seed { tenant, at, pretty } => {
            let seeded = default_plan(&tenant, at.unwrap_or_else(Utc::now))?;
            write_json(out, seeded.plan(), pretty)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Validate(input) => validate_file(&input.file, out),
        Command::Canonicalize { input, pretty } => {
            let plan = read_plan(&input.file)?;
            write_json(out, &canonicalize(&plan), pretty)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Hash(input) => {
            let plan = read_plan(&input.file)?;
            writeln!(out, "{}", PlanHash::of_plan(&plan)?)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Encode { input, decode } => {
            let text = read_input(&input.file)?;
            if decode {
                write_json(out, &decode_plan(&text)?, true)?;
            } else {
                let plan: Plan = serde_json::from_str(&text).context("input is not a plan")?;
                writeln!(out, "{}", encode_plan(&plan)?)?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Fetch { remote, hash_only } => {
            let (transport, locator) = connect(&remote)?;
            fetch(&transport, &locator, hash_only, out).await
        }
        Command::Move { remote, key, to } => {
            let (transport, locator) = connect(&remote)?;
            move_block(transport, locator, PlanEdit::MoveBlock { key, to }, out).await
        }
    }
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
    }
}

/// Parse and validate; order is left as given
fn read_plan(path: &Path) -> Result<Plan> {
    let text = read_input(path)?;
    let plan = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a plan", path.display()))?;
    validate(&plan)?;
    Ok(plan)
}

fn write_json<T: serde::Serialize>(out: &mut impl Write, value: &T, pretty: bool) -> Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut *out, value)?;
    } else {
        serde_json::to_writer(&mut *out, value)?;
    }
    writeln!(out)?;
    Ok(())
}

fn validate_file(path: &Path, out: &mut impl Write) -> Result<ExitCode> {
    let text = read_input(path)?;
    match plan_model::parse_plan(&text) {
        Ok(plan) => {
            let hash = PlanHash::of_plan(&plan)?;
            writeln!(out, "ok: {} block(s), hash {hash}", plan.blocks.len())?;
            Ok(ExitCode::SUCCESS)
        }
        Err(ModelError::Invalid(errors)) => {
            for violation in errors.violations() {
                writeln!(out, "{violation}")?;
            }
            tracing::warn!(count = errors.violations().len(), "plan failed validation");
            Ok(ExitCode::from(EXIT_INVALID))
        }
        Err(other) => Err(other.into()),
    }
}

fn config_for(remote: &RemoteArgs) -> Result<SyncConfig> {
    let mut config = match &remote.config {
        Some(path) => SyncConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => SyncConfig::new(),
    }
    .with_env()?;
    if let Some(url) = &remote.base_url {
        config = config.with_base_url(url);
    }
    if let Some(tenant) = &remote.tenant {
        config = config.with_tenant(tenant);
    }
    Ok(config)
}

fn connect(remote: &RemoteArgs) -> Result<(HttpPlanTransport, PlanLocator)> {
    let config = config_for(remote)?;
    tracing::debug!(base_url = %config.base_url, tenant = %config.tenant_id, "connecting");
    let transport = HttpPlanTransport::new(&config)?;
    Ok((transport, config.locator()))
}

async fn fetch<T: PlanTransport>(
    transport: &T,
    locator: &PlanLocator,
    hash_only: bool,
    out: &mut impl Write,
) -> Result<ExitCode> {
    let stored = transport
        .fetch_current(locator)
        .await
        .with_context(|| format!("failed to fetch {locator}"))?;
    if hash_only {
        writeln!(out, "{}", stored.hash)?;
    } else {
        write_json(out, &PlanEnvelope::from_stored(&stored)?, true)?;
    }
    Ok(ExitCode::SUCCESS)
}

async fn move_block<T: PlanTransport>(
    transport: T,
    locator: PlanLocator,
    edit: PlanEdit,
    out: &mut impl Write,
) -> Result<ExitCode> {
    let session = EditSession::open(transport, locator).await?;
    session.apply(&edit)?;
    match session.save().await? {
        SaveOutcome::Saved(stored) => {
            writeln!(out, "saved: {}", stored.hash)?;
            Ok(ExitCode::SUCCESS)
        }
        SaveOutcome::Conflicted(report) => {
            writeln!(
                out,
                "conflict: store moved from {} to {}; `{edit}` was not applied",
                report.stale_hash, report.current_hash
            )?;
            Ok(ExitCode::from(EXIT_CONFLICT))
        }
    }
}
