use anyhow::{Context, Result};
use chrono_tz::Tz;
use lushsync_core::reconcile::{reconcile, ReconcilePlan};
use lushsync_core::{SyncError, SyncResult};
use lushsync_provider_google::CalendarWriter;
use owo_colors::OwoColorize;

use crate::config::{self, Config, UserConfig};

/// What one user's sync pass did.
pub struct SyncStats {
    pub created: usize,
    pub deleted: usize,
}

/// Totals across the configured users. Failures are counted, never fatal:
/// one user's broken login must not stop the remaining users.
#[derive(Default)]
struct RunSummary {
    created: usize,
    deleted: usize,
    failed: usize,
}

impl RunSummary {
    fn absorb(&mut self, outcome: SyncResult<SyncStats>) {
        match outcome {
            Ok(stats) => {
                println!("   {} created, {} deleted", stats.created, stats.deleted);
                self.created += stats.created;
                self.deleted += stats.deleted;
            }
            Err(e) => {
                println!("   {}", e.to_string().red());
                self.failed += 1;
            }
        }
    }
}

pub async fn run(only_user: Option<&str>) -> Result<()> {
    let cfg = config::load_config()?;
    let tz = cfg.timezone()?;
    let users = resolve_users(&cfg, only_user)?;
    let password = resolve_password(&cfg)?;

    let google_cfg = cfg.google()?;
    let writer = CalendarWriter::connect(&google_cfg)
        .await
        .map_err(|e| SyncError::Auth(format!("{:#}", e)))?;

    let mut summary = RunSummary::default();

    for (i, user) in users.iter().enumerate() {
        println!("Syncing {}", user.username);
        summary.absorb(sync_user(&writer, &cfg, user, &password, tz).await);

        if i < users.len() - 1 {
            println!();
        }
    }

    println!(
        "\nDone: {} events created, {} deleted across {} user(s)",
        summary.created,
        summary.deleted,
        users.len()
    );

    if summary.failed > 0 {
        println!(
            "{}",
            format!(
                "{} user(s) failed; the next run re-compares against the portal and self-heals",
                summary.failed
            )
            .red()
        );
    }

    Ok(())
}

/// One user's full pass: scrape, reconcile, apply.
///
/// No rollback on a partial failure; whatever was applied stays and the next
/// run's reconciliation converges on the portal's truth again.
async fn sync_user(
    writer: &CalendarWriter,
    cfg: &Config,
    user: &UserConfig,
    password: &str,
    tz: Tz,
) -> SyncResult<SyncStats> {
    let truth = lushsync_portal::scrape(&cfg.portal, &user.username, password, tz).await?;

    if truth.is_empty() {
        println!("   No upcoming shifts on the portal");
    }

    let existing = writer
        .list_upcoming(&user.calendar_id)
        .await
        .map_err(api_err)?;

    let plan = reconcile(&existing, &truth, tz);

    apply_plan(writer, &user.calendar_id, &plan).await
}

async fn apply_plan(
    writer: &CalendarWriter,
    calendar_id: &str,
    plan: &ReconcilePlan,
) -> SyncResult<SyncStats> {
    let mut stats = SyncStats {
        created: 0,
        deleted: 0,
    };

    for event_id in &plan.to_delete {
        writer.delete(calendar_id, event_id).await.map_err(api_err)?;
        stats.deleted += 1;
    }

    for (date_key, shift) in &plan.to_create {
        let link = writer
            .insert_shift(calendar_id, shift)
            .await
            .map_err(api_err)?;
        println!("   Created {}: {}", date_key, link);
        stats.created += 1;
    }

    Ok(stats)
}

fn api_err(e: anyhow::Error) -> SyncError {
    SyncError::Api(format!("{:#}", e))
}

fn resolve_users(cfg: &Config, only: Option<&str>) -> SyncResult<Vec<UserConfig>> {
    if cfg.users.is_empty() {
        return Err(SyncError::Config(
            "No users configured. Add [[users]] entries to config.toml".to_string(),
        ));
    }

    match only {
        None => Ok(cfg.users.clone()),
        Some(name) => match cfg.users.iter().find(|u| u.username == name) {
            Some(user) => Ok(vec![user.clone()]),
            None => {
                let available: Vec<&str> =
                    cfg.users.iter().map(|u| u.username.as_str()).collect();
                Err(SyncError::Config(format!(
                    "Unknown user {:?}. Configured users: {}",
                    name,
                    available.join(", ")
                )))
            }
        },
    }
}

fn resolve_password(cfg: &Config) -> Result<String> {
    if let Some(var) = &cfg.password_env {
        match std::env::var(var) {
            Ok(password) if !password.is_empty() => return Ok(password),
            _ => eprintln!("Note: {} is not set, falling back to a prompt", var),
        }
    }

    rpassword::prompt_password("Portal password: ").context("Failed to read portal password")
}
