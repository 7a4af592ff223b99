//! `cargo publish-gate publish`

use crate::core::context::ReleaseContext;
use crate::core::error::ReleaseResult;
use crate::core::preflight::{self, PUBLISH_TOOLS};
use crate::core::vcs::SystemGit;
use crate::graph::resolve_publish_order;
use crate::registry::Registry;
use crate::registry::index::SparseIndex;
use crate::registry::publisher::{CargoPublisher, PublishOutcome};
use crate::release::workflow::{PackageSelection, PublishWorkflow};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Machine-readable summary of a publish run
#[derive(Serialize)]
struct PublishReport<'a> {
  registry: &'a str,
  dry_run: bool,
  timestamp: DateTime<Utc>,
  outcomes: &'a [PublishOutcome],
}

pub fn run_publish(
  ctx: &mut ReleaseContext,
  package: String,
  registry: Option<String>,
  dry_run: bool,
  json: bool,
) -> ReleaseResult<()> {
  preflight::require_tools(PUBLISH_TOOLS)?;

  let registry_name = registry.unwrap_or_else(|| ctx.config.publish.default_registry.clone());
  let registry = Registry::resolve(&registry_name, &ctx.config, &ctx.root)?;
  let order = resolve_publish_order(&ctx.metadata, &ctx.config.publish.order)?;
  let selection = PackageSelection::parse(&package);

  let git = SystemGit::open(&ctx.root)?;
  let index = SparseIndex::new(&ctx.config.publish.user_agent)?;
  let mut client = CargoPublisher::new(ctx.root.clone(), dry_run);

  if !json {
    let target = match &selection {
      PackageSelection::All => format!("{} package(s)", order.len()),
      PackageSelection::One(name) => name.clone(),
    };
    let mode = if dry_run { " (dry run)" } else { "" };
    println!("📦 Publishing {} to {}{}\n", target, registry.name, mode);
  }

  let outcomes = PublishWorkflow::new(&git, &index, &mut client, &order)
    .quiet(json)
    .run(&mut ctx.metadata, &selection, &registry)?;

  if json {
    let report = PublishReport {
      registry: &registry.name,
      dry_run,
      timestamp: Utc::now(),
      outcomes: &outcomes,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    return Ok(());
  }

  let published = outcomes
    .iter()
    .filter(|o| !matches!(o, PublishOutcome::Skipped { .. }))
    .count();
  let skipped = outcomes.len() - published;

  println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
  if dry_run {
    println!("Summary: {} verified, {} already published", published, skipped);
  } else {
    println!("Summary: {} published, {} already published", published, skipped);
  }

  Ok(())
}
