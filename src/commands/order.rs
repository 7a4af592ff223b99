use crate::core::context::ReleaseContext;
use crate::core::error::ReleaseResult;
use crate::graph::resolve_publish_order;

/// Print the publish order, one package per line
pub fn run_order(ctx: &ReleaseContext, json: bool) -> ReleaseResult<()> {
  let order = resolve_publish_order(&ctx.metadata, &ctx.config.publish.order)?;

  if json {
    println!("{}", serde_json::to_string_pretty(&order)?);
    return Ok(());
  }

  let source = if ctx.config.publish.order.is_empty() {
    "computed from dependencies"
  } else {
    "configured"
  };
  println!("📋 Publish order ({}):", source);
  for (position, name) in order.iter().enumerate() {
    println!("   {}. {}", position + 1, name);
  }

  Ok(())
}
