//! Stored version inspection and administration

use anyhow::{Context, Result};
use depot::{coordinate::Coordinate, service::admin};

use super::Settings;

/// Show a stored version
pub async fn cmd_show(settings: &Settings, group: &str, artifact: &str, version: &str, json_output: bool) -> Result<()> {
  let store = settings.open_store().await?;
  let coordinate = Coordinate::new(group, artifact);

  let Some(record) = admin::find_version(&store, &coordinate, version).await? else {
    anyhow::bail!("{coordinate}:{version} is not stored");
  };

  if json_output {
    println!("{}", serde_json::to_string_pretty(&record)?);
    return Ok(());
  }

  println!("{}", record.gav());
  println!("  Updated:  {}", record.updated_at);
  if record.excluded {
    println!(
      "  Excluded: {}",
      record.exclusion_reason.as_deref().unwrap_or("no reason given")
    );
  }
  if record.evicted {
    println!("  Evicted");
  }

  println!("  Dependencies ({}):", record.version_data.dependencies.len());
  for dependency in &record.version_data.dependencies {
    println!("    {dependency}");
  }

  let report = &record.transitive_dependencies_report;
  if report.valid {
    println!("  Transitive ({}):", report.dependencies.len());
    for dependency in &report.dependencies {
      println!("    {dependency}");
    }
  } else {
    println!(
      "  Transitive: invalid ({})",
      report.invalid_reason.as_deref().unwrap_or("unknown reason")
    );
  }

  for property in &record.version_data.properties {
    println!("  {} = {}", property.name, property.value);
  }
  Ok(())
}

/// Mark a stored version as unresolvable
pub async fn cmd_exclude(settings: &Settings, group: &str, artifact: &str, version: &str, reason: &str) -> Result<()> {
  let store = settings.open_store().await?;
  let gav = admin::resolve_version(&store, &Coordinate::new(group, artifact), version).await?;

  admin::exclude_version(&store, &gav, reason)
    .await
    .with_context(|| format!("Failed to exclude {gav}"))?;
  settings.save_store(&store).await?;

  println!("Excluded {gav}: {reason}");
  Ok(())
}

/// Retire a stored version from bulk refreshes
pub async fn cmd_evict(settings: &Settings, group: &str, artifact: &str, version: &str) -> Result<()> {
  let store = settings.open_store().await?;
  let gav = admin::resolve_version(&store, &Coordinate::new(group, artifact), version).await?;

  admin::evict_version(&store, &gav)
    .await
    .with_context(|| format!("Failed to evict {gav}"))?;
  settings.save_store(&store).await?;

  println!("Evicted {gav}");
  Ok(())
}
