use super::{Context, print_output};
use colored::Colorize;
use deployflow_cloud::{FindGroupsTask, NamedCondition};

pub async fn handle(
    ctx: &Context,
    tags: Vec<NamedCondition>,
    tag_set: Option<String>,
    property: String,
) -> anyhow::Result<()> {
    let mut task = FindGroupsTask {
        property_name: property,
        delimiter: ctx.delimiter(),
        ..Default::default()
    };

    if let Some(name) = tag_set {
        let conditions = ctx.config.tag_set(&name).ok_or_else(|| {
            anyhow::anyhow!(
                "Tag set '{}' not found. Available: {}",
                name,
                ctx.config
                    .tag_sets
                    .keys()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        })?;
        tracing::debug!("Using tag set '{}' ({} conditions)", name, conditions.len());
        for condition in conditions {
            task.add_tag(condition);
        }
    }
    for tag in tags {
        task.add_tag(tag);
    }
    task.validate()?;

    let client = ctx.client().await;
    match task.execute(&client).await? {
        Some(output) => print_output(&output),
        None => eprintln!("{}", "ℹ No auto scaling group matched".dimmed()),
    }

    Ok(())
}
