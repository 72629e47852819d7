use super::{Context, print_outcome};
use colored::Colorize;
use deployflow_cloud::WaitForDeploymentTask;

pub async fn handle(
    ctx: &Context,
    deployment_id: Option<String>,
    status: Option<String>,
) -> anyhow::Result<()> {
    let task = WaitForDeploymentTask {
        deployment_id,
        status,
        delimiter: ctx.delimiter(),
        poll: ctx.poll(),
        ..Default::default()
    };
    task.validate()?;

    let deployment_id = task.deployment_id.as_deref().unwrap_or_default();
    eprintln!(
        "{}",
        format!("Waiting for deployment '{}'...", deployment_id).blue()
    );

    let client = ctx.client().await;
    let outcome = task.execute(&client, &ctx.watcher).await?;
    print_outcome(deployment_id, &outcome);

    Ok(())
}
