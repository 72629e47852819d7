use super::{Context, print_outcome};
use colored::Colorize;
use deployflow_cloud::WaitForStackTask;

pub async fn handle(
    ctx: &Context,
    stack_name: Option<String>,
    status: Option<String>,
) -> anyhow::Result<()> {
    let task = WaitForStackTask {
        stack_name,
        status,
        delimiter: ctx.delimiter(),
        poll: ctx.poll(),
        ..Default::default()
    };
    task.validate()?;

    let stack_name = task.stack_name.as_deref().unwrap_or_default();
    eprintln!("{}", format!("Waiting for stack '{}'...", stack_name).blue());

    let client = ctx.client().await;
    let outcome = task.execute(&client, &ctx.watcher).await?;
    print_outcome(stack_name, &outcome);

    Ok(())
}
