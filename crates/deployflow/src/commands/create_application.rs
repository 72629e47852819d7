use super::{Context, print_output};
use colored::Colorize;
use deployflow_cloud::CreateApplicationTask;

pub async fn handle(
    ctx: &Context,
    application_name: Option<String>,
    property: String,
) -> anyhow::Result<()> {
    let task = CreateApplicationTask {
        application_name,
        property_name: property,
    };
    task.validate()?;

    let client = ctx.client().await;
    let output = task.execute(&client).await?;

    eprintln!("{}", "✓ Application created".green().bold());
    print_output(&output);

    Ok(())
}
