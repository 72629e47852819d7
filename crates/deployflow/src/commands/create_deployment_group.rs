use super::{Context, print_output};
use clap::Args;
use colored::Colorize;
use deployflow_cloud::{CreateDeploymentGroupTask, Ec2TagFilter};

#[derive(Args, Debug)]
pub struct DeploymentGroupArgs {
    #[arg(long)]
    pub application_name: Option<String>,
    #[arg(long)]
    pub deployment_group_name: Option<String>,
    #[arg(long)]
    pub deployment_config_name: Option<String>,
    #[arg(long)]
    pub service_role_arn: Option<String>,
    /// EC2 tag filter, repeatable (KEY=VALUE, KEY or =VALUE)
    #[arg(long = "ec2-tag", value_name = "FILTER", value_parser = crate::parse_tag_filter)]
    pub ec2_tags: Vec<Ec2TagFilter>,
    /// Auto scaling group names, split by the delimiter
    #[arg(long, value_name = "NAMES")]
    pub auto_scaling_groups: Option<String>,
}

pub async fn handle(
    ctx: &Context,
    args: DeploymentGroupArgs,
    property: String,
) -> anyhow::Result<()> {
    let mut task = CreateDeploymentGroupTask {
        application_name: args.application_name,
        deployment_group_name: args.deployment_group_name,
        deployment_config_name: args.deployment_config_name,
        service_role_arn: args.service_role_arn,
        ec2_tag_filters: args.ec2_tags,
        property_name: property,
        ..Default::default()
    };
    if let Some(groups) = &args.auto_scaling_groups {
        task.add_auto_scaling_groups(groups, &ctx.delimiter());
    }
    task.validate()?;

    let client = ctx.client().await;
    let output = task.execute(&client).await?;

    eprintln!("{}", "✓ Deployment group created".green().bold());
    print_output(&output);

    Ok(())
}
