//! Routes command implementation

use clap::Args;

use super::{Cli, CliError, SiteArgs};
use crate::harvest::Harvester;
use crate::FetchTarget;

/// Routes command arguments
#[derive(Args, Debug, Clone)]
pub struct RoutesArgs {
    /// Site, filter and credential flags
    #[command(flatten)]
    pub site: SiteArgs,

    /// Print the targets as a JSON array
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

impl RoutesArgs {
    /// Discover the fetch targets and print them
    pub async fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let config = self.site.resolve(cli.config.as_deref())?;
        let targets = Harvester::new(config).discover().await?;

        if self.json {
            let json = serde_json::to_string_pretty(&targets)
                .map_err(|e| CliError::InvalidArgument(format!("cannot encode targets: {e}")))?;
            println!("{json}");
        } else {
            for target in &targets {
                println!("{}", format_target(target));
            }
        }
        Ok(())
    }
}

/// One line per target: type, URL and option page id when set
pub fn format_target(target: &FetchTarget) -> String {
    match &target.option_page_id {
        Some(id) => format!("{}\t{}\t(option page: {id})", target.type_name, target.url),
        None => format!("{}\t{}", target.type_name, target.url),
    }
}
