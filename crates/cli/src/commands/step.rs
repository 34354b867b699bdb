//! Test Step Commands

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;

use crate::client::ApiClient;
use crate::output::{print_list, OutputFormat, TableDisplay};
use stepwright_common::StepDetails;

#[derive(Subcommand)]
pub enum StepCommands {
    /// List the steps of a test case, in execution order
    List {
        /// Test case ID
        #[arg(long)]
        case: i64,
    },
}

/// Step display wrapper for serialization
#[derive(Serialize)]
pub struct StepDisplay {
    pub id: i64,
    pub order: i64,
    pub action: String,
    pub selector: String,
    pub value: String,
    pub description: String,
}

impl From<StepDetails> for StepDisplay {
    fn from(step: StepDetails) -> Self {
        let selector = step
            .selector
            .as_ref()
            .map(|binding| format!("{} ({})", binding.name, binding.page_name))
            .unwrap_or_default();
        let value = step
            .input_value
            .or(step.assertion_value)
            .unwrap_or_default();

        Self {
            id: step.id,
            order: step.order_index,
            action: step.action,
            selector,
            value,
            description: step.description.unwrap_or_default(),
        }
    }
}

impl TableDisplay for StepDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Order", "Action", "Selector", "Value", "Description"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.order.to_string(),
            self.action.clone(),
            self.selector.clone(),
            self.value.clone(),
            self.description.clone(),
        ]
    }
}

pub async fn execute(cmd: StepCommands, client: &ApiClient, format: OutputFormat) -> Result<()> {
    match cmd {
        StepCommands::List { case } => {
            let steps = client.list_steps(case).await?;
            let displays: Vec<StepDisplay> = steps.into_iter().map(StepDisplay::from).collect();
            print_list(&displays, format);
        }
    }

    Ok(())
}
