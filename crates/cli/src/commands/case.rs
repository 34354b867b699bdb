//! Test Case Commands

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;

use crate::client::ApiClient;
use crate::commands::suite::format_timestamp;
use crate::output::{print_list, OutputFormat, TableDisplay};
use stepwright_common::TestCase;

#[derive(Subcommand)]
pub enum CaseCommands {
    /// List the test cases of a suite
    List {
        /// Suite ID
        #[arg(long)]
        suite: i64,
    },
}

/// Case display wrapper for serialization
#[derive(Serialize)]
pub struct CaseDisplay {
    pub id: i64,
    pub suite_id: i64,
    pub name: String,
    pub description: String,
    pub created: String,
}

impl From<TestCase> for CaseDisplay {
    fn from(case: TestCase) -> Self {
        Self {
            id: case.id,
            suite_id: case.suite_id,
            name: case.name,
            description: case.description.unwrap_or_default(),
            created: format_timestamp(case.created_at),
        }
    }
}

impl TableDisplay for CaseDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Suite", "Name", "Description", "Created"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.suite_id.to_string(),
            self.name.clone(),
            self.description.clone(),
            self.created.clone(),
        ]
    }
}

pub async fn execute(cmd: CaseCommands, client: &ApiClient, format: OutputFormat) -> Result<()> {
    match cmd {
        CaseCommands::List { suite } => {
            let cases = client.list_cases(suite).await?;
            let displays: Vec<CaseDisplay> = cases.into_iter().map(CaseDisplay::from).collect();
            print_list(&displays, format);
        }
    }

    Ok(())
}
