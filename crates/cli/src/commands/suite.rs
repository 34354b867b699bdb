//! Test Suite Commands

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;

use crate::client::ApiClient;
use crate::output::{print_item, print_list, OutputFormat, TableDisplay};
use stepwright_common::TestSuite;

#[derive(Subcommand)]
pub enum SuiteCommands {
    /// List all test suites
    List,

    /// Show a test suite
    Show {
        /// Suite ID
        id: i64,
    },
}

/// Suite display wrapper for serialization
#[derive(Serialize)]
pub struct SuiteDisplay {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub created: String,
}

impl From<TestSuite> for SuiteDisplay {
    fn from(suite: TestSuite) -> Self {
        Self {
            id: suite.id,
            name: suite.name,
            description: suite.description.unwrap_or_default(),
            created: format_timestamp(suite.created_at),
        }
    }
}

impl TableDisplay for SuiteDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Name", "Description", "Created"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.description.clone(),
            self.created.clone(),
        ]
    }
}

/// Epoch seconds as a readable UTC stamp; raw value if out of range
pub fn format_timestamp(epoch_seconds: i64) -> String {
    chrono::DateTime::from_timestamp(epoch_seconds, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| epoch_seconds.to_string())
}

pub async fn execute(cmd: SuiteCommands, client: &ApiClient, format: OutputFormat) -> Result<()> {
    match cmd {
        SuiteCommands::List => {
            let suites = client.list_suites().await?;
            let displays: Vec<SuiteDisplay> = suites.into_iter().map(SuiteDisplay::from).collect();
            print_list(&displays, format);
        }

        SuiteCommands::Show { id } => {
            let suite = client.get_suite(id).await?;
            let display = SuiteDisplay::from(suite);
            print_item(&display, format);
        }
    }

    Ok(())
}
