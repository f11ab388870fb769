//! Implementation of the `near-fees query` command.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::context::AppContext;
use crate::cli::output::{create_spinner_with_message, output, CommandOutput, ProgressBarExt, TableFormatter};
use crate::domain::models::{QueryResult, QuerySource};

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// SQL to run
    #[arg(required_unless_present = "file", conflicts_with = "file")]
    pub sql: Option<String>,

    /// Read the SQL from a file
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,
}

impl QueryArgs {
    pub fn source(&self) -> Option<QuerySource> {
        match (&self.sql, &self.file) {
            (Some(sql), _) => Some(QuerySource::Text(sql.clone())),
            (None, Some(path)) => Some(QuerySource::File(path.clone())),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QueryOutput {
    pub row_count: usize,
    #[serde(flatten)]
    pub result: QueryResult,
}

impl CommandOutput for QueryOutput {
    fn to_human(&self) -> String {
        if self.result.columns.is_empty() {
            return "Statement returned no result set".to_string();
        }
        format!(
            "{}\n{} row(s)",
            TableFormatter::new().format_result(&self.result),
            self.row_count
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: QueryArgs, context: &AppContext, json_mode: bool) -> Result<()> {
    let source = args.source().context("Provide SQL text or --file")?;
    let service = context.query_service()?;

    let spinner = create_spinner_with_message("Running query...", json_mode);
    let result = match service.run(source).await {
        Ok(result) => result,
        Err(err) => {
            spinner.finish_error("Query failed");
            return Err(err).context("Failed to run query");
        }
    };
    spinner.finish_success(format!("Returned {} rows", result.len()));

    let query_output = QueryOutput {
        row_count: result.len(),
        result: (*result).clone(),
    };
    output(&query_output, json_mode);
    Ok(())
}
