//! The describe → review → build conversation.
//!
//! Input and output are injected so the whole loop runs against in-memory
//! buffers in tests.

use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::Context;
use etlsmith_core::{FlowBuildResult, FlowBuilder, FlowDefinition};
use etlsmith_monitoring::LogExt;
use etlsmith_planner::FlowPlanner;
use tracing::{info, instrument, warn};

use crate::render::{render_result, render_run_report};

/// Behavior switches taken from the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionOptions {
    /// Build without asking for confirmation
    pub assume_yes: bool,
    /// Start the flow after a successful build without asking
    pub start: bool,
}

/// What happened to one description
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The user declined to build the plan
    Declined,
    /// The plan was built; the result may still carry errors
    Built(FlowBuildResult),
}

pub struct Session {
    planner: Arc<dyn FlowPlanner>,
    builder: FlowBuilder,
    options: SessionOptions,
}

fn ask(input: &mut impl BufRead, output: &mut impl Write, question: &str) -> anyhow::Result<bool> {
    write!(output, "{} [y/N] ", question)?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

impl Session {
    pub fn new(planner: Arc<dyn FlowPlanner>, builder: FlowBuilder, options: SessionOptions) -> Self {
        Self {
            planner,
            builder,
            options,
        }
    }

    /// Show `definition`, build it once confirmed, then optionally start it
    #[instrument(skip_all, fields(processors = definition.processors.len()))]
    pub async fn realize(
        &self,
        definition: &FlowDefinition,
        input: &mut impl BufRead,
        output: &mut impl Write,
    ) -> anyhow::Result<Outcome> {
        writeln!(output, "Proposed flow:\n{}", definition)?;

        if !self.options.assume_yes && !ask(input, output, "Build this flow?")? {
            writeln!(output, "Cancelled.")?;
            return Ok(Outcome::Declined);
        }

        let result = self.builder.build_flow(definition).await;
        write!(output, "{}", render_result(&result))?;

        if result.success && !result.processor_ids.is_empty() {
            let start = self.options.start
                || (!self.options.assume_yes && ask(input, output, "Start the flow now?")?);
            if start {
                let report = self.builder.start_flow(&result).await;
                write!(output, "{}", render_run_report("Started", &report))?;
            }
        } else if !result.success {
            warn!(errors = result.errors.len(), "Flow left partially built");
        }

        Ok(Outcome::Built(result))
    }

    /// Plan `description` and realize the result
    pub async fn describe(
        &self,
        description: &str,
        input: &mut impl BufRead,
        output: &mut impl Write,
    ) -> anyhow::Result<Outcome> {
        writeln!(output, "Planning...")?;
        let definition = self
            .planner
            .plan(description)
            .await
            .log_err("Planning failed")
            .context("Failed to plan flow")?;
        self.realize(&definition, input, output).await
    }

    /// Prompt for descriptions until an empty line, `quit` or end of input.
    ///
    /// Planning failures are reported and the loop continues.
    pub async fn run_interactive(
        &self,
        input: &mut impl BufRead,
        output: &mut impl Write,
    ) -> anyhow::Result<Vec<Outcome>> {
        let mut outcomes = Vec::new();
        loop {
            write!(output, "\nDescribe the data flow to build (empty line to exit):\n> ")?;
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                break;
            }
            let description = line.trim();
            if description.is_empty() || description.eq_ignore_ascii_case("quit") || description.eq_ignore_ascii_case("exit") {
                break;
            }

            match self.describe(description, input, output).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => writeln!(output, "Error: {:#}", e)?,
            }
        }
        info!(flows = outcomes.len(), "Session finished");
        Ok(outcomes)
    }
}
