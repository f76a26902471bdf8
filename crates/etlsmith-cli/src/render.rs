//! Human-readable summaries of build and run-state results.

use etlsmith_core::{FlowBuildResult, RunStateReport};
use std::fmt::Write;

/// Summary of a build, listing every error and warning
pub fn render_result(result: &FlowBuildResult) -> String {
    let mut out = String::new();
    let headline = if result.success {
        "Flow built successfully"
    } else {
        "Flow built with errors"
    };
    let _ = writeln!(out, "{}", headline);
    if let Some(group_id) = &result.process_group_id {
        let _ = writeln!(out, "  process group: {}", group_id);
    }
    let _ = writeln!(
        out,
        "  created: {} processor(s), {} connection(s), {} controller service(s)",
        result.processor_ids.len(),
        result.connection_ids.len(),
        result.controller_service_ids.len()
    );

    if !result.errors.is_empty() {
        let _ = writeln!(out, "Errors:");
        for error in &result.errors {
            let _ = writeln!(out, "  - {}", error);
        }
    }
    if !result.warnings.is_empty() {
        let _ = writeln!(out, "Warnings:");
        for warning in &result.warnings {
            let _ = writeln!(out, "  - {}", warning);
        }
    }
    out
}

/// One-line outcome of a start or stop request, plus any failures
pub fn render_run_report(action: &str, report: &RunStateReport) -> String {
    let mut out = format!("{} {} component(s)\n", action, report.updated.len());
    for error in &report.errors {
        let _ = writeln!(out, "  - {}", error);
    }
    out
}
