//! Human-readable rendering of reports.

use std::fmt;

use crate::pipeline::types::{BatchReport, MessageOutcome, ProcessReport};

impl fmt::Display for ProcessReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "From:    {}", self.sender)?;
        if !self.recipients.is_empty() {
            writeln!(f, "To:      {}", self.recipients.join(", "))?;
        }
        writeln!(f, "Subject: {}", self.subject)?;
        writeln!(f, "Date:    {}", self.date.to_rfc3339())?;
        writeln!(f)?;
        writeln!(f, "Summary:")?;
        writeln!(f, "{}", self.summary)?;
        if !self.outline.is_empty() {
            writeln!(f)?;
            writeln!(f, "Outline:")?;
            writeln!(f, "{}", self.outline)?;
        }
        Ok(())
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in &self.outcomes {
            writeln!(f, "=== Message UID {} ===", outcome.uid())?;
            match outcome {
                MessageOutcome::Processed { report, .. } => write!(f, "{report}")?,
                MessageOutcome::Failed { error, .. } => writeln!(f, "Failed: {error}")?,
            }
            writeln!(f)?;
        }
        write!(
            f,
            "{}: {} found, {} processed, {} failed",
            self.mailbox,
            self.found,
            self.processed(),
            self.failures()
        )?;
        if self.aborted {
            write!(f, " (stopped after first failure)")?;
        }
        writeln!(f)
    }
}
