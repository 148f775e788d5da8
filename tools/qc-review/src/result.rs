//! 运行结果.

use cell_berry::review::RunSummary;
use std::io::{self, Write};

/// 将 `summary` 的结果写进 `w` 中.
fn describe_into<W: Write>(summary: &RunSummary, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    writeln!(w, "Review run: {summary}")?;
    if !summary.reviewed.is_empty() {
        writeln!(w, "Finalized:")?;
        for id in summary.reviewed.iter() {
            writeln!(w, "{S4}{id}")?;
        }
    }
    if !summary.deferred.is_empty() {
        writeln!(w, "Deferred (will be offered again next run):")?;
        for d in summary.deferred.iter() {
            writeln!(w, "{S4}{d}")?;
        }
    }
    if !summary.failed.is_empty() {
        writeln!(w, "Failed (fix the input and rerun):")?;
        for f in summary.failed.iter() {
            writeln!(w, "{S4}{f}")?;
        }
    }
    Ok(())
}

/// 分析运行结果.
pub fn analyze(summary: &RunSummary) {
    let mut out = io::stdout().lock();
    let written = utils::sep_to(&mut out)
        .and_then(|_| describe_into(summary, &mut out))
        .and_then(|_| utils::sep_to(&mut out));
    if let Err(e) = written {
        log::error!("failed to describe run summary: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::describe_into;
    use cell_berry::review::{DeferReason, Deferred, ImageFailure, RunSummary};
    use cell_berry::QcError;

    #[test]
    fn test_describe() {
        let summary = RunSummary {
            reviewed: vec!["a".to_owned()],
            skipped: vec!["b".to_owned()],
            deferred: vec![Deferred {
                id: "c".to_owned(),
                reason: DeferReason::Abandoned,
            }],
            failed: vec![ImageFailure {
                id: "d".to_owned(),
                error: QcError::MissingImage("d".to_owned()),
            }],
        };
        let mut buf = Vec::new();
        describe_into(&summary, &mut buf).unwrap();
        let s = String::from_utf8(buf).unwrap();
        assert!(s.starts_with("Review run: 4 image(s): 1 reviewed, 1 skipped, 1 deferred, 1 failed"));
        assert!(s.contains("    c: review abandoned"));
        assert!(s.contains("    d: image `d` not found in input"));
    }
}
