//! Feedback command — `stagehand feedback`.

use anyhow::Result;
use console::style;
use std::path::Path;

use stagehand::feedback::FeedbackClassifier;

pub async fn cmd_feedback(project_dir: &Path, issue: u64, summarize: bool) -> Result<()> {
    let (config, forge) = super::setup(project_dir)?;
    let classifier = FeedbackClassifier::new(forge, config);

    let items = classifier.collect_feedback(issue).await?;
    if items.is_empty() {
        println!("No feedback comments on issue #{}", issue);
        return Ok(());
    }

    for item in &items {
        let team = item.team.as_deref().unwrap_or("-");
        println!(
            "[{} / {} / {}] @{}: {}",
            style(item.kind).bold(),
            item.priority,
            team,
            item.author,
            item.body.lines().next().unwrap_or("")
        );
    }

    if summarize
        && let Some(number) = classifier.file_summary_issue(issue).await?
    {
        println!();
        println!(
            "{} filed summary issue #{}",
            style("summary").green().bold(),
            number
        );
    }

    Ok(())
}
