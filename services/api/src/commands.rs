use crate::infra::{build_quest_service, read_submission};
use clap::Args;
use quest_verifier::config::AppConfig;
use quest_verifier::error::AppError;
use quest_verifier::workflows::quest::{ScoreBreakdown, ScoringEngine, PASS_THRESHOLD};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Submission text to score
    #[arg(long)]
    pub(crate) text: String,
}

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// Path to a JSON submission payload
    #[arg(long)]
    pub(crate) request: PathBuf,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let breakdown = ScoringEngine::new().score(&args.text);
    print!("{}", render_breakdown(&breakdown));
    Ok(())
}

pub(crate) async fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let request = read_submission(&args.request)?;
    let service = build_quest_service(&config.moderation);

    let report = service.evaluate_with_breakdown(&request).await?;

    println!("Quest {} / user {}", request.quest_id, request.user_id);
    match &report.breakdown {
        Some(breakdown) => print!("{}", render_breakdown(breakdown)),
        None => println!("Not scored: access gated or attempt already consumed"),
    }
    println!("{}", serde_json::to_string_pretty(&report.result)?);
    Ok(())
}

fn render_breakdown(breakdown: &ScoreBreakdown) -> String {
    let mut output = String::from("Score breakdown\n");
    if breakdown.components.is_empty() {
        output.push_str("- no heuristics matched\n");
    }
    for component in &breakdown.components {
        output.push_str(&format!(
            "- {:?}: +{} ({})\n",
            component.rule, component.points, component.notes
        ));
    }
    let verdict = if breakdown.total >= PASS_THRESHOLD {
        "meets"
    } else {
        "below"
    };
    output.push_str(&format!(
        "Total {} ({} pass threshold {}, before moderation)\n",
        breakdown.total, verdict, PASS_THRESHOLD
    ));
    output
}
