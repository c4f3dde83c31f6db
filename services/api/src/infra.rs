use metrics_exporter_prometheus::PrometheusHandle;
use quest_verifier::config::ModerationConfig;
use quest_verifier::error::AppError;
use quest_verifier::workflows::quest::{
    InMemoryCompletionLedger, KeywordModerator, QuestEvaluationService, SubmissionRequest,
};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type QuestService = QuestEvaluationService<InMemoryCompletionLedger, KeywordModerator>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn build_quest_service(config: &ModerationConfig) -> Arc<QuestService> {
    let ledger = Arc::new(InMemoryCompletionLedger::new());
    let moderator = Arc::new(KeywordModerator::new(&config.blocked_terms));
    Arc::new(QuestEvaluationService::new(
        ledger,
        moderator,
        config.timeout,
    ))
}

/// Reads and validates a submission payload from disk.
pub(crate) fn read_submission(path: &Path) -> Result<SubmissionRequest, AppError> {
    let raw = std::fs::read(path)?;
    let request: SubmissionRequest = serde_json::from_slice(&raw)?;
    request.validate()?;
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    fn moderation_config() -> ModerationConfig {
        ModerationConfig {
            timeout: Duration::from_millis(500),
            blocked_terms: vec!["spam".to_string()],
        }
    }

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("{}-{name}", uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes()).expect("write temp file");
        path
    }

    #[tokio::test]
    async fn configured_blocklist_vetoes_submissions() {
        let service = build_quest_service(&moderation_config());
        let path = write_temp(
            "spam.json",
            &serde_json::json!({
                "questId": uuid::Uuid::new_v4(),
                "userId": uuid::Uuid::new_v4(),
                "claimed_at": "2024-06-15T12:00:00Z",
                "access_condition": [],
                "user_data": { "completed_quests": [], "nfts": [], "level": 2 },
                "submission_text": "wow go go SPAM"
            })
            .to_string(),
        );

        let request = read_submission(&path).expect("submission loads");
        let result = service.evaluate(&request).await.expect("evaluation runs");
        std::fs::remove_file(&path).ok();

        assert_eq!(result.score, 0);
    }

    #[test]
    fn read_submission_rejects_invalid_payloads() {
        let path = write_temp("broken.json", "{ \"questId\": 1 }");
        let result = read_submission(&path);
        std::fs::remove_file(&path).ok();

        assert!(matches!(result, Err(AppError::Payload(_))));
    }

    #[test]
    fn read_submission_applies_boundary_validation() {
        let path = write_temp(
            "level.json",
            &serde_json::json!({
                "questId": uuid::Uuid::new_v4(),
                "userId": uuid::Uuid::new_v4(),
                "claimed_at": "2024-06-15T12:00:00Z",
                "user_data": { "nfts": ["0xabc"], "level": 0 },
                "submission_text": "hello"
            })
            .to_string(),
        );
        let result = read_submission(&path);
        std::fs::remove_file(&path).ok();

        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
