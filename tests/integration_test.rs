// Integration tests for aidx
use aidx::prelude::*;
use aidx::{CorpusStore, EngineStatus, ReviewStatus, Vector};
use aidx_storage::METADATA_FILE;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

fn config(top_k: usize) -> EngineConfig {
    EngineConfig {
        top_k,
        ..EngineConfig::default()
    }
}

fn historical_cases() -> Vec<Case> {
    vec![
        Case::new("2024-00001", 12000.0, 8, Decision::Approved)
            .with_enquiry_feedback("Family lives in a rented room, father is a daily wager")
            .with_officer_comment("Genuine need, approve"),
        Case::new("2024-00002", 9500.0, 7, Decision::Approved)
            .with_enquiry_feedback("Widow supporting children, no other income")
            .with_officer_comment("Genuine need, approve"),
        Case::new("2024-00003", 65000.0, 4, Decision::Rejected)
            .with_enquiry_feedback("Owns house and car, stable salaried job")
            .with_officer_comment("Income above threshold"),
        Case::new("2024-00004", 14000.0, 9, Decision::Approved)
            .with_verification_notes("Documents verified, medical expenses high")
            .with_officer_comment("Approve for medical support"),
        Case::new("2024-00005", 48000.0, 3, Decision::Rejected)
            .with_enquiry_feedback("Business owner, family well settled")
            .with_officer_comment("Income above threshold"),
    ]
}

fn trained_engine(top_k: usize) -> DecisionEngine {
    let engine = DecisionEngine::with_hashing_embedder(config(top_k)).unwrap();
    engine.train(historical_cases()).unwrap();
    engine
}

/// Delegates to a hashing embedder until switched offline
struct FlakyEmbedder {
    inner: HashingEmbedder,
    offline: AtomicBool,
}

impl TextEmbedder for FlakyEmbedder {
    fn model_id(&self) -> &str {
        self.inner.model_id()
    }

    fn dim(&self) -> usize {
        self.inner.dim()
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Vector>> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Provider("embedding service unavailable".to_string()));
        }
        self.inner.encode(texts)
    }
}

#[test]
fn test_two_case_tie_rejects() {
    let engine = DecisionEngine::with_hashing_embedder(config(2)).unwrap();
    engine
        .train(vec![
            Case::new("A", 15000.0, 8, Decision::Approved),
            Case::new("B", 25000.0, 6, Decision::Rejected),
        ])
        .unwrap();

    let query = CaseProfile::new().with_income(15000.0).with_family_members(8);
    let result = engine.try_predict(&query).unwrap();

    assert_eq!(result.recommendation, Recommendation::Rejected);
    assert_eq!(result.confidence, 0.5);
    assert_eq!(result.approved_matches, 1);
    assert_eq!(result.rejected_matches, 1);
    assert_eq!(result.similar_cases_count, 2);
    // Identical profile text ranks first
    assert_eq!(result.top_similar_cases[0].case.case_id, "A");
    assert!(result.explanation.contains("• Monthly Income: PKR 15,000"));
    assert!(result.explanation.contains("• Average income in similar cases: PKR 20,000"));
    assert!(result.explanation.ends_with("💡 AI Recommendation: REJECT this case"));
}

#[test]
fn test_cohort_size_is_clamped_to_corpus() {
    let engine = trained_engine(20);
    let query = CaseProfile::new().with_income(10000.0).with_family_members(7);
    let result = engine.try_predict(&query).unwrap();

    assert_eq!(result.similar_cases_count, 5);
    assert_eq!(result.top_similar_cases.len(), 5);
    assert_eq!(result.approved_matches + result.rejected_matches, 5);
    assert_eq!(result.recommendation, Recommendation::Approved);
    assert!((result.confidence - 0.6).abs() < 1e-9);
}

#[test]
fn test_prediction_invariants() {
    let engine = trained_engine(3);
    let queries = [
        CaseProfile::new(),
        CaseProfile::new().with_income(70000.0),
        CaseProfile::new()
            .with_family_members(6)
            .with_enquiry_feedback("Widow, children in school"),
    ];

    for query in &queries {
        let result = engine.try_predict(query).unwrap();
        assert_eq!(result.top_similar_cases.len(), 3);
        assert_eq!(result.approved_matches + result.rejected_matches, 3);
        assert!(result.confidence >= 0.5 && result.confidence <= 1.0);

        let scores: Vec<f32> = result
            .top_similar_cases
            .iter()
            .map(|c| c.similarity_score)
            .collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
        assert!(scores.iter().all(|s| (-1.0..=1.0).contains(s)));
    }
}

#[test]
fn test_predict_before_training_is_error_response() {
    let engine = DecisionEngine::with_hashing_embedder(config(20)).unwrap();
    let query = CaseProfile::new().with_income(10000.0);

    assert!(matches!(engine.try_predict(&query), Err(Error::NotTrained)));

    let response = engine.predict(&query).to_response();
    assert_eq!(response.ai_recommendation, Recommendation::Error);
    assert_eq!(response.confidence, 0.0);
    assert_eq!(response.similar_cases_count, 0);
    assert!(response.top_similar_cases.is_empty());
    assert!(response
        .explanation
        .starts_with("Error generating recommendation: Engine not trained"));
}

#[test]
fn test_save_and_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let engine = trained_engine(3);
    let metadata = engine.save(dir.path()).unwrap();
    assert_eq!(metadata.rows, 5);
    assert_eq!(metadata.dim, 384);

    let restored = DecisionEngine::with_hashing_embedder(config(3)).unwrap();
    let report = restored.load(dir.path()).unwrap();
    assert_eq!(report.cases, 5);
    assert!(!report.model_mismatch);
    assert_eq!(report.snapshot_id, metadata.snapshot_id.to_string());

    let query = CaseProfile::new()
        .with_income(11000.0)
        .with_family_members(8)
        .with_enquiry_feedback("Daily wager, rented room");
    let before = engine.try_predict(&query).unwrap();
    let mut after = restored.try_predict(&query).unwrap();

    // Everything but the timestamp must match
    after.generated_at = before.generated_at;
    assert_eq!(before, after);
    assert_eq!(engine.stats().unwrap(), restored.stats().unwrap());
}

#[test]
fn test_load_with_missing_artifact() {
    let dir = tempfile::tempdir().unwrap();
    trained_engine(3).save(dir.path()).unwrap();
    std::fs::remove_file(dir.path().join(METADATA_FILE)).unwrap();

    let engine = DecisionEngine::with_hashing_embedder(config(3)).unwrap();
    match engine.load(dir.path()) {
        Err(Error::ArtifactMissing { paths }) => {
            assert_eq!(paths, vec![dir.path().join(METADATA_FILE)]);
        }
        other => panic!("expected ArtifactMissing, got {:?}", other),
    }
    assert_eq!(engine.status(), EngineStatus::Uninitialized);
    assert!(!engine.predict(&CaseProfile::new()).is_ok());
}

#[test]
fn test_retraining_is_idempotent() {
    let engine = trained_engine(3);
    let query = CaseProfile::new().with_income(50000.0).with_family_members(3);
    let first = engine.try_predict(&query).unwrap();

    engine.train(historical_cases()).unwrap();
    let second = engine.try_predict(&query).unwrap();

    assert_eq!(engine.case_count(), 5);
    assert_eq!(first.recommendation, second.recommendation);
    assert_eq!(first.explanation, second.explanation);
    assert_eq!(first.top_similar_cases, second.top_similar_cases);
}

#[test]
fn test_retraining_replaces_corpus() {
    let engine = trained_engine(3);
    engine
        .train(vec![Case::new("only", 1000.0, 2, Decision::Rejected)])
        .unwrap();

    let result = engine.try_predict(&CaseProfile::new()).unwrap();
    assert_eq!(result.similar_cases_count, 1);
    assert_eq!(result.recommendation, Recommendation::Rejected);
    assert_eq!(result.confidence, 1.0);
}

#[test]
fn test_provider_failure_yields_error_response() {
    let embedder = Arc::new(FlakyEmbedder {
        inner: HashingEmbedder::new(64),
        offline: AtomicBool::new(false),
    });
    let engine = DecisionEngine::new(config(3), embedder.clone()).unwrap();
    engine.train(historical_cases()).unwrap();

    embedder.offline.store(true, Ordering::SeqCst);
    let prediction = engine.predict(&CaseProfile::new().with_income(9000.0));

    assert_eq!(prediction.recommendation(), Recommendation::Error);
    let json = serde_json::to_value(&prediction).unwrap();
    assert_eq!(json["ai_recommendation"], "ERROR");
    assert_eq!(
        json["explanation"],
        "Error generating recommendation: Embedding provider error: embedding service unavailable"
    );

    // Corpus survives the outage
    embedder.offline.store(false, Ordering::SeqCst);
    assert!(engine.predict(&CaseProfile::new().with_income(9000.0)).is_ok());
}

#[test]
fn test_model_mismatch_is_reported_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    trained_engine(3).save(dir.path()).unwrap();

    let narrow = DecisionEngine::new(config(3), Arc::new(HashingEmbedder::new(64))).unwrap();
    let report = narrow.load(dir.path()).unwrap();
    assert!(report.model_mismatch);
    assert_eq!(report.stored_model_id, "hashing-trigram-384");
    assert_eq!(narrow.case_count(), 5);

    // Queries are now 64 wide against a 384-wide corpus
    let query = CaseProfile::new().with_income(9000.0);
    assert!(matches!(
        narrow.try_predict(&query),
        Err(Error::DimensionMismatch { .. })
    ));
    assert_eq!(narrow.predict(&query).recommendation(), Recommendation::Error);
}

#[test]
fn test_snapshot_is_readable_by_store() {
    let dir = tempfile::tempdir().unwrap();
    let engine = trained_engine(3);
    engine.save(dir.path()).unwrap();

    let stored = CorpusStore::new(dir.path()).load().unwrap();
    assert_eq!(stored.corpus.len(), 5);
    assert_eq!(stored.corpus.get(2).unwrap().0.case_id, "2024-00003");
}

#[test]
fn test_triage_of_confident_prediction() {
    let engine = DecisionEngine::with_hashing_embedder(config(1)).unwrap();
    engine.train(historical_cases()).unwrap();

    let prediction = engine.predict(&CaseProfile::new().with_income(12000.0));
    let triage = aidx::triage(&prediction, engine.config().review_threshold);

    assert_eq!(prediction.confidence(), 1.0);
    assert_ne!(triage.status, ReviewStatus::NeedsReview);
}

#[test]
fn test_dataset_file_trains_engine() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cases.json");
    std::fs::write(
        &path,
        r#"[
            {"income": 15000, "family_members": 8, "final_decision": "Approved",
             "decision_officer_comment": "Approve"},
            {"income": 25000, "family_members": 6, "final_decision": "rejected"}
        ]"#,
    )
    .unwrap();

    let cases = aidx::load_cases(&path).unwrap();
    assert_eq!(cases[0].case_id, "case-00001");
    assert_eq!(cases[1].final_decision, Decision::Rejected);

    let engine = DecisionEngine::with_hashing_embedder(config(20)).unwrap();
    let stats = engine.train(cases).unwrap();
    assert_eq!(stats.total_cases, 2);
    assert_eq!(stats.approval_rate, 50.0);
}
