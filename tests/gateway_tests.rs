//! AI gateway behaviour against a scripted model

mod common;

use common::{auth_error, diagnosis_json, gateway, quota_error, ScriptedModel};
use medizen::gateway::{
    with_retry, DiagnosisRequest, ForecastRisk, GenerateContentResponse, LatLng, MedicineDraft,
    RecordingBackoff,
};
use medizen::records::{initial_profile, ConsultationMode};
use medizen::MediZenError;
use serde_json::json;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

fn symptoms(text: &str) -> DiagnosisRequest {
    DiagnosisRequest {
        symptoms: text.to_string(),
        mode: ConsultationMode::Symptoms,
        attachment: None,
    }
}

#[tokio::test]
async fn test_quota_thunk_runs_retries_plus_one_times() {
    for retries in 0..4 {
        let calls = AtomicU32::new(0);
        let backoff = RecordingBackoff::new();

        let result: medizen::Result<()> = with_retry(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(quota_error()) }
            },
            retries,
            &backoff,
        )
        .await;

        assert!(matches!(result, Err(MediZenError::QuotaExceeded)));
        assert_eq!(calls.load(Ordering::SeqCst), retries + 1);
        assert_eq!(backoff.attempts(), (1..=retries).collect::<Vec<_>>());
    }
}

#[tokio::test]
async fn test_auth_thunk_runs_exactly_once() {
    let calls = AtomicU32::new(0);
    let backoff = RecordingBackoff::new();

    let result: medizen::Result<()> = with_retry(
        || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(auth_error()) }
        },
        5,
        &backoff,
    )
    .await;

    assert!(matches!(result, Err(MediZenError::AuthenticationFailed)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(backoff.attempts().is_empty());
}

#[tokio::test]
async fn test_quota_then_success_recovers() {
    let model = Arc::new(
        ScriptedModel::new()
            .fail(quota_error())
            .reply_json(diagnosis_json("Cardiologist")),
    );
    let (gateway, backoff) = gateway(model.clone());

    let analysis = gateway
        .diagnose(&symptoms("palpitations"), &initial_profile())
        .await
        .unwrap();

    assert_eq!(analysis.specialty, "Cardiologist");
    assert_eq!(model.call_count(), 2);
    assert_eq!(backoff.attempts(), vec![1]);
}

#[tokio::test]
async fn test_gateway_gives_up_after_configured_retries() {
    let model = Arc::new(ScriptedModel::failing(quota_error()));
    let (gateway, _) = gateway(model.clone());

    let err = gateway.support_reply("hello").await.unwrap_err();

    assert!(matches!(err, MediZenError::QuotaExceeded));
    assert!(err.needs_credential_replacement());
    // default policy: two retries
    assert_eq!(model.call_count(), 3);
}

#[tokio::test]
async fn test_other_errors_pass_through_untouched() {
    let model = Arc::new(ScriptedModel::failing(MediZenError::ApiError {
        status: 503,
        message: "UNAVAILABLE: backend overloaded".into(),
    }));
    let (gateway, _) = gateway(model.clone());

    let err = gateway.support_reply("hello").await.unwrap_err();

    assert!(matches!(err, MediZenError::ApiError { status: 503, .. }));
    assert_eq!(model.call_count(), 1);
}

#[tokio::test]
async fn test_malformed_json_is_a_parse_error() {
    let model = Arc::new(ScriptedModel::new().reply_text("I think you are fine."));
    let (gateway, _) = gateway(model);

    let err = gateway
        .diagnose(&symptoms("headache"), &initial_profile())
        .await
        .unwrap_err();
    assert!(matches!(err, MediZenError::ParseError(_)));
}

#[tokio::test]
async fn test_fenced_json_is_accepted() {
    let fenced = format!("```json\n{}\n```", diagnosis_json("Neurologist"));
    let model = Arc::new(ScriptedModel::new().reply_text(fenced));
    let (gateway, _) = gateway(model);

    let analysis = gateway
        .diagnose(&symptoms("migraine"), &initial_profile())
        .await
        .unwrap();
    assert_eq!(analysis.specialty, "Neurologist");
}

#[tokio::test]
async fn test_speech_is_truncated_and_uses_speech_model() {
    let audio: GenerateContentResponse = serde_json::from_value(json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [{"inlineData": {"mimeType": "audio/pcm;rate=24000", "data": "AAABAA=="}}]
            }
        }]
    }))
    .unwrap();
    let model = Arc::new(ScriptedModel::new().reply(audio));
    let (gateway, _) = gateway(model.clone());

    let clip = gateway.synthesize_speech(&"a".repeat(900)).await.unwrap();
    assert_eq!(clip.data, "AAABAA==");

    let request = model.last_request().unwrap();
    let sent = request.contents[0].parts[0].text.clone().unwrap();
    assert_eq!(sent.chars().count(), 500);
    assert_eq!(model.models_called(), vec![gateway.models().speech.clone()]);
}

#[tokio::test]
async fn test_speech_without_audio_is_a_parse_error() {
    let model = Arc::new(ScriptedModel::new().reply_text("no audio here"));
    let (gateway, _) = gateway(model);

    let err = gateway.synthesize_speech("hello").await.unwrap_err();
    assert!(matches!(err, MediZenError::ParseError(_)));
}

#[tokio::test]
async fn test_clinic_search_reads_map_chunks() {
    let response: GenerateContentResponse = serde_json::from_value(json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": "Two clinics nearby."}]},
            "groundingMetadata": {
                "groundingChunks": [
                    {"maps": {"title": "Heart Care Center", "uri": "https://maps.example/1"}},
                    {"web": {"title": "ignored"}},
                    {"maps": {"title": "City Cardiology"}}
                ]
            }
        }]
    }))
    .unwrap();
    let model = Arc::new(ScriptedModel::new().reply(response));
    let (gateway, _) = gateway(model.clone());

    let search = gateway
        .find_clinics(
            "Cardiologist",
            Some(LatLng {
                latitude: 28.6,
                longitude: 77.2,
            }),
        )
        .await
        .unwrap();

    assert_eq!(search.text, "Two clinics nearby.");
    assert_eq!(search.locations.len(), 2);
    assert_eq!(search.locations[1].title, "City Cardiology");
    assert_eq!(search.locations[1].uri, "");
    assert!(model.last_request().unwrap().tools.is_some());
}

#[tokio::test]
async fn test_forecast_and_medicine_shapes() {
    let model = Arc::new(
        ScriptedModel::new()
            .reply_json(json!({
                "prediction": "Stable trend",
                "actions": ["Keep walking"],
                "riskLevel": "Moderate"
            }))
            .reply_json(json!([
                {"name": "Paracetamol", "uses": ["Fever"], "price": 35.0},
                {"name": "Cetirizine", "type": "Antihistamine", "uses": ["Allergy"]}
            ])),
    );
    let (gateway, _) = gateway(model);

    let forecast = gateway
        .health_forecast(&[], &initial_profile())
        .await
        .unwrap();
    assert_eq!(forecast.risk_level, ForecastRisk::Moderate);

    let medicines: Vec<MedicineDraft> = gateway.suggest_medicines("sneezing").await.unwrap();
    assert_eq!(medicines.len(), 2);
    assert_eq!(medicines[1].kind.as_deref(), Some("Antihistamine"));
    assert_eq!(medicines[1].price, None);
}
