use buildcast_core::Credential;
use imagen::ImagenClient;
use orchestrator::{NoopProgress, OrchestratorError, SequenceOrchestrator};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PREDICT_PATH: &str = "/models/imagen-test:predict";

fn image_response(data: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "predictions": [{"bytesBase64Encoded": data, "mimeType": "image/jpeg"}]
    }))
}

#[tokio::test]
async fn test_sequence_against_mock_service() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(PREDICT_PATH))
        .and(header("x-goog-api-key", "live-key"))
        .and(body_partial_json(json!({
            "instances": [{"prompt": "A glass tower, in an empty lot before construction, site cleared for development. Photorealistic, high-resolution, detailed architecture."}]
        })))
        .respond_with(image_response("Zmlyc3Q="))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(PREDICT_PATH))
        .and(body_partial_json(json!({
            "instances": [{"prompt": "A glass tower, fully completed, newly finished, and shining, ready for its grand opening. Photorealistic, high-resolution, detailed architecture."}]
        })))
        .respond_with(image_response("bGFzdA=="))
        .expect(1)
        .mount(&server)
        .await;

    let orchestrator = SequenceOrchestrator::new(ImagenClient::new(server.uri(), "imagen-test"));

    let images = orchestrator
        .generate_sequence(&Credential::new("live-key"), "A glass tower", 2, &mut NoopProgress)
        .await
        .unwrap();

    assert_eq!(
        images,
        vec!["data:image/jpeg;base64,Zmlyc3Q=", "data:image/jpeg;base64,bGFzdA=="]
    );
}

#[tokio::test]
async fn test_api_error_stops_after_failing_stage() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(PREDICT_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"code": 403, "message": "API key not valid. Please pass a valid API key.", "status": "PERMISSION_DENIED"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let orchestrator = SequenceOrchestrator::new(ImagenClient::new(server.uri(), "imagen-test"));

    let err = orchestrator
        .generate_sequence(&Credential::new("wrong-key"), "Bridge", 4, &mut NoopProgress)
        .await
        .unwrap_err();

    match err {
        OrchestratorError::Generation { stage, reason } => {
            assert_eq!(stage, 1);
            assert!(reason.contains("API key not valid"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_filtered_image_counts_as_missing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(PREDICT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "predictions": [{"raiFilteredReason": "Filtered by safety settings"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let orchestrator = SequenceOrchestrator::new(ImagenClient::new(server.uri(), "imagen-test"));

    let err = orchestrator
        .generate_sequence(&Credential::new("key"), "Bridge", 3, &mut NoopProgress)
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(1));
    assert!(err.to_string().contains("The model did not return an image."));
}
