// tests/api.rs
//! Endpoint contract tests over the full route table, with the diagnosis
//! provider replaced by a scripted mock.

use actix_web::{App, test, web};
use async_trait::async_trait;
use cropdoctor::errors::CropDoctorError;
use cropdoctor::models::{AnalysisResult, EncodedImage};
use cropdoctor::services::vision::DiagnosisProvider;
use cropdoctor::{AppState, configure_routes};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

struct MockProvider {
    reply: Result<String, String>,
    calls: AtomicUsize,
}

impl MockProvider {
    fn ok(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing(detail: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(detail.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DiagnosisProvider for MockProvider {
    async fn diagnose(&self, _image: &EncodedImage) -> Result<AnalysisResult, CropDoctorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Ok(text) => Ok(AnalysisResult(text.clone())),
            Err(detail) => Err(CropDoctorError::AnalysisFailed(detail.clone())),
        }
    }
}

macro_rules! test_app {
    ($provider:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::new($provider)))
                .configure(configure_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn analyze_relays_the_provider_text_verbatim() {
    let provider = MockProvider::ok("## Diagnosis\n\nTomato late blight");
    let app = test_app!(provider.clone());

    let req = test::TestRequest::post()
        .uri("/api/analyze-crop")
        .set_json(serde_json::json!({ "image": "data:image/png;base64,aGVsbG8=" }))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(
        body,
        serde_json::json!({ "analysis": "## Diagnosis\n\nTomato late blight" })
    );
    assert_eq!(provider.call_count(), 1);
}

#[actix_web::test]
async fn missing_image_answers_400_without_calling_the_provider() {
    let provider = MockProvider::ok("unused");
    let app = test_app!(provider.clone());

    for payload in [
        serde_json::json!({}),
        serde_json::json!({ "image": "" }),
        serde_json::json!({ "image": "   " }),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/analyze-crop")
            .set_json(&payload)
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), 400, "payload {:?}", payload);

        let body: serde_json::Value = test::read_body_json(res).await;
        assert!(
            body["error"].as_str().is_some_and(|s| !s.is_empty()),
            "400 body must carry an error message: {:?}",
            body
        );
    }

    assert_eq!(
        provider.call_count(),
        0,
        "no provider call may be attempted without an image"
    );
}

#[actix_web::test]
async fn provider_failure_answers_500_without_leaking_detail() {
    let secret_detail = "Bearer token sk-12345 rejected by upstream";
    let provider = MockProvider::failing(secret_detail);
    let app = test_app!(provider.clone());

    let req = test::TestRequest::post()
        .uri("/api/analyze-crop")
        .set_json(serde_json::json!({ "image": "data:image/png;base64,aGVsbG8=" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), 500);

    let body = test::read_body(res).await;
    let text = String::from_utf8_lossy(&body);
    assert!(
        !text.contains(secret_detail) && !text.contains("sk-12345"),
        "provider detail leaked into the response: {}",
        text
    );
    let json: serde_json::Value = serde_json::from_slice(&body).expect("JSON error body");
    assert!(json["error"].as_str().is_some_and(|s| !s.is_empty()));
    assert_eq!(provider.call_count(), 1);
}

#[actix_web::test]
async fn upload_round_trips_a_file_into_a_data_uri() {
    let app = test_app!(MockProvider::ok("unused"));

    let boundary = "---------------------------boundary";
    let mut payload = Vec::new();
    payload.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    payload.extend_from_slice(
        b"Content-Disposition: form-data; name=\"image\"; filename=\"leaf.png\"\r\n",
    );
    payload.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
    payload.extend_from_slice(b"fake png bytes");
    payload.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    let req = test::TestRequest::post()
        .uri("/api/upload-image")
        .insert_header((
            "Content-Type",
            format!("multipart/form-data; boundary={}", boundary),
        ))
        .set_payload(payload)
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["filename"], "leaf.png");
    assert_eq!(body["size"], 14);
    let image = body["image"].as_str().expect("image field");
    assert!(
        image.starts_with("data:image/png;base64,"),
        "unexpected data URI: {}",
        image
    );
}

#[actix_web::test]
async fn upload_without_a_file_field_answers_400() {
    let app = test_app!(MockProvider::ok("unused"));

    let boundary = "---------------------------boundary";
    let payload = format!("--{}--\r\n", boundary);

    let req = test::TestRequest::post()
        .uri("/api/upload-image")
        .insert_header((
            "Content-Type",
            format!("multipart/form-data; boundary={}", boundary),
        ))
        .set_payload(payload)
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), 400);
}

#[actix_web::test]
async fn render_formats_markup_and_preserves_content() {
    let app = test_app!(MockProvider::ok("unused"));

    let req = test::TestRequest::post()
        .uri("/api/render-report")
        .set_json(serde_json::json!({ "analysis": "## රෝගය\n\nTomato **blight**" }))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    let html = body["html"].as_str().expect("html field");
    assert!(html.contains("<h2>රෝගය</h2>"), "html: {}", html);
    assert!(html.contains("<strong>blight</strong>"), "html: {}", html);
}

#[actix_web::test]
async fn render_tolerates_malformed_markup() {
    let app = test_app!(MockProvider::ok("unused"));

    let req = test::TestRequest::post()
        .uri("/api/render-report")
        .set_json(serde_json::json!({ "analysis": "<div>*** [broken]( | garbage |" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), 200);

    let body: serde_json::Value = test::read_body_json(res).await;
    assert!(
        body["html"].as_str().is_some_and(|s| !s.is_empty()),
        "malformed markup must still render: {:?}",
        body
    );
}

#[actix_web::test]
async fn render_without_text_answers_400() {
    let app = test_app!(MockProvider::ok("unused"));

    let req = test::TestRequest::post()
        .uri("/api/render-report")
        .set_json(serde_json::json!({}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), 400);
}

#[actix_web::test]
async fn export_yields_a_named_pdf_download() {
    let app = test_app!(MockProvider::ok("unused"));

    let req = test::TestRequest::post()
        .uri("/api/export-report")
        .set_json(serde_json::json!({ "analysis": "## Report\n\nA finding" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), 200);
    assert_eq!(
        res.headers().get("Content-Type").unwrap(),
        "application/pdf"
    );
    let disposition = res
        .headers()
        .get("Content-Disposition")
        .expect("download header")
        .to_str()
        .unwrap()
        .to_string();
    assert!(
        disposition.contains("crop-analysis-report.pdf"),
        "disposition: {}",
        disposition
    );

    let body = test::read_body(res).await;
    assert!(body.starts_with(b"%PDF-"), "not a PDF document");
}

#[actix_web::test]
async fn export_with_no_result_is_a_no_op_204() {
    let app = test_app!(MockProvider::ok("unused"));

    for payload in [serde_json::json!({}), serde_json::json!({ "analysis": "  " })] {
        let req = test::TestRequest::post()
            .uri("/api/export-report")
            .set_json(&payload)
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), 204, "payload {:?}", payload);
    }
}

#[actix_web::test]
async fn end_to_end_pipeline_preserves_the_provider_text() {
    let reply = "## විශ්ලේෂණය\n\nLeaf spot detected. **Remove** affected leaves.";
    let provider = MockProvider::ok(reply);
    let app = test_app!(provider.clone());

    // Select: upload a file to obtain the encoded image.
    let boundary = "---------------------------boundary";
    let mut payload = Vec::new();
    payload.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    payload.extend_from_slice(
        b"Content-Disposition: form-data; name=\"image\"; filename=\"leaf.jpg\"\r\n",
    );
    payload.extend_from_slice(b"Content-Type: image/jpeg\r\n\r\n");
    payload.extend_from_slice(b"jpeg bytes");
    payload.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    let req = test::TestRequest::post()
        .uri("/api/upload-image")
        .insert_header((
            "Content-Type",
            format!("multipart/form-data; boundary={}", boundary),
        ))
        .set_payload(payload)
        .to_request();
    let upload: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let image = upload["image"].as_str().expect("encoded image").to_string();

    // Analyze.
    let req = test::TestRequest::post()
        .uri("/api/analyze-crop")
        .set_json(serde_json::json!({ "image": image }))
        .to_request();
    let analysis: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(analysis["analysis"], reply);

    // Render: content equal to the provider's text, markup-level
    // formatting only.
    let req = test::TestRequest::post()
        .uri("/api/render-report")
        .set_json(serde_json::json!({ "analysis": analysis["analysis"] }))
        .to_request();
    let rendered: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let html = rendered["html"].as_str().expect("html");
    for fragment in ["විශ්ලේෂණය", "Leaf spot detected.", "<strong>Remove</strong>"] {
        assert!(html.contains(fragment), "missing {:?} in {}", fragment, html);
    }

    assert_eq!(provider.call_count(), 1);
}

#[actix_web::test]
async fn health_reports_the_service_name() {
    let app = test_app!(MockProvider::ok("unused"));

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "cropdoctor");
}
