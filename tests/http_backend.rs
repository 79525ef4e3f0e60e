//! HTTP backend exchanges against a local mock server.

use humlyric::audio::{Clip, ClipFormat};
use humlyric::backend::{DraftRequest, HttpBackend, LineRequest, LyricsBackend};
use humlyric::{HumlyricError, Note};
use serde_json::json;
use wiremock::matchers::{body_json, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn wav_clip() -> Clip {
    Clip {
        bytes: vec![0x52, 0x49, 0x46, 0x46],
        format: ClipFormat::Wav,
    }
}

fn draft_request() -> DraftRequest {
    DraftRequest {
        notes: vec![Note {
            midi: 60,
            name: "C4".to_string(),
            start: 0.0,
            dur: 0.5,
        }],
        keywords: vec!["river".to_string()],
        genre: "folk".to_string(),
        pinned: vec!["river".to_string()],
    }
}

#[tokio::test]
async fn upload_parses_transcript() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(header_exists("content-type"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "duration_sec": 2.5,
            "notes": [{"midi": 60, "name": "C4", "start": 0.0, "dur": 0.5}],
            "keywords": ["river", "moon"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri());
    let transcript = backend.upload(&wav_clip()).await.expect("upload");

    assert_eq!(transcript.duration_sec, 2.5);
    assert_eq!(transcript.notes.len(), 1);
    assert_eq!(transcript.notes[0].name, "C4");
    assert_eq!(transcript.keywords, vec!["river", "moon"]);
}

#[tokio::test]
async fn upload_maps_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri());
    match backend.upload(&wav_clip()).await {
        Err(HumlyricError::TranscriptionFailed { message }) => {
            assert!(message.contains("500"), "message was: {}", message);
        }
        other => panic!("expected TranscriptionFailed, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn upload_rejects_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri());
    assert!(matches!(
        backend.upload(&wav_clip()).await,
        Err(HumlyricError::TranscriptionFailed { .. })
    ));
}

#[tokio::test]
async fn upload_rejects_malformed_note() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "duration_sec": 1.0,
            "notes": [{"midi": 60, "name": "C4", "start": -1.0, "dur": 0.5}],
            "keywords": []
        })))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri());
    assert!(matches!(
        backend.upload(&wav_clip()).await,
        Err(HumlyricError::TranscriptionFailed { .. })
    ));
}

#[tokio::test]
async fn generate_drafts_echoes_request_body() {
    let server = MockServer::start().await;
    let request = draft_request();
    Mock::given(method("POST"))
        .and(path("/lyrics"))
        .and(body_json(json!({
            "notes": [{"midi": 60, "name": "C4", "start": 0.0, "dur": 0.5}],
            "keywords": ["river"],
            "genre": "folk",
            "pinned": ["river"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "drafts": ["line1\nline2", "lineA\nlineB"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri());
    let drafts = backend.generate_drafts(&request).await.expect("generate");
    assert_eq!(drafts, vec!["line1\nline2", "lineA\nlineB"]);
}

#[tokio::test]
async fn generate_drafts_rejects_empty_batch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/lyrics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "drafts": [] })))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri());
    match backend.generate_drafts(&draft_request()).await {
        Err(HumlyricError::GenerationFailed { message }) => {
            assert!(message.contains("empty"), "message was: {}", message);
        }
        other => panic!("expected GenerationFailed, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn generate_drafts_maps_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/lyrics"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri());
    assert!(matches!(
        backend.generate_drafts(&draft_request()).await,
        Err(HumlyricError::GenerationFailed { .. })
    ));
}

#[tokio::test]
async fn regenerate_line_returns_alternatives() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/regenerate_line"))
        .and(body_json(json!({
            "line": "line2",
            "genre": "folk",
            "pinned": ["river"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "alts": ["new2a", "new2b"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri());
    let request = LineRequest {
        line: "line2".to_string(),
        genre: "folk".to_string(),
        pinned: vec!["river".to_string()],
    };
    let alts = backend.regenerate_line(&request).await.expect("regenerate");
    assert_eq!(alts, vec!["new2a", "new2b"]);
}

#[tokio::test]
async fn regenerate_line_accepts_empty_alternatives() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/regenerate_line"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "alts": [] })))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri());
    let request = LineRequest {
        line: "x".to_string(),
        genre: "pop".to_string(),
        pinned: vec![],
    };
    let alts = backend.regenerate_line(&request).await.expect("regenerate");
    assert!(alts.is_empty());
}

#[tokio::test]
async fn regenerate_line_maps_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/regenerate_line"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri());
    let request = LineRequest {
        line: "x".to_string(),
        genre: "pop".to_string(),
        pinned: vec![],
    };
    assert!(matches!(
        backend.regenerate_line(&request).await,
        Err(HumlyricError::RegenerationFailed { .. })
    ));
}

// The upload is a multipart submission whose single part carries the clip
// under the agreed field name with a format-matching filename.
#[tokio::test]
async fn upload_sends_multipart_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "duration_sec": 0.5,
            "notes": [],
            "keywords": []
        })))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri());
    backend.upload(&wav_clip()).await.expect("upload");

    let requests = server.received_requests().await.expect("recorded");
    assert_eq!(requests.len(), 1);
    let content_type = requests[0]
        .headers
        .get("content-type")
        .expect("content-type header")
        .to_str()
        .expect("ascii");
    assert!(
        content_type.starts_with("multipart/form-data"),
        "content-type was: {}",
        content_type
    );
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"file\""), "body missing field name");
    assert!(body.contains("filename=\"hum.wav\""), "body missing filename");
}

#[tokio::test]
async fn ogg_clip_gets_matching_filename() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "duration_sec": 0.5,
            "notes": [],
            "keywords": []
        })))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri());
    let clip = Clip {
        bytes: vec![0x4f, 0x67, 0x67, 0x53],
        format: ClipFormat::OggOpus,
    };
    backend.upload(&clip).await.expect("upload");

    let requests = server.received_requests().await.expect("recorded");
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("filename=\"hum.ogg\""), "body missing filename");
    assert!(body.contains("audio/ogg"), "body missing part content type");
}
