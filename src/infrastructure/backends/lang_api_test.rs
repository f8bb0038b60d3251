use anyhow::Result;
use mockito::Matcher;

use super::LangApi;
use crate::domain::models::AudioPayload;
use crate::domain::models::Backend;
use crate::domain::models::FeedbackRequest;
use crate::domain::models::LearnRequest;

impl LangApi {
    fn with_url(url: String) -> LangApi {
        return LangApi {
            url,
            timeout: 2000,
            health_check_timeout: 200,
        };
    }
}

mod health_check {
    use super::*;

    #[tokio::test]
    async fn it_successfully_health_checks() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/openapi.json")
            .with_status(200)
            .create_async()
            .await;

        let backend = LangApi::with_url(server.url());
        let res = backend.health_check().await;

        assert!(res.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn it_fails_health_checks() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/openapi.json")
            .with_status(500)
            .create_async()
            .await;

        let backend = LangApi::with_url(server.url());
        let res = backend.health_check().await;

        assert!(res.is_err());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn it_fails_without_url() {
        let backend = LangApi::with_url("".to_string());
        let res = backend.health_check().await;

        assert!(res.is_err());
    }
}

mod learn {
    use super::*;

    #[tokio::test]
    async fn it_posts_the_turn() -> Result<()> {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/learn")
            .match_body(Matcher::Json(serde_json::json!({
                "prompt": "hola",
                "context": "assistant: ¡Hola!",
                "is_new_chat": false,
            })))
            .with_status(200)
            .with_body(r#"{"response": "¡Muy bien!", "audio": "AQID"}"#)
            .create_async()
            .await;

        let backend = LangApi::with_url(server.url());
        let res = backend
            .learn(LearnRequest::new(
                "hola",
                "assistant: ¡Hola!".to_string(),
                false,
            ))
            .await?;

        mock.assert_async().await;
        assert_eq!(res.response, "¡Muy bien!");
        assert_eq!(res.audio, Some("AQID".to_string()));

        return Ok(());
    }

    #[tokio::test]
    async fn it_accepts_missing_audio() -> Result<()> {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/learn")
            .with_status(200)
            .with_body(r#"{"response": "¡Hola!"}"#)
            .create_async()
            .await;

        let backend = LangApi::with_url(server.url());
        let res = backend
            .learn(LearnRequest::new("Start the lesson", "".to_string(), true))
            .await?;

        assert!(res.audio.is_none());

        return Ok(());
    }

    #[tokio::test]
    async fn it_reports_http_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/learn")
            .with_status(500)
            .create_async()
            .await;

        let backend = LangApi::with_url(server.url());
        let res = backend
            .learn(LearnRequest::new("hola", "".to_string(), false))
            .await;

        insta::assert_snapshot!(res.unwrap_err().to_string(), @"HTTP error! status: 500");
    }

    #[tokio::test]
    async fn it_fails_on_malformed_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/learn")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let backend = LangApi::with_url(server.url());
        let res = backend
            .learn(LearnRequest::new("hola", "".to_string(), false))
            .await;

        assert!(res.is_err());
    }
}

mod feedback {
    use super::*;

    #[tokio::test]
    async fn it_posts_the_context() -> Result<()> {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/feedback")
            .match_body(Matcher::Json(serde_json::json!({
                "context": "user: hola",
            })))
            .with_status(200)
            .with_body(r#"{"feedback": "1. hola"}"#)
            .create_async()
            .await;

        let backend = LangApi::with_url(server.url());
        let res = backend
            .feedback(FeedbackRequest {
                context: "user: hola".to_string(),
            })
            .await?;

        mock.assert_async().await;
        assert_eq!(res.feedback, "1. hola");

        return Ok(());
    }

    #[tokio::test]
    async fn it_reports_http_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/feedback")
            .with_status(503)
            .create_async()
            .await;

        let backend = LangApi::with_url(server.url());
        let res = backend.feedback(FeedbackRequest::default()).await;

        insta::assert_snapshot!(res.unwrap_err().to_string(), @"HTTP error! status: 503");
    }
}

mod speech_to_text {
    use super::*;

    #[tokio::test]
    async fn it_uploads_audio_as_multipart() -> Result<()> {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/speech-to-text")
            .match_header(
                "content-type",
                Matcher::Regex("^multipart/form-data".to_string()),
            )
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="audio""#.to_string()),
                Matcher::Regex(r#"filename="recording.wav""#.to_string()),
            ]))
            .with_status(200)
            .with_body(r#"{"transcript": " me llamo Ana "}"#)
            .create_async()
            .await;

        let backend = LangApi::with_url(server.url());
        let res = backend
            .speech_to_text(AudioPayload::wav(b"RIFF".to_vec()))
            .await?;

        mock.assert_async().await;
        assert_eq!(res, "me llamo Ana");

        return Ok(());
    }

    #[tokio::test]
    async fn it_fails_without_transcript() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/speech-to-text")
            .with_status(200)
            .with_body(r#"{"transcript": "  "}"#)
            .create_async()
            .await;

        let backend = LangApi::with_url(server.url());
        let res = backend
            .speech_to_text(AudioPayload::wav(b"RIFF".to_vec()))
            .await;

        insta::assert_snapshot!(res.unwrap_err().to_string(), @"No transcript received");
    }

    #[tokio::test]
    async fn it_reports_detail_on_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/speech-to-text")
            .with_status(400)
            .with_body(r#"{"detail": "No speech detected"}"#)
            .create_async()
            .await;

        let backend = LangApi::with_url(server.url());
        let res = backend
            .speech_to_text(AudioPayload::wav(b"RIFF".to_vec()))
            .await;

        insta::assert_snapshot!(res.unwrap_err().to_string(), @"No speech detected");
    }

    #[tokio::test]
    async fn it_falls_back_to_status_without_detail() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/speech-to-text")
            .with_status(500)
            .with_body("Internal Server Error")
            .create_async()
            .await;

        let backend = LangApi::with_url(server.url());
        let res = backend
            .speech_to_text(AudioPayload::wav(b"RIFF".to_vec()))
            .await;

        insta::assert_snapshot!(res.unwrap_err().to_string(), @"HTTP error! status: 500");
    }
}
