//! Integration tests: the real HTTP transport against a mockito server.

mod common;

use bot_services::types::UNKNOWN_ALBUM;
use bot_services::{Error, Platform};
use common::MockServerFixture;
use mockito::Matcher;

#[tokio::test]
async fn test_music_falls_back_to_itunes_and_floors_millis() {
    let mut fx = MockServerFixture::new().await;
    let deezer = fx
        .mock_json("GET", "music.deezer", 503, r#"{"error":"maintenance"}"#, 1)
        .await;
    let itunes = fx
        .mock_json(
            "GET",
            "music.itunes",
            200,
            r#"{"resultCount":1,"results":[{
                "trackName":"Despacito","artistName":"Luis Fonsi",
                "trackTimeMillis":185999,
                "previewUrl":"https://audio.test/despacito.m4a",
                "artworkUrl100":"https://img.test/100.jpg"}]}"#,
            1,
        )
        .await;

    let track = fx.facade().search_music("despacito").await.unwrap();

    assert_eq!(track.provider, "music.itunes");
    assert_eq!(track.duration_secs, 185);
    assert_eq!(track.album, UNKNOWN_ALBUM);
    assert_eq!(track.artist, "Luis Fonsi");
    deezer.assert_async().await;
    itunes.assert_async().await;
}

#[tokio::test]
async fn test_every_chat_provider_failing_is_unavailable() {
    let mut fx = MockServerFixture::new().await;
    let pawan = fx.mock_json("POST", "chat.pawan", 500, "{}", 1).await;
    let anywhere = fx
        .mock_json("POST", "chat.chatanywhere", 200, "not json", 1)
        .await;
    let churchless = fx
        .mock_json(
            "POST",
            "chat.churchless",
            429,
            r#"{"error":{"message":"rate limited"}}"#,
            1,
        )
        .await;

    let err = fx.facade().chat("hola").await.unwrap_err();

    match &err {
        Error::UpstreamUnavailable {
            capability,
            attempts,
            message,
        } => {
            assert_eq!(capability, "chat");
            assert_eq!(*attempts, 3);
            assert!(message.contains("429"), "last error should be the 429: {message}");
        }
        other => panic!("expected UpstreamUnavailable, got {other:?}"),
    }
    assert!(err.user_message().contains("chat"));
    pawan.assert_async().await;
    anywhere.assert_async().await;
    churchless.assert_async().await;
}

#[tokio::test]
async fn test_missing_argument_never_reaches_the_network() {
    let mut fx = MockServerFixture::new().await;
    let tinyurl = fx.mock_text("shorten.tinyurl", 200, "https://tinyurl.com/x", 0).await;
    let google = fx.mock_json("GET", "translate.google", 200, "[]", 0).await;

    let facade = fx.facade();
    let err = facade.shorten_url("  ").await.unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { ref argument, .. } if argument == "url"));
    assert!(facade.translate("", Some("en")).await.unwrap_err().is_invalid_argument());

    tinyurl.assert_async().await;
    google.assert_async().await;
}

#[tokio::test]
async fn test_identical_calls_hit_the_provider_each_time() {
    let mut fx = MockServerFixture::new().await;
    let tinyurl = fx
        .mock_text("shorten.tinyurl", 200, "https://tinyurl.com/abc", 2)
        .await;

    let facade = fx.facade();
    for _ in 0..2 {
        let out = tokio_test::assert_ok!(facade.shorten_url("https://example.com/long").await);
        assert_eq!(out.short_url, "https://tinyurl.com/abc");
        assert_eq!(out.original_url, "https://example.com/long");
    }
    tinyurl.assert_async().await;
}

#[tokio::test]
async fn test_plain_text_error_moves_to_isgd() {
    let mut fx = MockServerFixture::new().await;
    let tinyurl = fx.mock_text("shorten.tinyurl", 200, "Error", 1).await;
    let isgd = fx.mock_text("shorten.isgd", 200, "https://is.gd/q1w2e3", 1).await;

    let out = fx.facade().shorten_url("https://example.com").await.unwrap();

    assert_eq!(out.short_url, "https://is.gd/q1w2e3");
    assert_eq!(out.provider, "shorten.isgd");
    tinyurl.assert_async().await;
    isgd.assert_async().await;
}

#[tokio::test]
async fn test_translate_uses_default_language() {
    let mut fx = MockServerFixture::new().await;
    let google = fx
        .server
        .mock("GET", "/translate/google")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("tl".into(), "es".into()),
            Matcher::UrlEncoded("q".into(), "Good morning".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[[["Buenos días","Good morning",null,null,10]],null,"en"]"#)
        .expect(1)
        .create_async()
        .await;

    let out = fx.facade().translate("Good morning", None).await.unwrap();

    assert_eq!(out.translated_text, "Buenos días");
    assert_eq!(out.source_language, "en");
    assert_eq!(out.target_language, "es");
    google.assert_async().await;
}

#[tokio::test]
async fn test_youtube_walks_to_the_aggregator() {
    let mut fx = MockServerFixture::new().await;
    let y2mate = fx.mock_json("POST", "youtube.y2mate", 500, "{}", 1).await;
    let cobalt = fx
        .mock_json(
            "POST",
            "youtube.cobalt",
            200,
            r#"{"status":"error","text":"youtube is blocking us"}"#,
            1,
        )
        .await;
    let aggregator = fx
        .server
        .mock("GET", "/api/ytmp4")
        .match_query(Matcher::UrlEncoded(
            "url".into(),
            "https://youtu.be/dQw4w9WgXcQ".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"success":true,"data":{"title":"Never Gonna Give You Up","quality":"720p",
                "thumbnail":"https://i.ytimg.com/vi/dQw4w9WgXcQ/hq.jpg",
                "download":"https://dl.test/rick.mp4"}}"#,
        )
        .expect(1)
        .create_async()
        .await;

    let out = fx
        .facade()
        .download_auto("https://youtu.be/dQw4w9WgXcQ", None)
        .await
        .unwrap();

    assert_eq!(out.platform, Platform::Youtube);
    assert_eq!(out.provider, "youtube.aggregator");
    assert_eq!(out.download_url, "https://dl.test/rick.mp4");
    assert_eq!(out.format, "mp4");
    assert_eq!(out.duration_secs, None);
    y2mate.assert_async().await;
    cobalt.assert_async().await;
    aggregator.assert_async().await;
}

#[tokio::test]
async fn test_text_to_image_probes_with_head() {
    let mut fx = MockServerFixture::new().await;
    let primary = fx
        .server
        .mock("HEAD", Matcher::Regex(r"^/image/pollinations/".into()))
        .match_query(Matcher::UrlEncoded("nologo".into(), "true".into()))
        .with_status(200)
        .with_header("content-type", "image/jpeg")
        .expect(1)
        .create_async()
        .await;

    let out = fx.facade().text_to_image("red fox").await.unwrap();

    assert_eq!(out.provider, "image.pollinations");
    assert!(out.image_url.contains("/image/pollinations/red%20fox?"));
    assert_eq!(out.prompt, "red fox");
    primary.assert_async().await;
}

#[tokio::test]
async fn test_weather_falls_back_to_wttr() {
    let mut fx = MockServerFixture::new().await;
    // Without an OpenWeatherMap key the primary is skipped before any request.
    let owm = fx
        .mock_json(
            "GET",
            "weather.openweathermap",
            401,
            r#"{"cod":401,"message":"Invalid API key"}"#,
            0,
        )
        .await;
    let wttr = fx
        .server
        .mock("GET", "/weather/wttr/Madrid")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("format".into(), "j1".into()),
            Matcher::UrlEncoded("lang".into(), "es".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"current_condition":[{"temp_C":"28","FeelsLikeC":"27","humidity":"20",
                "windspeedKmph":"9","weatherDesc":[{"value":"Sunny"}],
                "lang_es":[{"value":"Soleado"}]}]}"#,
        )
        .expect(1)
        .create_async()
        .await;

    let report = fx.facade().weather("Madrid").await.unwrap();

    assert_eq!(report.provider, "weather.wttr");
    assert_eq!(report.city, "Madrid");
    assert_eq!(report.temperature, 28.0);
    assert_eq!(report.humidity, Some(20.0));
    assert_eq!(report.description, "Soleado");
    owm.assert_async().await;
    wttr.assert_async().await;
}
