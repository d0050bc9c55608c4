use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use ibis::{Body, Response};
use serde::ser::Error as _;
use serde::{Serialize, Serializer};

#[derive(Serialize)]
struct User {
    name: &'static str,
    admin: bool,
}

#[test]
fn default_is_200_and_empty() {
    let response = Response::default();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.body().is_empty());
    assert!(response.is_ok());
}

#[test]
fn with_json_sets_header_and_body() {
    let response = Response::default()
        .with_json(&User {
            name: "John",
            admin: false,
        })
        .unwrap();

    assert_eq!(response.header_line("content-type"), "application/json");
    assert_eq!(
        response.body().text(),
        r#"{"name":"John","admin":false}"#
    );
    assert_eq!(response.status(), StatusCode::OK);
}

#[test]
fn with_json_status() {
    let response = Response::default()
        .with_json_status(&User { name: "John", admin: true }, StatusCode::CREATED)
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.header_line("content-type"), "application/json");
}

struct Broken;

impl Serialize for Broken {
    fn serialize<S>(&self, _: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        Err(S::Error::custom("broken on purpose"))
    }
}

#[test]
fn with_json_surfaces_serialization_failures() {
    let err = Response::default().with_json(&Broken).unwrap_err();
    assert!(err.to_string().contains("failed to encode response body as json"));
}

#[test]
fn with_redirect_defaults_to_found() {
    let response = Response::default().with_redirect("/login").unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.header_line("location"), "/login");
    assert!(response.is_redirect());
}

#[test]
fn with_redirect_status() {
    let response = Response::default()
        .with_redirect_status("https://example.com/", StatusCode::MOVED_PERMANENTLY)
        .unwrap();

    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(response.header_line("location"), "https://example.com/");
}

#[test]
fn with_redirect_rejects_invalid_locations() {
    assert!(Response::default().with_redirect("/lo\ngin").is_err());
}

#[test]
fn with_file_defaults_to_octet_stream() {
    let response = Response::default().with_file(b"binary".as_slice(), None);

    assert_eq!(
        response.header_line("content-type"),
        "application/octet-stream"
    );
    assert_eq!(response.body().as_bytes(), b"binary");
}

#[test]
fn with_file_with_an_explicit_type() {
    let response = Response::default().with_file("a,b,c", Some(mime::TEXT_CSV));
    assert_eq!(response.header_line("content-type"), "text/csv");
}

#[test]
fn with_file_download_without_a_name() {
    let response = Response::default().with_file_download(b"data".as_slice(), None, None);
    assert_eq!(response.header_line("content-disposition"), "attachment");
}

#[test]
fn with_file_download_with_a_name() {
    let response =
        Response::default().with_file_download(b"data".as_slice(), Some("report Q1.pdf"), None);

    assert_eq!(
        response.header_line("content-disposition"),
        "attachment; filename=\"report Q1.pdf\"; filename*=UTF-8''report%20Q1.pdf"
    );
}

#[test]
fn with_file_download_scrubs_the_quoted_name() {
    let response = Response::default().with_file_download(
        b"data".as_slice(),
        Some("he\"llo\u{1}.txt"),
        None,
    );

    let disposition = response.header_line("content-disposition");
    assert!(disposition.starts_with("attachment; filename=\"he llo .txt\""));
    assert!(disposition.contains("filename*=UTF-8''he%22llo%01.txt"));
}

#[test]
fn status_predicates() {
    assert!(Response::new(StatusCode::CONTINUE).is_informational());
    assert!(Response::new(StatusCode::NO_CONTENT).is_successful());
    assert!(Response::new(StatusCode::SEE_OTHER).is_redirect());
    assert!(Response::new(StatusCode::MULTIPLE_CHOICES).is_redirection());
    assert!(!Response::new(StatusCode::MULTIPLE_CHOICES).is_redirect());
    assert!(Response::new(StatusCode::FORBIDDEN).is_forbidden());
    assert!(Response::new(StatusCode::NOT_FOUND).is_not_found());
    assert!(Response::new(StatusCode::IM_A_TEAPOT).is_client_error());
    assert!(Response::new(StatusCode::BAD_GATEWAY).is_server_error());

    for status in [
        StatusCode::NO_CONTENT,
        StatusCode::RESET_CONTENT,
        StatusCode::NOT_MODIFIED,
    ] {
        assert!(Response::new(status).is_empty());
    }
    assert!(!Response::new(StatusCode::OK).is_empty());
}

#[test]
fn display_renders_the_http_message() {
    let response = Response::default()
        .with_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
        .with_body("hi");

    assert_eq!(
        response.to_string(),
        "HTTP/1.1 200 OK\r\ncontent-type: text/plain\r\n\r\nhi"
    );
}

#[test]
fn into_response_round_trips() {
    let response = Response::new(StatusCode::ACCEPTED)
        .with_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
        .with_body(Body::from("done"));

    let inner = response.into_response();
    assert_eq!(inner.status(), StatusCode::ACCEPTED);
    assert_eq!(inner.body().text(), "done");
}
