//! S3 adapter against a local wiremock server using path-style addressing.
//!
//! Covers how S3 responses are normalized and that each failed call reaches
//! the server exactly once.
#![cfg(feature = "s3")]

use futures::{StreamExt, TryStreamExt};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use nimbus_core::ErrorKind;
use nimbus_storage::ObjectStorage;
use nimbus_storage::s3::{S3Options, S3Storage};

const BUCKET: &str = "uploads";

async fn connect(server: &MockServer) -> nimbus_core::Result<S3Storage> {
    let endpoint = server.uri();
    S3Storage::with_options(S3Options {
        bucket: BUCKET,
        region: Some("us-east-1"),
        endpoint_url: Some(&endpoint),
        path_style: true,
        access_key: Some("AKIDEXAMPLE"),
        secret_key: Some("wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY"),
    })
    .await
}

/// Mock server answering the bucket check, plus a connected adapter.
async fn setup() -> (MockServer, S3Storage) {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path(format!("/{BUCKET}")))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    let storage = connect(&server).await.expect("connect");
    (server, storage)
}

fn object_path(key: &str) -> String {
    format!("/{BUCKET}/{key}")
}

async fn requests_to(server: &MockServer, verb: &str, key: &str) -> usize {
    let target = object_path(key);
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.as_str() == verb && r.url.path() == target)
        .count()
}

fn no_such_key() -> ResponseTemplate {
    ResponseTemplate::new(404).set_body_string(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <Error><Code>NoSuchKey</Code><Message>The specified key does not exist.</Message></Error>",
    )
}

#[tokio::test]
async fn rejected_bucket_check_is_configuration_error() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path(format!("/{BUCKET}")))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = connect(&server).await.err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    let heads = server.received_requests().await.unwrap_or_default().len();
    assert_eq!(heads, 1);
}

#[tokio::test]
async fn save_then_load_once() {
    let (server, storage) = setup().await;
    Mock::given(method("PUT"))
        .and(path(object_path("report.csv")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(object_path("report.csv")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"a,b,c\n1,2,3\n".to_vec()))
        .mount(&server)
        .await;

    storage.save("report.csv", b"a,b,c\n1,2,3\n").await.unwrap();
    let data = storage.load_once("report.csv").await.unwrap();
    assert_eq!(data.as_ref(), b"a,b,c\n1,2,3\n");
}

#[tokio::test]
async fn missing_key_is_not_found() {
    let (server, storage) = setup().await;
    Mock::given(method("GET"))
        .and(path(object_path("missing.txt")))
        .respond_with(no_such_key())
        .mount(&server)
        .await;

    let err = storage.load_once("missing.txt").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let mut stream = storage.load_stream("missing.txt");
    assert!(stream.next().await.unwrap().unwrap_err().is_not_found());
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn server_error_is_backend_and_not_retried() {
    let (server, storage) = setup().await;
    Mock::given(method("GET"))
        .and(path(object_path("busy.txt")))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = storage.load_once("busy.txt").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Backend);
    assert_eq!(requests_to(&server, "GET", "busy.txt").await, 1);
}

#[tokio::test]
async fn load_stream_yields_fixed_chunks() {
    let (server, storage) = setup().await;
    let data: Vec<u8> = (0..5000u32).map(|i| (i % 256) as u8).collect();
    Mock::given(method("GET"))
        .and(path(object_path("big.bin")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(data.clone()))
        .mount(&server)
        .await;

    let stream = storage.load_stream("big.bin");
    assert_eq!(requests_to(&server, "GET", "big.bin").await, 0);

    let chunks: Vec<_> = stream.try_collect().await.unwrap();
    let lens: Vec<usize> = chunks.iter().map(|c| c.len()).collect();
    assert_eq!(lens, vec![1024, 1024, 1024, 1024, 904]);
    assert_eq!(chunks.concat(), data);
}

#[tokio::test]
async fn exists_maps_only_404_to_false() {
    let (server, storage) = setup().await;
    Mock::given(method("HEAD"))
        .and(path(object_path("here.txt")))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path(object_path("absent.txt")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path(object_path("broken.txt")))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(storage.exists("here.txt").await.unwrap());
    assert!(!storage.exists("absent.txt").await.unwrap());
    let err = storage.exists("broken.txt").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Backend);
    assert_eq!(requests_to(&server, "HEAD", "broken.txt").await, 1);
}

#[tokio::test]
async fn delete_missing_key_succeeds() {
    let (server, storage) = setup().await;
    Mock::given(method("DELETE"))
        .and(path(object_path("never.txt")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    storage.delete("never.txt").await.unwrap();
}
