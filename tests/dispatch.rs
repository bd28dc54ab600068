//! Dispatch tests against an in-process HTTP server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use jsonpedia::{ConfigurationError, JsonPedia, Origin, Outcome, RequestParams, TransportError};

/// Records the path and query of every request it receives.
#[derive(Clone, Default)]
struct Recorder {
    requests: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

async fn record(State(recorder): State<Recorder>, uri: Uri) -> (StatusCode, String) {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_default();
    recorder.requests.lock().unwrap().push(target.clone());

    if uri.path().ends_with("/missing") {
        (StatusCode::NOT_FOUND, "no such resource".to_string())
    } else if uri.path().ends_with("/broken") {
        (StatusCode::INTERNAL_SERVER_ERROR, String::new())
    } else {
        (StatusCode::OK, format!("{{\"requested\":\"{}\"}}", uri.path()))
    }
}

async fn setup_test_server() -> (JsonPedia, Recorder) {
    let recorder = Recorder::default();
    let app = Router::new()
        .fallback(record)
        .with_state(recorder.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let jsonpedia = JsonPedia::new(Origin::new("127.0.0.1", Some(port))).unwrap();
    (jsonpedia, recorder)
}

#[tokio::test]
async fn test_annotate_request() {
    let (jsonpedia, recorder) = setup_test_server().await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let fail_tx = tx.clone();

    jsonpedia
        .annotate("en:Albert_Einstein")
        .extractors()
        .linkers()
        .json()
        .done(move |body| {
            let _ = tx.send(Ok(body));
        })
        .fail(move |err| {
            let _ = fail_tx.send(Err(err));
        });

    let body = rx.recv().await.unwrap().unwrap();
    assert_eq!(
        body,
        "{\"requested\":\"/annotate/resource/json/en:Albert_Einstein\"}"
    );
    assert_eq!(
        recorder.requests(),
        vec!["/annotate/resource/json/en:Albert_Einstein?procs=Extractors,Linkers"]
    );
}

#[tokio::test]
async fn test_mongo_select_request() {
    let (jsonpedia, recorder) = setup_test_server().await;
    let dispatcher = jsonpedia
        .mongo()
        .select("_id = #736 -> title", "@type : link", 1);

    dispatcher.done(|_| {});
    assert!(dispatcher.outcome().await.unwrap().is_success());
    assert_eq!(
        recorder.requests(),
        vec!["/storage/mongo/select?q=_id%20%3D%20%23736%20-%3E%20title&filter=%40type%20%3A%20link&limit=1"]
    );
}

#[tokio::test]
async fn test_mongo_mapred_request() {
    let (jsonpedia, recorder) = setup_test_server().await;
    let dispatcher = jsonpedia.mongo().mapred(
        "_id = #736",
        "function() { emit(this._id, 1); }",
        "function(key, values) { return Array.sum(values) }",
        10,
    );

    dispatcher.fail(|_| {});
    match dispatcher.outcome().await {
        Some(Outcome::Success(body)) => {
            assert_eq!(body, "{\"requested\":\"/storage/mongo/mapred\"}")
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    let requests = recorder.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0]
        .starts_with("/storage/mongo/mapred?criteria=_id%20%3D%20%23736&map=function%28%29"));
    assert!(requests[0].ends_with("&limit=10"));
}

#[tokio::test]
async fn test_elastic_select_request() {
    let (jsonpedia, recorder) = setup_test_server().await;
    let dispatcher = jsonpedia
        .elastic()
        .select("Albert Einstein", "@type : link", 1);

    dispatcher.done(|_| {});
    dispatcher.outcome().await;
    assert_eq!(
        recorder.requests(),
        vec!["/storage/elastic/select?q=Albert%20Einstein&filter=%40type%20%3A%20link&limit=1"]
    );
}

#[tokio::test]
async fn test_done_and_fail_issue_one_request() {
    let (jsonpedia, recorder) = setup_test_server().await;
    let calls = Arc::new(AtomicUsize::new(0));
    let dispatcher = jsonpedia.elastic().select("q", "", 1);

    let (c1, c2) = (calls.clone(), calls.clone());
    dispatcher
        .fail(move |_| {
            c1.fetch_add(1, Ordering::SeqCst);
        })
        .done(move |_| {
            c2.fetch_add(1, Ordering::SeqCst);
        });
    dispatcher.outcome().await;

    // Re-registering after delivery neither resends nor re-notifies.
    let c3 = calls.clone();
    dispatcher.done(move |_| {
        c3.fetch_add(1, Ordering::SeqCst);
    });
    dispatcher.clone().fail(|_| {});

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(recorder.requests().len(), 1);
}

#[tokio::test]
async fn test_http_error_reaches_fail_callback() {
    let (jsonpedia, _recorder) = setup_test_server().await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let done_tx = tx.clone();

    let dispatcher = jsonpedia.annotate("missing").html();
    dispatcher
        .done(move |body| {
            let _ = done_tx.send(Ok(body));
        })
        .fail(move |err| {
            let _ = tx.send(Err(err));
        });

    assert_eq!(rx.recv().await.unwrap(), Err("Not Found[404]".to_string()));
    assert_eq!(
        dispatcher.outcome().await,
        Some(Outcome::Failure(TransportError::new("Not Found", 404)))
    );
}

#[tokio::test]
async fn test_server_error_status() {
    let (jsonpedia, _recorder) = setup_test_server().await;
    let dispatcher = jsonpedia.annotate("broken").validate().json();

    dispatcher.done(|_| {});
    match dispatcher.outcome().await {
        Some(Outcome::Failure(err)) => {
            assert_eq!(err.status, 500);
            assert_eq!(err.to_string(), "Internal Server Error[500]");
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_no_request_without_subscription() {
    let (jsonpedia, recorder) = setup_test_server().await;
    let dispatcher = jsonpedia.annotate("en:Rome").structure().json();

    tokio::task::yield_now().await;
    assert!(!dispatcher.is_dispatched());
    assert_eq!(dispatcher.outcome().await, None);
    assert!(recorder.requests().is_empty());
}

#[tokio::test]
async fn test_missing_mode_is_rejected_before_any_request() {
    let (jsonpedia, recorder) = setup_test_server().await;

    let result = jsonpedia.request(RequestParams::default());
    assert!(matches!(result, Err(ConfigurationError::MissingMode)));
    assert!(recorder.requests().is_empty());
}

#[tokio::test]
async fn test_request_params_dispatch() {
    let (jsonpedia, recorder) = setup_test_server().await;
    let params: RequestParams = serde_json::from_str(
        r#"{"mode": "elastic", "calls": [{"verb": "select", "args": ["Albert Einstein", "@type : link", 1]}]}"#,
    )
    .unwrap();

    let dispatcher = jsonpedia.request(params).unwrap();
    dispatcher.done(|_| {});
    dispatcher.outcome().await;
    assert_eq!(
        recorder.requests(),
        vec!["/storage/elastic/select?q=Albert%20Einstein&filter=%40type%20%3A%20link&limit=1"]
    );
}
