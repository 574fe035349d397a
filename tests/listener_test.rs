mod common;

use bytes::Bytes;
use common::MockUpstream;
use gateway_chain::api_spec::ApiSpec;
use gateway_chain::middleware::NullInstrument;
use gateway_chain::server::{Gateway, GatewayOptions, ServerListener};
use http_body_util::{BodyExt, Full};
use hyper::StatusCode;
use hyper_util::client::legacy;
use hyper_util::rt::TokioExecutor;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

#[tokio::test]
async fn test_serves_requests_over_tcp() {
    let upstream = Arc::new(MockUpstream::new("{\"ok\":true}"));
    let mut gateway = Gateway::new(GatewayOptions {
        instrument: Arc::new(NullInstrument),
        upstream: upstream.clone(),
        ..GatewayOptions::default()
    });
    let mut spec = ApiSpec::new("echo", "/echo", "http://127.0.0.1:9000");
    spec.disable_rate_limit = true;
    gateway.add_api(spec).unwrap();

    let listener = ServerListener::from_listener(TcpListener::bind("127.0.0.1:0").await.unwrap());
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(listener.run(Arc::new(gateway), async {
        let _ = stop_rx.await;
    }));

    let client = legacy::Client::builder(TokioExecutor::new()).build_http::<Full<Bytes>>();

    let req = hyper::Request::post(format!("http://{}/echo/items", addr))
        .body(Full::new(Bytes::from_static(b"payload")))
        .unwrap();
    let res = client.request(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"{\"ok\":true}");

    let call = upstream.last_call().unwrap();
    assert_eq!(call.uri, "http://127.0.0.1:9000/items");
    assert_eq!(&call.body[..], b"payload");

    let req = hyper::Request::get(format!("http://{}/unknown", addr))
        .body(Full::new(Bytes::new()))
        .unwrap();
    assert_eq!(client.request(req).await.unwrap().status(), StatusCode::NOT_FOUND);

    stop_tx.send(()).unwrap();
    server.await.unwrap().unwrap();
}
