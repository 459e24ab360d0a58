//! Requests through the sample application, with and without generated
//! delegates.

use std::sync::Arc;

use daedalus::http::StatusCode;
use daedalus::Endpoint;
use daedalus_e2e::generated_endpoints::{SourceKeyMetadata, THUNKS};
use daedalus_e2e::models::{Item, Probe};
use daedalus_e2e::{app, generic_app};
use daedalus_test::TestClient;
use serde_json::json;

fn client() -> (TestClient, Arc<Probe>) {
    let probe = Arc::new(Probe::default());
    let app = app(Arc::clone(&probe)).unwrap();
    (TestClient::new(app), probe)
}

fn endpoint<'a>(client: &'a TestClient, pattern: &str) -> &'a Endpoint {
    client
        .application()
        .endpoints()
        .iter()
        .find(|endpoint| endpoint.pattern() == pattern)
        .unwrap_or_else(|| panic!("no endpoint for {pattern}"))
}

#[test]
fn test_route_value_closure_is_specialized() {
    let (client, _) = client();

    assert!(endpoint(&client, "/items/{id}").is_specialized());
    client
        .get("/items/42")
        .send()
        .assert_status(StatusCode::OK)
        .assert_header("content-type", "application/json")
        .assert_body_eq("42");
    client.get("/items/forty-two").send().assert_status(StatusCode::BAD_REQUEST);
}

#[test]
fn test_custom_extractor_falls_back_to_generic_binding() {
    let (client, _) = client();

    assert!(!endpoint(&client, "/tenants/{id}").is_specialized());
    assert!(endpoint(&client, "/tenants/{id}").metadata::<SourceKeyMetadata>().is_none());
    client
        .get("/tenants/7")
        .header("x-tenant", "acme")
        .send()
        .assert_status(StatusCode::OK)
        .assert_body_eq("acme:7");
    client.get("/tenants/7").send().assert_status(StatusCode::BAD_REQUEST);
}

#[test]
fn test_every_other_endpoint_is_specialized() {
    let (client, _) = client();
    let endpoints = client.application().endpoints();

    let generic: Vec<&str> = endpoints
        .iter()
        .filter(|endpoint| !endpoint.is_specialized())
        .map(Endpoint::pattern)
        .collect();
    assert_eq!(generic, vec!["/tenants/{id}", "/pair/b/{y}"]);
    assert_eq!(endpoints.len(), THUNKS.len() + 2);
}

#[test]
fn test_same_line_registrations_do_not_share_a_thunk() {
    let (client, _) = client();

    let first = endpoint(&client, "/pair/a/{x}");
    let second = endpoint(&client, "/pair/b/{y}");
    let key = first.metadata::<SourceKeyMetadata>().unwrap();
    assert!(first.is_specialized());
    assert!(!second.is_specialized());
    assert!(second.metadata::<SourceKeyMetadata>().is_none());
    assert_eq!(THUNKS.iter().filter(|(other, _)| other.line() == key.0.line()).count(), 1);

    client.get("/pair/a/5").send().assert_status(StatusCode::OK).assert_body_eq("5");
    client.get("/pair/b/5").send().assert_status(StatusCode::OK).assert_body_eq("1005");
}

#[test]
fn test_shared_handler_gets_independent_entries() {
    let (client, _) = client();

    let catalog = endpoint(&client, "/catalog/{id}").metadata::<SourceKeyMetadata>().unwrap();
    let archive = endpoint(&client, "/archive/{id}").metadata::<SourceKeyMetadata>().unwrap();
    assert_ne!(catalog, archive);
    assert_eq!(catalog.0.path(), archive.0.path());
    assert_eq!(archive.0.line(), catalog.0.line() + 1);

    let compass = json!({"id": 1, "name": "compass"});
    client.get("/catalog/1").send().assert_status(StatusCode::OK).assert_json_eq(&compass);
    client.get("/archive/1").send().assert_status(StatusCode::OK).assert_json_eq(&compass);
    client.get("/archive/9").send().assert_status(StatusCode::NOT_FOUND);
}

#[test]
fn test_json_body_and_services() {
    let (client, _) = client();

    let item = Item {
        id: 3,
        name: "astrolabe".to_string(),
    };
    client.post("/catalog").json(&item).send().assert_status(StatusCode::CREATED);
    client
        .post("/catalog")
        .json(&json!({"id": 4, "name": " "}))
        .send()
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    client
        .post("/catalog")
        .body("not json")
        .send()
        .assert_status(StatusCode::BAD_REQUEST);

    client.get("/catalog").send().assert_status(StatusCode::OK).assert_body_eq("2");
    let names: Vec<&str> = client.application().endpoints().iter().map(Endpoint::name).collect();
    assert!(names.contains(&"catalog-size"), "{names:?}");
    assert!(names.contains(&"POST /catalog"), "{names:?}");
}

#[test]
fn test_filtered_endpoint_skips_handler_on_bad_request() {
    let (client, probe) = client();
    assert!(endpoint(&client, "/guarded/{id}").is_specialized());

    client.get("/guarded/5").send().assert_status(StatusCode::OK).assert_body_eq("5");
    assert_eq!((probe.filter_calls(), probe.handler_calls()), (1, 1));

    client
        .get("/guarded/abc")
        .send()
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_empty_body();
    assert_eq!((probe.filter_calls(), probe.handler_calls()), (2, 1));

    client
        .get("/guarded/-1")
        .send()
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!((probe.filter_calls(), probe.handler_calls()), (3, 1));
}

#[test]
fn test_unfiltered_endpoint_always_invokes_handler() {
    let (client, probe) = client();

    client.get("/plain/-1").send().assert_status(StatusCode::OK).assert_body_eq("-1");
    client.get("/plain/2").send().assert_body_eq("2");

    assert_eq!((probe.filter_calls(), probe.handler_calls()), (0, 2));
}

#[test]
fn test_generic_application_answers_the_same() {
    let (specialized, _) = client();
    let generic = TestClient::new(generic_app(Arc::new(Probe::default())).unwrap());
    assert!(generic.application().endpoints().iter().all(|e| !e.is_specialized()));

    for uri in ["/items/42", "/items/x", "/catalog/2", "/catalog/9", "/catalog", "/plain/3", "/missing"] {
        let left = specialized.get(uri).send();
        let right = generic.get(uri).send();
        assert_eq!(left.status(), right.status(), "{uri}");
        if left.is_success() {
            assert_eq!(left.body(), right.body(), "{uri}");
        }
    }
    generic
        .delete("/items/1")
        .send()
        .assert_status(StatusCode::METHOD_NOT_ALLOWED);
}
