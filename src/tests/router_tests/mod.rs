mod listman_tests;
mod monitor_tests;

use crate::config::ListmanConfig;
use crate::router::{handle, AppState};
use crate::tests::utils::TestDbs;
use astra::{Body, Response};
use http::{Method, Request};
use std::io::Read;

fn state(dbs: &TestDbs) -> AppState {
    AppState {
        listman: dbs.listman.clone(),
        warehouse: dbs.warehouse.clone(),
        listman_cfg: ListmanConfig {
            allowed_domains: vec!["example.com".to_string()],
            public_url: "http://ops.example.com/listman".to_string(),
        },
    }
}

fn get(uri: &str) -> astra::Request {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn body_of(resp: Response) -> String {
    let mut body = String::new();
    resp.into_body().reader().read_to_string(&mut body).unwrap();
    body
}

/// Status and body of a GET that the router answered without error.
fn get_ok(dbs: &TestDbs, uri: &str) -> (u16, String) {
    let resp = handle(get(uri), &state(dbs)).expect("Handler failed");
    (resp.status().as_u16(), body_of(resp))
}
