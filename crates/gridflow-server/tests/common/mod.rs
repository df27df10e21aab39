#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Request, Response, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use gridflow_core::WorkflowManager;
use gridflow_server::{api::build_router, ServerConfig, WorkflowServer};

pub const WORKFLOW_PATH: &str = "/crabserver/workflow";

pub const ALICE_DN: &str = "/DC=ch/DC=cern/OU=Users/CN=alice";
pub const BOB_DN: &str = "/DC=ch/DC=cern/OU=Users/CN=bob";

pub fn test_config() -> ServerConfig {
    ServerConfig {
        port: 0,
        bind_address: "127.0.0.1".to_string(),
        log_level: "debug".to_string(),
        ..ServerConfig::default()
    }
}

pub fn router_with(manager: Arc<dyn WorkflowManager>) -> Router {
    router_with_config(test_config(), manager)
}

pub fn router_with_config(config: ServerConfig, manager: Arc<dyn WorkflowManager>) -> Router {
    let server = WorkflowServer::new(config, manager);
    build_router(Arc::new(server))
}

/// Form body of a valid submission for `workflow`
pub fn submit_form(workflow: &str) -> String {
    [
        ("workflow", workflow),
        ("jobtype", "Analysis"),
        ("jobsw", "CMSSW_5_3_4"),
        ("jobarch", "slc5_amd64_gcc462"),
        ("inputdata", "/RelValProdTTbar/JobRobot-MC_3XY_V24_JobRobot-v1/GEN-SIM-DIGI-RECO"),
        ("sitewhitelist", "T2_CH_CERN"),
        ("splitalgo", "FileBased"),
        ("algoargs", "10"),
        ("configdoc", "c0ffee"),
        ("userisburl", "https://cache.example.org/sandbox.tgz"),
        ("savelogsflag", "0"),
        ("publishname", "mypub"),
        ("asyncdest", "T2_IT_Pisa"),
        ("blacklistT1", "0"),
    ]
    .iter()
    .map(|(k, v)| format!("{}={}", k, v))
    .collect::<Vec<_>>()
    .join("&")
}

pub fn request(method: &str, uri: &str, user: Option<(&str, &str)>, form: Option<String>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((dn, login)) = user {
        builder = builder.header("cms-authn-dn", dn).header("cms-authn-login", login);
    }
    match form {
        Some(form) => builder
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(form))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn alice() -> Option<(&'static str, &'static str)> {
    Some((ALICE_DN, "alice"))
}

pub fn bob() -> Option<(&'static str, &'static str)> {
    Some((BOB_DN, "bob"))
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Response<Body>) {
    let response = app.clone().oneshot(request).await.unwrap();
    (response.status(), response)
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn rest_status(response: &Response<Body>) -> String {
    response
        .headers()
        .get("x-rest-status")
        .map(|v| v.to_str().unwrap().to_string())
        .unwrap_or_default()
}
