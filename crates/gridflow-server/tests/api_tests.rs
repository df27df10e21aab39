mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;

use common::*;
use gridflow_core::{InMemoryWorkflowManager, JobRecord, WorkflowStatus};
use gridflow_server::{config::AuthzDefaults, ServerConfig};

fn setup() -> (Arc<InMemoryWorkflowManager>, axum::Router) {
    let manager = Arc::new(InMemoryWorkflowManager::new());
    let app = router_with(manager.clone());
    (manager, app)
}

async fn submit(app: &axum::Router, workflow: &str, user: Option<(&str, &str)>) {
    let (status, _) = send(app, request("PUT", WORKFLOW_PATH, user, Some(submit_form(workflow)))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_submit_workflow() {
    let (manager, app) = setup();

    let (status, response) = send(
        &app,
        request("PUT", WORKFLOW_PATH, alice(), Some(submit_form("crab_wf1"))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["result"][0]["RequestName"], "crab_wf1");
    assert_eq!(manager.workflow_status("crab_wf1").await.unwrap(), WorkflowStatus::New);
}

#[tokio::test]
async fn test_submit_parameters_in_query_string() {
    let (_, app) = setup();
    let uri = format!("{}?{}", WORKFLOW_PATH, submit_form("from_query"));

    let (status, _) = send(&app, request("PUT", &uri, alice(), None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_submit_duplicate_is_rejected() {
    let (_, app) = setup();
    submit(&app, "dup", alice()).await;

    let (status, response) = send(&app, request("PUT", WORKFLOW_PATH, alice(), Some(submit_form("dup")))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(rest_status(&response), "305");
}

#[tokio::test]
async fn test_requests_without_identity_are_refused() {
    let (_, app) = setup();

    let (status, response) = send(&app, request("PUT", WORKFLOW_PATH, None, Some(submit_form("wf")))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(rest_status(&response), "902");

    let (status, _) = send(&app, request("GET", WORKFLOW_PATH, None, None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_missing_and_invalid_parameters() {
    let (_, app) = setup();

    let form = submit_form("wf").replace("&jobsw=CMSSW_5_3_4", "");
    let (status, response) = send(&app, request("PUT", WORKFLOW_PATH, alice(), Some(form))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(rest_status(&response), "301");
    let body = json_body(response).await;
    assert_eq!(body["errorDetails"]["errorCode"], "ERR_MISSING_PARAMETER");

    let form = submit_form("wf").replace("splitalgo=FileBased", "splitalgo=FileBasedX");
    let (status, response) = send(&app, request("PUT", WORKFLOW_PATH, alice(), Some(form))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(rest_status(&response), "302");

    let uri = format!("{}?workflow=wf&verbose=1", WORKFLOW_PATH);
    let (status, response) = send(&app, request("GET", &uri, alice(), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("verbose"));
}

#[tokio::test]
async fn test_get_latest_workflows_of_caller() {
    let (_, app) = setup();
    submit(&app, "alice_1", alice()).await;
    submit(&app, "alice_2", alice()).await;
    submit(&app, "bob_1", bob()).await;

    let (status, response) = send(&app, request("GET", WORKFLOW_PATH, alice(), None)).await;
    assert_eq!(status, StatusCode::OK);
    let body = json_body(response).await;
    let rows = body["result"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r["workflow"].as_str().unwrap().starts_with("alice_")));

    let uri = format!("{}?limit=1", WORKFLOW_PATH);
    let (_, response) = send(&app, request("GET", &uri, alice(), None)).await;
    let body = json_body(response).await;
    assert_eq!(body["result"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_get_latest_with_huge_age_and_limit() {
    let (_, app) = setup();
    submit(&app, "alice_1", alice()).await;

    for query in ["age=1000000000", "age=9223372036854775807", "limit=9223372036854775807&age=0"] {
        let uri = format!("{}?{}", WORKFLOW_PATH, query);
        let (status, _) = send(&app, request("GET", &uri, alice(), None)).await;
        assert_eq!(status, StatusCode::OK, "{}", query);
    }

    let uri = format!("{}?age=9223372036854775807", WORKFLOW_PATH);
    let (_, response) = send(&app, request("GET", &uri, alice(), None)).await;
    assert_eq!(json_body(response).await["result"].as_array().unwrap().len(), 1);

    let uri = format!("{}?age=9223372036854775808", WORKFLOW_PATH);
    let (status, response) = send(&app, request("GET", &uri, alice(), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(rest_status(&response), "302");
}

#[tokio::test]
async fn test_non_ascii_values_are_rejected() {
    let (_, app) = setup();

    let form = submit_form("wf").replace("jobsw=CMSSW_5_3_4", "jobsw=CMSSW_\u{0665}_3_4");
    let (status, response) = send(&app, request("PUT", WORKFLOW_PATH, alice(), Some(form))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(rest_status(&response), "302");

    let form = submit_form("wf").replace("cache.example.org", "cache.ex\u{e4}mple.org");
    let (status, _) = send(&app, request("PUT", WORKFLOW_PATH, alice(), Some(form))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_status_and_subresources() {
    let (manager, app) = setup();
    submit(&app, "wf1", alice()).await;
    for id in 1..=3 {
        manager
            .record_job(
                "wf1",
                JobRecord {
                    job_id: id,
                    state: "failed".to_string(),
                    exit_code: Some(8021),
                    error_message: Some("FileReadError".to_string()),
                    log_url: Some(format!("https://logs.example.org/{}.tgz", id)),
                    output_url: None,
                },
            )
            .await
            .unwrap();
    }

    let uri = format!("{}?workflow=wf1", WORKFLOW_PATH);
    let (_, response) = send(&app, request("GET", &uri, bob(), None)).await;
    let body = json_body(response).await;
    assert_eq!(body["result"][0]["jobsPerStatus"]["failed"], 3);

    let uri = format!("{}?workflow=wf1&subresource=logs&limit=2", WORKFLOW_PATH);
    let (_, response) = send(&app, request("GET", &uri, alice(), None)).await;
    let body = json_body(response).await;
    assert_eq!(body["result"].as_array().unwrap().len(), 2);

    let uri = format!("{}?workflow=wf1&subresource=errors&shortformat=1", WORKFLOW_PATH);
    let (_, response) = send(&app, request("GET", &uri, alice(), None)).await;
    let body = json_body(response).await;
    assert_eq!(body["result"], json!([{ "workflow": "wf1", "exitcode": 8021, "jobs": 3 }]));

    let uri = format!("{}?workflow=wf1&subresource=configcache", WORKFLOW_PATH);
    let (_, response) = send(&app, request("GET", &uri, alice(), None)).await;
    let body = json_body(response).await;
    assert_eq!(body["result"], json!([{ "wf1": { "configdoc": "c0ffee" } }]));

    let uri = format!("{}?workflow=wf1&subresource=status", WORKFLOW_PATH);
    let (status, response) = send(&app, request("GET", &uri, alice(), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(rest_status(&response), "302");
}

#[tokio::test]
async fn test_get_unknown_workflow() {
    let (_, app) = setup();
    let uri = format!("{}?workflow=nope", WORKFLOW_PATH);
    let (status, response) = send(&app, request("GET", &uri, alice(), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(rest_status(&response), "303");
}

#[tokio::test]
async fn test_only_owner_can_abort() {
    let (manager, app) = setup();
    submit(&app, "wf1", alice()).await;

    let uri = format!("{}?workflow=wf1", WORKFLOW_PATH);
    let (status, response) = send(&app, request("DELETE", &uri, bob(), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(rest_status(&response), "901");
    assert_eq!(manager.workflow_status("wf1").await.unwrap(), WorkflowStatus::New);

    let (status, response) = send(&app, request("DELETE", &uri, alice(), None)).await;
    assert_eq!(status, StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["result"][0]["killed"], json!(["wf1"]));
    assert_eq!(manager.workflow_status("wf1").await.unwrap(), WorkflowStatus::Killed);

    let (status, _) = send(&app, request("DELETE", &uri, alice(), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!("{}?workflow=wf1&force=1", WORKFLOW_PATH);
    let (status, _) = send(&app, request("DELETE", &uri, alice(), None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_abort_requires_a_workflow() {
    let (_, app) = setup();
    let (status, response) = send(&app, request("DELETE", WORKFLOW_PATH, alice(), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(rest_status(&response), "301");
}

#[tokio::test]
async fn test_post_resubmit_and_publish() {
    let (manager, app) = setup();
    submit(&app, "wf1", alice()).await;

    let (status, _) = send(
        &app,
        request("POST", WORKFLOW_PATH, bob(), Some("workflow=wf1&resubmit=1".to_string())),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        request("POST", WORKFLOW_PATH, alice(), Some("workflow=wf1&resubmit=1".to_string())),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(manager.workflow_status("wf1").await.unwrap(), WorkflowStatus::Resubmitted);

    let (status, response) = send(
        &app,
        request(
            "POST",
            WORKFLOW_PATH,
            alice(),
            Some("workflow=wf1&dbsurl=https://dbs.example.org:8443/phys03".to_string()),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["result"][0]["dbsurl"], "https://dbs.example.org:8443/phys03");

    let (status, response) = send(
        &app,
        request("POST", WORKFLOW_PATH, alice(), Some("workflow=wf1&resubmit=0".to_string())),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "result": [] }));
}

#[tokio::test]
async fn test_unsupported_method() {
    let (_, app) = setup();
    let (status, response) = send(&app, request("PATCH", WORKFLOW_PATH, alice(), None)).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(rest_status(&response), "202");
}

#[tokio::test]
async fn test_health_check() {
    let (_, app) = setup();
    let (status, response) = send(&app, request("GET", "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "UP");
    assert_eq!(body["title"], "CRABRESTFull");
    assert_eq!(body["admin"], "cms.analysis.ops@cern.ch");
    assert_eq!(body["dependencies"]["workflowManager"]["status"], "UP");
    assert_eq!(body["dependencies"]["requestManager"]["database"], "reqmgrdb");
}

#[tokio::test]
async fn test_authz_defaults_are_enforced() {
    let config = ServerConfig {
        authz_defaults: AuthzDefaults {
            role: Some("operator".to_string()),
            group: Some("crab3".to_string()),
            site: None,
        },
        ..test_config()
    };
    let app = router_with_config(config, Arc::new(InMemoryWorkflowManager::new()));

    let (status, response) = send(&app, request("GET", WORKFLOW_PATH, alice(), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(rest_status(&response), "901");

    let mut req = request("GET", WORKFLOW_PATH, alice(), None);
    req.headers_mut()
        .insert("cms-authz-operator", "group:crab3 site:T2_CH_CERN".parse().unwrap());
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, request("GET", "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
}
