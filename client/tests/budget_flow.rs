//! Budget creation/update flow against a stub server, pinning both the
//! totals pass (run before submission) and the Spanish wire contract.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post, put};
use axum::{Json, Router};
use serde_json::json;

use clinic_client::{ClientError, ClinicClient, ValidationError};
use shared::{BudgetDraft, Phase, Procedure};

#[derive(Default)]
struct BudgetStub {
    received_body: Mutex<Option<serde_json::Value>>,
}

async fn create_budget(
    State(stub): State<Arc<BudgetStub>>,
    Json(body): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    *stub.received_body.lock().unwrap() = Some(body.clone());
    let mut budget = body;
    budget["_id"] = json!("b-1");
    Json(budget)
}

async fn update_budget(
    State(stub): State<Arc<BudgetStub>>,
    Json(body): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    *stub.received_body.lock().unwrap() = Some(body.clone());
    let mut budget = body;
    budget["_id"] = json!("b-1");
    Json(budget)
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn draft() -> BudgetDraft {
    BudgetDraft {
        patient_id: "p-17".to_string(),
        specialty: "Ortodoncia".to_string(),
        phases: vec![
            Phase {
                name: "Fase Inicial".to_string(),
                description: "Diagnóstico".to_string(),
                procedures: vec![
                    Procedure {
                        name: "Limpieza".to_string(),
                        unit_count: 2,
                        unit_cost: 40.0,
                        cost_total: 0.0,
                    },
                    Procedure {
                        name: "Radiografía".to_string(),
                        unit_count: 1,
                        unit_cost: 25.5,
                        cost_total: 0.0,
                    },
                ],
                total: 0.0,
            },
            Phase {
                name: "Fase Final".to_string(),
                description: String::new(),
                procedures: vec![Procedure {
                    name: "Corona".to_string(),
                    unit_count: 1,
                    unit_cost: 320.0,
                    cost_total: 0.0,
                }],
                total: 0.0,
            },
        ],
        total_general: 0.0,
    }
}

#[tokio::test]
async fn create_budget_submits_computed_totals_in_wire_format() {
    let stub = Arc::new(BudgetStub::default());
    let router = Router::new()
        .route("/api/budgets", post(create_budget))
        .with_state(stub.clone());
    let base_url = serve(router).await;
    let client = ClinicClient::new(base_url);

    let created = client.create_budget(draft()).await.unwrap();
    assert_eq!(created.id, "b-1");
    assert_eq!(created.total_general, 105.5 + 320.0);
    assert_eq!(created.phases[0].total, 105.5);
    assert_eq!(created.phases[0].procedures[0].cost_total, 80.0);

    // The body on the wire carries the Spanish contract and the totals
    // computed before submission.
    let body = stub.received_body.lock().unwrap().clone().unwrap();
    assert_eq!(body["paciente"], "p-17");
    assert_eq!(body["totalGeneral"], 425.5);
    assert_eq!(body["fases"][0]["total"], 105.5);
    assert_eq!(body["fases"][0]["procedimientos"][0]["costoTotal"], 80.0);
    assert_eq!(body["fases"][0]["procedimientos"][1]["numeroPiezas"], 1);
    assert_eq!(body["fases"][1]["procedimientos"][0]["costoPorUnidad"], 320.0);
}

#[tokio::test]
async fn update_budget_recomputes_totals_like_create() {
    let stub = Arc::new(BudgetStub::default());
    let router = Router::new()
        .route("/api/budgets/:id", put(update_budget))
        .with_state(stub.clone());
    let base_url = serve(router).await;
    let client = ClinicClient::new(base_url);

    let mut changed = draft();
    changed.phases[0].procedures[0].unit_count = 4;

    let updated = client.update_budget("b-1", changed).await.unwrap();
    assert_eq!(updated.phases[0].total, 160.0 + 25.5);

    let body = stub.received_body.lock().unwrap().clone().unwrap();
    assert_eq!(body["fases"][0]["procedimientos"][0]["costoTotal"], 160.0);
}

#[tokio::test]
async fn invalid_draft_is_refused_before_any_request() {
    let stub = Arc::new(BudgetStub::default());
    let router = Router::new()
        .route("/api/budgets", post(create_budget))
        .with_state(stub.clone());
    let base_url = serve(router).await;
    let client = ClinicClient::new(base_url);

    let mut bad = draft();
    bad.phases[1].procedures[0].unit_cost = -320.0;

    let err = client.create_budget(bad).await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Validation(ValidationError::NegativeUnitCost)
    ));
    assert!(stub.received_body.lock().unwrap().is_none());
}

#[tokio::test]
async fn budget_status_goes_out_as_estado() {
    async fn patch_status(
        State(stub): State<Arc<BudgetStub>>,
        Path(id): Path<String>,
        Json(body): Json<serde_json::Value>,
    ) -> Json<serde_json::Value> {
        *stub.received_body.lock().unwrap() = Some(body);
        Json(json!({
            "_id": id,
            "paciente": "p-17",
            "especialidad": "Ortodoncia",
            "fases": [],
            "totalGeneral": 0.0
        }))
    }

    let stub = Arc::new(BudgetStub::default());
    let router = Router::new()
        .route("/api/budgets/:id/estado", patch(patch_status))
        .with_state(stub.clone());
    let base_url = serve(router).await;
    let client = ClinicClient::new(base_url);

    let budget = client.update_budget_status("b-1", "aprobado").await.unwrap();
    assert_eq!(budget.id, "b-1");

    let body = stub.received_body.lock().unwrap().clone().unwrap();
    assert_eq!(body, json!({ "estado": "aprobado" }));
}

#[tokio::test]
async fn treatment_budget_routes_compute_totals_like_create() {
    let stub = Arc::new(BudgetStub::default());
    let router = Router::new()
        .route(
            "/api/budgets/treatment/:treatment_id",
            post(create_budget).get(|| async {
                Json(json!({
                    "_id": "b-7",
                    "paciente": "p-17",
                    "especialidad": "Ortodoncia",
                    "fases": [],
                    "totalGeneral": 425.5
                }))
            }),
        )
        .with_state(stub.clone());
    let base_url = serve(router).await;
    let client = ClinicClient::new(base_url);

    let created = client
        .create_budget_for_treatment("t-9", draft())
        .await
        .unwrap();
    assert_eq!(created.total_general, 425.5);

    // The treatment route gets the same totals pass as a plain create.
    let body = stub.received_body.lock().unwrap().clone().unwrap();
    assert_eq!(body["totalGeneral"], 425.5);
    assert_eq!(body["fases"][0]["total"], 105.5);

    let fetched = client.budget_by_treatment("t-9").await.unwrap();
    assert_eq!(fetched.id, "b-7");
    assert_eq!(fetched.total_general, 425.5);
}

#[tokio::test]
async fn delete_budget_discards_response_body() {
    async fn delete_handler() -> StatusCode {
        StatusCode::NO_CONTENT
    }

    let router = Router::new().route("/api/budgets/:id", delete(delete_handler));
    let base_url = serve(router).await;
    let mut client = ClinicClient::new(base_url);

    client.delete_budget("b-1").await.unwrap();
}

#[tokio::test]
async fn monthly_report_sends_spanish_query_params() {
    async fn monthly(
        Query(params): Query<HashMap<String, String>>,
    ) -> (StatusCode, Json<serde_json::Value>) {
        if params.get("mes").map(String::as_str) == Some("3")
            && params.get("año").map(String::as_str) == Some("2025")
        {
            (
                StatusCode::OK,
                Json(json!({ "totalIngresos": 1500.0, "cantidadPagos": 3 })),
            )
        } else {
            (StatusCode::BAD_REQUEST, Json(json!({ "error": "parámetros inválidos" })))
        }
    }

    let router = Router::new().route("/api/financial-reports/mensual", get(monthly));
    let base_url = serve(router).await;
    let client = ClinicClient::new(base_url);

    let report = client.monthly_report(3, 2025).await.unwrap();
    assert_eq!(report.total_income, 1500.0);
    assert_eq!(report.payment_count, 3);
    assert!(report.payments.is_empty());
}

#[tokio::test]
async fn network_failure_maps_to_network_error() {
    // Nothing is listening on this port.
    let client = ClinicClient::new("http://127.0.0.1:9");
    let err = client.budgets().await.unwrap_err();
    assert!(matches!(err, ClientError::Network(_)));
}
