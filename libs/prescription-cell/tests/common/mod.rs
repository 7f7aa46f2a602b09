// Stateful stand-in for the PostgREST endpoints the prescription cell calls.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use prescription_cell::PrescriptionState;
use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};

const REQUIRED_KEYS: [&str; 5] = ["name", "dosage", "frequency", "duration", "notes"];

#[derive(Default)]
struct Tables {
    prescriptions: HashMap<Uuid, StoredRow>,
    consultations: HashMap<Uuid, Uuid>,
    next_seq: u64,
    write_failure: Option<(String, String)>,
}

#[derive(Clone)]
struct StoredRow {
    seq: u64,
    row: Value,
}

#[derive(Clone, Default)]
pub struct FakePostgrest {
    tables: Arc<Mutex<Tables>>,
}

impl FakePostgrest {
    pub async fn start() -> (MockServer, FakePostgrest) {
        let server = MockServer::start().await;
        let fake = FakePostgrest::default();

        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/upsert_prescription"))
            .respond_with(UpsertResponder(fake.clone()))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/prescriptions"))
            .respond_with(SelectResponder(fake.clone()))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/appointments"))
            .respond_with(OwnerResponder(fake.clone()))
            .mount(&server)
            .await;

        (server, fake)
    }

    /// Registers a consultation and returns its id.
    pub fn add_consultation(&self, patient_id: Uuid) -> Uuid {
        let consultation_id = Uuid::new_v4();
        self.tables.lock().unwrap().consultations.insert(consultation_id, patient_id);
        consultation_id
    }

    /// Overwrites the stored medications text, as an external script would.
    pub fn set_raw_medications(&self, prescription_id: Uuid, text: &str) {
        let mut tables = self.tables.lock().unwrap();
        let stored = tables
            .prescriptions
            .get_mut(&prescription_id)
            .expect("prescription must exist before tampering");
        stored.row["medications"] = Value::String(text.to_string());
    }

    pub fn raw_medications(&self, prescription_id: Uuid) -> Option<String> {
        self.tables
            .lock()
            .unwrap()
            .prescriptions
            .get(&prescription_id)
            .and_then(|stored| stored.row["medications"].as_str().map(str::to_string))
    }

    pub fn row_count(&self) -> usize {
        self.tables.lock().unwrap().prescriptions.len()
    }

    /// Makes every following write fail inside the function with this SQLSTATE.
    pub fn fail_writes_with(&self, code: &str, message: &str) {
        self.tables.lock().unwrap().write_failure = Some((code.to_string(), message.to_string()));
    }
}

pub fn app_config(server: &MockServer) -> AppConfig {
    TestConfig::with_supabase_url(server.uri()).to_app_config()
}

pub fn prescription_state(server: &MockServer) -> Arc<PrescriptionState> {
    let config = app_config(server);
    let supabase = Arc::new(SupabaseClient::new(&config));
    Arc::new(PrescriptionState::new(Arc::new(config), supabase))
}

fn eq_filter(request: &Request, column: &str) -> Option<Uuid> {
    request
        .url
        .query_pairs()
        .find(|(key, _)| key == column)
        .and_then(|(_, value)| value.strip_prefix("eq.").and_then(|id| Uuid::parse_str(id).ok()))
}

fn param_uuid(body: &Value, key: &str) -> Option<Uuid> {
    body.get(key).and_then(Value::as_str).and_then(|s| Uuid::parse_str(s).ok())
}

fn check_violation() -> ResponseTemplate {
    ResponseTemplate::new(400).set_body_json(MockSupabaseResponses::postgrest_error(
        "23514",
        "new row for relation \"prescriptions\" violates check constraint \"prescriptions_medications_shape\"",
    ))
}

/// Mirrors `upsert_prescription`: validate, then insert or replace one row.
struct UpsertResponder(FakePostgrest);

impl Respond for UpsertResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = match serde_json::from_slice(&request.body) {
            Ok(body) => body,
            Err(_) => return ResponseTemplate::new(400),
        };

        let medications = &body["p_medications"];
        let well_formed = medications.as_array().is_some_and(|elements| {
            elements.iter().all(|element| {
                element.as_object().is_some_and(|object| {
                    REQUIRED_KEYS.iter().all(|key| object.get(*key).is_some_and(Value::is_string))
                })
            })
        });
        if !well_formed {
            return check_violation();
        }

        let (Some(id), Some(consultation_id), Some(doctor_id), Some(patient_id)) = (
            param_uuid(&body, "p_id"),
            param_uuid(&body, "p_consultation_id"),
            param_uuid(&body, "p_doctor_id"),
            param_uuid(&body, "p_patient_id"),
        ) else {
            return ResponseTemplate::new(400).set_body_json(MockSupabaseResponses::postgrest_error(
                "22P02",
                "invalid input syntax for type uuid",
            ));
        };

        let mut tables = self.0.tables.lock().unwrap();

        if let Some((code, message)) = tables.write_failure.clone() {
            return ResponseTemplate::new(409)
                .set_body_json(MockSupabaseResponses::postgrest_error(&code, &message));
        }

        if !tables.consultations.contains_key(&consultation_id) {
            return ResponseTemplate::new(409).set_body_json(MockSupabaseResponses::postgrest_error(
                "23503",
                "insert or update on table \"prescriptions\" violates foreign key constraint",
            ));
        }

        let now = Utc::now().to_rfc3339();
        let created_at = tables
            .prescriptions
            .get(&id)
            .map(|stored| stored.row["created_at"].clone())
            .unwrap_or_else(|| json!(now));

        tables.next_seq += 1;
        let seq = tables.next_seq;

        let row = json!({
            "id": id,
            "consultation_id": consultation_id,
            "doctor_id": doctor_id,
            "patient_id": patient_id,
            "instructions": body["p_instructions"].as_str().unwrap_or_default(),
            "medications": medications.to_string(),
            "created_at": created_at,
            "updated_at": now
        });

        tables.prescriptions.insert(id, StoredRow { seq, row: row.clone() });

        ResponseTemplate::new(200).set_body_json(json!([row]))
    }
}

struct SelectResponder(FakePostgrest);

impl Respond for SelectResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let casts_medications = request
            .url
            .query_pairs()
            .any(|(key, value)| key == "select" && value.contains("medications::text"));
        if !casts_medications {
            return ResponseTemplate::new(400).set_body_json(MockSupabaseResponses::postgrest_error(
                "PGRST100",
                "medications must be selected as text",
            ));
        }

        let tables = self.0.tables.lock().unwrap();
        let mut rows: Vec<StoredRow> = if let Some(id) = eq_filter(request, "id") {
            tables.prescriptions.get(&id).cloned().into_iter().collect()
        } else if let Some(consultation_id) = eq_filter(request, "consultation_id") {
            tables
                .prescriptions
                .values()
                .filter(|stored| stored.row["consultation_id"] == json!(consultation_id))
                .cloned()
                .collect()
        } else if let Some(patient_id) = eq_filter(request, "patient_id") {
            tables
                .prescriptions
                .values()
                .filter(|stored| stored.row["patient_id"] == json!(patient_id))
                .cloned()
                .collect()
        } else {
            tables.prescriptions.values().cloned().collect()
        };

        rows.sort_by(|a, b| b.seq.cmp(&a.seq));
        let body: Vec<Value> = rows.into_iter().map(|stored| stored.row).collect();

        ResponseTemplate::new(200).set_body_json(body)
    }
}

struct OwnerResponder(FakePostgrest);

impl Respond for OwnerResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let tables = self.0.tables.lock().unwrap();
        let rows: Vec<Value> = eq_filter(request, "id")
            .and_then(|id| tables.consultations.get(&id))
            .map(|patient_id| MockSupabaseResponses::consultation_owner_row(&patient_id.to_string()))
            .into_iter()
            .collect();

        ResponseTemplate::new(200).set_body_json(rows)
    }
}
