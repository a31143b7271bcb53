//! HTTP surface of the validator: `PUT <base>/validate/connection` and
//! friends, served with actix-web.

pub mod errors;
mod handlers;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use common::config::ValidatorConfig;
use components::{ConnectionValidator, ConnectorRegistry};
use std::sync::Arc;

pub use errors::RequestError;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ConnectorRegistry>,
    pub validator: ConnectionValidator,
}

impl AppState {
    pub fn new(registry: ConnectorRegistry, validator: ConnectionValidator) -> Self {
        Self {
            registry: Arc::new(registry),
            validator,
        }
    }
}

/// Mounts every route under `base_path` (empty or starting with `/`, no
/// trailing slash). `/healthz` stays at the root.
pub fn configure(cfg: &mut web::ServiceConfig, base_path: &str) {
    cfg.route(
        &format!("{base_path}/validate/connection"),
        web::put().to(handlers::validate_by_class),
    )
    .route(
        &format!("{base_path}/{{connector}}/validate/connection"),
        web::put().to(handlers::validate_connector),
    )
    .route(
        &format!("{base_path}/connectors"),
        web::get().to(handlers::list_connectors),
    )
    .route("/healthz", web::get().to(handlers::health));
}

pub async fn run_backend(config: &ValidatorConfig, registry: ConnectorRegistry) -> std::io::Result<()> {
    let validator = ConnectionValidator::new(config.probe.timeout());
    let state = web::Data::new(AppState::new(registry, validator));
    let base_path = config.base_path().to_string();

    tracing::info!(
        addr = %config.server.addr,
        base_path = %base_path,
        probe_timeout_ms = config.probe.timeout_ms,
        connectors = state.registry.len(),
        "starting validation server"
    );

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(state.clone())
            .configure(|cfg| configure(cfg, &base_path))
    })
    .bind(config.server.addr.as_str())?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::{header, StatusCode};
    use actix_web::test;
    use components::connectors::{mongodb, postgres};
    use components::probe::stub::StubProbe;
    use components::ProbeFailure;
    use serde_json::{json, Value};
    use std::time::Duration;

    const BASE: &str = "/debezium";

    fn state(mongo_probe: Arc<StubProbe>) -> web::Data<AppState> {
        let registry = ConnectorRegistry::new()
            .with(mongodb::definition(), mongo_probe)
            .and_then(|r| r.with(postgres::definition(), Arc::new(StubProbe::reachable())))
            .expect("registry");
        web::Data::new(AppState::new(
            registry,
            ConnectionValidator::new(Duration::from_secs(1)),
        ))
    }

    fn mongo_body() -> Value {
        json!({
            "connector.class": mongodb::CONNECTOR_CLASS_NAME,
            "mongodb.connection.string": "mongodb://mongo1:27017/?replicaSet=rs0",
            "mongodb.user": "debezium",
            "mongodb.password": "dbz",
            "mongodb.server.selection.timeout.ms": 10000,
            "snapshot.mode": "never",
            "topic.prefix": "mongo1"
        })
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data($state)
                    .configure(|cfg| configure(cfg, BASE)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn valid_configuration_returns_valid_report() {
        let probe = Arc::new(StubProbe::reachable());
        let app = app!(state(probe.clone()));

        let req = test::TestRequest::put()
            .uri("/debezium/mongodb/validate/connection")
            .set_json(mongo_body())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "status": "VALID", "validationResults": [] }));
        assert_eq!(probe.calls(), 1);
    }

    #[actix_web::test]
    async fn unreachable_store_is_still_a_200() {
        let probe = Arc::new(StubProbe::failing(ProbeFailure::unreachable(
            "Server selection timeout: No available servers",
        )));
        let app = app!(state(probe));

        let mut body = mongo_body();
        body["mongodb.connection.string"] =
            json!("mongodb://192.168.222.222:27017/?replicaSet=zz666");
        let req = test::TestRequest::put()
            .uri("/debezium/mongodb/validate/connection")
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "INVALID");
        assert_eq!(body["validationResults"].as_array().map(Vec::len), Some(1));
        assert_eq!(
            body["validationResults"][0]["property"],
            "mongodb.connection.string"
        );
        assert_eq!(
            body["validationResults"][0]["message"],
            "Unable to connect: Server selection timeout: No available servers"
        );
    }

    #[actix_web::test]
    async fn missing_connection_string_is_reported_without_probing() {
        let probe = Arc::new(StubProbe::reachable());
        let app = app!(state(probe.clone()));

        let req = test::TestRequest::put()
            .uri("/debezium/mongodb/validate/connection")
            .set_json(json!({ "connector.class": mongodb::CONNECTOR_CLASS_NAME }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["status"], "INVALID");
        assert_eq!(
            body["validationResults"][0],
            json!({
                "property": "mongodb.connection.string",
                "message": "The 'mongodb.connection.string' value is invalid: Missing connection string"
            })
        );
        assert_eq!(probe.calls(), 0);
    }

    #[actix_web::test]
    async fn connector_is_selected_by_class() {
        let probe = Arc::new(StubProbe::reachable());
        let app = app!(state(probe.clone()));

        let req = test::TestRequest::put()
            .uri("/debezium/validate/connection")
            .set_json(mongo_body())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "VALID");
        assert_eq!(probe.calls(), 1);

        let req = test::TestRequest::put()
            .uri("/debezium/validate/connection")
            .set_json(json!({ "topic.prefix": "x" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::put()
            .uri("/debezium/validate/connection")
            .set_json(json!({ "connector.class": "io.debezium.connector.oracle.OracleConnector" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn unknown_alias_is_not_found() {
        let app = app!(state(Arc::new(StubProbe::reachable())));
        let req = test::TestRequest::put()
            .uri("/debezium/oracle/validate/connection")
            .set_json(json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "unknown connector type 'oracle'");
    }

    #[actix_web::test]
    async fn malformed_requests_are_rejected() {
        let app = app!(state(Arc::new(StubProbe::reachable())));

        let req = test::TestRequest::put()
            .uri("/debezium/mongodb/validate/connection")
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{ not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::put()
            .uri("/debezium/mongodb/validate/connection")
            .set_json(json!({ "tasks.max": [1, 2] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(
            body["error"],
            "property 'tasks.max' must be a string, number or boolean"
        );

        let req = test::TestRequest::put()
            .uri("/debezium/mongodb/validate/connection")
            .set_json(json!(["not", "an", "object"]))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::put()
            .uri("/debezium/mongodb/validate/connection")
            .insert_header((header::CONTENT_TYPE, "text/plain"))
            .set_payload(mongo_body().to_string())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[actix_web::test]
    async fn null_values_count_as_absent() {
        let app = app!(state(Arc::new(StubProbe::reachable())));
        let mut body = mongo_body();
        body["topic.prefix"] = Value::Null;

        let req = test::TestRequest::put()
            .uri("/debezium/mongodb/validate/connection")
            .set_json(body)
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["validationResults"][0]["property"], "topic.prefix");
    }

    #[actix_web::test]
    async fn lists_connectors_and_health() {
        let app = app!(state(Arc::new(StubProbe::reachable())));

        let req = test::TestRequest::get().uri("/debezium/connectors").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            body,
            json!([
                { "alias": "mongodb", "connectorClass": mongodb::CONNECTOR_CLASS_NAME },
                { "alias": "postgres", "connectorClass": postgres::CONNECTOR_CLASS_NAME }
            ])
        );

        let req = test::TestRequest::get().uri("/healthz").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
