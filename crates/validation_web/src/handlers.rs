use crate::errors::RequestError;
use crate::AppState;
use actix_web::{web, HttpMessage, HttpRequest, HttpResponse, Responder};
use components::connectors::CONNECTOR_CLASS;
use components::{ConfigMap, RegisteredConnector};
use serde::Serialize;
use serde_json::Value;

const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Serialize)]
struct ConnectorSummary<'a> {
    alias: &'a str,
    #[serde(rename = "connectorClass")]
    connector_class: &'a str,
}

/// `PUT {base}/{connector}/validate/connection`
pub async fn validate_connector(
    state: web::Data<AppState>,
    connector: web::Path<String>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, RequestError> {
    let config = parse_config(&req, &body)?;
    let alias = connector.into_inner();
    let registered = state
        .registry
        .get(&alias)
        .ok_or_else(|| RequestError::not_found(format!("unknown connector type '{alias}'")))?;

    Ok(run_validation(&state, registered, &config).await)
}

/// `PUT {base}/validate/connection`, connector picked by `connector.class`.
pub async fn validate_by_class(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, RequestError> {
    let config = parse_config(&req, &body)?;
    let class = config.value(CONNECTOR_CLASS).ok_or_else(|| {
        RequestError::bad_request(format!(
            "'{CONNECTOR_CLASS}' is required to select a connector type"
        ))
    })?;
    let registered = state.registry.by_class(class).ok_or_else(|| {
        RequestError::not_found(format!("no connector type registered for class '{class}'"))
    })?;

    Ok(run_validation(&state, registered, &config).await)
}

pub async fn list_connectors(state: web::Data<AppState>) -> impl Responder {
    let connectors: Vec<ConnectorSummary<'_>> = state
        .registry
        .iter()
        .map(|c| ConnectorSummary {
            alias: c.definition().alias(),
            connector_class: c.definition().connector_class(),
        })
        .collect();
    HttpResponse::Ok().json(connectors)
}

pub async fn health() -> impl Responder {
    HttpResponse::Ok().finish()
}

async fn run_validation(
    state: &AppState,
    registered: &RegisteredConnector,
    config: &ConfigMap,
) -> HttpResponse {
    let definition = registered.definition();
    let report = state
        .validator
        .validate(definition, registered.probe(), config)
        .await;

    tracing::info!(
        connector = definition.alias(),
        status = %report.status(),
        errors = report.errors().len(),
        "validated connector configuration"
    );
    HttpResponse::Ok().json(report)
}

fn parse_config(req: &HttpRequest, body: &[u8]) -> Result<ConfigMap, RequestError> {
    let content_type = req.content_type();
    if !content_type.eq_ignore_ascii_case(JSON_CONTENT_TYPE) {
        return Err(RequestError::unsupported_media_type(format!(
            "expected content type {JSON_CONTENT_TYPE}, got '{content_type}'"
        )));
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| RequestError::bad_request(format!("malformed JSON body: {e}")))?;
    ConfigMap::try_from(value).map_err(|e| RequestError::bad_request(e.message()))
}
