// SPDX-License-Identifier: Apache-2.0

use serde_json::{json, Value};

use crate::errors::API_ERROR_CODES;

fn error_response(description: &str) -> Value {
    json!({
      "description": description,
      "content": {"application/json": {"schema": {"$ref": "#/components/schemas/ApiError"}}}
    })
}

#[must_use]
pub fn openapi_v1_spec() -> Value {
    json!({
      "openapi": "3.0.3",
      "info": {
        "title": "campus-checkin API",
        "version": crate::API_VERSION
      },
      "paths": {
        "/healthz": {
          "get": {"responses": {"200": {"description": "ok"}}}
        },
        "/readyz": {
          "get": {
            "responses": {
              "200": {"description": "ready"},
              "503": error_response("ledger not reachable")
            }
          }
        },
        "/v1/version": {
          "get": {"responses": {"200": {"description": "crate and config schema version"}}}
        },
        "/v1/checkins": {
          "post": {
            "parameters": [
              {"name": "x-user-id", "in": "header", "required": true, "schema": {"type": "string"}}
            ],
            "requestBody": {
              "required": true,
              "content": {"application/json": {"schema": {"$ref": "#/components/schemas/CheckinRequest"}}}
            },
            "responses": {
              "200": {"description": "scan verdict (ACCEPTED, ALREADY_USED, NOT_REGISTERED, MALFORMED)"},
              "400": error_response("invalid request body"),
              "401": error_response("missing caller identity"),
              "403": error_response("caller may not operate the scanner"),
              "413": error_response("request body too large"),
              "503": error_response("ledger unavailable"),
              "504": error_response("ledger timeout")
            }
          }
        },
        "/v1/events/{event_id}/attendance": {
          "get": {
            "parameters": [
              {"name": "event_id", "in": "path", "required": true, "schema": {"type": "string"}},
              {"name": "x-user-id", "in": "header", "required": true, "schema": {"type": "string"}}
            ],
            "responses": {
              "200": {"description": "attendance counts"},
              "403": error_response("caller may not view attendance"),
              "404": error_response("event not found")
            }
          }
        },
        "/v1/events/{event_id}/registrations": {
          "post": {
            "parameters": [
              {"name": "event_id", "in": "path", "required": true, "schema": {"type": "string"}},
              {"name": "x-user-id", "in": "header", "required": true, "schema": {"type": "string"}}
            ],
            "responses": {
              "201": {"description": "registration created"},
              "404": error_response("event or profile not found"),
              "409": error_response("already registered"),
              "422": error_response("event closed")
            }
          }
        },
        "/v1/events/{event_id}/ticket": {
          "get": {
            "parameters": [
              {"name": "event_id", "in": "path", "required": true, "schema": {"type": "string"}},
              {"name": "x-user-id", "in": "header", "required": true, "schema": {"type": "string"}}
            ],
            "responses": {
              "200": {"description": "ticket credential"},
              "404": error_response("registration not found")
            }
          }
        },
        "/v1/me/registrations": {
          "get": {
            "parameters": [
              {"name": "x-user-id", "in": "header", "required": true, "schema": {"type": "string"}}
            ],
            "responses": {
              "200": {"description": "caller registrations"},
              "401": error_response("missing caller identity")
            }
          }
        }
      },
      "components": {
        "schemas": {
          "ApiError": {
            "type": "object",
            "required": ["code", "message", "details", "request_id"],
            "additionalProperties": false,
            "properties": {
              "code": {"$ref": "#/components/schemas/ApiErrorCode"},
              "details": {"type": "object"},
              "message": {"type": "string"},
              "request_id": {"type": "string"}
            }
          },
          "ApiErrorCode": {
            "type": "string",
            "enum": API_ERROR_CODES
          },
          "CheckinRequest": {
            "type": "object",
            "required": ["credential"],
            "additionalProperties": false,
            "properties": {
              "credential": {"type": "string", "maxLength": campus_checkin_model::MAX_CREDENTIAL_BYTES}
            }
          }
        }
      }
    })
}
