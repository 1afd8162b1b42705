//! Built-in API documentation and liveness.

use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

/// Route and resource documentation served at `GET /`.
pub fn api_docs() -> Value {
    json!({
        "resources": {
            "Timer": {
                "fields": {
                    "id": "Unique id (<created millis>:<uuid>)",
                    "group": "Name of the owning group",
                    "title": "Title",
                    "start": "Start date",
                    "end": "End date (null while running)",
                    "hourlyPrice": "Price per hour",
                    "...": "Anything you attach"
                }
            },
            "Group": {
                "fields": {
                    "name": "Unique name",
                    "...": "Anything you attach"
                }
            },
            "Consolidation": {
                "fields": {
                    "duration": "Total duration of consolidated timers in ms.",
                    "price": "Total price",
                    "start": "Start date of the earliest consolidated timer.",
                    "end": "End date of the latest consolidated timer.",
                    "countTimers": "Number of consolidated timers."
                }
            }
        },
        "query": {
            "title": "Case-insensitive substring of the title",
            "since": "Only timers started at or after this RFC 3339 date",
            "until": "Only timers started before this RFC 3339 date"
        },
        "routes": {
            "GET::/timers": { "desc": "Returns all timers.", "returns": "Timers" },
            "DELETE::/timers": { "desc": "Removes all timers.", "returns": "Removed" },
            "GET::/timers/running": { "desc": "Returns all running timers.", "returns": "Timers" },
            "GET::/timers/consolidate": { "desc": "Returns consolidation of all timers.", "returns": "Consolidation" },
            "GET::/timers/:group": { "desc": "Returns all timers in a group.", "returns": "Timers" },
            "DELETE::/timers/:group": { "desc": "Removes all timers in \"group\".", "returns": "Removed" },
            "GET::/timers/:group/running": { "desc": "Returns running timers in a group.", "returns": "Timers" },
            "GET::/timers/:group/consolidate": { "desc": "Returns consolidation of all timers in a group.", "returns": "Consolidation" },
            "POST::/timers/:group/start": { "desc": "Starts a new timer in \"group\".", "returns": "Timer" },
            "GET::/timers/:group/:id": { "desc": "Returns a single timer.", "returns": "Timer" },
            "PUT::/timers/:group/:id": { "desc": "Updates a timer; id, group, start and end are read-only.", "returns": "Timer" },
            "DELETE::/timers/:group/:id": { "desc": "Removes timer \"id\" in \"group\".", "returns": "Removed" },
            "POST::/timers/:group/:id/stop": { "desc": "Stops timer \"id\" in \"group\".", "returns": "Timer" },
            "GET::/groups": { "desc": "Returns all groups.", "returns": "Groups" },
            "GET::/groups/names": { "desc": "Returns all group names.", "returns": "Names" },
            "POST::/groups/:name": { "desc": "Creates (or replaces) a group.", "returns": "Group" },
            "GET::/groups/:name": { "desc": "Returns a group.", "returns": "Group" },
            "PUT::/groups/:name": { "desc": "Updates a group; the name is read-only.", "returns": "Group" },
            "DELETE::/groups/:name": { "desc": "Removes a group and all its timers.", "returns": "Removed" },
            "GET::/groups/:name/timers": { "desc": "Returns all timers of a group.", "returns": "Timers" },
            "GET::/groups/:name/timers/running": { "desc": "Returns running timers of a group.", "returns": "Timers" },
            "GET::/groups/:name/consolidate": { "desc": "Returns consolidation of a group.", "returns": "Consolidation" }
        }
    })
}

pub async fn docs() -> Json<Value> {
    Json(api_docs())
}

#[derive(Serialize)]
pub struct HealthStatus {
    pub version: &'static str,
    pub status: &'static str,
}

pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "ok",
    })
}
