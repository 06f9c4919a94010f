//! The demo counter page used by `mustweb render` and `mustweb serve`.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use axum::Json;
use mustweb_codegen::{ExprOps, HandlerRef, Method, Payload, Route, RouteTable, StateProxy};
use mustweb_compiler::{CompileError, Opts, PageBuilder, RenderConfig};
use mustweb_schema::{FieldType, Schema, SchemaError};
use mustweb_server::MustWeb;
use serde_json::{json, Value as JsonValue};

pub const INCREMENT_PATH: &str = "/api/increment";

pub fn state_schema() -> Result<Schema, SchemaError> {
    Schema::builder("CounterState")
        .field("name", FieldType::Str, "Guest")
        .field("count", FieldType::Int, 0)
        .field("loading", FieldType::Bool, false)
        .build()
}

pub fn increment_request() -> Result<Schema, SchemaError> {
    Schema::builder("IncrementRequest")
        .field("by", FieldType::Int, 1)
        .build()
}

pub fn increment_response() -> Result<Schema, SchemaError> {
    Schema::builder("IncrementResponse")
        .field("new_count", FieldType::Int, 0)
        .build()
}

pub fn increment_handler() -> HandlerRef {
    HandlerRef::new("increment")
}

pub fn increment_route() -> Result<Route, SchemaError> {
    Ok(Route::new(Method::Post, INCREMENT_PATH, &increment_handler())
        .request(&increment_request()?)
        .response(&increment_response()?))
}

/// The demo's routes, for rendering without a server.
pub fn route_table() -> Result<RouteTable, SchemaError> {
    Ok(RouteTable::new(vec![increment_route()?]))
}

/// Counter page: greeting, name input, count and a guarded increment button.
pub fn counter_page(ml: &mut PageBuilder, state: &StateProxy) -> Result<(), CompileError> {
    let name = state.field("name")?;
    let count = state.field("count")?;
    let loading = state.field("loading")?;
    let increment = increment_handler();

    ml.div("space-y-4", |ml| {
        ml.heading(1, (), |ml| ml.text(["Hello, ".into(), name.expr(), "!".into()]))?;
        ml.label((), |ml| {
            ml.text(["Your name"])?;
            ml.input(&name, Opts::new().attr("placeholder", "Guest"))
        })?;
        ml.p((), |ml| ml.text(["Count: ".into(), count.expr()]))?;
        ml.p(Opts::new().class("text-sm text-gray-500").show_if(&loading), |ml| {
            ml.text(["Saving..."])
        })?;
        ml.button(
            "+1",
            Opts::new().disable_if((&loading).or((&count).ge(99))),
            |h| {
                h.assign(&loading, true);
                let res = h.invoke(&increment, Payload::object([("by", Payload::from(1))]));
                h.assign(&count, res.field("new_count"));
                h.assign(&loading, false);
                Ok(())
            },
        )
    })
}

/// The demo app: the counter page plus an in-memory increment endpoint.
pub fn app(config: RenderConfig) -> Result<MustWeb> {
    let counter = Arc::new(AtomicI64::new(0));
    let increment = move |Json(body): Json<JsonValue>| {
        let counter = counter.clone();
        async move {
            let by = body["by"].as_i64().unwrap_or(1);
            let new_count = counter.fetch_add(by, Ordering::SeqCst) + by;
            Json(json!({ "new_count": new_count }))
        }
    };

    MustWeb::new(config)
        .page("/", &state_schema()?, counter_page)?
        .remote(increment_route()?, increment)
}
