//! Request dispatch.
//!
//! One request goes through `MATCHING_ROUTE -> RESOLVING_VARIANT ->
//! INVOKING_HANDLER` and ends responded, unhandled or failed. Handler errors
//! are returned to the caller untouched.

use super::model::MockModel;
use super::overrides::Overrides;
use super::path::PathMatch;
use super::request::MockRequest;
use super::types::{DispatchOutcome, Route, Unhandled, Variant};
use crate::variant_handlers::{HandlerError, VariantHandler};
use hyper::Method;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub(crate) async fn dispatch(
    model: &MockModel,
    overrides: &Overrides,
    default_delay: u64,
    mut request: MockRequest,
) -> Result<DispatchOutcome, HandlerError> {
    let Some((route, variant, matched)) =
        match_route(model, overrides, &request.method, request.path())
    else {
        debug!(method = %request.method, path = request.path(), "No route matched");
        return Ok(DispatchOutcome::Unhandled(Unhandled::NoRouteMatched));
    };

    let Some(variant) = variant else {
        debug!(route = %route.id, "No variant selected for route");
        return Ok(DispatchOutcome::Unhandled(Unhandled::NoVariantSelected));
    };

    let handler = match &variant.handler {
        Some(handler) if !variant.disabled => handler,
        _ => {
            debug!(variant = %variant.id, "Variant is disabled");
            return Ok(DispatchOutcome::Unhandled(Unhandled::VariantDisabled));
        }
    };

    let delay = variant.delay.or(route.delay).unwrap_or(default_delay);
    if delay > 0 {
        debug!(variant = %variant.id, delay_ms = delay, "Delaying response");
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    debug!(variant = %variant.id, "Invoking variant handler");
    request.params = matched.params;
    let response = match handler {
        VariantHandler::Request(handler) => handler.handle(&request).await?,
        VariantHandler::Router(router) => router.route(&request, &matched.sub_path).await?,
    };

    Ok(match response {
        Some(response) => DispatchOutcome::Responded(response),
        None => DispatchOutcome::Unhandled(Unhandled::PassedByHandler),
    })
}

/// First route, in definition order, accepting the method and path, with
/// the variant it resolves to. Routes resolving to a sub-router match the
/// path as a prefix; every other route needs a full match.
fn match_route<'a>(
    model: &'a MockModel,
    overrides: &Overrides,
    method: &Method,
    path: &str,
) -> Option<(&'a Arc<Route>, Option<&'a Arc<Variant>>, PathMatch)> {
    model.routes.iter().find_map(|route| {
        if !route.accepts(method) {
            return None;
        }
        let variant = resolve_variant(model, overrides, route);
        let mounted = variant
            .and_then(|v| v.handler.as_ref())
            .is_some_and(|h| h.is_router());
        let matched = if mounted {
            route.matcher.matches_prefix(path)
        } else {
            route.matcher.matches(path)
        }?;
        Some((route, variant, matched))
    })
}

/// Override first, then the active collection.
fn resolve_variant<'a>(
    model: &'a MockModel,
    overrides: &Overrides,
    route: &Route,
) -> Option<&'a Arc<Variant>> {
    if let Some(variant) = overrides
        .get(&route.id)
        .and_then(|id| model.variants.get(id))
    {
        return Some(variant);
    }
    let id = model.active_collection()?.variant_for(&route.id)?;
    model.variants.get(id)
}
