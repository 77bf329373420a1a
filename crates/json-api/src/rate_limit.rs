//! Per-caller rate limiting middleware.

use std::sync::Arc;

use salvo::prelude::*;
use tracing::warn;

use nexus_app::rate_limit::RateDecision;

use crate::{extensions::*, observability::record_rate_limited, state::State};

const REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Counts the request against the caller's window; must run after auth.
///
/// A failing counter store lets the request through.
#[salvo::handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    let (limiter, subject) = {
        let state = match depot.obtain_or_500::<Arc<State>>() {
            Ok(state) => state,
            Err(error) => {
                res.render(error);
                ctrl.skip_rest();

                return;
            }
        };

        let Some(limiter) = state.rate_limiter.clone() else {
            ctrl.call_next(req, depot, res).await;

            return;
        };

        let subject = match depot.claims_or_401() {
            Ok(claims) => format!("{}:{}", claims.tenant, claims.subject),
            Err(error) => {
                res.render(error);
                ctrl.skip_rest();

                return;
            }
        };

        (limiter, subject)
    };

    match limiter.check(&subject).await {
        Ok(RateDecision::Allowed { remaining }) => {
            if let Err(source) = res.add_header(REMAINING_HEADER, remaining.to_string(), true) {
                warn!("failed to set rate limit header: {source}");
            }
        }
        Ok(RateDecision::Limited { limit }) => {
            record_rate_limited();
            res.render(
                StatusError::too_many_requests()
                    .brief(format!("Rate limit of {limit} requests per window exceeded")),
            );
            ctrl.skip_rest();

            return;
        }
        Err(source) => {
            warn!(subject, "rate limiter unavailable, allowing request: {source}");
        }
    }

    ctrl.call_next(req, depot, res).await;
}
