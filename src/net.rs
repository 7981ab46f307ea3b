//! Fetch client for the boss generation proxy
//!
//! Thin wrapper over the browser fetch API. Transport, auth and CORS all
//! live in the same-origin proxy, not here; this module just ships the
//! prompt out and hands whatever comes back to the sim's validation
//! pipeline.

use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, Response};

use crate::SessionContext;
use crate::sim::boss::{self, BossError, BossRequest, RawBossResponse};

/// Proxy endpoint (same-origin serverless function)
const CHAT_ENDPOINT: &str = "/api/chat";

fn js_err(context: &str, err: JsValue) -> BossError {
    BossError::Request(format!("{context}: {err:?}"))
}

/// Request a generated encounter for the given progress snapshot
///
/// Any failure maps to a `BossError`; callers route those to the
/// deterministic fallback encounter.
pub async fn request_boss_encounter(
    req: &BossRequest,
    session: &SessionContext,
) -> Result<RawBossResponse, BossError> {
    let body = serde_json::json!({
        "messages": [
            { "role": "system", "content": boss::SYSTEM_PROMPT },
            { "role": "user", "content": boss::build_prompt(req, session) },
        ]
    });

    let init = RequestInit::new();
    init.set_method("POST");
    init.set_body(&JsValue::from_str(&body.to_string()));

    let request = Request::new_with_str_and_init(CHAT_ENDPOINT, &init)
        .map_err(|e| js_err("building request", e))?;
    request
        .headers()
        .set("Content-Type", "application/json")
        .map_err(|e| js_err("setting headers", e))?;

    let window =
        web_sys::window().ok_or_else(|| BossError::Request("no window".to_string()))?;
    let response: Response = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| js_err("fetch", e))?
        .dyn_into()
        .map_err(|_| BossError::Request("fetch did not return a Response".to_string()))?;

    if !response.ok() {
        return Err(BossError::Status(response.status()));
    }

    let text = JsFuture::from(response.text().map_err(|e| js_err("reading body", e))?)
        .await
        .map_err(|e| js_err("reading body", e))?
        .as_string()
        .ok_or_else(|| BossError::Request("response body was not text".to_string()))?;

    boss::parse_chat_content(&text)
}
