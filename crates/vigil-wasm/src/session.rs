//! fetch-based session logout

use crate::describe;
use vigil_core::SessionBoundary;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestCredentials, RequestInit, Response, Window};

/// `POST {api_base}/logout` with the session cookie
pub struct FetchSessionBoundary {
    window: Window,
    endpoint: String,
}

impl FetchSessionBoundary {
    pub fn new(window: Window, api_base: &str) -> Self {
        let endpoint = format!("{}/logout", api_base.trim_end_matches('/'));
        Self { window, endpoint }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl SessionBoundary for FetchSessionBoundary {
    /// Not awaited by the widget; keepalive lets the request outlive the
    /// navigation that follows it
    fn logout(&self) {
        let init = RequestInit::new();
        init.set_method("POST");
        init.set_credentials(RequestCredentials::Include);
        init.set_keepalive(true);

        let request = match Request::new_with_str_and_init(&self.endpoint, &init) {
            Ok(request) => request,
            Err(e) => {
                web_sys::console::warn_1(&format!("[Vigil] logout request invalid: {}", describe(&e)).into());
                return;
            }
        };

        let pending = self.window.fetch_with_request(&request);
        let endpoint = self.endpoint.clone();
        wasm_bindgen_futures::spawn_local(async move {
            match JsFuture::from(pending).await {
                Ok(value) => {
                    let status = value.dyn_into::<Response>().map(|r| r.status()).unwrap_or(0);
                    if !(200..300).contains(&status) {
                        web_sys::console::warn_1(&format!("[Vigil] logout {} returned {}", endpoint, status).into());
                    }
                }
                Err(e) => {
                    web_sys::console::warn_1(&format!("[Vigil] logout {} failed: {}", endpoint, describe(&e)).into());
                }
            }
        });
    }
}
